//! Local file dictionary source.

use super::{ChangeResult, DictionarySource, Validators};
use crate::core::DictionarySnapshot;
use crate::error::{DictError, Result};
use async_trait::async_trait;
use std::fs::{File, Metadata};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Dictionary stored on the local filesystem.
///
/// Used for `file://` locations and plain paths. Change detection derives
/// validators from the file's modification time and length, so the same
/// monitor logic drives both local and remote dictionaries.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::sources::FileSource;
///
/// let source = FileSource::new("/etc/dict/polyphone.txt");
/// ```
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a new file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The watched path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DictionarySource for FileSource {
    async fn check(&self, prior: &Validators) -> ChangeResult {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(err) => return ChangeResult::Unreachable(DictError::Io(err)),
        };

        let observed = file_validators(&metadata);
        if observed.differs_from(prior) {
            ChangeResult::Changed(observed)
        } else {
            ChangeResult::Unchanged
        }
    }

    async fn load(&self) -> Result<DictionarySnapshot> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_local(&path))
            .await
            .map_err(|e| DictError::Load(format!("Dictionary load task failed: {}", e)))?
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Read and parse a dictionary file synchronously.
///
/// Used for the bundled dictionary a monitor starts from.
///
/// # Errors
///
/// Returns [`DictError::Load`] if the file cannot be opened or read.
pub fn load_local(path: impl AsRef<Path>) -> Result<DictionarySnapshot> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        DictError::Load(format!("Failed to open dictionary {}: {}", path.display(), e))
    })?;

    DictionarySnapshot::from_reader(BufReader::new(file)).map_err(|e| {
        DictError::Load(format!("Failed to read dictionary {}: {}", path.display(), e))
    })
}

fn file_validators(metadata: &Metadata) -> Validators {
    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok());

    let last_modified = modified.map(|d| format!("{}.{:09}", d.as_secs(), d.subsec_nanos()));
    let etag = Some(match modified {
        Some(d) => format!("{}-{}", metadata.len(), d.as_secs()),
        None => metadata.len().to_string(),
    });

    Validators::new(last_modified, etag)
}
