//! Example demonstrating a hot-reloaded polyphone dictionary.
//!
//! Set `DICT_MONITOR_LOCATION` to poll a real server, e.g.
//!
//! ```text
//! DICT_MONITOR_LOCATION=https://dict.example.com/polyphone.txt \
//! DICT_MONITOR_INTERVAL_MS=5000 RUST_LOG=hotswap_dict=debug \
//!     cargo run --example remote_dictionary
//! ```
//!
//! Without it, the example polls a local file and edits it to trigger a reload.

use hotswap_dict::monitor::global;
use hotswap_dict::prelude::*;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hotswap_dict=info")),
        )
        .init();

    println!("=== Remote Dictionary Example ===\n");

    let temp_dir = tempfile::tempdir()?;
    let dictionary_path = temp_dir.path().join("polyphone.txt");
    std::fs::write(&dictionary_path, "# polyphones\n行=xíng háng\n")?;

    let mut settings = SettingsLoader::new().load()?;
    let local = settings.location.is_none() && settings.location_file.is_none();
    if local {
        settings.location = Some(dictionary_path.to_string_lossy().into_owned());
        settings.interval_ms = 500;
    }
    println!("Polling {}", settings.resolve_location()?);
    println!("  Interval: {:?}", settings.interval());
    println!();

    // Any number of plugin instances may do this; one worker runs.
    let handle = init_global(&settings)?;
    let _subscription = handle.dictionary().subscribe(|snapshot| {
        println!("✓ Reloaded: {} entries", snapshot.len());
    });

    thread::sleep(Duration::from_secs(1));
    print_lookup(&handle.get(), "行");

    if local {
        println!("\nEditing the dictionary...");
        std::fs::write(&dictionary_path, "# polyphones\n行=xíng háng dāo\n长=cháng zhǎng\n")?;
        thread::sleep(Duration::from_secs(2));
        print_lookup(&handle.get(), "行");
        print_lookup(&handle.get(), "长");
    } else {
        thread::sleep(settings.interval() * 3);
        print_lookup(&handle.get(), "行");
    }

    println!("\n{} cycles completed", handle.cycles());
    global().shutdown();
    println!("✓ Monitor stopped");

    Ok(())
}

fn print_lookup(snapshot: &DictionarySnapshot, key: &str) {
    match snapshot.variants(key) {
        Some(variants) => println!("  {} → {}", key, variants.join(" / ")),
        None => println!("  {} → (no entry)", key),
    }
}
