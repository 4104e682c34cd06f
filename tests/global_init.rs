//! The process-wide scheduler. Kept in its own test binary since the global
//! worker outlives individual tests.

mod common;

use axum::http::Method;
use common::DictionaryServer;
use hotswap_dict::monitor::global;
use hotswap_dict::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_init_global_is_idempotent() {
    let server = DictionaryServer::start();
    server.publish(Some("L1"), Some("E1"), "行=xíng háng dāo\n");

    let settings = MonitorSettings {
        interval_ms: 50,
        initial_delay_ms: 0,
        ..MonitorSettings::with_location(server.url())
    };

    // Every plugin instance calls this on load.
    let started = Instant::now();
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let settings = settings.clone();
            thread::spawn(move || init_global(&settings).unwrap())
        })
        .collect();
    let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
    assert!(handles.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert!(Arc::ptr_eq(&handles[0], &global().handle().unwrap()));

    let start = Instant::now();
    while !handles[0].get().contains_key("行") && start.elapsed() < Duration::from_secs(5) {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(handles[0].get().variants("行").unwrap().len(), 3);

    // A later call with different settings joins the running worker.
    let other = MonitorSettings::with_location("http://127.0.0.1:1/other.txt");
    assert!(Arc::ptr_eq(&handles[0], &init_global(&other).unwrap()));

    thread::sleep(Duration::from_millis(500));
    global().shutdown();
    assert!(!handles[0].is_running());
    assert!(global().handle().is_none());

    // One check per 50ms at most; four workers would send four times that.
    let bound = started.elapsed().as_millis() as usize / 50 + 3;
    let heads = server.count(Method::HEAD);
    assert!(heads <= bound, "expected a single worker, got {} checks", heads);
    assert_eq!(handles[0].source_name(), format!("http:{}", server.url()));
}

#[test]
fn test_settings_without_location_start_nothing() {
    let scheduler = Scheduler::new();
    let result = scheduler.initialize_from_settings(&MonitorSettings::default());
    assert!(matches!(result, Err(DictError::Configuration(_))));
    assert!(scheduler.handle().is_none());
}
