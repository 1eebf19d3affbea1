use std::{thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn console_only_logging_leaves_no_files_behind() {
    let dir = tempdir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    led_canvas::logging::init(false, None);
    tracing::warn!("device unreachable");

    sleep(Duration::from_millis(100));

    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 0, "console logging should not create files");
}
