use led_canvas::grid::device::{DeviceInfo, MatrixSize};
use led_canvas::grid::messages::StateChange;
use led_canvas::grid::persist::{KeyValueStore, KEY_ENDPOINT, KEY_GRID_HEIGHT, KEY_GRID_WIDTH};
use led_canvas::grid::state::ControllerPhase;
use led_canvas::grid::{MemoryStore, PixelColor};
use std::sync::{Arc, Mutex};

#[path = "mock_device.rs"]
mod mock_device;

use mock_device::{harness, ENDPOINT};

fn status_changes(seen: &Arc<Mutex<Vec<StateChange>>>) -> Vec<StateChange> {
    seen.lock()
        .unwrap()
        .iter()
        .filter(|change| matches!(change, StateChange::Status(_)))
        .cloned()
        .collect()
}

#[test]
fn reported_matrix_size_becomes_authoritative() {
    let mut h = harness(16, 16, MemoryStore::new());
    h.device.set_info(DeviceInfo {
        name: Some("Shelf".into()),
        matrix: Some(MatrixSize {
            width: 8,
            height: 4,
        }),
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.controller
        .subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    assert!(h.controller.set_endpoint(Some(ENDPOINT)));

    assert_eq!((h.controller.width(), h.controller.height()), (8, 4));
    assert_eq!(h.controller.pixels().len(), 32);
    let store = h.controller.persistence().store();
    assert_eq!(store.get(KEY_GRID_WIDTH).unwrap().as_deref(), Some("8"));
    assert_eq!(store.get(KEY_GRID_HEIGHT).unwrap().as_deref(), Some("4"));
    assert_eq!(store.get(KEY_ENDPOINT).unwrap().as_deref(), Some(ENDPOINT));

    let seen = seen.lock().unwrap();
    assert!(seen.contains(&StateChange::Dimensions {
        width: 8,
        height: 4
    }));
    assert_eq!(h.controller.phase(), ControllerPhase::Ready);
    assert!(!h.controller.status().loading);

    // negotiation queues the canvas for the device
    assert!(h.controller.sync_state().is_pending());
}

#[test]
fn oversized_reported_matrix_keeps_local_dimensions() {
    let mut h = harness(5, 3, MemoryStore::new());
    h.device.set_info(DeviceInfo {
        name: None,
        matrix: Some(MatrixSize {
            width: usize::MAX,
            height: usize::MAX,
        }),
    });

    assert!(h.controller.set_endpoint(Some(ENDPOINT)));
    assert_eq!((h.controller.width(), h.controller.height()), (5, 3));
    assert_eq!(h.controller.pixels().len(), 15);
    assert_eq!(h.controller.persistence().store().get(KEY_GRID_WIDTH).unwrap(), None);
    assert_eq!(h.controller.phase(), ControllerPhase::Ready);
}

#[test]
fn device_without_matrix_keeps_local_dimensions() {
    let mut h = harness(5, 3, MemoryStore::new());
    h.controller.set_endpoint(Some(ENDPOINT));
    assert_eq!((h.controller.width(), h.controller.height()), (5, 3));
    assert!(!h.controller.status().has_error());
}

#[test]
fn unreachable_device_sets_error_and_finishes_loading() {
    let store = MemoryStore::with_entries([(KEY_ENDPOINT, ENDPOINT)]);
    let mut h = harness(2, 2, store);
    h.device.set_fail_info(true);
    assert!(h.controller.status().loading);

    h.controller.connect();
    assert!(h.controller.status().has_error());
    assert!(!h.controller.status().loading);
    assert_eq!(h.controller.phase(), ControllerPhase::Ready);

    // local editing keeps working while the device is unreachable
    assert!(h.controller.update_pixel(0, PixelColor::rgb(1, 2, 3)));
}

#[test]
fn continue_without_device_clears_error_and_stays_offline() {
    let store = MemoryStore::with_entries([(KEY_ENDPOINT, ENDPOINT)]);
    let mut h = harness(2, 2, store);
    h.device.set_fail_info(true);
    h.controller.connect();
    assert!(h.controller.status().has_error());

    h.controller.continue_without_device();
    let status = h.controller.status();
    assert!(status.ignore_device);
    assert!(!status.has_error());
    assert!(!status.loading);

    h.device.set_fail_info(false);
    h.controller.connect();
    h.controller.update_pixel(1, PixelColor::rgb(9, 9, 9));
    h.controller.flush();
    assert_eq!(h.device.push_count(), 0);
}

#[test]
fn continuing_while_loading_notifies_status_once() {
    let store = MemoryStore::with_entries([(KEY_ENDPOINT, ENDPOINT)]);
    let mut h = harness(2, 2, store);
    assert_eq!(h.controller.phase(), ControllerPhase::Loading);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.controller
        .subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    h.controller.continue_without_device();

    let statuses = status_changes(&seen);
    assert_eq!(statuses.len(), 1);
    let StateChange::Status(status) = &statuses[0] else {
        unreachable!()
    };
    assert!(status.ignore_device);
    assert!(!status.loading);
    assert!(!status.has_error());
}

#[test]
fn setting_same_endpoint_after_failure_reconnects() {
    let mut h = harness(4, 4, MemoryStore::new());
    h.device.set_fail_info(true);
    assert!(h.controller.set_endpoint(Some(ENDPOINT)));
    assert!(h.controller.status().has_error());

    h.device.set_fail_info(false);
    h.device.set_info(DeviceInfo {
        name: None,
        matrix: Some(MatrixSize {
            width: 2,
            height: 2,
        }),
    });
    assert!(h.controller.set_endpoint(Some(ENDPOINT)));
    assert!(!h.controller.status().has_error());
    assert_eq!((h.controller.width(), h.controller.height()), (2, 2));
}

#[test]
fn setting_same_endpoint_when_healthy_does_nothing() {
    let mut h = harness(4, 4, MemoryStore::new());
    h.controller.set_endpoint(Some(ENDPOINT));
    h.device.set_info(DeviceInfo {
        name: None,
        matrix: Some(MatrixSize {
            width: 2,
            height: 2,
        }),
    });

    assert!(h.controller.set_endpoint(Some(ENDPOINT)));
    assert_eq!((h.controller.width(), h.controller.height()), (4, 4));
}

#[test]
fn invalid_endpoint_is_rejected_without_changing_state() {
    let mut h = harness(2, 2, MemoryStore::new());
    assert!(!h.controller.set_endpoint(Some("mqtt://broker.local")));
    assert!(h.controller.endpoint().is_none());
    assert!(h.controller.status().has_error());
    assert_eq!(h.controller.persistence().store().get(KEY_ENDPOINT).unwrap(), None);
}

#[test]
fn clearing_endpoint_removes_it_from_store() {
    let mut h = harness(2, 2, MemoryStore::new());
    h.controller.set_endpoint(Some(ENDPOINT));
    assert!(h.controller.set_endpoint(None));
    assert!(h.controller.endpoint().is_none());
    assert_eq!(h.controller.persistence().store().get(KEY_ENDPOINT).unwrap(), None);

    h.controller.update_pixel(0, PixelColor::rgb(4, 4, 4));
    h.controller.flush();
    assert_eq!(h.device.push_count(), 0);
}

#[test]
fn stored_settings_are_restored_on_startup() {
    let store = MemoryStore::with_entries([
        ("currentColor", "#00ff00"),
        ("palette", "#111111,#222222"),
        ("debounceDelay", "250"),
    ]);
    let h = harness(2, 2, store);
    assert_eq!(h.controller.current_color(), PixelColor::rgb(0, 0xff, 0));
    assert_eq!(
        h.controller.palette(),
        &[PixelColor::rgb(0x11, 0x11, 0x11), PixelColor::rgb(0x22, 0x22, 0x22)]
    );
    assert_eq!(h.controller.config().debounce_delay_ms, 250);
    assert_eq!(
        h.controller.sync_state().debounce_delay(),
        std::time::Duration::from_millis(250)
    );
}

#[test]
fn color_and_palette_changes_are_persisted() {
    let mut h = harness(2, 2, MemoryStore::new());
    h.controller.set_current_color(PixelColor::rgb(0xab, 0xcd, 0xef));
    h.controller
        .set_palette(vec![PixelColor::BLACK, PixelColor::rgb(0xff, 0xff, 0xff)]);

    let store = h.controller.persistence().store();
    assert_eq!(store.get("currentColor").unwrap().as_deref(), Some("#abcdef"));
    assert_eq!(store.get("palette").unwrap().as_deref(), Some("#000000,#ffffff"));
}
