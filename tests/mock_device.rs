#![allow(dead_code)]

use anyhow::{bail, Result};
use led_canvas::grid::clock::ManualClock;
use led_canvas::grid::device::{DeliveryMode, DeviceInfo, DevicePayload, DeviceTransport};
use led_canvas::grid::{DeviceClient, GridConfig, GridController, MemoryStore};
use std::sync::{Arc, Mutex};
use url::Url;

pub const ENDPOINT: &str = "http://192.168.4.20/json";

/// Device double that records every push and can be told to fail.
#[derive(Default)]
pub struct MockDevice {
    pub pushes: Mutex<Vec<DevicePayload>>,
    pub info: Mutex<DeviceInfo>,
    pub fail_pushes: Mutex<bool>,
    pub fail_info: Mutex<bool>,
}

impl MockDevice {
    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    pub fn last_push(&self) -> Option<DevicePayload> {
        self.pushes.lock().unwrap().last().cloned()
    }

    pub fn set_fail_pushes(&self, fail: bool) {
        *self.fail_pushes.lock().unwrap() = fail;
    }

    pub fn set_fail_info(&self, fail: bool) {
        *self.fail_info.lock().unwrap() = fail;
    }

    pub fn set_info(&self, info: DeviceInfo) {
        *self.info.lock().unwrap() = info;
    }
}

impl DeviceTransport for MockDevice {
    fn fetch_info(&self, endpoint: &Url) -> Result<DeviceInfo> {
        if *self.fail_info.lock().unwrap() {
            bail!("connection refused by {endpoint}");
        }
        Ok(self.info.lock().unwrap().clone())
    }

    fn push_state(&self, endpoint: &Url, payload: &DevicePayload) -> Result<()> {
        if *self.fail_pushes.lock().unwrap() {
            bail!("device at {endpoint} timed out");
        }
        self.pushes.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: GridController<MemoryStore>,
    pub device: Arc<MockDevice>,
    pub clock: ManualClock,
}

pub fn harness(width: usize, height: usize, store: MemoryStore) -> Harness {
    harness_with_mode(width, height, store, DeliveryMode::Inline)
}

pub fn harness_with_mode(
    width: usize,
    height: usize,
    store: MemoryStore,
    mode: DeliveryMode,
) -> Harness {
    let device = Arc::new(MockDevice::default());
    let clock = ManualClock::default();
    let controller = GridController::with_clock(
        store,
        DeviceClient::new(device.clone(), mode),
        GridConfig::default().with_dimensions(width, height),
        Box::new(clock.clone()),
    );
    Harness {
        controller,
        device,
        clock,
    }
}

/// A harness already connected to [`ENDPOINT`] with nothing left to push.
pub fn connected(width: usize, height: usize) -> Harness {
    let mut h = harness(width, height, MemoryStore::new());
    assert!(h.controller.set_endpoint(Some(ENDPOINT)));
    h.controller.flush();
    h.device.pushes.lock().unwrap().clear();
    h
}
