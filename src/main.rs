use led_canvas::grid::{DeviceClient, GridController, HttpTransport, JsonFileStore};
use led_canvas::logging;
use led_canvas::settings::Settings;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PUSH_WAIT: Duration = Duration::from_secs(10);

/// Restore the stored canvas and push it to the configured device once.
fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.json".to_string());
    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    let store_path = settings.store_path();
    let store = JsonFileStore::open(&store_path).unwrap_or_else(|err| {
        tracing::warn!("starting with an empty canvas store: {err:#}");
        JsonFileStore::empty(&store_path)
    });

    let device = DeviceClient::new(Arc::new(HttpTransport::new()?), settings.delivery);
    let mut controller = GridController::new(store, device, settings.grid_defaults());

    if let Some(endpoint) = settings.endpoint.as_deref() {
        controller.set_endpoint(Some(endpoint));
    }
    if controller.phase().is_loading() {
        controller.connect();
    }
    let Some(endpoint) = controller.endpoint().cloned() else {
        tracing::warn!("no device endpoint configured; nothing to push");
        return Ok(());
    };

    controller.schedule_sync(true);
    let deadline = Instant::now() + PUSH_WAIT;
    while controller.sync_state().is_in_flight() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
        controller.tick();
    }

    if controller.sync_state().is_in_flight() {
        tracing::warn!("device at {endpoint} has not answered after {PUSH_WAIT:?}");
    } else if let Some(err) = &controller.status().error {
        tracing::error!("device at {endpoint} did not accept the canvas: {err}");
    } else {
        tracing::info!(
            width = controller.width(),
            height = controller.height(),
            "canvas pushed to {endpoint}"
        );
    }
    Ok(())
}
