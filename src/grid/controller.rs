use crate::grid::clock::{Clock, SystemClock};
use crate::grid::color::{default_current_color, default_palette, PixelColor};
use crate::grid::device::{parse_endpoint, DeviceClient, DevicePayload, SendOutcome};
use crate::grid::history::{HistoryAction, HistoryLog};
use crate::grid::messages::StateChange;
use crate::grid::model::GridConfig;
use crate::grid::persist::{KeyValueStore, Persistence};
use crate::grid::state::{can_transition, ControllerPhase, StatusFlags};
use crate::grid::store::PixelGrid;
use crate::grid::sync::{SyncDecision, SyncEngine};
use crate::shortcut::{is_undo_chord, KeyEvent};
use std::time::Duration;
use url::Url;

type Subscriber = Box<dyn FnMut(&StateChange)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Debounced,
    Drawing,
}

/// Public surface used by the UI. Owns the grid, its undo log, persistence
/// and the device sync state; all methods run on the caller's thread.
pub struct GridController<S: KeyValueStore> {
    config: GridConfig,
    grid: PixelGrid,
    history: HistoryLog,
    persistence: Persistence<S>,
    sync: SyncEngine,
    device: DeviceClient,
    clock: Box<dyn Clock>,
    endpoint: Option<Url>,
    palette: Vec<PixelColor>,
    current_color: PixelColor,
    phase: ControllerPhase,
    status: StatusFlags,
    subscribers: Vec<Subscriber>,
}

impl<S: KeyValueStore> GridController<S> {
    pub fn new(store: S, device: DeviceClient, defaults: GridConfig) -> Self {
        Self::with_clock(store, device, defaults, Box::new(SystemClock))
    }

    /// Restore persisted state from `store`, falling back to `defaults` for
    /// anything missing or unreadable.
    pub fn with_clock(
        store: S,
        device: DeviceClient,
        defaults: GridConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        let persistence = Persistence::new(store);

        let mut config = defaults.with_dimensions(defaults.width, defaults.height);
        if let Some((width, height)) = persistence.load_dimensions() {
            config = config.with_dimensions(width, height);
        }
        if let Some(delay_ms) = persistence.load_debounce_delay() {
            config.debounce_delay_ms = delay_ms;
        }
        let palette = persistence.load_palette().unwrap_or_else(default_palette);
        let current_color = persistence
            .load_current_color()
            .unwrap_or_else(default_current_color);
        let history = persistence.load_history();
        let endpoint = persistence.load_endpoint().and_then(|raw| {
            parse_endpoint(&raw)
                .map_err(|err| tracing::warn!("ignoring stored endpoint: {err:#}"))
                .ok()
        });

        let mut controller = Self {
            grid: PixelGrid::new(config.width, config.height),
            sync: SyncEngine::new(Duration::from_millis(config.debounce_delay_ms)),
            config,
            history,
            persistence,
            device,
            clock,
            endpoint,
            palette,
            current_color,
            phase: ControllerPhase::Initializing,
            status: StatusFlags {
                loading: true,
                ..StatusFlags::default()
            },
            subscribers: Vec::new(),
        };
        controller.setup_grid();

        let next = if controller.endpoint.is_some() {
            ControllerPhase::Loading
        } else {
            ControllerPhase::Ready
        };
        controller.transition(next);
        tracing::debug!(
            width = controller.config.width,
            height = controller.config.height,
            history = controller.history.len(),
            "grid controller restored"
        );
        controller
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StateChange) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn notify(&mut self, change: StateChange) {
        for subscriber in &mut self.subscribers {
            subscriber(&change);
        }
    }

    fn notify_status(&mut self) {
        let status = self.status.clone();
        self.notify(StateChange::Status(status));
    }

    fn transition(&mut self, to: ControllerPhase) {
        if self.enter_phase(to) {
            self.notify_status();
        }
    }

    /// Move to `to` without notifying. Returns whether the loading flag
    /// changed.
    fn enter_phase(&mut self, to: ControllerPhase) -> bool {
        if !can_transition(self.phase, to) {
            tracing::warn!(from = ?self.phase, to = ?to, "ignoring invalid phase transition");
            return false;
        }
        self.phase = to;
        let loading = to.is_loading();
        let changed = self.status.loading != loading;
        self.status.loading = loading;
        changed
    }

    pub fn pixels(&self) -> &[PixelColor] {
        self.grid.pixels()
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn config(&self) -> GridConfig {
        self.config
    }

    pub fn palette(&self) -> &[PixelColor] {
        &self.palette
    }

    pub fn current_color(&self) -> PixelColor {
        self.current_color
    }

    pub fn status(&self) -> &StatusFlags {
        &self.status
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn sync_state(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn compose_payload(&self) -> DevicePayload {
        DevicePayload::from_pixels(self.grid.pixels())
    }

    /// Rebuild the buffer for the configured dimensions from the stored
    /// pixels (or the live buffer when nothing is stored). Never pushes to
    /// the device.
    pub fn setup_grid(&mut self) {
        let seed = self
            .persistence
            .load_pixels()
            .unwrap_or_else(|| self.grid.pixels().to_vec());
        self.grid
            .setup(self.config.width, self.config.height, Some(seed.as_slice()));
        if self.phase == ControllerPhase::Initializing {
            return;
        }
        self.persistence.save_pixels(self.grid.pixels());
        self.notify(StateChange::Pixels);
    }

    pub fn update_pixel(&mut self, index: usize, color: PixelColor) -> bool {
        self.update_pixel_with(index, color, Schedule::Debounced)
    }

    /// Same as [`GridController::update_pixel`] for cells painted during a
    /// drag; the push waits for the trailing edge of the gesture.
    pub fn paint_stroke(&mut self, index: usize, color: PixelColor) -> bool {
        self.update_pixel_with(index, color, Schedule::Drawing)
    }

    fn update_pixel_with(&mut self, index: usize, color: PixelColor, schedule: Schedule) -> bool {
        let Some(action) = self.grid.set_pixel(index, color) else {
            return false;
        };
        self.history.record(action);
        self.after_mutation(schedule);
        true
    }

    /// Paint every index with `color`. Each changed cell gets its own undo
    /// entry, but storage and sync run once for the whole batch.
    pub fn batch_update_pixels(&mut self, indices: &[usize], color: PixelColor) -> usize {
        let mut changed = 0;
        for &index in indices {
            if let Some(action) = self.grid.set_pixel(index, color) {
                self.history.record(action);
                changed += 1;
            }
        }
        if changed > 0 {
            self.after_mutation(Schedule::Debounced);
        }
        changed
    }

    /// Replace the whole buffer. Returns `false` when the input was rejected.
    pub fn apply_pixel_array(&mut self, pixels: &[PixelColor]) -> bool {
        if pixels.is_empty() {
            tracing::warn!("rejecting empty pixel array");
            return false;
        }
        let expected = self.grid.len();
        if pixels.len() != expected {
            if self.phase.is_loading() {
                tracing::debug!(
                    got = pixels.len(),
                    expected,
                    "discarding mismatched pixel array while loading"
                );
                return false;
            }
            tracing::warn!(
                got = pixels.len(),
                expected,
                "fitting pixel array to grid size"
            );
        }
        let action = self.grid.replace_all(pixels);
        self.history.record(action);
        self.after_mutation(Schedule::Debounced);
        true
    }

    pub fn clear_screen(&mut self) {
        let action = self.grid.clear();
        self.history.record(action);
        self.after_mutation(Schedule::Debounced);
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.grid) {
            return false;
        }
        self.after_mutation(Schedule::Debounced);
        true
    }

    pub fn last_action(&self) -> Option<&HistoryAction> {
        self.history.last()
    }

    fn after_mutation(&mut self, schedule: Schedule) {
        self.sync.mark_changed();
        self.persistence.save_pixels(self.grid.pixels());
        self.persistence.save_history(&self.history);
        self.notify(StateChange::Pixels);
        let len = self.history.len();
        self.notify(StateChange::History { len });

        let now = self.clock.now();
        match schedule {
            Schedule::Debounced => {
                if self.sync.schedule_debounced(now, false).should_send() {
                    self.send_now();
                }
            }
            Schedule::Drawing => self.sync.schedule_drawing(now),
        }
    }

    /// Debounced push request; a forced request skips the timer entirely.
    pub fn schedule_sync(&mut self, force_immediate: bool) {
        let now = self.clock.now();
        if self.sync.schedule_debounced(now, force_immediate).should_send() {
            self.send_now();
        }
    }

    /// Cancel any timer and push now if anything changed.
    pub fn flush(&mut self) {
        if self.sync.flush() == SyncDecision::SendNow {
            self.send_now();
        }
    }

    /// Drive timers and collect background push outcomes. Call this from the
    /// host's frame or event loop.
    pub fn tick(&mut self) {
        for outcome in self.device.drain_outcomes() {
            self.handle_outcome(outcome);
        }
        let now = self.clock.now();
        if self.sync.tick(now).should_send() {
            self.send_now();
        }
    }

    fn send_now(&mut self) {
        if self.status.ignore_device {
            tracing::debug!("device ignored; skipping push");
            return;
        }
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!("no device endpoint configured; skipping push");
            return;
        };
        let payload = self.compose_payload();
        let ticket = self.sync.begin_send();
        tracing::debug!(pixels = payload.seg.i.len(), %endpoint, "pushing grid to device");
        if let Some(outcome) = self.device.dispatch(endpoint, payload, ticket) {
            self.handle_outcome(outcome);
        }
    }

    fn handle_outcome(&mut self, outcome: SendOutcome) {
        match outcome.result {
            Ok(()) => {
                let resync = self.sync.complete_send(outcome.ticket, true);
                if self.status.error.take().is_some() {
                    self.notify_status();
                }
                if resync {
                    self.schedule_sync(false);
                }
            }
            Err(msg) => {
                self.sync.complete_send(outcome.ticket, false);
                tracing::warn!("device push failed: {msg}");
                self.status.error = Some(msg);
                self.notify_status();
            }
        }
    }

    /// Negotiate with the stored endpoint, if any. Loading ends either way.
    pub fn connect(&mut self) {
        match self.endpoint.clone() {
            Some(endpoint) if !self.status.ignore_device => self.negotiate(&endpoint),
            _ => self.transition(ControllerPhase::Ready),
        }
    }

    /// Point the controller at a new device endpoint, or at none. Returns
    /// `false` when `endpoint` is not a usable http(s) URL. Passing the
    /// current endpoint again only reconnects when the last attempt failed.
    pub fn set_endpoint(&mut self, endpoint: Option<&str>) -> bool {
        let parsed = match endpoint.map(parse_endpoint).transpose() {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("rejecting device endpoint: {err:#}");
                self.status.error = Some(format!("{err:#}"));
                self.notify_status();
                return false;
            }
        };
        if parsed == self.endpoint {
            if self.status.has_error() && self.phase != ControllerPhase::Initializing {
                self.connect();
            }
            return true;
        }
        self.endpoint = parsed;
        self.persistence
            .save_endpoint(self.endpoint.as_ref().map(Url::as_str));
        let endpoint = self.endpoint.as_ref().map(Url::to_string);
        self.notify(StateChange::Endpoint { endpoint });
        if self.phase != ControllerPhase::Initializing {
            self.connect();
        }
        true
    }

    fn negotiate(&mut self, endpoint: &Url) {
        self.transition(ControllerPhase::Loading);
        match self.device.fetch_info(endpoint) {
            Ok(info) => {
                tracing::info!(
                    name = info.name.as_deref().unwrap_or("unknown"),
                    %endpoint,
                    "connected to device"
                );
                match info.matrix {
                    Some(matrix) if matrix.is_supported() => {
                        self.set_dimensions(matrix.width, matrix.height);
                    }
                    Some(matrix) => tracing::warn!(
                        width = matrix.width,
                        height = matrix.height,
                        "keeping local grid size; device matrix is unsupported"
                    ),
                    None => {}
                }
                if self.status.error.take().is_some() {
                    self.notify_status();
                }
                self.sync.mark_changed();
                self.schedule_sync(false);
            }
            Err(err) => {
                tracing::error!("failed to reach device at {endpoint}: {err:#}");
                self.status.error = Some(format!("{err:#}"));
                self.notify_status();
            }
        }
        self.transition(ControllerPhase::Ready);
    }

    /// Stop talking to the device for the rest of the session. Local editing
    /// keeps working.
    pub fn continue_without_device(&mut self) {
        self.status.ignore_device = true;
        self.status.error = None;
        self.sync.cancel_timer();
        self.enter_phase(ControllerPhase::Ready);
        self.notify_status();
    }

    pub fn set_dimensions(&mut self, width: usize, height: usize) {
        let next = self.config.with_dimensions(width, height);
        if (next.width, next.height) == (self.config.width, self.config.height) {
            return;
        }
        self.config = next;
        self.persistence
            .save_dimensions(self.config.width, self.config.height);
        self.on_dimensions_changed();
    }

    fn on_dimensions_changed(&mut self) {
        if self.phase == ControllerPhase::Initializing {
            return;
        }
        self.setup_grid();
        self.history.clear();
        self.persistence.save_history(&self.history);
        self.sync.mark_changed();
        let (width, height) = (self.config.width, self.config.height);
        tracing::info!(width, height, "grid dimensions changed");
        self.notify(StateChange::Dimensions { width, height });
        self.notify(StateChange::History { len: 0 });
    }

    pub fn set_debounce_delay(&mut self, delay_ms: u64) {
        self.config.debounce_delay_ms = delay_ms;
        self.sync.set_debounce_delay(Duration::from_millis(delay_ms));
        self.persistence.save_debounce_delay(delay_ms);
        self.notify(StateChange::DebounceDelay { delay_ms });
    }

    pub fn set_current_color(&mut self, color: PixelColor) {
        if color == self.current_color {
            return;
        }
        self.current_color = color;
        self.persistence.save_current_color(color);
        self.notify(StateChange::CurrentColor { color });
    }

    pub fn set_palette(&mut self, palette: Vec<PixelColor>) {
        self.palette = palette;
        self.persistence.save_palette(&self.palette);
        self.notify(StateChange::Palette);
    }

    /// Handle a key press. Returns `true` when it matched a binding.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if is_undo_chord(event) {
            self.undo();
            return true;
        }
        false
    }
}
