//! Coalescing of local edits into device pushes.
//!
//! The engine never talks to the network itself. Each entry point returns a
//! [`SyncDecision`] and the controller performs the send when told to. Time
//! only moves through [`SyncEngine::tick`], which the host calls from its
//! event loop.

use std::time::{Duration, Instant};

/// Trailing-edge window used while a drag gesture is in progress.
pub const DRAWING_WINDOW: Duration = Duration::from_millis(25);

/// The single timer shared by the debounced and drawing schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerSlot {
    #[default]
    Idle,
    Debounce {
        deadline: Instant,
    },
    Drawing {
        deadline: Instant,
    },
    /// The debounce timer fired with changes pending; the send runs on the
    /// next tick so it lands together with the next visual update.
    AwaitingFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Wait,
    SendNow,
}

impl SyncDecision {
    pub fn should_send(self) -> bool {
        matches!(self, Self::SendNow)
    }
}

/// Handle for one outbound push, used to match its completion to the edits it
/// carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEngine {
    debounce_delay: Duration,
    slot: TimerSlot,
    pending_change: bool,
    generation: u64,
    outstanding_sends: usize,
}

impl SyncEngine {
    pub fn new(debounce_delay: Duration) -> Self {
        Self {
            debounce_delay,
            slot: TimerSlot::Idle,
            pending_change: false,
            generation: 0,
            outstanding_sends: 0,
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    pub fn set_debounce_delay(&mut self, delay: Duration) {
        self.debounce_delay = delay;
    }

    pub fn slot(&self) -> TimerSlot {
        self.slot
    }

    pub fn has_timer(&self) -> bool {
        !matches!(self.slot, TimerSlot::Idle)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_change
    }

    /// True while a fired debounce waits for the next tick or a push has not
    /// reported back yet.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.slot, TimerSlot::AwaitingFrame) || self.outstanding_sends > 0
    }

    pub fn mark_changed(&mut self) {
        self.pending_change = true;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Debounced scheduling. A forced call cancels any timer and sends right
    /// away. Otherwise calls made while a timer is live (or a push is
    /// outstanding) piggyback on it instead of restarting it.
    pub fn schedule_debounced(&mut self, now: Instant, force_immediate: bool) -> SyncDecision {
        if force_immediate {
            self.cancel_timer();
            return SyncDecision::SendNow;
        }
        if self.has_timer() || self.outstanding_sends > 0 {
            return SyncDecision::Wait;
        }
        self.slot = TimerSlot::Debounce {
            deadline: now + self.debounce_delay,
        };
        SyncDecision::Wait
    }

    /// Drawing scheduling. Every call restarts the short window, replacing
    /// whatever timer was live.
    pub fn schedule_drawing(&mut self, now: Instant) {
        self.slot = TimerSlot::Drawing {
            deadline: now + DRAWING_WINDOW,
        };
    }

    /// Cancel any timer and send now if there is anything to send.
    pub fn flush(&mut self) -> SyncDecision {
        self.cancel_timer();
        if self.pending_change {
            SyncDecision::SendNow
        } else {
            SyncDecision::Wait
        }
    }

    pub fn cancel_timer(&mut self) {
        self.slot = TimerSlot::Idle;
    }

    /// Advance timers to `now`.
    pub fn tick(&mut self, now: Instant) -> SyncDecision {
        match self.slot {
            TimerSlot::Idle => SyncDecision::Wait,
            TimerSlot::Debounce { deadline } if now >= deadline => {
                self.slot = if self.pending_change {
                    TimerSlot::AwaitingFrame
                } else {
                    TimerSlot::Idle
                };
                SyncDecision::Wait
            }
            TimerSlot::Drawing { deadline } if now >= deadline => {
                self.slot = TimerSlot::Idle;
                if self.pending_change && self.outstanding_sends == 0 {
                    SyncDecision::SendNow
                } else {
                    SyncDecision::Wait
                }
            }
            TimerSlot::AwaitingFrame => {
                self.slot = TimerSlot::Idle;
                if self.pending_change {
                    SyncDecision::SendNow
                } else {
                    SyncDecision::Wait
                }
            }
            TimerSlot::Debounce { .. } | TimerSlot::Drawing { .. } => SyncDecision::Wait,
        }
    }

    pub fn begin_send(&mut self) -> SendTicket {
        self.outstanding_sends += 1;
        SendTicket {
            generation: self.generation,
        }
    }

    /// Record the outcome of a push. The pending flag clears only when the
    /// push succeeded and no edit arrived after it was composed. Returns
    /// `true` when such a newer edit still needs to reach the device.
    pub fn complete_send(&mut self, ticket: SendTicket, success: bool) -> bool {
        self.outstanding_sends = self.outstanding_sends.saturating_sub(1);
        if !success {
            return false;
        }
        if ticket.generation == self.generation {
            self.pending_change = false;
            false
        } else {
            self.pending_change
        }
    }
}
