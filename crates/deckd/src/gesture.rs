use std::time::{Duration, Instant};
use tracing::debug;

/// Semantic gesture classified from press/release timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Down,
    Up,
    DoubleClick,
    LongPress,
}

/// Raw transition from the key matrix.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: usize,
    pub pressed: bool,
    pub timestamp: Instant,
}

/// Actions the detector wants the caller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Invoke the gesture callback on the key's bound handler (fire and forget).
    Dispatch { key: usize, gesture: Gesture },
    /// Re-push the key's current image, inset while the key is held.
    Redraw { key: usize, pressed: bool },
}

/// One armed timer. The generation stamps which arming this deadline belongs
/// to: a fire observed under an older generation was superseded by a newer
/// press/release and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTimer {
    deadline: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct KeyState {
    last_release: Option<Instant>,
    long_press: Option<PendingTimer>,
    key_up: Option<PendingTimer>,
    /// A long-press fired during the current press cycle; the click family
    /// stays suppressed until the next press.
    long_press_fired: bool,
}

/// Turns raw press/release events into semantic gestures.
///
/// Pure state machine in the same shape as the daemon's event loop expects:
/// feed it events and deadline checks, perform the actions it returns. It
/// does no I/O and spawns nothing, so the single-threaded caller is the only
/// thing that ever mutates a key's pending timers.
pub struct GestureDetector {
    keys: Vec<KeyState>,
    double_click_window: Duration,
    long_press_threshold: Duration,
    generation: u64,
}

impl GestureDetector {
    pub fn new(keys: usize, double_click_window: Duration, long_press_threshold: Duration) -> Self {
        Self {
            keys: (0..keys).map(|_| KeyState::default()).collect(),
            double_click_window,
            long_press_threshold,
            generation: 0,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Process one raw transition, returning actions for the caller.
    pub fn handle_event(&mut self, event: KeyEvent) -> Vec<Action> {
        if event.key >= self.keys.len() {
            debug!(key = event.key, "event for unmapped key");
            return Vec::new();
        }

        let mut actions = Vec::new();
        if event.pressed {
            self.handle_press(event, &mut actions);
        } else {
            self.handle_release(event, &mut actions);
        }
        actions.push(Action::Redraw {
            key: event.key,
            pressed: event.pressed,
        });
        actions
    }

    fn handle_press(&mut self, event: KeyEvent, actions: &mut Vec<Action>) {
        let generation = self.next_generation();
        let state = &mut self.keys[event.key];

        // Re-arm the long-press timer; any prior one for this key is
        // superseded by the replacement.
        state.long_press = Some(PendingTimer {
            deadline: event.timestamp + self.long_press_threshold,
            generation,
        });
        state.long_press_fired = false;

        actions.push(Action::Dispatch {
            key: event.key,
            gesture: Gesture::Down,
        });
    }

    fn handle_release(&mut self, event: KeyEvent, actions: &mut Vec<Action>) {
        let window = self.double_click_window;
        let generation = self.next_generation();
        let state = &mut self.keys[event.key];

        let prior_release = state.last_release.replace(event.timestamp);

        // A still-pending long-press timer means this was a short press.
        // If it already fired, the whole click family is suppressed for
        // this cycle: long-press and clicks are mutually exclusive.
        let long_cycle = if state.long_press.take().is_some() {
            debug!(key = event.key, "long-press timer cancelled by release");
            false
        } else {
            state.long_press_fired
        };
        if long_cycle {
            return;
        }

        let is_double = prior_release
            .map_or(false, |t| event.timestamp.duration_since(t) < window);
        if is_double {
            if state.key_up.take().is_some() {
                debug!(key = event.key, "pending key-up cancelled by double-click");
            }
            actions.push(Action::Dispatch {
                key: event.key,
                gesture: Gesture::DoubleClick,
            });
        } else {
            // Delay the plain key-up long enough for a second release to
            // turn the pair into a double-click instead.
            state.key_up = Some(PendingTimer {
                deadline: event.timestamp + window,
                generation,
            });
        }
    }

    /// Fire every timer whose deadline has passed.
    pub fn check_timers(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        for key in 0..self.keys.len() {
            if let Some(timer) = self.keys[key].key_up {
                if timer.deadline <= now {
                    actions.extend(self.fire_key_up(key, timer.generation));
                }
            }
            if let Some(timer) = self.keys[key].long_press {
                if timer.deadline <= now {
                    actions.extend(self.fire_long_press(key, timer.generation));
                }
            }
        }
        actions
    }

    /// A delayed key-up deadline fired. Validates the firing is still the
    /// tracked one for the key; a stale fire is a benign no-op.
    fn fire_key_up(&mut self, key: usize, generation: u64) -> Vec<Action> {
        let state = &mut self.keys[key];
        match state.key_up {
            Some(timer) if timer.generation == generation => {
                state.key_up = None;
                vec![Action::Dispatch {
                    key,
                    gesture: Gesture::Up,
                }]
            }
            _ => Vec::new(),
        }
    }

    /// A long-press deadline fired. Same staleness rule as [`fire_key_up`].
    fn fire_long_press(&mut self, key: usize, generation: u64) -> Vec<Action> {
        let state = &mut self.keys[key];
        match state.long_press {
            Some(timer) if timer.generation == generation => {
                state.long_press = None;
                state.long_press_fired = true;
                vec![Action::Dispatch {
                    key,
                    gesture: Gesture::LongPress,
                }]
            }
            _ => Vec::new(),
        }
    }

    /// Earliest pending deadline across all keys, or None when no timer is
    /// armed (the event loop sleeps without wakeups in that case).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.keys
            .iter()
            .flat_map(|k| [k.key_up, k.long_press])
            .flatten()
            .map(|t| t.deadline)
            .min()
    }

    /// Drop every pending timer. Called at scene teardown so gestures from
    /// the outgoing scene cannot land on the incoming one.
    pub fn cancel_all(&mut self) {
        for state in &mut self.keys {
            state.long_press = None;
            state.key_up = None;
        }
    }
}
