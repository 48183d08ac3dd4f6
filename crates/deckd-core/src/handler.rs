use crate::surface::{ImageSource, KeyVisual, Margins, Surface};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Commands into the daemon's coordinator. The admin IPC layer and handlers
/// both speak this interface: a key can switch scenes or change brightness
/// the same way a remote admin client does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch scenes by a relative delta; wraps in both directions.
    AdvanceScene(i64),
    /// Jump to an absolute scene index.
    ActivateScene(usize),
    /// Set panel brightness. 0 turns the screen off.
    SetBrightness(u8),
    /// Stop the daemon.
    Shutdown,
}

/// One key's seat at the table: the surface slot a handler renders into,
/// plus the command channel back into the daemon.
#[derive(Clone)]
pub struct KeySlot {
    key: usize,
    surface: Arc<dyn Surface>,
    commands: mpsc::UnboundedSender<Command>,
}

impl KeySlot {
    pub fn new(
        key: usize,
        surface: Arc<dyn Surface>,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            key,
            surface,
            commands,
        }
    }

    pub fn key(&self) -> usize {
        self.key
    }

    /// Send a command to the daemon. Silently dropped during shutdown.
    pub fn send(&self, command: Command) {
        let _ = self.commands.send(command);
    }

    /// Push a visual to this key. Render failures are logged here and the
    /// key keeps its previous image.
    pub fn render(&self, visual: &KeyVisual, margins: Margins) {
        if let Err(e) = self.surface.render(self.key, visual, margins) {
            warn!(key = self.key, error = %e, "render failed");
        }
    }
}

/// State every handler carries: the current visual, the cooperative stop
/// flag, and the polling interval for long-running loops.
pub struct HandlerBase {
    visual: Mutex<KeyVisual>,
    stop: AtomicBool,
    interval: Duration,
}

impl HandlerBase {
    pub fn new(interval: Duration) -> Self {
        Self::with_visual(KeyVisual::default(), interval)
    }

    pub fn with_visual(visual: KeyVisual, interval: Duration) -> Self {
        Self {
            visual: Mutex::new(visual),
            stop: AtomicBool::new(false),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn set_stopped(&self, stopped: bool) {
        self.stop.store(stopped, Ordering::Relaxed);
    }

    /// Snapshot of the current visual.
    pub fn visual(&self) -> KeyVisual {
        self.visual.lock().unwrap().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.visual.lock().unwrap().title = title.into();
    }

    pub fn set_image(&self, image: Option<ImageSource>) {
        self.visual.lock().unwrap().image = image;
    }

    pub fn update_visual(&self, f: impl FnOnce(&mut KeyVisual)) {
        f(&mut self.visual.lock().unwrap());
    }

    /// Push the current visual to the slot, using the visual's own margins.
    /// No-op once the stop flag is set, so a handler torn down mid-loop
    /// cannot produce stale screen writes.
    pub fn draw(&self, slot: &KeySlot) {
        if self.is_stopped() {
            return;
        }
        let visual = self.visual();
        slot.render(&visual, visual.margins);
    }
}

/// Pluggable behavior bound to one key within one scene.
///
/// Hooks run as supervised tasks on the daemon's executor and may suspend
/// freely. The coordinator clears the stop flag before `on_will_appear` and
/// sets it before `on_will_disappear`; an appear hook that loops must check
/// it cooperatively, at least once per interval:
///
/// ```ignore
/// while !self.base().is_stopped() {
///     self.base().draw(slot);
///     tokio::time::sleep(self.base().interval()).await;
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    fn base(&self) -> &HandlerBase;

    /// The key became visible. The stop flag is already cleared.
    async fn on_will_appear(&self, slot: &KeySlot) -> Result<()> {
        self.base().draw(slot);
        Ok(())
    }

    /// The key is leaving the screen. The stop flag is already set.
    async fn on_will_disappear(&self, _slot: &KeySlot) -> Result<()> {
        Ok(())
    }

    async fn on_key_down(&self, _slot: &KeySlot) -> Result<()> {
        Ok(())
    }

    async fn on_key_up(&self, _slot: &KeySlot) -> Result<()> {
        Ok(())
    }

    async fn on_key_double_click(&self, _slot: &KeySlot) -> Result<()> {
        Ok(())
    }

    async fn on_key_long_pressed(&self, _slot: &KeySlot) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct RecordingSurface {
        calls: StdMutex<Vec<(usize, String)>>,
    }

    impl RecordingSurface {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Surface for RecordingSurface {
        fn render(&self, key: usize, visual: &KeyVisual, _margins: Margins) -> Result<()> {
            self.calls.lock().unwrap().push((key, visual.title.clone()));
            Ok(())
        }

        fn set_brightness(&self, _level: u8) -> Result<()> {
            Ok(())
        }
    }

    fn slot_with(surface: Arc<RecordingSurface>) -> KeySlot {
        let (tx, _rx) = mpsc::unbounded_channel();
        KeySlot::new(3, surface, tx)
    }

    #[test]
    fn draw_pushes_current_visual() {
        let surface = RecordingSurface::new();
        let slot = slot_with(surface.clone());
        let base = HandlerBase::new(Duration::from_secs(1));
        base.set_title("hello");

        base.draw(&slot);

        let calls = surface.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(3, "hello".to_string())]);
    }

    #[test]
    fn draw_after_stop_touches_nothing() {
        let surface = RecordingSurface::new();
        let slot = slot_with(surface.clone());
        let base = HandlerBase::new(Duration::from_secs(1));
        base.set_title("stale");
        base.set_stopped(true);

        base.draw(&slot);

        assert_eq!(surface.call_count(), 0);
    }

    #[test]
    fn stop_flag_round_trips() {
        let base = HandlerBase::new(Duration::from_secs(1));
        assert!(!base.is_stopped());
        base.set_stopped(true);
        assert!(base.is_stopped());
        base.set_stopped(false);
        assert!(!base.is_stopped());
    }

    #[test]
    fn send_after_daemon_exit_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        let slot = KeySlot::new(0, RecordingSurface::new(), tx);
        drop(rx);
        // Must not panic.
        slot.send(Command::AdvanceScene(1));
    }
}
