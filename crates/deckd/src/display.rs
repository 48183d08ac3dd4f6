use anyhow::Result;
use deckd_core::surface::{KeyVisual, Margins, Surface};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Headless rendering target: writes render calls to the log instead of a
/// panel. Stands in when no vendor backend is wired up, and keeps the
/// daemon fully operational for development and admin testing.
pub struct LogSurface;

impl Surface for LogSurface {
    fn render(&self, key: usize, visual: &KeyVisual, margins: Margins) -> Result<()> {
        debug!(
            key,
            title = %visual.title.replace('\n', " "),
            has_image = visual.image.is_some(),
            ?margins,
            "render"
        );
        Ok(())
    }

    fn set_brightness(&self, level: u8) -> Result<()> {
        debug!(level, "set brightness");
        Ok(())
    }
}

/// Panel power state: the configured brightness level plus an off flag.
/// Level 0 turns the panel off but keeps the last level so a key touch can
/// restore it.
pub struct ScreenState {
    surface: Arc<dyn Surface>,
    brightness: u8,
    off: bool,
}

impl ScreenState {
    pub fn new(surface: Arc<dyn Surface>, brightness: u8) -> Self {
        let mut screen = Self {
            surface,
            brightness: brightness.clamp(1, 100),
            off: true,
        };
        screen.apply(brightness);
        screen
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn is_off(&self) -> bool {
        self.off
    }

    /// Apply a brightness level; 0 switches the panel off.
    pub fn apply(&mut self, level: u8) {
        let level = level.min(100);
        if level == 0 {
            self.off = true;
            self.push(0);
            info!("screen off");
            return;
        }
        if self.off || level != self.brightness {
            self.off = false;
            self.brightness = level;
            self.push(level);
            info!(level, "screen brightness");
        }
    }

    /// Restore the last configured level after the panel was switched off.
    pub fn wake(&mut self) {
        if self.off {
            self.apply(self.brightness);
        }
    }

    fn push(&self, level: u8) {
        if let Err(e) = self.surface.set_brightness(level) {
            warn!(error = %e, "setting brightness failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSurface {
        levels: Mutex<Vec<u8>>,
    }

    impl RecordingSurface {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                levels: Mutex::new(Vec::new()),
            })
        }
    }

    impl Surface for RecordingSurface {
        fn render(&self, _key: usize, _visual: &KeyVisual, _margins: Margins) -> Result<()> {
            Ok(())
        }

        fn set_brightness(&self, level: u8) -> Result<()> {
            self.levels.lock().unwrap().push(level);
            Ok(())
        }
    }

    #[test]
    fn startup_applies_the_configured_level() {
        let surface = RecordingSurface::new();
        let screen = ScreenState::new(surface.clone(), 60);
        assert!(!screen.is_off());
        assert_eq!(*surface.levels.lock().unwrap(), vec![60]);
    }

    #[test]
    fn zero_turns_off_but_remembers_the_level() {
        let surface = RecordingSurface::new();
        let mut screen = ScreenState::new(surface.clone(), 60);
        screen.apply(0);
        assert!(screen.is_off());
        assert_eq!(screen.brightness(), 60);
        assert_eq!(*surface.levels.lock().unwrap(), vec![60, 0]);
    }

    #[test]
    fn wake_restores_the_remembered_level() {
        let surface = RecordingSurface::new();
        let mut screen = ScreenState::new(surface.clone(), 40);
        screen.apply(0);
        screen.wake();
        assert!(!screen.is_off());
        assert_eq!(*surface.levels.lock().unwrap(), vec![40, 0, 40]);
    }

    #[test]
    fn wake_while_on_changes_nothing() {
        let surface = RecordingSurface::new();
        let mut screen = ScreenState::new(surface.clone(), 40);
        screen.wake();
        assert_eq!(*surface.levels.lock().unwrap(), vec![40]);
    }

    #[test]
    fn reapplying_the_same_level_is_not_pushed_twice() {
        let surface = RecordingSurface::new();
        let mut screen = ScreenState::new(surface.clone(), 60);
        screen.apply(60);
        assert_eq!(*surface.levels.lock().unwrap(), vec![60]);
    }

    #[test]
    fn levels_above_100_are_clamped() {
        let surface = RecordingSurface::new();
        let mut screen = ScreenState::new(surface.clone(), 60);
        screen.apply(250);
        assert_eq!(screen.brightness(), 100);
        assert_eq!(*surface.levels.lock().unwrap(), vec![60, 100]);
    }
}
