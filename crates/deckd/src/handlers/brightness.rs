use anyhow::Result;
use async_trait::async_trait;
use deckd_core::config::HandlerConfig;
use deckd_core::handler::{Command, Handler, HandlerBase, KeySlot};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const MIN_LEVEL: u8 = 10;
const MAX_LEVEL: u8 = 100;

/// Brightness key: each click steps the panel brightness up, wrapping back
/// to dim after full. The key's title shows the level it will apply.
pub struct BrightnessHandler {
    base: HandlerBase,
    step: u8,
    level: AtomicU8,
}

impl BrightnessHandler {
    fn bump(&self) -> u8 {
        let mut level = self.level.load(Ordering::Relaxed).saturating_add(self.step);
        if level > MAX_LEVEL {
            level = MIN_LEVEL;
        }
        self.level.store(level, Ordering::Relaxed);
        level
    }
}

#[async_trait]
impl Handler for BrightnessHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    async fn on_will_appear(&self, slot: &KeySlot) -> Result<()> {
        let level = self.level.load(Ordering::Relaxed);
        self.base.set_title(format!("{}%", level));
        self.base.draw(slot);
        Ok(())
    }

    async fn on_key_up(&self, slot: &KeySlot) -> Result<()> {
        let level = self.bump();
        slot.send(Command::SetBrightness(level));
        self.base.set_title(format!("{}%", level));
        self.base.draw(slot);
        Ok(())
    }
}

pub fn build(config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
    Ok(Arc::new(BrightnessHandler {
        base: HandlerBase::with_visual(config.visual(), config.interval()),
        step: config.step.unwrap_or(10).max(1),
        level: AtomicU8::new(60),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckd_core::surface::{KeyVisual, Margins, Surface};
    use tokio::sync::mpsc;

    struct NullSurface;

    impl Surface for NullSurface {
        fn render(&self, _key: usize, _visual: &KeyVisual, _margins: Margins) -> Result<()> {
            Ok(())
        }

        fn set_brightness(&self, _level: u8) -> Result<()> {
            Ok(())
        }
    }

    fn slot() -> (KeySlot, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (KeySlot::new(0, Arc::new(NullSurface), tx), rx)
    }

    #[tokio::test]
    async fn click_steps_brightness_by_the_configured_step() {
        let mut config = HandlerConfig::named("brightness");
        config.step = Some(20);
        let handler = build(&config).unwrap();
        let (slot, mut rx) = slot();

        handler.on_key_up(&slot).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::SetBrightness(80));
        handler.on_key_up(&slot).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::SetBrightness(100));
    }

    #[tokio::test]
    async fn stepping_past_full_wraps_to_dim() {
        let mut config = HandlerConfig::named("brightness");
        config.step = Some(50);
        let handler = build(&config).unwrap();
        let (slot, mut rx) = slot();

        handler.on_key_up(&slot).await.unwrap(); // 60 -> 110 -> wrap
        assert_eq!(rx.try_recv().unwrap(), Command::SetBrightness(MIN_LEVEL));
    }

    #[tokio::test]
    async fn title_tracks_the_level() {
        let handler = build(&HandlerConfig::named("brightness")).unwrap();
        let (slot, _rx) = slot();
        handler.on_key_up(&slot).await.unwrap();
        assert_eq!(handler.base().visual().title, "70%");
    }
}
