use anyhow::Result;
use async_trait::async_trait;
use deckd_core::config::HandlerConfig;
use deckd_core::handler::{Command, Handler, HandlerBase, KeySlot};
use deckd_core::surface::ImageSource;
use std::sync::Arc;

const NEXT_ARROW: &str = r#"<svg width="200" height="200" viewBox="0 0 200 200" xmlns="http://www.w3.org/2000/svg"><polygon points="60,40 150,100 60,160" fill="white"/></svg>"#;
const PREV_ARROW: &str = r#"<svg width="200" height="200" viewBox="0 0 200 200" xmlns="http://www.w3.org/2000/svg"><polygon points="140,40 50,100 140,160" fill="white"/></svg>"#;

/// Scene navigation key: a click moves to the next (or previous) scene,
/// a double-click turns the screen off.
pub struct PageHandler {
    base: HandlerBase,
    prev: bool,
}

#[async_trait]
impl Handler for PageHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    async fn on_will_appear(&self, slot: &KeySlot) -> Result<()> {
        let arrow = if self.prev { PREV_ARROW } else { NEXT_ARROW };
        self.base.set_image(Some(ImageSource::Svg(arrow.into())));
        self.base.draw(slot);
        Ok(())
    }

    async fn on_key_up(&self, slot: &KeySlot) -> Result<()> {
        let delta = if self.prev { -1 } else { 1 };
        slot.send(Command::AdvanceScene(delta));
        Ok(())
    }

    async fn on_key_double_click(&self, slot: &KeySlot) -> Result<()> {
        slot.send(Command::SetBrightness(0));
        Ok(())
    }
}

pub fn build(config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
    Ok(Arc::new(PageHandler {
        base: HandlerBase::with_visual(config.visual(), config.interval()),
        prev: config.prev.unwrap_or(false),
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
    async fn click_advances_forward_by_default() {
        let handler = build(&HandlerConfig::named("page")).unwrap();
        let (slot, mut rx) = slot();
        handler.on_key_up(&slot).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::AdvanceScene(1));
    }

    #[tokio::test]
    async fn prev_flag_reverses_the_direction() {
        let mut config = HandlerConfig::named("page");
        config.prev = Some(true);
        let handler = build(&config).unwrap();
        let (slot, mut rx) = slot();
        handler.on_key_up(&slot).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::AdvanceScene(-1));
    }

    #[tokio::test]
    async fn double_click_turns_the_screen_off() {
        let handler = build(&HandlerConfig::named("page")).unwrap();
        let (slot, mut rx) = slot();
        handler.on_key_double_click(&slot).await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::SetBrightness(0));
    }

    #[tokio::test]
    async fn appear_installs_an_arrow_image() {
        let handler = build(&HandlerConfig::named("page")).unwrap();
        let (slot, _rx) = slot();
        handler.on_will_appear(&slot).await.unwrap();
        assert!(matches!(
            handler.base().visual().image,
            Some(ImageSource::Svg(_))
        ));
    }
}
