use anyhow::Result;
use async_trait::async_trait;
use deckd_core::config::HandlerConfig;
use deckd_core::handler::{Handler, HandlerBase};
use std::sync::Arc;

/// Static key: draws its configured title/image once on appear and reacts
/// to nothing. Also used to pad scenes with fewer handlers than keys.
pub struct LabelHandler {
    base: HandlerBase,
}

#[async_trait]
impl Handler for LabelHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }
}

pub fn build(config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
    Ok(Arc::new(LabelHandler {
        base: HandlerBase::with_visual(config.visual(), config.interval()),
    }))
}

/// A blank key for unconfigured slots.
pub fn blank() -> Arc<dyn Handler> {
    Arc::new(LabelHandler {
        base: HandlerBase::new(std::time::Duration::from_secs(3)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keeps_the_configured_title() {
        let mut config = HandlerConfig::named("label");
        config.title = Some("hello".into());
        let handler = build(&config).unwrap();
        assert_eq!(handler.base().visual().title, "hello");
    }

    #[test]
    fn blank_keys_have_nothing_to_draw() {
        let handler = blank();
        assert!(handler.base().visual().is_empty());
    }
}
