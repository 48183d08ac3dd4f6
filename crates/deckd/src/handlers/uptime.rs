use anyhow::Result;
use async_trait::async_trait;
use deckd_core::config::HandlerConfig;
use deckd_core::handler::{Handler, HandlerBase, KeySlot};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Uptime key: polls once per interval, showing how long the daemon has
/// been running. A click refreshes immediately.
pub struct UptimeHandler {
    base: HandlerBase,
    started: Instant,
}

impl UptimeHandler {
    fn refresh(&self, slot: &KeySlot) {
        self.base
            .set_title(format!("up\n{}", format_uptime(self.started.elapsed())));
        self.base.draw(slot);
    }
}

#[async_trait]
impl Handler for UptimeHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    async fn on_will_appear(&self, slot: &KeySlot) -> Result<()> {
        while !self.base.is_stopped() {
            self.refresh(slot);
            tokio::time::sleep(self.base.interval()).await;
        }
        Ok(())
    }

    async fn on_key_up(&self, slot: &KeySlot) -> Result<()> {
        self.refresh(slot);
        Ok(())
    }
}

fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

pub fn build(config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
    Ok(Arc::new(UptimeHandler {
        base: HandlerBase::with_visual(config.visual(), config.interval()),
        started: Instant::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_under_a_day_is_hms() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 25)), "03:00:25");
    }

    #[test]
    fn format_over_a_day_includes_days() {
        let two_days = Duration::from_secs(2 * 86_400 + 3661);
        assert_eq!(format_uptime(two_days), "2d 01:01:01");
    }
}
