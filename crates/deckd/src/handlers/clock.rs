use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, Timelike};
use deckd_core::config::HandlerConfig;
use deckd_core::handler::{Handler, HandlerBase, KeySlot};
use deckd_core::surface::ImageSource;
use std::fmt::Write;
use std::sync::Arc;

/// Analog clock key: redraws an SVG clock face once per interval.
pub struct ClockHandler {
    base: HandlerBase,
}

#[async_trait]
impl Handler for ClockHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    async fn on_will_appear(&self, slot: &KeySlot) -> Result<()> {
        while !self.base.is_stopped() {
            let now = Local::now();
            let svg = clock_svg(now.hour(), now.minute(), now.second());
            self.base.set_image(Some(ImageSource::Svg(svg)));
            self.base.draw(slot);
            tokio::time::sleep(self.base.interval()).await;
        }
        Ok(())
    }
}

/// Clock face with hour marks and three hands, centered on the origin.
fn clock_svg(hour: u32, minute: u32, second: u32) -> String {
    let mut svg = String::from(
        r#"<svg width="200" height="200" viewBox="-100 -100 200 200" xmlns="http://www.w3.org/2000/svg">"#,
    );
    svg.push_str(r#"<circle cx="0" cy="0" r="90" fill="none" stroke="white" stroke-width="6"/>"#);

    for mark in 0..12 {
        let angle = f64::from(mark) * 30.0_f64.to_radians();
        let (outer_x, outer_y) = (90.0 * angle.sin(), -90.0 * angle.cos());
        let (inner_x, inner_y) = (80.0 * angle.sin(), -80.0 * angle.cos());
        let _ = write!(
            svg,
            r#"<line x1="{outer_x:.2}" y1="{outer_y:.2}" x2="{inner_x:.2}" y2="{inner_y:.2}" stroke="white" stroke-width="4"/>"#,
        );
    }

    hand(&mut svg, hand_angle(hour, minute), 40.0, "white", 6);
    hand(&mut svg, f64::from(minute) * 6.0, 60.0, "white", 4);
    hand(&mut svg, f64::from(second) * 6.0, 80.0, "yellow", 2);

    svg.push_str(r#"<circle cx="0" cy="0" r="4" fill="black"/>"#);
    svg.push_str("</svg>");
    svg
}

/// Hour hand angle in degrees, drifting with the minutes.
fn hand_angle(hour: u32, minute: u32) -> f64 {
    f64::from(hour % 12) * 30.0 + f64::from(minute) * 0.5
}

fn hand(svg: &mut String, angle_deg: f64, length: f64, color: &str, width: u32) {
    let angle = angle_deg.to_radians();
    let (x, y) = (length * angle.sin(), -length * angle.cos());
    let _ = write!(
        svg,
        r#"<line x1="0" y1="0" x2="{x:.2}" y2="{y:.2}" stroke="{color}" stroke-width="{width}"/>"#,
    );
}

pub fn build(config: &HandlerConfig) -> Result<Arc<dyn Handler>> {
    let mut config = config.clone();
    if config.interval_ms.is_none() {
        // A clock with a second hand wants a 1 Hz refresh.
        config.interval_ms = Some(1000);
    }
    Ok(Arc::new(ClockHandler {
        base: HandlerBase::with_visual(config.visual(), config.interval()),
    }))
}
