//! Scenario files for the headless simulator
//!
//! A scenario is a TOML document describing a carousel configuration, a
//! viewport and a timeline of host actions:
//!
//! ```toml
//! duration_ms = 5000
//!
//! [carousel]
//! alignment = "start"
//! autoplay = true
//!
//! [viewport]
//! width = 300.0
//! items = 10
//! item_width = 100.0
//!
//! [[steps]]
//! at_ms = 1200
//! action = "move"
//! index = 4
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use blinc_carousel::{
    Carousel, CarouselConfig, CarouselEvent, ControlIntent, Direction, HeadlessViewport,
    ScrollContainer, WrapMode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Simulated frame length
pub const FRAME: Duration = Duration::from_millis(16);

// =============================================================================
// Scenario file
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub carousel: CarouselConfig,
    pub viewport: ViewportLayout,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_duration_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
pub struct ViewportLayout {
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    pub items: usize,
    pub item_width: f32,
    #[serde(default)]
    pub gap: f32,
    #[serde(default)]
    pub padding: f32,
    /// Programmatic scrolls the platform undoes
    #[serde(default)]
    pub resnaps: u32,
    /// Frames per smooth scroll
    #[serde(default)]
    pub smooth_frames: Option<u32>,
}

fn default_height() -> f32 {
    100.0
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Animate {
        index: usize,
    },
    Move {
        index: usize,
    },
    Next {
        direction: Direction,
        #[serde(default)]
        wrap: WrapMode,
    },
    Dot {
        index: usize,
    },
    Play,
    Stop,
    Wheel,
    PointerDown,
    PointerUp,
    /// A user drag to an absolute offset
    Scroll {
        left: f32,
    },
    Resize {
        width: f32,
    },
    Hide,
    Show,
    Unmount,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let mut scenario: Scenario = toml::from_str(source).context("Failed to parse TOML")?;
        scenario.carousel = scenario
            .carousel
            .validate()
            .context("Invalid [carousel] table")?;
        if scenario.viewport.width <= 0.0 || scenario.viewport.item_width <= 0.0 {
            anyhow::bail!("Viewport and item widths must be positive");
        }
        scenario.steps.sort_by_key(|step| step.at_ms);
        Ok(scenario)
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// Event observed during a run, stamped with simulated time
#[derive(Clone, Debug, Serialize)]
pub struct Record {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: CarouselEvent,
}

/// Final carousel state after a run
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub section_count: usize,
    pub section_index: Option<usize>,
    pub max_visible: Option<usize>,
    pub scroll_left: f32,
    pub playing: bool,
}

pub struct Simulation {
    carousel: Carousel<HeadlessViewport>,
    steps: Vec<Step>,
    start: Instant,
    duration: Duration,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> Result<Self> {
        let start = Instant::now();
        let layout = &scenario.viewport;
        let mut viewport = HeadlessViewport::new(layout.width, layout.height)
            .with_gap(layout.gap)
            .with_padding(layout.padding)
            .with_resnaps(layout.resnaps);
        if let Some(frames) = layout.smooth_frames {
            viewport = viewport.with_smooth_frames(frames);
        }
        let items = viewport.push_items(std::iter::repeat(layout.item_width).take(layout.items));

        let mut carousel = Carousel::new_at(scenario.carousel, viewport, start)
            .context("Failed to create carousel")?;
        carousel.set_elements(items);

        Ok(Self {
            carousel,
            steps: scenario.steps,
            start,
            duration: Duration::from_millis(scenario.duration_ms),
        })
    }

    /// Run to the end of the timeline, handing every event to `sink`
    pub fn run<F>(mut self, mut sink: F) -> Summary
    where
        F: FnMut(Record),
    {
        let mut steps = std::mem::take(&mut self.steps).into_iter().peekable();
        let mut elapsed = Duration::ZERO;

        while elapsed <= self.duration {
            let at_ms = elapsed.as_millis() as u64;
            while let Some(step) = steps.next_if(|step| step.at_ms <= at_ms) {
                debug!(at_ms, action = ?step.action, "step");
                self.apply(step.action);
            }

            self.carousel.run_headless_frame(self.start + elapsed);
            for event in self.carousel.drain_events() {
                sink(Record { at_ms, event });
            }
            elapsed += FRAME;
        }

        self.summary()
    }

    fn apply(&mut self, action: Action) {
        let carousel = &mut self.carousel;
        match action {
            Action::Animate { index } => carousel.animate_to_section(index),
            Action::Move { index } => carousel.move_to_section(index),
            Action::Next { direction, wrap } => carousel.next_item(direction, wrap),
            Action::Dot { index } => carousel.handle_intent(ControlIntent::Dot(index)),
            Action::Play => carousel.play(),
            Action::Stop => carousel.stop(),
            Action::Wheel => carousel.wheel(),
            Action::PointerDown => carousel.interaction_start(),
            Action::PointerUp => carousel.interaction_end(),
            Action::Scroll { left } => carousel.container_mut().user_scroll_to(left),
            Action::Resize { width } => {
                carousel.container_mut().set_width(width);
                carousel.resize();
            }
            Action::Hide => carousel.container_mut().set_displayed(false),
            Action::Show => carousel.container_mut().set_displayed(true),
            Action::Unmount => carousel.unmount(),
        }
    }

    fn summary(&self) -> Summary {
        Summary {
            section_count: self.carousel.section_count(),
            section_index: self.carousel.section_index(),
            max_visible: self.carousel.max_visible(),
            scroll_left: self.carousel.container().scroll_left(),
            playing: self.carousel.is_playing(),
        }
    }
}

/// Log a record the way the simulator prints it without `--json`
pub fn log_record(record: &Record) {
    match &record.event {
        CarouselEvent::SectionIndexChanged(index) => {
            info!(at_ms = record.at_ms, index, "section index changed")
        }
        CarouselEvent::SectionsChanged(sections) => {
            let indices: Vec<usize> = sections.iter().map(|s| s.carousel_index).collect();
            info!(at_ms = record.at_ms, ?indices, "sections changed")
        }
        CarouselEvent::CenteredChanged(entry) => {
            info!(at_ms = record.at_ms, index = entry.carousel_index, "centered item changed")
        }
        CarouselEvent::PlaybackChanged(state) => {
            info!(at_ms = record.at_ms, ?state, "playback changed")
        }
        other => info!(at_ms = record.at_ms, event = ?other, "event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
        duration_ms = 1000

        [carousel]
        alignment = "start"

        [viewport]
        width = 300.0
        items = 6
        item_width = 100.0

        [[steps]]
        at_ms = 500
        action = "move"
        index = 3

        [[steps]]
        at_ms = 100
        action = "next"
        direction = "right"
    "#;

    #[test]
    fn test_parse_sorts_steps() {
        let scenario = Scenario::parse(BASIC).unwrap();
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].at_ms, 100);
        assert!(matches!(
            scenario.steps[0].action,
            Action::Next {
                direction: Direction::Right,
                wrap: WrapMode::Clamp
            }
        ));
        assert!(matches!(scenario.steps[1].action, Action::Move { index: 3 }));
    }

    #[test]
    fn test_parse_rejects_bad_alignment() {
        let source = BASIC.replace("\"start\"", "\"middle\"");
        assert!(Scenario::parse(&source).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let source = BASIC.replace("\"move\"", "\"teleport\"");
        assert!(Scenario::parse(&source).is_err());
    }

    #[test]
    fn test_run_reaches_target() {
        let scenario = Scenario::parse(BASIC).unwrap();
        let mut records = Vec::new();
        let summary = Simulation::new(scenario)
            .unwrap()
            .run(|record| records.push(record));

        assert_eq!(summary.section_count, 4);
        assert_eq!(summary.section_index, Some(3));
        assert_eq!(summary.scroll_left, 300.0);
        assert!(records
            .iter()
            .any(|r| r.event == CarouselEvent::SectionIndexChanged(1) && r.at_ms >= 100));
    }

    #[test]
    fn test_record_json_shape() {
        let record = Record {
            at_ms: 32,
            event: CarouselEvent::SectionIndexChanged(2),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "at_ms": 32, "type": "section-index-changed", "value": 2 })
        );
    }
}
