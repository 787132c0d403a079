//! Blinc Carousel
//!
//! A headless engine for horizontally scrolling carousels:
//!
//! - **Visibility Tracking**: per-element intersection facts merged into a keyed cache
//! - **Section Model**: a stable section count derived from how many items fit at once
//! - **Section Index**: the active section under `start`, `center` or `end` alignment
//! - **Navigation**: scroll offsets per alignment with a bounded stability loop
//! - **Autoplay**: timed flips that pause on interaction and resume afterwards
//! - **Resize Recovery**: restores the active section after layout changes
//!
//! The engine never touches a real view. Hosts implement [`ScrollContainer`],
//! forward visibility facts and frame ticks, and react to [`CarouselEvent`]s.
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//! use blinc_carousel::{Alignment, Carousel, CarouselConfig, HeadlessViewport};
//!
//! let now = Instant::now();
//! let config = CarouselConfig::new().with_alignment(Alignment::Start);
//! let (viewport, items) = HeadlessViewport::uniform(300.0, 100.0, 6);
//!
//! let mut carousel = Carousel::new_at(config, viewport, now).unwrap();
//! carousel.set_elements(items);
//! carousel.run_headless_frame(now);
//!
//! assert_eq!(carousel.max_visible(), Some(3));
//! assert_eq!(carousel.section_count(), 4);
//! assert_eq!(carousel.section_index(), Some(0));
//! ```

pub mod carousel;
pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod geometry;
pub mod headless;
pub mod intersection;
pub mod model;
pub mod navigator;
pub mod pagination;
pub mod playback;
pub mod resize;
pub mod resolver;
pub mod scroll;
pub mod sections;
pub mod timers;
pub mod tracker;

pub use carousel::Carousel;
pub use config::{Alignment, CarouselConfig};
pub use controls::{ControlIntent, DotItem};
pub use error::{CarouselError, Result};
pub use events::{carousel_events, CarouselEvent, EventDispatcher, EventType, MAX_BUFFERED_EVENTS};
pub use geometry::Rect;
pub use headless::HeadlessViewport;
pub use model::{SectionState, StateChanges};
pub use navigator::{scroll_delta, CorrectionStatus, Direction, ScrollCorrection, WrapMode};
pub use pagination::{PaginationHint, SnapTargets};
pub use playback::{Playback, PlaybackState};
pub use scroll::{ScrollBehavior, ScrollContainer};
pub use sections::{section_count, Generation, MaxVisibleLatch};
pub use timers::{TimerId, Timers};
pub use tracker::{ElementId, VisibilityEntry, VisibilityFact, VisibilityTracker};
