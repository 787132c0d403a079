//! The carousel reducer
//!
//! [`Carousel`] owns every piece of carousel state and is the only thing
//! that mutates it. The host forwards observer callbacks, frame ticks and
//! input notifications; the carousel updates its derived section state,
//! drives the scroll container and emits [`CarouselEvent`]s.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use blinc_carousel::{Carousel, CarouselConfig, HeadlessViewport};
//!
//! let t0 = Instant::now();
//! let (viewport, items) = HeadlessViewport::uniform(300.0, 100.0, 10);
//! let mut carousel = Carousel::new_at(CarouselConfig::default(), viewport, t0).unwrap();
//! carousel.set_elements(items);
//! carousel.run_headless_frame(t0);
//! assert_eq!(carousel.section_count(), 8);
//!
//! carousel.move_to_section(5);
//! for frame in 1..=5 {
//!     carousel.run_headless_frame(t0 + Duration::from_millis(16 * frame));
//! }
//! assert_eq!(carousel.section_index(), Some(5));
//! ```

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::{Alignment, CarouselConfig};
use crate::controls::{closest_cycle_index, dot_items, ControlIntent, DotItem};
use crate::error::Result;
use crate::events::{CarouselEvent, EventDispatcher, EventType};
use crate::model::SectionState;
use crate::navigator::{
    clamp_offset, element_delta, step_index, CorrectionStatus, Direction, ScrollCorrection,
    WrapMode,
};
use crate::pagination::{recycled_container_count, PaginationHint, SnapTargets};
use crate::playback::{Playback, PlaybackState};
use crate::resize::ResizeRecovery;
use crate::scroll::{ScrollBehavior, ScrollContainer};
use crate::sections::{section_count, section_diff};
use crate::timers::Timers;
use crate::tracker::{ElementId, VisibilityEntry, VisibilityFact, VisibilityTracker};

const WHEEL_DEBOUNCE: &str = "wheel";
const ELEMENTS_DEBOUNCE: &str = "elements";

/// Work scheduled on the carousel's timer queue
#[derive(Clone, Debug, PartialEq)]
enum CarouselTask {
    /// Autoplay flip
    Autoplay,
    /// Wheel input went quiet
    WheelSettled,
    /// A burst of element set changes settled
    ApplyElements(Vec<ElementId>),
}

/// Headless carousel section tracker and navigator
pub struct Carousel<C: ScrollContainer> {
    config: CarouselConfig,
    container: C,
    tracker: VisibilityTracker,
    state: SectionState,
    elements: Vec<ElementId>,

    timers: Timers<CarouselTask>,
    playback: Playback,
    resize: ResizeRecovery,

    correction: Option<ScrollCorrection>,
    /// Section a smooth navigation is heading to
    expected_index: Option<usize>,
    snap_fix_pending: bool,
    /// Navigation waiting for snap targets to be materialized
    pending_navigation: Option<(usize, ScrollBehavior)>,
    snap_targets: Option<SnapTargets>,

    /// Last section index that was not `None`, before the current one
    previous_section_index: Option<usize>,
    centered: Option<usize>,

    dispatcher: EventDispatcher,
    now: Instant,
    mounted: bool,
}

impl<C: ScrollContainer> Carousel<C> {
    /// Create a carousel using the wall clock as its starting time
    pub fn new(config: CarouselConfig, container: C) -> Result<Self> {
        Self::new_at(config, container, Instant::now())
    }

    /// Create a carousel whose clock starts at `now`
    pub fn new_at(config: CarouselConfig, container: C, now: Instant) -> Result<Self> {
        let config = config.validate()?;
        let mut carousel = Self {
            tracker: VisibilityTracker::new(),
            state: SectionState::new(config.alignment, config.threshold),
            elements: Vec::new(),
            timers: Timers::new(),
            playback: Playback::new(config.flip_time()),
            resize: ResizeRecovery::new(),
            correction: None,
            expected_index: None,
            snap_fix_pending: false,
            pending_navigation: None,
            snap_targets: None,
            previous_section_index: None,
            centered: None,
            dispatcher: EventDispatcher::new(),
            now,
            mounted: true,
            config,
            container,
        };
        if carousel.config.autoplay {
            carousel.play();
        }
        Ok(carousel)
    }

    /// Create a carousel over placeholder snap targets for a recycled list
    /// of `item_count` logical items
    pub fn recycled(config: CarouselConfig, container: C, item_count: usize, now: Instant) -> Result<Self> {
        let mut carousel = Self::new_at(config, container, now)?;
        carousel.snap_targets = Some(SnapTargets::new(item_count, carousel.config.infinite));
        Ok(carousel)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn alignment(&self) -> Alignment {
        self.state.alignment()
    }

    pub fn section_count(&self) -> usize {
        self.state.section_count()
    }

    pub fn sections(&self) -> &[VisibilityEntry] {
        self.state.sections()
    }

    /// Active section, `None` while between sections
    pub fn section_index(&self) -> Option<usize> {
        self.state.section_index()
    }

    pub fn max_visible(&self) -> Option<usize> {
        self.state.max_visible()
    }

    /// Entries currently satisfying the visibility threshold
    pub fn intersecting(&self) -> &[VisibilityEntry] {
        self.state.intersecting()
    }

    pub fn centered_entry(&self) -> Option<&VisibilityEntry> {
        self.centered.and_then(|index| self.tracker.get(index))
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Whether the scroll stability loop is running
    pub fn is_correcting(&self) -> bool {
        self.correction.is_some()
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.pending_navigation.is_some()
    }

    pub fn snap_targets(&self) -> Option<&SnapTargets> {
        self.snap_targets.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Time of the most recent tick
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Section count of the full logical item list
    ///
    /// Equals [`section_count`](Self::section_count) except for recycled
    /// lists, where only part of the list has snap targets.
    pub fn initial_section_count(&self) -> usize {
        match &self.snap_targets {
            Some(snaps) => section_count(self.alignment(), snaps.item_count(), self.max_visible()),
            None => self.section_count(),
        }
    }

    /// Dot state for a controls collaborator
    pub fn dot_items(&self) -> Vec<DotItem> {
        dot_items(self.initial_section_count(), self.section_index())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a handler for one event type
    pub fn on<F>(&mut self, event_type: EventType, handler: F)
    where
        F: FnMut(&CarouselEvent) + 'static,
    {
        self.dispatcher.register(event_type, handler);
    }

    /// Take every buffered event, oldest first
    pub fn drain_events(&mut self) -> Vec<CarouselEvent> {
        self.dispatcher.drain()
    }

    pub fn set_event_buffering(&mut self, enabled: bool) {
        self.dispatcher.set_buffering(enabled);
    }

    // =========================================================================
    // Element set
    // =========================================================================

    /// Replace the tracked element set, starting a new generation
    pub fn set_elements(&mut self, elements: Vec<ElementId>) {
        self.tracker.untrack_all();
        self.tracker.clear();
        let generation = self.state.begin_generation();
        self.correction = None;
        self.expected_index = None;
        self.snap_fix_pending = false;
        self.resize.cancel();
        self.tracker.track(&elements, 0);
        debug!(
            generation = generation.value(),
            count = elements.len(),
            "carousel elements replaced"
        );
        self.elements = elements;
        self.refresh();
    }

    /// Append elements to the tracked set, keeping the current generation
    pub fn append_elements(&mut self, elements: Vec<ElementId>) {
        if elements.is_empty() {
            return;
        }
        self.extend_elements(elements);
        self.elements_added();
    }

    /// Track `elements` after the current ones, keeping their indices
    fn extend_elements(&mut self, elements: Vec<ElementId>) {
        self.tracker.track(&elements, self.elements.len());
        self.elements.extend(elements);
        self.refresh();
    }

    fn elements_added(&mut self) {
        self.dispatcher.emit(CarouselEvent::ElementsAdded {
            total: self.elements.len(),
        });
        self.resume_pending_navigation();
    }

    /// Apply a settled element set
    ///
    /// A recycled list that only grew keeps its generation and indices;
    /// anything else replaces the set.
    fn apply_scheduled_elements(&mut self, elements: Vec<ElementId>) {
        let grows = self.snap_targets.is_some()
            && !self.elements.is_empty()
            && elements.starts_with(&self.elements);
        if grows {
            let added = elements[self.elements.len()..].to_vec();
            debug!(added = added.len(), "scheduled elements appended");
            self.extend_elements(added);
        } else {
            self.set_elements(elements);
        }
        self.elements_added();
    }

    /// Replace the element set once changes stop arriving
    pub fn schedule_elements(&mut self, elements: Vec<ElementId>) {
        self.timers.debounce(
            ELEMENTS_DEBOUNCE,
            self.now,
            self.config.settle_debounce(),
            CarouselTask::ApplyElements(elements),
        );
    }

    // =========================================================================
    // Observer input
    // =========================================================================

    /// Merge visibility facts reported by the host
    pub fn apply_visibility(&mut self, facts: &[VisibilityFact]) {
        let mut changed = false;
        for fact in facts {
            changed |= self.tracker.apply(fact);
        }
        if changed {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.state
            .set_container_width(self.container.container_rect().width);
        let changes = self.state.refresh(&self.tracker);

        if changes.sections {
            self.dispatcher
                .emit(CarouselEvent::SectionsChanged(self.state.sections().to_vec()));
        }

        if let Some((old, new)) = changes.section_index {
            if old.is_some() {
                self.previous_section_index = old;
            }
            if let Some(index) = new {
                self.dispatcher.emit(CarouselEvent::SectionIndexChanged(index));
                if self.expected_index == Some(index) {
                    self.expected_index = None;
                    self.snap_fix_pending = true;
                }
            }
        }

        if changes.intersecting || changes.sections {
            self.update_centered();
        }
    }

    fn update_centered(&mut self) {
        let container = &self.container;
        let center = container.container_rect().center_x();
        let next = crate::resolver::centered_entry(self.state.intersecting(), center, |entry| {
            container.element_rect(entry.target)
        });
        if let Some(entry) = next {
            if self.centered != Some(entry.carousel_index) {
                self.centered = Some(entry.carousel_index);
                self.dispatcher.emit(CarouselEvent::CenteredChanged(entry));
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Smoothly scroll to section `index`
    pub fn animate_to_section(&mut self, index: usize) {
        self.go_to_section(index, ScrollBehavior::Smooth);
    }

    /// Jump to section `index` without animation
    pub fn move_to_section(&mut self, index: usize) {
        self.go_to_section(index, ScrollBehavior::Auto);
    }

    /// Animate one section in `direction`
    ///
    /// No-op while between sections, and at a boundary unless `wrap` is
    /// [`WrapMode::Recycle`].
    pub fn next_item(&mut self, direction: Direction, wrap: WrapMode) {
        let current = self.section_index();
        match step_index(current, self.section_count(), direction, wrap) {
            Some(next) => self.animate_to_section(next),
            None => trace!(?current, ?direction, ?wrap, "next item ignored"),
        }
    }

    /// Apply an arrow or dot click
    pub fn handle_intent(&mut self, intent: ControlIntent) {
        match intent {
            ControlIntent::Nav(direction) => self.next_item(direction, WrapMode::Clamp),
            ControlIntent::Dot(selected) => {
                let infinite = self.snap_targets.as_ref().is_some_and(|s| s.is_infinite());
                let target = match self.section_index() {
                    Some(current) if infinite => {
                        closest_cycle_index(selected, current, self.initial_section_count())
                    }
                    _ => selected,
                };
                self.animate_to_section(target);
            }
        }
    }

    fn go_to_section(&mut self, index: usize, behavior: ScrollBehavior) {
        if !self.mounted {
            return;
        }
        self.interrupt();

        let mut index = index;
        if let Some(snaps) = self.snap_targets.as_mut() {
            index = snaps.clamp_index(index);
            let visible = self
                .state
                .max_visible()
                .unwrap_or_else(|| snaps.visible_count());
            let added = snaps.ensure_reachable(index, section_diff(self.state.alignment(), visible));
            let total = snaps.count();
            if added > 0 {
                self.dispatcher
                    .emit(CarouselEvent::SnapTargetsAdded { added, total });
            }
            if self.elements.len() < total {
                debug!(index, total, "navigation waiting for snap targets");
                self.pending_navigation = Some((index, behavior));
                return;
            }
            if !snaps.is_infinite() {
                // Out of items: settle for the last section
                index = index.min(self.state.section_count().saturating_sub(1));
            }
        }
        self.pending_navigation = None;

        let Some(section) = self.state.section(index) else {
            trace!(index, count = self.section_count(), "no such section");
            return;
        };
        let target = section.target;
        let delta = element_delta(&self.container, self.state.alignment(), target);
        let left = self.container.scroll_left() + delta;
        debug!(index, ?behavior, delta, "navigating to section");

        self.correction = None;
        self.snap_fix_pending = false;
        match behavior {
            ScrollBehavior::Smooth => {
                self.expected_index = Some(index);
                let left = clamp_offset(&self.container, left);
                self.container.scroll_to(left, ScrollBehavior::Smooth);
            }
            ScrollBehavior::Auto => {
                self.expected_index = None;
                self.start_correction(left);
            }
        }
    }

    fn resume_pending_navigation(&mut self) {
        let Some((index, behavior)) = self.pending_navigation else {
            return;
        };
        let ready = self
            .snap_targets
            .as_ref()
            .map_or(true, |snaps| self.elements.len() >= snaps.count());
        if ready {
            self.pending_navigation = None;
            self.go_to_section(index, behavior);
        }
    }

    fn start_correction(&mut self, left: f32) {
        self.correction = Some(ScrollCorrection::start(
            &mut self.container,
            left,
            self.config.correction_attempts,
        ));
    }

    fn run_correction(&mut self) {
        let Some(correction) = self.correction.as_mut() else {
            return;
        };
        match correction.on_frame(&mut self.container) {
            CorrectionStatus::Running => return,
            CorrectionStatus::Settled => {
                trace!(target = correction.target(), "scroll position settled");
            }
            CorrectionStatus::GaveUp => {
                warn!(
                    target = correction.target(),
                    attempts = correction.attempts(),
                    actual = self.container.scroll_left(),
                    "scroll position did not stabilize"
                );
            }
            CorrectionStatus::Aborted => {
                debug!("scroll correction aborted, container not displayed");
            }
        }
        self.correction = None;
    }

    /// Hold the landing offset of a smooth navigation against re-snapping
    fn run_snap_fix(&mut self) {
        if !self.snap_fix_pending || self.container.is_scrolling() {
            return;
        }
        self.snap_fix_pending = false;
        let left = self.container.scroll_left();
        self.start_correction(left);
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start autoplay, flipping right (and wrapping) every flip period
    pub fn play(&mut self) {
        if !self.mounted {
            return;
        }
        if self
            .playback
            .play(&mut self.timers, self.now, CarouselTask::Autoplay)
        {
            self.dispatcher
                .emit(CarouselEvent::PlaybackChanged(PlaybackState::Playing));
        }
    }

    pub fn stop(&mut self) {
        if self.playback.stop(&mut self.timers) {
            self.dispatcher
                .emit(CarouselEvent::PlaybackChanged(PlaybackState::Stopped));
        }
    }

    fn interrupt(&mut self) {
        self.playback
            .interrupt(&mut self.timers, self.now, CarouselTask::Autoplay);
    }

    /// Pointer down (or any other interaction start)
    pub fn interaction_start(&mut self) {
        if self.playback.interaction_start(&mut self.timers) {
            self.dispatcher
                .emit(CarouselEvent::PlaybackChanged(PlaybackState::Stopped));
        }
    }

    /// Pointer up (or any other interaction end)
    pub fn interaction_end(&mut self) {
        if !self.mounted {
            return;
        }
        if self
            .playback
            .interaction_end(&mut self.timers, self.now, CarouselTask::Autoplay)
        {
            self.dispatcher
                .emit(CarouselEvent::PlaybackChanged(PlaybackState::Playing));
        }
    }

    /// Wheel input; the interaction ends after a quiet window
    pub fn wheel(&mut self) {
        self.interaction_start();
        self.timers.debounce(
            WHEEL_DEBOUNCE,
            self.now,
            self.config.wheel_quiet(),
            CarouselTask::WheelSettled,
        );
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// The container was resized
    pub fn resize(&mut self) {
        self.resize
            .begin(self.section_index(), self.previous_section_index);
        self.refresh();
    }

    fn recover_to(&mut self, index: usize) {
        let Some(section) = self.state.section(index) else {
            return;
        };
        let target = section.target;
        let delta = element_delta(&self.container, self.state.alignment(), target);
        let left = self.container.scroll_left() + delta;
        debug!(index, delta, "restoring section after resize");
        self.interrupt();
        self.start_correction(left);
    }

    // =========================================================================
    // Recycled lists
    // =========================================================================

    /// The virtualization layer rendered a new page
    pub fn on_pagination(&mut self, hint: PaginationHint) {
        let Some(snaps) = self.snap_targets.as_mut() else {
            return;
        };
        let Some(added) = snaps.on_pagination(hint) else {
            trace!(?hint, "pagination already covered");
            return;
        };
        let total = snaps.count();
        if added > 0 {
            self.dispatcher
                .emit(CarouselEvent::SnapTargetsAdded { added, total });
        }
        self.dispatcher.emit(CarouselEvent::PaginationChanged(hint));
    }

    /// Page geometry of the recycled list
    pub fn set_page_geometry(&mut self, item_width: f32, per: usize) {
        let width = self.container.container_rect().width;
        if let Some(snaps) = self.snap_targets.as_mut() {
            snaps.set_page_geometry(width, item_width, per);
        }
    }

    /// Recycled containers to render for items of `item_width`
    ///
    /// Covers the container width scaled by the configured margin.
    pub fn recycled_container_count(&self, item_width: f32) -> usize {
        recycled_container_count(
            self.container.container_rect().width,
            item_width,
            self.config.margin,
        )
    }

    /// The logical item list changed length
    ///
    /// Surplus snap targets are dropped from the end.
    pub fn set_item_count(&mut self, item_count: usize) {
        let Some(snaps) = self.snap_targets.as_mut() else {
            return;
        };
        let removed = snaps.set_item_count(item_count);
        let count = snaps.count();
        if removed > 0 && self.elements.len() > count {
            let kept = self.elements[..count].to_vec();
            self.set_elements(kept);
        }
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Advance to `now`: fire due timers and run one animation frame
    pub fn tick(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        self.now = now;

        for task in self.timers.fire_due(now) {
            match task {
                CarouselTask::Autoplay => self.next_item(Direction::Right, WrapMode::Recycle),
                CarouselTask::WheelSettled => self.interaction_end(),
                CarouselTask::ApplyElements(elements) => self.apply_scheduled_elements(elements),
            }
        }

        self.run_snap_fix();
        self.run_correction();

        if let Some(index) = self.resize.advance(self.state.is_consistent()) {
            self.recover_to(index);
        }
    }

    /// Tear down: stop playback, cancel timers and pending scroll work
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop();
        self.playback.reset(&mut self.timers);
        self.timers.clear();
        self.correction = None;
        self.snap_fix_pending = false;
        self.pending_navigation = None;
        self.resize.cancel();
        self.tracker.untrack_all();
        self.mounted = false;
        debug!("carousel unmounted");
    }
}

impl<C: ScrollContainer + std::fmt::Debug> std::fmt::Debug for Carousel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("container", &self.container)
            .field("elements", &self.elements.len())
            .field("section_count", &self.section_count())
            .field("section_index", &self.section_index())
            .field("playback", &self.playback_state())
            .finish()
    }
}
