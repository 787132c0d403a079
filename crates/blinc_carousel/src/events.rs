//! Carousel notifications
//!
//! Events can be consumed two ways: handlers registered per event type are
//! called synchronously as the event is emitted, and (unless disabled) every
//! event is also buffered for the host to drain after each call. The buffer
//! keeps the newest [`MAX_BUFFERED_EVENTS`] events; hosts that only use
//! handlers lose nothing by never draining it.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::trace;

use crate::pagination::PaginationHint;
use crate::playback::PlaybackState;
use crate::tracker::VisibilityEntry;

/// Buffered events kept before the oldest are dropped
pub const MAX_BUFFERED_EVENTS: usize = 256;

/// Event type identifier
pub type EventType = u32;

/// Carousel event types
pub mod carousel_events {
    use super::EventType;

    pub const CENTERED_CHANGED: EventType = 1;
    pub const SECTION_INDEX_CHANGED: EventType = 2;
    pub const SECTIONS_CHANGED: EventType = 3;
    pub const PAGINATION_CHANGED: EventType = 4;
    pub const SNAP_TARGETS_ADDED: EventType = 5;
    pub const ELEMENTS_ADDED: EventType = 6;
    pub const PLAYBACK_CHANGED: EventType = 7;
}

/// Something observable changed
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum CarouselEvent {
    /// A different visible entry is now closest to the container center
    CenteredChanged(VisibilityEntry),
    /// The active section changed (only emitted for `Some` indices)
    SectionIndexChanged(usize),
    /// The section representatives changed
    SectionsChanged(Vec<VisibilityEntry>),
    /// The virtualization layer moved to a new page
    PaginationChanged(PaginationHint),
    /// Placeholder snap targets were requested; the host should create them
    SnapTargetsAdded { added: usize, total: usize },
    /// Elements were appended to a tracked recycled set
    ElementsAdded { total: usize },
    /// Autoplay started or stopped
    PlaybackChanged(PlaybackState),
}

impl CarouselEvent {
    pub fn event_type(&self) -> EventType {
        use carousel_events::*;

        match self {
            CarouselEvent::CenteredChanged(_) => CENTERED_CHANGED,
            CarouselEvent::SectionIndexChanged(_) => SECTION_INDEX_CHANGED,
            CarouselEvent::SectionsChanged(_) => SECTIONS_CHANGED,
            CarouselEvent::PaginationChanged(_) => PAGINATION_CHANGED,
            CarouselEvent::SnapTargetsAdded { .. } => SNAP_TARGETS_ADDED,
            CarouselEvent::ElementsAdded { .. } => ELEMENTS_ADDED,
            CarouselEvent::PlaybackChanged(_) => PLAYBACK_CHANGED,
        }
    }
}

/// Event handler function type
pub type EventHandler = Box<dyn FnMut(&CarouselEvent)>;

/// Dispatches carousel events to registered handlers
pub struct EventDispatcher {
    handlers: FxHashMap<EventType, SmallVec<[EventHandler; 2]>>,
    buffer: Option<VecDeque<CarouselEvent>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            buffer: Some(VecDeque::new()),
        }
    }

    /// Register a handler for one event type
    pub fn register<F>(&mut self, event_type: EventType, handler: F)
    where
        F: FnMut(&CarouselEvent) + 'static,
    {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(Box::new(handler));
    }

    /// Turn buffering for [`drain`](Self::drain) on or off
    pub fn set_buffering(&mut self, enabled: bool) {
        match (enabled, self.buffer.is_some()) {
            (true, false) => self.buffer = Some(VecDeque::new()),
            (false, true) => self.buffer = None,
            _ => {}
        }
    }

    pub fn emit(&mut self, event: CarouselEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type()) {
            for handler in handlers.iter_mut() {
                handler(&event);
            }
        }
        if let Some(buffer) = self.buffer.as_mut() {
            if buffer.len() >= MAX_BUFFERED_EVENTS {
                if let Some(dropped) = buffer.pop_front() {
                    trace!(event_type = dropped.event_type(), "event buffer full, dropped oldest");
                }
            }
            buffer.push_back(event);
        }
    }

    /// Take every buffered event, oldest first
    pub fn drain(&mut self) -> Vec<CarouselEvent> {
        self.buffer
            .as_mut()
            .map(|buffer| buffer.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handler_types", &self.handlers.len())
            .field("buffered", &self.buffer.as_ref().map(|b| b.len()))
            .finish()
    }
}
