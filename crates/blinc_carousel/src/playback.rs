//! Autoplay scheduling
//!
//! Playback is a two-state machine. User interaction pauses a playing
//! carousel and remembers to resume it once the interaction ends.
//!
//! ```text
//!            PLAY                       INTERACTION_START
//! Stopped ─────────> Playing ──────────────────────────────> Stopped
//!    ^                  │                                    (resume flagged)
//!    └──────────────────┘                                         │
//!           STOP                  INTERACTION_END (if flagged)    │
//!                       Playing <─────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::timers::{TimerId, Timers};

/// Playback event types
pub mod playback_events {
    /// Start (or restart) the flip cycle
    pub const PLAY: u32 = 1;
    /// Stop the flip cycle
    pub const STOP: u32 = 2;
    /// Pointer down, wheel start
    pub const INTERACTION_START: u32 = 3;
    /// Pointer up, wheel settled
    pub const INTERACTION_END: u32 = 4;
}

/// Autoplay state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl PlaybackState {
    /// Handle an event and return the new state, or None if no transition
    pub fn on_event(&self, event: u32) -> Option<Self> {
        use playback_events::*;

        match (self, event) {
            (PlaybackState::Stopped, PLAY) => Some(PlaybackState::Playing),
            (PlaybackState::Playing, STOP) => Some(PlaybackState::Stopped),
            (PlaybackState::Playing, INTERACTION_START) => Some(PlaybackState::Stopped),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Autoplay scheduler
///
/// Owns the repeating flip timer inside a shared [`Timers`] queue; `tick`
/// is the payload the queue hands back every flip period.
#[derive(Debug)]
pub struct Playback {
    state: PlaybackState,
    timer: Option<TimerId>,
    should_resume: bool,
    flip_time: Duration,
}

impl Playback {
    pub fn new(flip_time: Duration) -> Self {
        Self {
            state: PlaybackState::Stopped,
            timer: None,
            should_resume: false,
            flip_time,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn should_resume(&self) -> bool {
        self.should_resume
    }

    pub fn flip_time(&self) -> Duration {
        self.flip_time
    }

    /// Start playing, restarting the flip period if already playing
    ///
    /// Returns `true` when the state changed.
    pub fn play<T: Clone>(&mut self, timers: &mut Timers<T>, now: Instant, tick: T) -> bool {
        self.cancel_timer(timers);
        self.timer = Some(timers.set_interval(now, self.flip_time, tick));
        self.transition(playback_events::PLAY)
    }

    /// Stop playing
    pub fn stop<T: Clone>(&mut self, timers: &mut Timers<T>) -> bool {
        self.cancel_timer(timers);
        self.transition(playback_events::STOP)
    }

    /// Restart the flip period when playing
    pub fn interrupt<T: Clone>(&mut self, timers: &mut Timers<T>, now: Instant, tick: T) {
        if self.is_playing() {
            self.play(timers, now, tick);
        }
    }

    /// Pause for a user interaction, remembering to resume
    pub fn interaction_start<T: Clone>(&mut self, timers: &mut Timers<T>) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.should_resume = true;
        self.cancel_timer(timers);
        self.transition(playback_events::INTERACTION_START)
    }

    /// Resume if a previous interaction paused playback
    pub fn interaction_end<T: Clone>(&mut self, timers: &mut Timers<T>, now: Instant, tick: T) -> bool {
        if !self.should_resume {
            return false;
        }
        self.should_resume = false;
        self.play(timers, now, tick)
    }

    /// Drop the timer and the resume flag without a state event
    pub fn reset<T: Clone>(&mut self, timers: &mut Timers<T>) {
        self.cancel_timer(timers);
        self.should_resume = false;
        self.state = PlaybackState::Stopped;
    }

    fn cancel_timer<T: Clone>(&mut self, timers: &mut Timers<T>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }

    fn transition(&mut self, event: u32) -> bool {
        match self.state.on_event(event) {
            Some(next) => {
                debug!(from = ?self.state, to = ?next, event, "playback transition");
                self.state = next;
                true
            }
            None => false,
        }
    }
}
