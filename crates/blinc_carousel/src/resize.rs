//! Resize recovery
//!
//! A layout change can shuffle which elements are visible, briefly leaving
//! the carousel between sections. The section that was active when the
//! resize began is remembered and restored, without animation, once the
//! sections have been recomputed and one more frame has passed.

use tracing::debug;

/// Progress of a pending recovery
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizePhase {
    #[default]
    Idle,
    /// Waiting for sections to become consistent again
    AwaitingSections(usize),
    /// Sections are ready; restore on the next frame
    Scheduled(usize),
}

#[derive(Debug, Default)]
pub struct ResizeRecovery {
    phase: ResizePhase,
}

impl ResizeRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ResizePhase {
        self.phase
    }

    /// Remember the section to restore
    ///
    /// `current` wins; `previous` covers resizes that land between sections.
    /// A resize with neither leaves nothing to restore.
    pub fn begin(&mut self, current: Option<usize>, previous: Option<usize>) {
        self.phase = match current.or(previous) {
            Some(index) => {
                debug!(index, "resize recovery armed");
                ResizePhase::AwaitingSections(index)
            }
            None => ResizePhase::Idle,
        };
    }

    /// Advance one frame; yields the section index once it is time to restore
    pub fn advance(&mut self, sections_ready: bool) -> Option<usize> {
        match self.phase {
            ResizePhase::AwaitingSections(index) if sections_ready => {
                self.phase = ResizePhase::Scheduled(index);
                None
            }
            ResizePhase::Scheduled(index) => {
                self.phase = ResizePhase::Idle;
                Some(index)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.phase = ResizePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_current_index() {
        let mut recovery = ResizeRecovery::new();
        recovery.begin(Some(3), Some(2));
        assert_eq!(recovery.phase(), ResizePhase::AwaitingSections(3));
    }

    #[test]
    fn test_falls_back_to_previous_index() {
        let mut recovery = ResizeRecovery::new();
        recovery.begin(None, Some(2));
        assert_eq!(recovery.phase(), ResizePhase::AwaitingSections(2));
    }

    #[test]
    fn test_nothing_to_restore() {
        let mut recovery = ResizeRecovery::new();
        recovery.begin(None, None);
        assert_eq!(recovery.advance(true), None);
        assert_eq!(recovery.phase(), ResizePhase::Idle);
    }

    #[test]
    fn test_waits_for_sections_then_one_frame() {
        let mut recovery = ResizeRecovery::new();
        recovery.begin(Some(4), None);
        assert_eq!(recovery.advance(false), None);
        assert_eq!(recovery.advance(false), None);
        assert_eq!(recovery.advance(true), None);
        assert_eq!(recovery.phase(), ResizePhase::Scheduled(4));
        assert_eq!(recovery.advance(true), Some(4));
        assert_eq!(recovery.advance(true), None);
    }

    #[test]
    fn test_cancel() {
        let mut recovery = ResizeRecovery::new();
        recovery.begin(Some(1), None);
        recovery.cancel();
        assert_eq!(recovery.advance(true), None);
    }
}
