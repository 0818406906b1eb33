//! Guard against infinite alias and merge-key expansion.
//!
//! The tracker holds the definition paths of anchored nodes whose expansion
//! is currently on the call stack. Frames are pushed on entry and popped on
//! exit, so two alias chains that reach the same anchor one after the other
//! are fine; only re-entering an anchor from inside its own expansion fails.

use tracing::debug;

use crate::error::{MergeError, Result};
use crate::path::Path;

#[derive(Debug, Default)]
pub struct CycleTracker {
    in_progress: Vec<Path>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `frame`, the definition path of the anchor about to be
    /// expanded. `at` is where the reference was met and is what the error
    /// reports.
    pub fn enter(&mut self, frame: &Path, at: &Path) -> Result<()> {
        if self.in_progress.contains(frame) {
            debug!(anchor = %frame, at = %at, "Anchor re-entered during its own expansion");
            return Err(MergeError::Cycle {
                path: at.to_string(),
            });
        }
        self.in_progress.push(frame.clone());
        Ok(())
    }

    /// Pops `frame`. Frames must be left in reverse order of entry.
    pub fn leave(&mut self, frame: &Path) {
        let popped = self.in_progress.pop();
        debug_assert_eq!(popped.as_ref(), Some(frame), "unbalanced cycle tracker frames");
    }

    pub fn depth(&self) -> usize {
        self.in_progress.len()
    }

    /// Runs `f` inside `frame`, leaving the frame whether `f` succeeds or not.
    pub fn guarded<T, F>(&mut self, frame: &Path, at: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.enter(frame, at)?;
        let result = f(self);
        self.leave(frame);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_is_a_cycle() {
        let mut tracker = CycleTracker::new();
        let anchor = Path::root().key("x");
        let at = anchor.key("egress");

        tracker.enter(&anchor, &anchor).unwrap();
        let err = tracker.enter(&anchor, &at).unwrap_err();
        assert_eq!(err.to_string(), "cycle detected at path: x.egress");
    }

    #[test]
    fn test_sequential_visits_are_not_cycles() {
        let mut tracker = CycleTracker::new();
        let anchor = Path::root().key("services").key("a");

        for at in ["services.a", "services.a2", "services.a3"] {
            let at: Path = at.parse().unwrap();
            tracker.guarded(&anchor, &at, |_| Ok(())).unwrap();
        }
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_guarded_leaves_frame_on_error() {
        let mut tracker = CycleTracker::new();
        let anchor = Path::root().key("x");

        let result: Result<()> = tracker.guarded(&anchor, &anchor, |inner| {
            inner.enter(&anchor, &anchor.key("y"))
        });
        assert!(result.is_err());
        assert_eq!(tracker.depth(), 0);
    }
}
