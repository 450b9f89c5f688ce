use rand::Rng;

use super::{Puzzle, PuzzleBuilder};
use crate::error::PuzzleError;
use crate::services::PuzzleCallbacks;

/// Holds at most one running puzzle.
///
/// Starting while an instance is active fails with
/// [`PuzzleError::AlreadyActive`]. A terminal instance is released as soon as
/// the call that finished it returns, so the slot can be reused.
#[derive(Debug, Default)]
pub struct PuzzleSlot {
    current: Option<Puzzle>,
}

impl PuzzleSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(Puzzle::is_active)
    }

    #[must_use]
    pub fn active(&self) -> Option<&Puzzle> {
        self.current.as_ref().filter(|puzzle| puzzle.is_active())
    }

    pub fn start<R: Rng + ?Sized>(
        &mut self,
        builder: PuzzleBuilder,
        rng: &mut R,
        callbacks: impl PuzzleCallbacks + 'static,
    ) -> Result<(), PuzzleError> {
        if self.is_active() {
            return Err(PuzzleError::AlreadyActive);
        }
        self.current = Some(builder.start(rng, callbacks)?);
        Ok(())
    }

    /// Runs `f` against the active puzzle.
    pub fn with_active<T>(&mut self, f: impl FnOnce(&mut Puzzle) -> T) -> Result<T, PuzzleError> {
        let puzzle = self
            .current
            .as_mut()
            .filter(|puzzle| puzzle.is_active())
            .ok_or(PuzzleError::NotActive)?;
        let out = f(puzzle);
        let finished = !puzzle.is_active();
        if finished {
            log::debug!("puzzel-slot vrijgegeven");
            self.current = None;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Callbacks;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use std::rc::Rc;

    fn noop() -> Callbacks<impl FnOnce(crate::intersection::ConvergenceEstimate), impl FnOnce()> {
        Callbacks::new(|_| {}, || {})
    }

    #[test]
    fn second_start_is_rejected_while_active() {
        let mut slot = PuzzleSlot::new();
        let mut rng = StdRng::seed_from_u64(1);
        slot.start(PuzzleBuilder::new(), &mut rng, noop()).unwrap();
        assert!(slot.is_active());

        let err = slot
            .start(PuzzleBuilder::new(), &mut rng, noop())
            .unwrap_err();
        assert_eq!(err, PuzzleError::AlreadyActive);
    }

    #[test]
    fn abort_releases_the_slot() {
        let mut slot = PuzzleSlot::new();
        let mut rng = StdRng::seed_from_u64(2);
        let cancelled = Rc::new(Cell::new(0));
        let counter = Rc::clone(&cancelled);
        slot.start(
            PuzzleBuilder::new(),
            &mut rng,
            Callbacks::new(|_| {}, move || counter.set(counter.get() + 1)),
        )
        .unwrap();

        assert_eq!(slot.with_active(Puzzle::abort), Ok(true));
        assert!(!slot.is_active());
        assert!(slot.active().is_none());
        assert_eq!(cancelled.get(), 1);

        assert_eq!(
            slot.with_active(Puzzle::abort),
            Err(PuzzleError::NotActive)
        );
        assert_eq!(cancelled.get(), 1);

        slot.start(PuzzleBuilder::new(), &mut rng, noop()).unwrap();
        assert!(slot.is_active());
    }
}
