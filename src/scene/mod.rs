//! Hidden target, candidate sources and the player's lock selection.

pub mod generator;

use serde::Serialize;

use crate::geom::{Point3, Ray3, Vec3};

pub use generator::{SOURCE_SLOTS, SourceGenerator, SourceSlot};

/// Number of candidate sources in every generated scene.
pub const SOURCE_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub usize);

/// A candidate signal origin emitting a direction vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub position: Point3,
    /// Approximately unit length.
    pub direction: Vec3,
    /// Whether the ray was generated to pass near the hidden target. Never shown.
    pub is_accurate: bool,
    locked: bool,
}

impl Source {
    #[must_use]
    pub fn new(
        id: SourceId,
        name: impl Into<String>,
        position: Point3,
        direction: Vec3,
        is_accurate: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            direction,
            is_accurate,
            locked: false,
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn ray(&self) -> Ray3 {
        Ray3::new(self.position, self.direction)
    }
}

/// Result of a lock toggle request. Only `Locked` and `Unlocked` change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Locked(SourceId),
    Unlocked(SourceId),
    /// The lock set is full and the source was not locked.
    CapReached(SourceId),
    /// No source under the pointer, or an unknown id.
    Missed,
}

impl ToggleOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Locked(_) | Self::Unlocked(_))
    }
}

/// The data model of one puzzle session.
///
/// `locked` mirrors each source's `locked` flag, in lock order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    hidden_target: Point3,
    sources: Vec<Source>,
    locked: Vec<SourceId>,
}

impl Scene {
    /// Builds a scene from explicit data. All sources start unlocked.
    #[must_use]
    pub fn new(hidden_target: Point3, sources: Vec<Source>) -> Self {
        let sources = sources
            .into_iter()
            .map(|mut source| {
                source.locked = false;
                source
            })
            .collect();
        Self {
            hidden_target,
            sources,
            locked: Vec::new(),
        }
    }

    #[must_use]
    pub fn hidden_target(&self) -> Point3 {
        self.hidden_target
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[must_use]
    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.iter().find(|source| source.id == id)
    }

    #[must_use]
    pub fn locked_ids(&self) -> &[SourceId] {
        &self.locked
    }

    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.locked.len()
    }

    /// Locked sources in the order they were locked.
    pub fn locked_sources(&self) -> impl Iterator<Item = &Source> + '_ {
        self.locked.iter().filter_map(|id| self.source(*id))
    }

    /// Unlocks a locked source, or locks an unlocked one if fewer than
    /// `max_locked` are locked. A full set leaves everything unchanged.
    pub fn toggle_lock(&mut self, id: SourceId, max_locked: usize) -> ToggleOutcome {
        let locked_count = self.locked.len();
        let Some(source) = self.sources.iter_mut().find(|source| source.id == id) else {
            return ToggleOutcome::Missed;
        };

        if source.locked {
            source.locked = false;
            self.locked.retain(|locked| *locked != id);
            ToggleOutcome::Unlocked(id)
        } else if locked_count < max_locked {
            source.locked = true;
            self.locked.push(id);
            ToggleOutcome::Locked(id)
        } else {
            ToggleOutcome::CapReached(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with(count: usize) -> Scene {
        let sources = (0..count)
            .map(|i| {
                Source::new(
                    SourceId(i),
                    format!("S{i}"),
                    Point3::new(i as f64 * 10.0, 0.0, 0.0),
                    Vec3::Z,
                    i % 2 == 0,
                )
            })
            .collect();
        Scene::new(Point3::ORIGIN, sources)
    }

    #[test]
    fn fourth_lock_is_a_no_op() {
        let mut scene = scene_with(SOURCE_COUNT);
        for i in 0..3 {
            assert_eq!(scene.toggle_lock(SourceId(i), 3), ToggleOutcome::Locked(SourceId(i)));
        }
        let before = scene.clone();

        assert_eq!(
            scene.toggle_lock(SourceId(3), 3),
            ToggleOutcome::CapReached(SourceId(3))
        );
        assert_eq!(scene, before);
        assert_eq!(scene.locked_count(), 3);
        assert!(!scene.source(SourceId(3)).unwrap().is_locked());
    }

    #[test]
    fn lock_then_unlock_restores_previous_state() {
        let mut scene = scene_with(SOURCE_COUNT);
        scene.toggle_lock(SourceId(4), 3);
        let before = scene.clone();

        assert!(scene.toggle_lock(SourceId(1), 3).changed());
        assert_eq!(
            scene.toggle_lock(SourceId(1), 3),
            ToggleOutcome::Unlocked(SourceId(1))
        );

        assert_eq!(scene, before);
        assert!(!scene.source(SourceId(1)).unwrap().is_locked());
    }

    #[test]
    fn unlock_is_allowed_when_full() {
        let mut scene = scene_with(SOURCE_COUNT);
        for i in 0..3 {
            scene.toggle_lock(SourceId(i), 3);
        }
        assert_eq!(
            scene.toggle_lock(SourceId(1), 3),
            ToggleOutcome::Unlocked(SourceId(1))
        );
        assert_eq!(scene.locked_ids(), &[SourceId(0), SourceId(2)]);
    }

    #[test]
    fn unknown_source_is_missed() {
        let mut scene = scene_with(2);
        assert_eq!(scene.toggle_lock(SourceId(9), 3), ToggleOutcome::Missed);
        assert_eq!(scene.locked_count(), 0);
    }

    #[test]
    fn new_scene_clears_lock_flags() {
        let mut source = Source::new(SourceId(0), "A", Point3::ORIGIN, Vec3::X, true);
        source.locked = true;
        let scene = Scene::new(Point3::ORIGIN, vec![source]);
        assert!(!scene.sources()[0].is_locked());
    }
}
