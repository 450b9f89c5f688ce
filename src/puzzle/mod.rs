//! The puzzle lifecycle: `Init -> Active -> {Solved, Aborted}`.
//!
//! A [`Puzzle`] owns its whole data model and is discarded after reaching a
//! terminal state; playing again means building a new one. Nothing here is
//! global, so independent instances can coexist (tests rely on that).

mod slot;

use rand::Rng;
use serde::Serialize;

use crate::error::PuzzleError;
use crate::intersection::{AccuracyRules, ConvergenceEstimate, estimate_convergence};
use crate::options::{PointerButton, PuzzleOptions};
use crate::render::{RenderFrame, Starfield};
use crate::scene::{Scene, SourceGenerator, ToggleOutcome};
use crate::services::{
    AudioCue, AudioSink, LogNotifier, Notifier, PuzzleCallbacks, Severity, SilentAudio,
};
use crate::view::{InteractionController, Projector, ScreenPoint, ViewState, Viewport};

pub use slot::PuzzleSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleState {
    Init,
    Active,
    Solved,
    Aborted,
}

impl PuzzleState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Solved | Self::Aborted)
    }
}

/// What a presentation layer needs for its read-outs, once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub locked_count: usize,
    pub accuracy: Option<f64>,
    pub estimate: Option<ConvergenceEstimate>,
    /// Whether "lock coordinates" would currently succeed.
    pub lock_enabled: bool,
}

pub trait FrameObserver {
    fn on_frame(&mut self, snapshot: &FrameSnapshot);
}

impl<F: FnMut(&FrameSnapshot)> FrameObserver for F {
    fn on_frame(&mut self, snapshot: &FrameSnapshot) {
        self(snapshot);
    }
}

/// Stand-in for the host's animation-frame handle.
///
/// Once cancelled it never runs again; a terminal puzzle cannot be resumed.
#[derive(Debug, Default, Clone)]
pub struct FrameLoop {
    running: bool,
    cancelled: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        if !self.cancelled {
            self.running = true;
        }
    }

    pub fn cancel(&mut self) {
        self.running = false;
        self.cancelled = true;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Counts a frame if the loop is running.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.frames += 1;
        }
        self.running
    }
}

/// Collects the collaborators of a puzzle before it starts.
pub struct PuzzleBuilder {
    options: PuzzleOptions,
    audio: Box<dyn AudioSink>,
    notifier: Box<dyn Notifier>,
    observers: Vec<Box<dyn FrameObserver>>,
    viewport: Viewport,
}

impl Default for PuzzleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: PuzzleOptions::default(),
            audio: Box::new(SilentAudio),
            notifier: Box::new(LogNotifier),
            observers: Vec::new(),
            viewport: Viewport::default(),
        }
    }

    #[must_use]
    pub fn options(mut self, options: PuzzleOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    #[must_use]
    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Generates a fresh scene from `rng` and starts the puzzle.
    pub fn start<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        callbacks: impl PuzzleCallbacks + 'static,
    ) -> Result<Puzzle, PuzzleError> {
        self.options.validate()?;
        let scene = SourceGenerator::new(&self.options).generate(rng);
        self.start_with_scene(scene, rng, callbacks)
    }

    /// Starts the puzzle on a prepared scene; `rng` only seeds the starfield.
    pub fn start_with_scene<R: Rng + ?Sized>(
        self,
        scene: Scene,
        rng: &mut R,
        callbacks: impl PuzzleCallbacks + 'static,
    ) -> Result<Puzzle, PuzzleError> {
        self.options.validate()?;
        let starfield = Starfield::generate(rng, self.options.star_count, self.options.star_radius);

        let mut puzzle = Puzzle {
            rules: AccuracyRules::from_options(&self.options),
            controller: InteractionController::new(&self.options),
            options: self.options,
            scene,
            view: ViewState::default(),
            viewport: self.viewport,
            starfield,
            frame_loop: FrameLoop::default(),
            state: PuzzleState::Init,
            callbacks: Some(Box::new(callbacks)),
            audio: self.audio,
            notifier: self.notifier,
            observers: self.observers,
            lock_enabled: false,
        };
        puzzle.activate();
        Ok(puzzle)
    }
}

pub struct Puzzle {
    options: PuzzleOptions,
    rules: AccuracyRules,
    scene: Scene,
    view: ViewState,
    controller: InteractionController,
    viewport: Viewport,
    starfield: Starfield,
    frame_loop: FrameLoop,
    state: PuzzleState,
    callbacks: Option<Box<dyn PuzzleCallbacks>>,
    audio: Box<dyn AudioSink>,
    notifier: Box<dyn Notifier>,
    observers: Vec<Box<dyn FrameObserver>>,
    /// Enablement as of the last frame, for edge-triggered notifications.
    lock_enabled: bool,
}

impl std::fmt::Debug for Puzzle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Puzzle")
            .field("state", &self.state)
            .field("scene", &self.scene)
            .field("view", &self.view)
            .field("frames", &self.frame_loop.frames())
            .finish_non_exhaustive()
    }
}

impl Puzzle {
    #[must_use]
    pub fn builder() -> PuzzleBuilder {
        PuzzleBuilder::new()
    }

    fn activate(&mut self) {
        debug_assert_eq!(self.state, PuzzleState::Init);
        self.view = ViewState::default();
        self.frame_loop.start();
        self.state = PuzzleState::Active;
        log::info!(
            "triangulatiepuzzel gestart met {} bronnen",
            self.scene.sources().len()
        );
        self.notifier.notify(
            "Triangulation started: lock three signal vectors to fix the origin.",
            Severity::Info,
        );
    }

    #[must_use]
    pub fn state(&self) -> PuzzleState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == PuzzleState::Active
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn options(&self) -> &PuzzleOptions {
        &self.options
    }

    #[must_use]
    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn projector(&self) -> Projector {
        Projector::new(&self.view, self.viewport, self.options.focal_length)
    }

    // ── input ───────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, at: ScreenPoint, button: PointerButton) -> bool {
        self.is_active() && self.controller.pointer_down(at, button)
    }

    pub fn pointer_move(&mut self, at: ScreenPoint) -> bool {
        if !self.is_active() {
            return false;
        }
        let changed = self.controller.pointer_move(at, &mut self.view);
        if changed {
            crate::debug_log!(
                "view pitch {:.3} yaw {:.3}",
                self.view.pitch,
                self.view.yaw
            );
        }
        changed
    }

    pub fn pointer_up(&mut self, at: ScreenPoint) {
        if self.is_active() {
            self.controller.pointer_up(at);
        }
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.is_active() && self.controller.wheel(delta_y, &mut self.view)
    }

    /// Toggles the source under the pointer. Ignored outside `Active`.
    pub fn click(&mut self, at: ScreenPoint) -> ToggleOutcome {
        if !self.is_active() {
            return ToggleOutcome::Missed;
        }
        let projector = self.projector();
        let outcome =
            self.controller
                .click(at, &mut self.scene, &projector, self.audio.as_mut());

        let (id, verb) = match outcome {
            ToggleOutcome::Locked(id) => (id, "locked"),
            ToggleOutcome::Unlocked(id) => (id, "unlocked"),
            ToggleOutcome::CapReached(_) | ToggleOutcome::Missed => return outcome,
        };
        if let Some(source) = self.scene.source(id) {
            let message = format!(
                "{} {verb} ({}/{})",
                source.name,
                self.scene.locked_count(),
                self.options.max_locked
            );
            log::debug!("{message}");
            self.notifier.notify(&message, Severity::Info);
        }
        outcome
    }

    // ── per-frame update ────────────────────────────────────────────────────

    /// Convergence estimate for the current lock set.
    #[must_use]
    pub fn estimate(&self) -> Option<ConvergenceEstimate> {
        estimate_convergence(&self.scene, &self.rules)
    }

    fn lock_enabled_for(&self, estimate: Option<&ConvergenceEstimate>) -> bool {
        self.scene.locked_count() == self.options.max_locked
            && estimate.is_some_and(|e| e.accuracy > self.options.success_threshold)
    }

    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        let estimate = self.estimate();
        FrameSnapshot {
            locked_count: self.scene.locked_count(),
            accuracy: estimate.map(|e| e.accuracy),
            lock_enabled: self.is_active() && self.lock_enabled_for(estimate.as_ref()),
            estimate,
        }
    }

    /// Runs one frame: recomputes the estimate, re-evaluates the lock action,
    /// notifies observers and returns the draw list. `None` once terminal.
    pub fn frame(&mut self) -> Option<RenderFrame<'_>> {
        if !self.is_active() || !self.frame_loop.tick() {
            return None;
        }

        let snapshot = self.snapshot();
        if snapshot.lock_enabled && !self.lock_enabled {
            self.notifier.notify(
                "Convergence fix available: lock coordinates now.",
                Severity::Highlight,
            );
        }
        self.lock_enabled = snapshot.lock_enabled;

        for observer in &mut self.observers {
            observer.on_frame(&snapshot);
        }

        let projector = self.projector();
        Some(RenderFrame::build(
            &self.scene,
            snapshot.estimate.as_ref(),
            &self.starfield,
            &projector,
            self.viewport,
            &self.options,
        ))
    }

    // ── actions ─────────────────────────────────────────────────────────────

    /// Accepts the current fix if three sources are locked and accuracy is
    /// above the threshold. Returns `false` (and does nothing) otherwise.
    pub fn lock_coordinates(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(estimate) = self.estimate() else {
            return false;
        };
        if !self.lock_enabled_for(Some(&estimate)) {
            return false;
        }

        self.state = PuzzleState::Solved;
        self.frame_loop.cancel();
        self.audio.play(AudioCue::Success);
        log::info!(
            "triangulatie opgelost: ({:.1}, {:.1}, {:.1}), nauwkeurigheid {:.1}%",
            estimate.point.x,
            estimate.point.y,
            estimate.point.z,
            estimate.accuracy
        );
        self.notifier.notify(
            &format!(
                "Origin fixed at ({:.1}, {:.1}, {:.1}) ly, accuracy {:.1}%",
                estimate.point.x, estimate.point.y, estimate.point.z, estimate.accuracy
            ),
            Severity::Highlight,
        );
        if let Some(callbacks) = self.callbacks.take() {
            callbacks.on_success(estimate);
        }
        true
    }

    /// Gives up. Always available while `Active`.
    pub fn abort(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = PuzzleState::Aborted;
        self.frame_loop.cancel();
        log::info!("triangulatiepuzzel afgebroken");
        self.notifier.notify("Triangulation aborted.", Severity::Info);
        if let Some(callbacks) = self.callbacks.take() {
            callbacks.on_cancel();
        }
        true
    }
}
