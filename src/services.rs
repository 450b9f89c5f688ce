//! Outward collaborators of a puzzle instance.
//!
//! The puzzle never synthesises sound, persists outcomes or renders text itself;
//! it only fires requests at these interfaces. Closures implement the
//! single-method traits directly.

use serde::Serialize;

use crate::intersection::ConvergenceEstimate;

/// Discrete sound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Click,
    Success,
}

impl AudioCue {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Success => "success",
        }
    }
}

/// Severity tag for player-facing status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Highlight,
}

impl Severity {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Highlight => "highlight",
        }
    }
}

pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);
}

pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

impl<F: FnMut(AudioCue)> AudioSink for F {
    fn play(&mut self, cue: AudioCue) {
        self(cue);
    }
}

impl<F: FnMut(&str, Severity)> Notifier for F {
    fn notify(&mut self, message: &str, severity: Severity) {
        self(message, severity);
    }
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Forwards status messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Highlight => log::warn!("{message}"),
        }
    }
}

/// The caller's completion handlers.
///
/// Both methods consume the handler, so at most one of them can ever run.
pub trait PuzzleCallbacks {
    fn on_success(self: Box<Self>, estimate: ConvergenceEstimate);
    fn on_cancel(self: Box<Self>);
}

/// [`PuzzleCallbacks`] built from a pair of closures.
pub struct Callbacks<S, C> {
    on_success: S,
    on_cancel: C,
}

impl<S, C> Callbacks<S, C>
where
    S: FnOnce(ConvergenceEstimate),
    C: FnOnce(),
{
    pub fn new(on_success: S, on_cancel: C) -> Self {
        Self {
            on_success,
            on_cancel,
        }
    }
}

impl<S, C> PuzzleCallbacks for Callbacks<S, C>
where
    S: FnOnce(ConvergenceEstimate),
    C: FnOnce(),
{
    fn on_success(self: Box<Self>, estimate: ConvergenceEstimate) {
        (self.on_success)(estimate);
    }

    fn on_cancel(self: Box<Self>) {
        (self.on_cancel)();
    }
}
