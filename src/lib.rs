#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod geom;
pub mod intersection;
pub mod options;
pub mod puzzle;
pub mod render;
pub mod scene;
pub mod services;
pub mod view;

use std::fmt;

use js_sys::Function;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use error::PuzzleError;
use intersection::ConvergenceEstimate;
use options::{PointerButton, PuzzleOptions};
use puzzle::{PuzzleBuilder, PuzzleSlot};
use services::{AudioCue, AudioSink, LogNotifier, Notifier, PuzzleCallbacks, Severity};
use view::{ScreenPoint, Viewport};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for the embedding page.
///
/// Holds at most one puzzle. Player input while no puzzle is active is
/// ignored; host misuse (a second `start`, bad options) is reported as an error.
#[wasm_bindgen]
pub struct PuzzleHost {
    options: PuzzleOptions,
    slot: PuzzleSlot,
    audio_handler: Option<Function>,
    notifier: Option<Function>,
}

impl Default for PuzzleHost {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PuzzleHost {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PuzzleHost {
        PuzzleHost {
            options: PuzzleOptions::default(),
            slot: PuzzleSlot::new(),
            audio_handler: None,
            notifier: None,
        }
    }

    /// Geeft terug of er een puzzel actief is.
    #[wasm_bindgen]
    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    /// Stel opties in voor de volgende puzzel. Ontbrekende velden houden hun standaardwaarde.
    #[wasm_bindgen]
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: PuzzleOptions = serde_wasm_bindgen::from_value(options)
            .map_err(|err| to_js_error(PuzzleError::InvalidOptions(err.to_string())))?;
        options.validate().map_err(to_js_error)?;
        self.options = options;
        Ok(())
    }

    /// Registreer `handler(cue)` voor geluidsverzoeken; geldt vanaf de volgende `start`.
    #[wasm_bindgen]
    pub fn set_audio_handler(&mut self, handler: Option<Function>) {
        self.audio_handler = handler;
    }

    /// Registreer `handler(message, severity)` voor statusmeldingen.
    #[wasm_bindgen]
    pub fn set_notifier(&mut self, handler: Option<Function>) {
        self.notifier = handler;
    }

    /// Start een nieuwe puzzel. `on_success(estimate)` of `on_cancel()` wordt
    /// precies één keer aangeroepen wanneer de puzzel eindigt.
    #[wasm_bindgen]
    pub fn start(
        &mut self,
        on_success: Function,
        on_cancel: Function,
        seed: Option<u32>,
    ) -> Result<(), JsValue> {
        let mut builder = PuzzleBuilder::new().options(self.options.clone());
        builder = match self.audio_handler.clone() {
            Some(handler) => builder.audio(JsAudio(handler)),
            None => builder,
        };
        builder = match self.notifier.clone() {
            Some(handler) => builder.notifier(JsNotifier(handler)),
            None => builder.notifier(LogNotifier),
        };

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(u64::from(seed)),
            None => StdRng::from_os_rng(),
        };
        let callbacks = JsCallbacks {
            on_success,
            on_cancel,
        };
        self.slot
            .start(builder, &mut rng, callbacks)
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16) -> bool {
        let Some(button) = PointerButton::from_dom(button) else {
            return false;
        };
        self.slot
            .with_active(|puzzle| puzzle.pointer_down(ScreenPoint::new(x, y), button))
            .unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.slot
            .with_active(|puzzle| puzzle.pointer_move(ScreenPoint::new(x, y)))
            .unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.slot
            .with_active(|puzzle| puzzle.pointer_up(ScreenPoint::new(x, y)))
            .ok();
    }

    #[wasm_bindgen]
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.slot
            .with_active(|puzzle| puzzle.wheel(delta_y))
            .unwrap_or(false)
    }

    /// Vergrendel of ontgrendel de bron onder de cursor. Geeft `true` bij een wijziging.
    #[wasm_bindgen]
    pub fn click(&mut self, x: f64, y: f64) -> bool {
        self.slot
            .with_active(|puzzle| puzzle.click(ScreenPoint::new(x, y)).changed())
            .unwrap_or(false)
    }

    /// Draai één frame en geef de tekenlijst terug, of `null` zonder actieve puzzel.
    #[wasm_bindgen]
    pub fn frame(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let viewport = Viewport::new(width, height).map_err(to_js_error)?;
        if !self.slot.is_active() {
            return Ok(JsValue::NULL);
        }
        self.slot
            .with_active(|puzzle| {
                puzzle.set_viewport(viewport);
                match puzzle.frame() {
                    Some(frame) => to_js_value(&frame),
                    None => Ok(JsValue::NULL),
                }
            })
            .map_err(to_js_error)?
    }

    /// Huidige read-outs (vergrendeld aantal, nauwkeurigheid, schatting, knopstatus).
    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        match self.slot.active() {
            Some(puzzle) => to_js_value(&puzzle.snapshot()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Accepteer de huidige fix. Geeft `false` als de actie niet beschikbaar is.
    #[wasm_bindgen]
    pub fn lock_coordinates(&mut self) -> bool {
        self.slot
            .with_active(puzzle::Puzzle::lock_coordinates)
            .unwrap_or(false)
    }

    #[wasm_bindgen]
    pub fn abort(&mut self) -> bool {
        self.slot
            .with_active(puzzle::Puzzle::abort)
            .unwrap_or(false)
    }
}

struct JsCallbacks {
    on_success: Function,
    on_cancel: Function,
}

impl PuzzleCallbacks for JsCallbacks {
    fn on_success(self: Box<Self>, estimate: ConvergenceEstimate) {
        let result = to_js_value(&estimate)
            .and_then(|value| self.on_success.call1(&JsValue::NULL, &value));
        if let Err(err) = result {
            log::warn!("on_success callback mislukt: {err:?}");
        }
    }

    fn on_cancel(self: Box<Self>) {
        if let Err(err) = self.on_cancel.call0(&JsValue::NULL) {
            log::warn!("on_cancel callback mislukt: {err:?}");
        }
    }
}

struct JsAudio(Function);

impl AudioSink for JsAudio {
    fn play(&mut self, cue: AudioCue) {
        if let Err(err) = self.0.call1(&JsValue::NULL, &JsValue::from_str(cue.name())) {
            log::warn!("geluidsverzoek `{}` mislukt: {err:?}", cue.name());
        }
    }
}

struct JsNotifier(Function);

impl Notifier for JsNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        let result = self.0.call2(
            &JsValue::NULL,
            &JsValue::from_str(message),
            &JsValue::from_str(severity.name()),
        );
        if let Err(err) = result {
            log::warn!("melding kon niet worden afgeleverd: {err:?}");
        }
    }
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|err| to_js_error(PuzzleError::Serialization(err.to_string())))
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::PuzzleHost;

    #[test]
    fn host_starts_without_a_puzzle() {
        let mut host = PuzzleHost::new();
        assert!(!host.is_active());
        assert!(!host.pointer_down(10.0, 10.0, 0));
        assert!(!host.pointer_move(20.0, 10.0));
        host.pointer_up(20.0, 10.0);
        assert!(!host.is_active());
        assert!(!host.click(10.0, 10.0));
        assert!(!host.wheel(-100.0));
        assert!(!host.lock_coordinates());
        assert!(!host.abort());
    }

    #[test]
    fn unknown_pointer_buttons_are_ignored() {
        let mut host = PuzzleHost::new();
        assert!(!host.pointer_down(0.0, 0.0, 7));
    }
}
