//! Tunables for a single puzzle instance.
//!
//! Every field has a default, so a host may pass a partial object through
//! `serde-wasm-bindgen` and only override what it needs.

use std::f64::consts::FRAC_PI_3;

use serde::Deserialize;

use crate::error::PuzzleError;
use crate::scene::SOURCE_COUNT;

/// Pointer button, numbered as in DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    #[must_use]
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PuzzleOptions {
    // Viewport.
    pub focal_length: f64,
    pub rotation_sensitivity: f64,
    pub zoom_speed: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub max_pitch: f64,
    pub pick_radius: f64,
    pub drag_button: PointerButton,
    /// Pointer travel (px) after which a press counts as a drag, not a click.
    pub click_slop: f64,

    // Triangulation rules.
    pub max_locked: usize,
    pub two_vector_accuracy_cap: f64,
    pub success_threshold: f64,
    pub parallel_epsilon: f64,

    // Scene generation.
    pub accurate_count: usize,
    /// Half-extent of the box the hidden target is drawn from, per axis.
    pub target_extent: [f64; 3],
    /// Per-component noise added to accurate directions, as a fraction of unit length.
    pub accurate_noise: f64,
    pub decoy_offset_min: f64,
    pub decoy_offset_max: f64,

    // Rendering.
    pub star_count: usize,
    pub star_radius: f64,
    pub grid_extent: f64,
    pub grid_step: f64,
    pub vector_length: f64,
}

impl Default for PuzzleOptions {
    fn default() -> Self {
        Self {
            focal_length: 500.0,
            rotation_sensitivity: 0.005,
            zoom_speed: 0.001,
            min_zoom: 0.5,
            max_zoom: 2.5,
            max_pitch: FRAC_PI_3,
            pick_radius: 25.0,
            drag_button: PointerButton::Primary,
            click_slop: 4.0,

            max_locked: 3,
            two_vector_accuracy_cap: 65.0,
            success_threshold: 85.0,
            parallel_epsilon: 1e-9,

            accurate_count: 3,
            target_extent: [60.0, 30.0, 60.0],
            accurate_noise: 0.03,
            decoy_offset_min: 60.0,
            decoy_offset_max: 120.0,

            star_count: 200,
            star_radius: 900.0,
            grid_extent: 200.0,
            grid_step: 50.0,
            vector_length: 400.0,
        }
    }
}

impl PuzzleOptions {
    /// Rejects option sets that would make the puzzle unplayable or the math undefined.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        let finite = [
            ("focal_length", self.focal_length),
            ("rotation_sensitivity", self.rotation_sensitivity),
            ("zoom_speed", self.zoom_speed),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("max_pitch", self.max_pitch),
            ("pick_radius", self.pick_radius),
            ("click_slop", self.click_slop),
            ("two_vector_accuracy_cap", self.two_vector_accuracy_cap),
            ("success_threshold", self.success_threshold),
            ("parallel_epsilon", self.parallel_epsilon),
            ("accurate_noise", self.accurate_noise),
            ("decoy_offset_min", self.decoy_offset_min),
            ("decoy_offset_max", self.decoy_offset_max),
            ("star_radius", self.star_radius),
            ("grid_extent", self.grid_extent),
            ("grid_step", self.grid_step),
            ("vector_length", self.vector_length),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(format!("`{name}` moet een eindig getal zijn")));
            }
        }
        if self.target_extent.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("`target_extent` moet eindig en niet-negatief zijn".into()));
        }

        if self.focal_length <= 0.0 {
            return Err(invalid("`focal_length` moet positief zijn".into()));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(invalid(format!(
                "zoombereik [{}, {}] is ongeldig",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_pitch <= 0.0 {
            return Err(invalid("`max_pitch` moet positief zijn".into()));
        }
        if self.pick_radius <= 0.0 || self.click_slop < 0.0 {
            return Err(invalid("`pick_radius` en `click_slop` moeten positief zijn".into()));
        }
        if self.max_locked == 0 || self.max_locked > SOURCE_COUNT {
            return Err(invalid(format!(
                "`max_locked` moet tussen 1 en {SOURCE_COUNT} liggen"
            )));
        }
        if self.accurate_count > SOURCE_COUNT {
            return Err(invalid(format!(
                "`accurate_count` mag niet groter zijn dan {SOURCE_COUNT}"
            )));
        }
        if self.parallel_epsilon < 0.0 || self.accurate_noise < 0.0 {
            return Err(invalid(
                "`parallel_epsilon` en `accurate_noise` mogen niet negatief zijn".into(),
            ));
        }
        if self.decoy_offset_min <= 0.0 || self.decoy_offset_min > self.decoy_offset_max {
            return Err(invalid(format!(
                "decoy-offsetbereik [{}, {}] is ongeldig",
                self.decoy_offset_min, self.decoy_offset_max
            )));
        }
        if self.grid_step <= 0.0 || self.grid_extent < 0.0 || self.vector_length <= 0.0 {
            return Err(invalid("rasteropties moeten positief zijn".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PuzzleError {
    PuzzleError::InvalidOptions(message)
}
