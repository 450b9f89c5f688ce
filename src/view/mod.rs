//! The interactive viewport: camera state, projection and pointer handling.

pub mod interaction;
pub mod projection;

pub use interaction::{InteractionController, ScreenPoint};
pub use projection::{Projected, Projector, ViewState, Viewport, project};
