//! Foutmeldingen voor de host-zijde van de puzzel.
//!
//! Spelerinvoer levert nooit een fout op; afgewezen invoer is simpelweg een no-op.

use thiserror::Error;

/// Misbruik van de puzzel door de host-applicatie.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PuzzleError {
    #[error("ongeldige puzzelopties: {0}")]
    InvalidOptions(String),
    #[error("er is al een triangulatiepuzzel actief")]
    AlreadyActive,
    #[error("er is geen actieve triangulatiepuzzel")]
    NotActive,
    #[error("ongeldige viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
    #[error("serialisatie mislukt: {0}")]
    Serialization(String),
}
