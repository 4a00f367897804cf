//! Error type shared by every terrain constructor.

use thiserror::Error;

/// Failures surfaced while building terrain or validating its parameters.
///
/// Clamped height queries, exhausted scatter tries and band rejections are
/// not errors; they never produce one of these.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("failed to decode heightmap image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read heightmap: {0}")]
    Io(#[from] std::io::Error),

    #[error("heightmap image has zero dimensions ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("scatter region needs {cells} acceleration cells, which exceeds the supported limit")]
    RegionTooLarge { cells: usize },
}

pub type Result<T> = std::result::Result<T, TerrainError>;

impl TerrainError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        TerrainError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject NaN/infinite and non-positive values with a uniform message.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TerrainError::config(field, format!("must be finite, got {value}")));
    }
    if value <= 0.0 {
        return Err(TerrainError::config(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TerrainError::config(field, format!("must be finite, got {value}")))
    }
}
