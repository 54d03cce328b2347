/// Error taxonomy for a render pass.
/// Geometry anomalies never surface here; they are skipped per triangle.
use thiserror::Error;

use crate::rendering::context::ContextState;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("uniform `{0}` was never bound")]
    UnboundUniform(String),

    #[error("uniform `{name}` holds a {found}, expected a {expected}")]
    UniformType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("no texture bound to slot {0}")]
    UnboundTexture(usize),

    #[error("texture slot {slot} out of range (max {max})")]
    TextureSlotOutOfRange { slot: usize, max: usize },

    #[error("render context cannot go from {from:?} to {to:?}")]
    InvalidState { from: ContextState, to: ContextState },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid texture: {0}")]
    InvalidTexture(String),

    #[error("resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, RenderError>;
