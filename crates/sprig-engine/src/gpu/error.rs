use thiserror::Error;

/// Errors raised while creating GPU resources.
#[derive(Debug, Error)]
pub enum GpuError {
    /// A WGSL module failed to parse or validate.
    #[error("failed to compile {stage} shader `{label}`:\n{message}")]
    Compile {
        label: String,
        stage: &'static str,
        message: String,
    },

    /// The vertex and fragment stages (or the vertex layout) do not fit together.
    #[error("failed to link shader `{label}`: {message}")]
    Link { label: String, message: String },

    #[error("invalid texture: {0}")]
    InvalidTexture(String),

    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),
}
