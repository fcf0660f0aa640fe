//! Error types for the Galaxy3D renderer
//!
//! This module defines the error type shared by the renderer frontend,
//! the backend contract and the engine loop.

use std::fmt;

/// Result type for Galaxy3D renderer operations
pub type Galaxy3dResult<T> = std::result::Result<T, Galaxy3dError>;

/// Galaxy3D renderer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Galaxy3dError {
    /// Backend-specific error (Vulkan, headless, mock, etc.)
    BackendError(String),

    /// A renderbuffer or the GPU has no room left for the request
    OutOfMemory,

    /// Invalid or stale resource handle (texture, renderbuffer, shader, etc.)
    InvalidResource(String),

    /// Caller passed an argument that breaks the operation contract
    /// (zero size, out of range offset, shrinking resize...)
    InvalidArgument(String),

    /// Initialization failed (renderer, backend plugin, global buffers)
    InitializationFailed(String),
}

impl fmt::Display for Galaxy3dError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Galaxy3dError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Galaxy3dError::OutOfMemory => write!(f, "Out of GPU memory"),
            Galaxy3dError::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Galaxy3dError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Galaxy3dError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Galaxy3dError {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build a `Galaxy3dError::BackendError` from it
///
/// # Example
///
/// ```no_run
/// # use galaxy_3d_renderer::engine_err;
/// # let name = "vertices";
/// let err = engine_err!("galaxy3d::Renderbuffer", "Buffer {} not found", name);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Galaxy3dError::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Galaxy3dError::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an ERROR message and return `Err(Galaxy3dError::InvalidArgument)` from the current function
///
/// Used for caller-contract violations: the operation performs no mutation.
#[macro_export]
macro_rules! engine_bail_arg {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        return Err($crate::galaxy3d::Galaxy3dError::InvalidArgument(message));
    }};
}

/// Log an ERROR message and return `Err(Galaxy3dError::InvalidResource)` from the current function
#[macro_export]
macro_rules! engine_bail_resource {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        return Err($crate::galaxy3d::Galaxy3dError::InvalidResource(message));
    }};
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
