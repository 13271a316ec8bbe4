// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Errors for setup, import and negotiation.
//!
//! Nothing here is retried internally.  Every error carries enough detail
//! to be logged by the caller, who decides whether to drop the frame or
//! disable hardware import for the stream.

use crate::context::GlVersion;
use crate::formats::{HwPixelFormat, ImageFormat};
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The graphics context can't host the import path.  Fatal for the session.
    #[error("unsupported graphics context: {0}")]
    UnsupportedContext(ContextProblem),
    /// The format isn't in the registry.  Fatal for the frame, or for the
    /// stream when it happens during negotiation.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(FormatQuery),
    /// The frame wasn't allocated from a surface-shareable pool.
    #[error("hardware frame has no shared surface")]
    NoSharedSurface,
    /// The frame's plane layout disagrees with its registered format.
    #[error(
        "frame reports {found} plane(s) (planar: {planar}) but its format has {expected}"
    )]
    PlaneLayoutMismatch {
        expected: usize,
        found: usize,
        planar: bool,
    },
    /// No plane at all could be bound.
    #[error("no plane could be bound: {0}")]
    BindFailed(PartialBindFailure),
    /// Negotiation was asked to rewrite a stream that isn't a hardware stream.
    #[error("stream format {0} is not a hardware format")]
    NotHardwareStream(ImageFormat),
}

/// Why [`crate::context::check_context`] rejected a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextProblem {
    /// Core rectangle textures need a newer GL.
    VersionTooOld { found: GlVersion, required: GlVersion },
    /// Surfaces can only be bound into a current context.
    NotCurrent,
}

impl Display for ContextProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextProblem::VersionTooOld { found, required } => write!(
                f,
                "need >= OpenGL {} for core rectangle texture support, have {}",
                required, found
            ),
            ContextProblem::NotCurrent => write!(f, "no graphics context is current"),
        }
    }
}

/// The key that failed a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatQuery {
    Hardware(HwPixelFormat),
    Image(ImageFormat),
    /// Negotiation was given no sub-format at all.
    Missing,
}

impl Display for FormatQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatQuery::Hardware(hw) => write!(f, "native format {}", hw),
            FormatQuery::Image(image) => write!(f, "image format {}", image),
            FormatQuery::Missing => write!(f, "no hardware sub-format"),
        }
    }
}

/// What a context reports when binding one surface plane fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("surface bind failed with code 0x{code:x}")]
pub struct BindError {
    /// Platform error code (a `CGLError` on macOS).
    pub code: u32,
}

/// One plane that couldn't be bound during an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneBindError {
    pub plane: usize,
    pub error: BindError,
}

/// Planes that failed to bind while the rest of the frame went through.
///
/// Returned as a warning alongside a successful import; the failed planes'
/// entries are left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialBindFailure {
    pub planes: Vec<PlaneBindError>,
}

impl PartialBindFailure {
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn failed_planes(&self) -> impl Iterator<Item = usize> + '_ {
        self.planes.iter().map(|p| p.plane)
    }
}

impl Display for PartialBindFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} plane(s) failed to bind", self.planes.len())?;
        for p in &self.planes {
            write!(f, "; plane {}: {}", p.plane, p.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PartialBindFailure {}
