// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Backend-specific glue.
//!
//! The import path itself only talks to [`crate::context::GraphicsContext`].
//! Backends here help renderers built on other APIs consume what it produces.

#[cfg(feature = "backend_wgpu")]
mod wgpu;
