// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Interop configuration.
//!
//! Parsing options is the caller's job; this is the already-parsed result.

use crate::formats::ImageFormat;

/// Settings for an [`crate::importer::ImportSession`] and the decoder hook.
///
/// # Examples
///
/// ```
/// use hwdec_interop::config::InteropConfig;
/// use hwdec_interop::formats::ImageFormat;
///
/// let config = InteropConfig {
///     debug_name: "main video",
///     preferred_format: ImageFormat::Uyvy,
/// };
/// assert_eq!(InteropConfig::default().preferred_format, ImageFormat::Nv12);
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteropConfig<'a> {
    /// Shows up in log messages.
    pub debug_name: &'a str,
    /// The image format the decoder should be asked to output.
    pub preferred_format: ImageFormat,
}

impl Default for InteropConfig<'_> {
    fn default() -> Self {
        InteropConfig {
            debug_name: "hwdec_interop",
            preferred_format: ImageFormat::Nv12,
        }
    }
}
