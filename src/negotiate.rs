// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Stream format negotiation.
//!
//! Two small hooks sit between the decoder and the renderer:
//!
//! - [`preferred_hw_format`] tells the decoder which native format to output,
//!   based on the configured [`ImageFormat`].
//! - [`reinit`] runs when the renderer learns the stream's format.  A hardware
//!   stream arrives tagged [`ImageFormat::VideoToolbox`] with the real format
//!   in `hw_subformat`; after `reinit` it is tagged with the real format, so
//!   the renderer sets up for planes it can sample.

use crate::config::InteropConfig;
use crate::error::{Error, FormatQuery};
use crate::formats::{HwPixelFormat, ImageFormat, lookup_by_image_format};
use logwise::privacy::LogIt;

/// The logical format record exchanged during stream setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub format: ImageFormat,
    /// The classified format behind a hardware `format`.
    pub hw_subformat: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
}

impl StreamParams {
    pub fn hardware(hw_subformat: ImageFormat, width: u32, height: u32) -> Self {
        StreamParams {
            format: ImageFormat::VideoToolbox,
            hw_subformat: Some(hw_subformat),
            width,
            height,
        }
    }
}

/// Rewrites a hardware stream's format to the format its frames will map to.
///
/// On error `params` is left exactly as it was; the caller should disable
/// hardware import for this stream.
pub fn reinit(params: &mut StreamParams) -> Result<(), Error> {
    if !params.format.is_hardware() {
        return Err(Error::NotHardwareStream(params.format));
    }
    let Some(subformat) = params.hw_subformat else {
        logwise::error_sync!("hardware stream has no sub-format");
        return Err(Error::UnsupportedFormat(FormatQuery::Missing));
    };
    let Some(descriptor) = lookup_by_image_format(subformat) else {
        logwise::error_sync!(
            "unsupported hardware sub-format {format}",
            format = LogIt(&subformat.to_string())
        );
        return Err(Error::UnsupportedFormat(FormatQuery::Image(subformat)));
    };
    logwise::debuginternal_sync!(
        "stream format {from} rewritten to {to}",
        from = LogIt(&params.format.to_string()),
        to = LogIt(&descriptor.image_format.to_string())
    );
    params.format = descriptor.image_format;
    params.hw_subformat = None;
    Ok(())
}

/// The native format the decoder should be asked for, if the configured
/// format has one.
pub fn preferred_hw_format(config: &InteropConfig<'_>) -> Option<HwPixelFormat> {
    lookup_by_image_format(config.preferred_format).map(|f| f.hw_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_subformat() {
        let mut params = StreamParams::hardware(ImageFormat::Nv12, 1280, 720);
        reinit(&mut params).unwrap();
        assert_eq!(params.format, ImageFormat::Nv12);
        assert_eq!(params.hw_subformat, None);
        assert_eq!((params.width, params.height), (1280, 720));
    }

    #[test]
    fn unknown_subformat_leaves_params_alone() {
        let mut params = StreamParams::hardware(ImageFormat::Yuyv, 1280, 720);
        let before = params;
        assert!(matches!(
            reinit(&mut params),
            Err(Error::UnsupportedFormat(FormatQuery::Image(ImageFormat::Yuyv)))
        ));
        assert_eq!(params, before);
    }

    #[test]
    fn missing_subformat_is_unsupported() {
        let mut params = StreamParams {
            hw_subformat: None,
            ..StreamParams::hardware(ImageFormat::Nv12, 16, 16)
        };
        assert!(matches!(
            reinit(&mut params),
            Err(Error::UnsupportedFormat(FormatQuery::Missing))
        ));
        assert_eq!(params.format, ImageFormat::VideoToolbox);
    }

    #[test]
    fn software_streams_are_refused() {
        let mut params = StreamParams {
            format: ImageFormat::Yuv420p,
            hw_subformat: None,
            width: 2,
            height: 2,
        };
        assert!(matches!(
            reinit(&mut params),
            Err(Error::NotHardwareStream(ImageFormat::Yuv420p))
        ));
    }

    #[test]
    fn preferred_format_maps_to_fourcc() {
        let config = InteropConfig {
            preferred_format: ImageFormat::Uyvy,
            ..InteropConfig::default()
        };
        assert_eq!(preferred_hw_format(&config), Some(HwPixelFormat::PACKED_422));
        assert_eq!(
            preferred_hw_format(&InteropConfig::default()),
            Some(HwPixelFormat::BIPLANAR_420_VIDEO)
        );
        let config = InteropConfig {
            preferred_format: ImageFormat::Rgba,
            ..InteropConfig::default()
        };
        assert_eq!(preferred_hw_format(&config), None);
    }
}
