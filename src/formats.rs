// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The registry of hardware pixel formats we know how to import.
//!
//! Each entry ties three things together:
//!
//! - the platform's native pixel-format code ([`HwPixelFormat`], a FourCC),
//! - the internal [`ImageFormat`] the rest of the pipeline uses,
//! - one [`PlaneFormat`] per plane, describing exactly how that plane's bytes
//!   must be sampled when the shared surface is bound as a texture.
//!
//! Getting a plane descriptor wrong does not fail loudly.  The texture binds
//! fine and the picture comes out with the wrong colors or the wrong
//! geometry, so the table is tested structurally.
//!
//! # Supported formats
//!
//! | FourCC | [`ImageFormat`] | Planes | Notes |
//! |--------|-----------------|--------|-------|
//! | `420v` | [`ImageFormat::Nv12`] | 2 | luma + interleaved chroma |
//! | `2vuy` | [`ImageFormat::Uyvy`] | 1 | packed 4:2:2, needs a `gbra` swizzle |
//! | `y420` | [`ImageFormat::Yuv420p`] | 3 | fully planar 4:2:0 |
//! | `BGRA` | [`ImageFormat::Rgb0`] | 1 | packed 32-bit |
//!
//! # Examples
//!
//! ```
//! use hwdec_interop::formats::{lookup_by_hw_format, lookup_by_image_format, HwPixelFormat, ImageFormat};
//!
//! let nv12 = lookup_by_image_format(ImageFormat::Nv12).unwrap();
//! assert_eq!(nv12.plane_count(), 2);
//!
//! let same = lookup_by_hw_format(nv12.hw_format).unwrap();
//! assert_eq!(same.image_format, ImageFormat::Nv12);
//!
//! assert!(lookup_by_hw_format(HwPixelFormat::from_fourcc(*b"none")).is_none());
//! ```

use std::fmt::{Debug, Display};

/// The largest number of planes any frame can have.
pub const MAX_PLANES: usize = 4;

/// A platform-native pixel format code.
///
/// On Apple platforms this is an `OSType`: four ASCII characters packed
/// big-endian into a `u32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwPixelFormat(pub u32);

impl HwPixelFormat {
    /// `kCVPixelFormatType_420YpCbCr8BiPlanarVideoRange`
    pub const BIPLANAR_420_VIDEO: HwPixelFormat = HwPixelFormat::from_fourcc(*b"420v");
    /// `kCVPixelFormatType_422YpCbCr8`
    pub const PACKED_422: HwPixelFormat = HwPixelFormat::from_fourcc(*b"2vuy");
    /// `kCVPixelFormatType_420YpCbCr8Planar`
    pub const PLANAR_420: HwPixelFormat = HwPixelFormat::from_fourcc(*b"y420");
    /// `kCVPixelFormatType_32BGRA`
    pub const BGRA_32: HwPixelFormat = HwPixelFormat::from_fourcc(*b"BGRA");

    pub const fn from_fourcc(code: [u8; 4]) -> Self {
        HwPixelFormat(u32::from_be_bytes(code))
    }

    pub const fn fourcc(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl Display for HwPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.fourcc();
        if code.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
            for c in code {
                write!(f, "{}", c as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

impl Debug for HwPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HwPixelFormat('{}')", self)
    }
}

/// Internal image format tags.
///
/// Only some of these appear in the registry.  [`ImageFormat::VideoToolbox`]
/// is the placeholder for a frame that is still an opaque hardware handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Opaque hardware frame, not yet classified.
    VideoToolbox,
    /// 8-bit 4:2:0, luma plane followed by an interleaved chroma plane.
    Nv12,
    /// 8-bit 4:2:2 packed as U Y V Y.
    Uyvy,
    /// 8-bit 4:2:0, three separate planes.
    Yuv420p,
    /// 8-bit RGB with an ignored fourth byte.
    Rgb0,
    /// 8-bit RGBA.
    Rgba,
    /// 8-bit 4:2:2 packed as Y U Y V.
    Yuyv,
}

impl ImageFormat {
    /// Whether frames with this tag still have to be imported or downloaded.
    pub const fn is_hardware(&self) -> bool {
        matches!(self, ImageFormat::VideoToolbox)
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageFormat::VideoToolbox => "videotoolbox",
            ImageFormat::Nv12 => "nv12",
            ImageFormat::Uyvy => "uyvy422",
            ImageFormat::Yuv420p => "yuv420p",
            ImageFormat::Rgb0 => "rgb0",
            ImageFormat::Rgba => "rgba",
            ImageFormat::Yuyv => "yuyv422",
        };
        write!(f, "{}", name)
    }
}

/// Channel layout of the client data, the `format` argument of a GL upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Red,
    Rg,
    /// Apple's packed 4:2:2 layout.
    Rgb422Apple,
    Bgra,
}

impl SampleFormat {
    pub const fn gl_enum(&self) -> u32 {
        match self {
            SampleFormat::Red => 0x1903,
            SampleFormat::Rg => 0x8227,
            SampleFormat::Rgb422Apple => 0x8A1F,
            SampleFormat::Bgra => 0x80E1,
        }
    }
}

/// Component type of the client data, the `type` argument of a GL upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    UnsignedByte,
    UnsignedShort88Apple,
    UnsignedInt8888Rev,
}

impl SampleType {
    pub const fn gl_enum(&self) -> u32 {
        match self {
            SampleType::UnsignedByte => 0x1401,
            SampleType::UnsignedShort88Apple => 0x85BA,
            SampleType::UnsignedInt8888Rev => 0x8367,
        }
    }
}

/// How the GPU stores the texture, the `internalformat` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuInternalFormat {
    Red,
    Rg,
    Rgb,
    Rgba,
}

impl GpuInternalFormat {
    pub const fn gl_enum(&self) -> u32 {
        match self {
            GpuInternalFormat::Red => 0x1903,
            GpuInternalFormat::Rg => 0x8227,
            GpuInternalFormat::Rgb => 0x1907,
            GpuInternalFormat::Rgba => 0x1908,
        }
    }
}

/// A per-channel remapping applied when sampling.
///
/// At most four characters, each one of `r`, `g`, `b`, `a`.  Empty means
/// channels are used as stored.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Swizzle(&'static str);

impl Swizzle {
    pub const IDENTITY: Swizzle = Swizzle("");

    /// Creates a swizzle, panicking (at compile time, in const context) on
    /// anything that is not a valid mask.
    pub const fn new(mask: &'static str) -> Self {
        let bytes = mask.as_bytes();
        assert!(bytes.len() <= 4, "swizzle is at most 4 channels");
        let mut i = 0;
        while i < bytes.len() {
            assert!(
                matches!(bytes[i], b'r' | b'g' | b'b' | b'a'),
                "swizzle channels must be r, g, b or a"
            );
            i += 1;
        }
        Swizzle(mask)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    pub const fn is_identity(&self) -> bool {
        self.0.is_empty()
    }

    /// The mask with the identity spelled out, for consumers that always
    /// want four characters.
    pub const fn or_identity(&self) -> &'static str {
        if self.0.is_empty() { "rgba" } else { self.0 }
    }
}

impl Debug for Swizzle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Swizzle({:?})", self.0)
    }
}

impl Display for Swizzle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Everything needed to bind one plane of a shared surface as a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneFormat {
    pub sample_format: SampleFormat,
    pub sample_type: SampleType,
    pub internal_format: GpuInternalFormat,
    pub swizzle: Swizzle,
}

impl PlaneFormat {
    const fn new(
        sample_format: SampleFormat,
        sample_type: SampleType,
        internal_format: GpuInternalFormat,
    ) -> Self {
        PlaneFormat {
            sample_format,
            sample_type,
            internal_format,
            swizzle: Swizzle::IDENTITY,
        }
    }

    const fn swizzled(self, swizzle: Swizzle) -> Self {
        PlaneFormat { swizzle, ..self }
    }
}

/// One row of the registry.
#[derive(Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub hw_format: HwPixelFormat,
    pub image_format: ImageFormat,
    pub planes: &'static [PlaneFormat],
}

impl FormatDescriptor {
    pub const fn plane_count(&self) -> usize {
        self.planes.len()
    }
}

const R8: PlaneFormat = PlaneFormat::new(
    SampleFormat::Red,
    SampleType::UnsignedByte,
    GpuInternalFormat::Red,
);
const RG8: PlaneFormat = PlaneFormat::new(
    SampleFormat::Rg,
    SampleType::UnsignedByte,
    GpuInternalFormat::Rg,
);

/// Every format this crate can import.
pub static FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor {
        hw_format: HwPixelFormat::BIPLANAR_420_VIDEO,
        image_format: ImageFormat::Nv12,
        planes: &[R8, RG8],
    },
    FormatDescriptor {
        hw_format: HwPixelFormat::PACKED_422,
        image_format: ImageFormat::Uyvy,
        planes: &[PlaneFormat::new(
            SampleFormat::Rgb422Apple,
            SampleType::UnsignedShort88Apple,
            GpuInternalFormat::Rgb,
        )
        .swizzled(Swizzle::new("gbra"))],
    },
    FormatDescriptor {
        hw_format: HwPixelFormat::PLANAR_420,
        image_format: ImageFormat::Yuv420p,
        planes: &[R8, R8, R8],
    },
    FormatDescriptor {
        hw_format: HwPixelFormat::BGRA_32,
        image_format: ImageFormat::Rgb0,
        planes: &[PlaneFormat::new(
            SampleFormat::Bgra,
            SampleType::UnsignedInt8888Rev,
            GpuInternalFormat::Rgba,
        )],
    },
];

/// Classifies a native pixel format.
pub fn lookup_by_hw_format(hw_format: HwPixelFormat) -> Option<&'static FormatDescriptor> {
    FORMATS.iter().find(|f| f.hw_format == hw_format)
}

/// Finds the native format that produces `image_format`.
pub fn lookup_by_image_format(image_format: ImageFormat) -> Option<&'static FormatDescriptor> {
    FORMATS.iter().find(|f| f.image_format == image_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_both_keys() {
        for descriptor in FORMATS {
            let by_image = lookup_by_image_format(descriptor.image_format).unwrap();
            let by_hw = lookup_by_hw_format(by_image.hw_format).unwrap();
            assert_eq!(by_hw.image_format, descriptor.image_format);
            assert!(std::ptr::eq(by_hw, descriptor));
        }
    }

    #[test]
    fn keys_are_unique() {
        for (i, a) in FORMATS.iter().enumerate() {
            for b in &FORMATS[i + 1..] {
                assert_ne!(a.hw_format, b.hw_format);
                assert_ne!(a.image_format, b.image_format);
            }
        }
    }

    #[test]
    fn plane_counts_in_range() {
        for descriptor in FORMATS {
            assert!(descriptor.plane_count() >= 1);
            assert!(descriptor.plane_count() <= MAX_PLANES);
        }
    }

    #[test]
    fn lookups_are_stable() {
        let a = lookup_by_hw_format(HwPixelFormat::PLANAR_420).unwrap();
        let b = lookup_by_hw_format(HwPixelFormat::PLANAR_420).unwrap();
        assert!(std::ptr::eq(a, b));
        let c = lookup_by_image_format(ImageFormat::Uyvy).unwrap();
        let d = lookup_by_image_format(ImageFormat::Uyvy).unwrap();
        assert!(std::ptr::eq(c, d));
    }

    #[test]
    fn nv12_samples_luma_then_chroma() {
        let nv12 = lookup_by_hw_format(HwPixelFormat::BIPLANAR_420_VIDEO).unwrap();
        assert_eq!(nv12.image_format, ImageFormat::Nv12);
        assert_eq!(nv12.planes[0].sample_format, SampleFormat::Red);
        assert_eq!(nv12.planes[0].internal_format, GpuInternalFormat::Red);
        assert_eq!(nv12.planes[1].sample_format, SampleFormat::Rg);
        assert_eq!(nv12.planes[1].internal_format, GpuInternalFormat::Rg);
        assert!(nv12.planes.iter().all(|p| p.sample_type == SampleType::UnsignedByte));
        assert!(nv12.planes.iter().all(|p| p.swizzle.is_identity()));
    }

    #[test]
    fn packed_422_is_swizzled() {
        let uyvy = lookup_by_image_format(ImageFormat::Uyvy).unwrap();
        assert_eq!(uyvy.hw_format, HwPixelFormat::PACKED_422);
        assert_eq!(uyvy.plane_count(), 1);
        let plane = uyvy.planes[0];
        assert_eq!(plane.sample_format.gl_enum(), 0x8A1F);
        assert_eq!(plane.sample_type.gl_enum(), 0x85BA);
        assert_eq!(plane.internal_format.gl_enum(), 0x1907);
        assert_eq!(plane.swizzle.as_str(), "gbra");
    }

    #[test]
    fn bgra_uses_reversed_packed_type() {
        let rgb0 = lookup_by_image_format(ImageFormat::Rgb0).unwrap();
        assert_eq!(rgb0.hw_format, HwPixelFormat::BGRA_32);
        assert_eq!(rgb0.planes[0].sample_format, SampleFormat::Bgra);
        assert_eq!(rgb0.planes[0].sample_type, SampleType::UnsignedInt8888Rev);
        assert_eq!(rgb0.planes[0].internal_format, GpuInternalFormat::Rgba);
    }

    #[test]
    fn unknown_formats_are_not_found() {
        assert!(lookup_by_hw_format(HwPixelFormat::from_fourcc(*b"yuvs")).is_none());
        assert!(lookup_by_image_format(ImageFormat::Rgba).is_none());
        assert!(lookup_by_image_format(ImageFormat::VideoToolbox).is_none());
    }

    #[test]
    fn fourcc_display() {
        assert_eq!(HwPixelFormat::BIPLANAR_420_VIDEO.to_string(), "420v");
        assert_eq!(HwPixelFormat(0x0000_0020).to_string(), "0x00000020");
        assert_eq!(HwPixelFormat::BGRA_32.0, 0x4247_5241);
    }

    #[test]
    fn swizzle_identity() {
        assert_eq!(Swizzle::IDENTITY.or_identity(), "rgba");
        assert_eq!(Swizzle::new("gbra").or_identity(), "gbra");
    }
}
