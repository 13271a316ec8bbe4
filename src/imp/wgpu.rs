// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! wgpu equivalents of registry plane formats.
//!
//! Useful when a wgpu renderer uploads [`crate::download`] output itself and
//! needs textures matching each plane.

use crate::formats::{GpuInternalFormat, PlaneFormat, SampleFormat, SampleType};
use crate::importer::MappedPlane;

impl PlaneFormat {
    /// The wgpu format holding this plane's texels, if wgpu has one.
    ///
    /// Apple's packed 4:2:2 has no wgpu equivalent.
    pub const fn wgpu_format(&self) -> Option<wgpu::TextureFormat> {
        match (self.sample_format, self.sample_type, self.internal_format) {
            (SampleFormat::Red, SampleType::UnsignedByte, GpuInternalFormat::Red) => {
                Some(wgpu::TextureFormat::R8Unorm)
            }
            (SampleFormat::Rg, SampleType::UnsignedByte, GpuInternalFormat::Rg) => {
                Some(wgpu::TextureFormat::Rg8Unorm)
            }
            (SampleFormat::Bgra, SampleType::UnsignedInt8888Rev, GpuInternalFormat::Rgba) => {
                Some(wgpu::TextureFormat::Bgra8Unorm)
            }
            _ => None,
        }
    }
}

impl MappedPlane {
    pub const fn wgpu_extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{TextureHandle, TextureTarget};
    use crate::formats::{ImageFormat, Swizzle, lookup_by_image_format};
    use crate::importer::MappedPlane;

    #[test]
    fn table_formats_map_to_wgpu() {
        let nv12 = lookup_by_image_format(ImageFormat::Nv12).unwrap();
        assert_eq!(nv12.planes[0].wgpu_format(), Some(wgpu::TextureFormat::R8Unorm));
        assert_eq!(nv12.planes[1].wgpu_format(), Some(wgpu::TextureFormat::Rg8Unorm));
        let rgb0 = lookup_by_image_format(ImageFormat::Rgb0).unwrap();
        assert_eq!(rgb0.planes[0].wgpu_format(), Some(wgpu::TextureFormat::Bgra8Unorm));
        let uyvy = lookup_by_image_format(ImageFormat::Uyvy).unwrap();
        assert_eq!(uyvy.planes[0].wgpu_format(), None);
    }

    #[test]
    fn extent_is_plane_sized() {
        let plane = MappedPlane {
            texture: TextureHandle(3),
            target: TextureTarget::Rectangle,
            width: 960,
            height: 540,
            swizzle: Swizzle::IDENTITY,
        };
        let extent = plane.wgpu_extent();
        assert_eq!((extent.width, extent.height, extent.depth_or_array_layers), (960, 540, 1));
    }
}
