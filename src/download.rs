// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
CPU readback of hardware frames.

When the consumer wants ordinary memory instead of textures (screenshots,
software filters, encoders), [`download_image`] locks the frame, describes
its planes with a borrowed [`ImageView`] and asks an [`ImagePool`] to copy
them out.  The view borrows the lock, so it can't outlive it, and the lock
is released however `download_image` returns.
*/

use crate::formats::{ImageFormat, MAX_PLANES, lookup_by_hw_format};
use crate::frame::{FrameAttributes, HardwareFrame, HwImage, PlaneView, ReadLock};
use logwise::privacy::LogIt;

/// A borrowed description of a locked frame's pixels.
#[derive(Debug, Clone)]
pub struct ImageView<'l> {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub attributes: FrameAttributes,
    plane_count: usize,
    planes: [PlaneView<'l>; MAX_PLANES],
}

impl<'l> ImageView<'l> {
    pub fn planes(&self) -> &[PlaneView<'l>] {
        &self.planes[..self.plane_count]
    }

    pub fn plane(&self, index: usize) -> Option<&PlaneView<'l>> {
        self.planes().get(index)
    }
}

/// Something that can turn an [`ImageView`] into an owned image.
pub trait ImagePool {
    type Image;

    /// Copies `view` into memory the pool owns.  `None` if allocation fails.
    fn materialize_copy(&mut self, view: &ImageView<'_>) -> Option<Self::Image>;
}

/// Copies a hardware frame into an image from `pool`.
///
/// Returns `None` when `image` isn't a hardware frame, when the frame can't
/// be locked, when its native format isn't in the registry, or when the pool
/// can't allocate.
///
/// Size and format are read from the locked buffer, not from `image`: the
/// decoder may have switched formats since the stream was negotiated.
pub fn download_image<F, P>(image: &HwImage<F>, pool: &mut P) -> Option<P::Image>
where
    F: HardwareFrame,
    P: ImagePool,
{
    if !image.format.is_hardware() {
        return None;
    }
    let lock = ReadLock::acquire(&image.frame)?;
    let frame = lock.frame();
    let width = frame.width();
    let height = frame.height();
    let hw_format = frame.pixel_format();
    let Some(descriptor) = lookup_by_hw_format(hw_format) else {
        logwise::warn_sync!(
            "can't download frame with unsupported format {format}",
            format = LogIt(&hw_format.to_string())
        );
        return None;
    };

    let mut planes = [PlaneView::EMPTY; MAX_PLANES];
    for (i, plane) in planes.iter_mut().enumerate().take(descriptor.plane_count()) {
        *plane = lock.plane(i);
    }
    let view = ImageView {
        format: descriptor.image_format,
        width,
        height,
        attributes: image.attributes,
        plane_count: descriptor.plane_count(),
        planes,
    };
    let copy = pool.materialize_copy(&view);
    drop(lock);
    copy
}

/// One plane of an [`OwnedImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPlane {
    pub data: Vec<u8>,
    pub stride: usize,
}

impl OwnedPlane {
    /// Row `y`, padding included.  `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.data.get(y * self.stride..(y + 1) * self.stride)
    }
}

/// An image in ordinary heap memory.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub attributes: FrameAttributes,
    pub planes: Vec<OwnedPlane>,
}

/// An [`ImagePool`] that allocates every image fresh on the heap.
#[derive(Debug, Default)]
pub struct HeapPool {
    allocations: usize,
    bytes: usize,
}

impl HeapPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Images materialized so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Bytes copied so far.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl ImagePool for HeapPool {
    type Image = OwnedImage;

    fn materialize_copy(&mut self, view: &ImageView<'_>) -> Option<OwnedImage> {
        let planes: Vec<OwnedPlane> = view
            .planes()
            .iter()
            .map(|p| OwnedPlane {
                data: p.as_bytes().to_vec(),
                stride: p.stride(),
            })
            .collect();
        self.allocations += 1;
        self.bytes += planes.iter().map(|p| p.data.len()).sum::<usize>();
        Some(OwnedImage {
            format: view.format,
            width: view.width,
            height: view.height,
            attributes: view.attributes,
            planes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::HwPixelFormat;
    use crate::testing::FakeFrame;

    #[test]
    fn non_hardware_images_are_ignored() {
        let frame = FakeFrame::new(HwPixelFormat::BGRA_32, 4, 4);
        let image = HwImage {
            format: ImageFormat::Rgb0,
            frame,
            attributes: FrameAttributes::default(),
        };
        let mut pool = HeapPool::new();
        assert!(download_image(&image, &mut pool).is_none());
        assert_eq!(image.frame.counters().locks(), 0);
    }

    #[test]
    fn copies_every_plane() {
        let frame = FakeFrame::new(HwPixelFormat::PLANAR_420, 8, 4);
        let image = HwImage::hardware(frame, FrameAttributes::default());
        let mut pool = HeapPool::new();
        let owned = download_image(&image, &mut pool).unwrap();
        assert_eq!(owned.format, ImageFormat::Yuv420p);
        assert_eq!(owned.planes.len(), 3);
        assert_eq!(owned.planes[1].data.len(), owned.planes[1].stride * 2);
        assert_eq!(pool.allocations(), 1);
        let c = image.frame.counters();
        assert_eq!(c.locks(), c.unlocks());
    }

    struct RefusingPool;
    impl ImagePool for RefusingPool {
        type Image = ();
        fn materialize_copy(&mut self, _view: &ImageView<'_>) -> Option<()> {
            None
        }
    }

    #[test]
    fn pool_failure_still_unlocks() {
        let image = HwImage::hardware(
            FakeFrame::new(HwPixelFormat::BGRA_32, 4, 4),
            FrameAttributes::default(),
        );
        assert!(download_image(&image, &mut RefusingPool).is_none());
        let c = image.frame.counters();
        assert_eq!((c.locks(), c.unlocks()), (1, 1));
    }
}
