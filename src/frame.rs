// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Hardware frames as the decoder hands them to us.
//!
//! A [`HardwareFrame`] is a reference-counted platform pixel buffer (a
//! `CVPixelBufferRef` on macOS).  Ownership is expressed with ordinary Rust
//! ownership: `Clone` retains the buffer and `Drop` releases it, so a
//! retained frame is simply a frame value someone holds on to.
//!
//! Frames eligible for zero-copy import are backed by a [`SharedSurface`].
//! For the CPU path, [`ReadLock`] locks the backing memory for reading and
//! unlocks it when dropped, whichever way the caller leaves.

use crate::formats::{HwPixelFormat, ImageFormat};
use std::marker::PhantomData;

/// An OS-level surface whose planes can back GPU textures directly.
pub trait SharedSurface {
    fn plane_width(&self, plane: usize) -> u32;
    fn plane_height(&self, plane: usize) -> u32;
}

/// A decoder-produced pixel buffer.
///
/// Cloning must retain the underlying buffer and dropping must release it.
///
/// # Safety
///
/// Between a successful [`HardwareFrame::lock_read`] and the matching
/// [`HardwareFrame::unlock_read`], for every plane `i < plane_count()` (or
/// plane 0 of a non-planar frame), `plane_base_address(i)` must point to at
/// least `plane_stride(i) * plane_rows(i)` readable bytes that stay valid
/// and unmodified until unlock.
pub unsafe trait HardwareFrame: Clone {
    type Surface: SharedSurface;

    /// The native pixel format, queried live from the buffer.
    fn pixel_format(&self) -> HwPixelFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn is_planar(&self) -> bool;
    /// Number of planes; 0 for non-planar buffers.
    fn plane_count(&self) -> usize;

    /// The backing shared surface, if the buffer came from a shareable pool.
    fn surface(&self) -> Option<&Self::Surface>;

    /// Locks the backing memory read-only.  Returns false if it can't.
    fn lock_read(&self) -> bool;
    fn unlock_read(&self);

    fn plane_base_address(&self, plane: usize) -> *const u8;
    fn plane_stride(&self, plane: usize) -> usize;
    fn plane_rows(&self, plane: usize) -> usize;
}

/// Color matrix of the YUV data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMatrix {
    #[default]
    Auto,
    Bt601,
    Bt709,
    Bt2020,
    Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorRange {
    #[default]
    Auto,
    Limited,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPrimaries {
    #[default]
    Auto,
    Bt601,
    Bt709,
    Bt2020,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorInfo {
    pub matrix: ColorMatrix,
    pub range: ColorRange,
    pub primaries: ColorPrimaries,
}

/// Per-frame metadata carried along when a frame is copied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameAttributes {
    /// Presentation timestamp in seconds.
    pub pts: Option<f64>,
    pub duration: Option<f64>,
    pub color: ColorInfo,
    /// Clockwise rotation in degrees.
    pub rotate: u16,
}

/// A frame as seen by the rest of the player.
///
/// `format` is [`ImageFormat::VideoToolbox`] while the pixels still live in
/// `frame` and have not been classified.
#[derive(Debug, Clone)]
pub struct HwImage<F> {
    pub format: ImageFormat,
    pub frame: F,
    pub attributes: FrameAttributes,
}

impl<F> HwImage<F> {
    pub fn hardware(frame: F, attributes: FrameAttributes) -> Self {
        HwImage {
            format: ImageFormat::VideoToolbox,
            frame,
            attributes,
        }
    }
}

/// Read access to one plane of a locked frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'l> {
    base: *const u8,
    stride: usize,
    rows: usize,
    _lock: PhantomData<&'l ()>,
}

impl PlaneView<'static> {
    pub(crate) const EMPTY: PlaneView<'static> = PlaneView {
        base: std::ptr::null(),
        stride: 0,
        rows: 0,
        _lock: PhantomData,
    };
}

impl<'l> PlaneView<'l> {
    pub fn base(&self) -> *const u8 {
        self.base
    }

    /// Bytes per row, including padding.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_null() || self.stride == 0 || self.rows == 0
    }

    /// The whole plane, padding included.
    pub fn as_bytes(&self) -> &'l [u8] {
        if self.is_empty() {
            return &[];
        }
        //safe because the lock this view borrows from keeps stride * rows bytes valid
        //(HardwareFrame's safety contract)
        unsafe { std::slice::from_raw_parts(self.base, self.stride * self.rows) }
    }

    /// Row `y`, padding included.  `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&'l [u8]> {
        if y >= self.rows {
            return None;
        }
        self.as_bytes().get(y * self.stride..(y + 1) * self.stride)
    }
}

/// A read lock on a frame's backing memory.  Unlocks on drop.
#[derive(Debug)]
pub struct ReadLock<'f, F: HardwareFrame> {
    frame: &'f F,
}

impl<'f, F: HardwareFrame> ReadLock<'f, F> {
    pub fn acquire(frame: &'f F) -> Option<Self> {
        if frame.lock_read() {
            Some(ReadLock { frame })
        } else {
            None
        }
    }

    pub fn frame(&self) -> &'f F {
        self.frame
    }

    /// A view of `plane`, valid while this lock is held.
    pub fn plane(&self, plane: usize) -> PlaneView<'_> {
        PlaneView {
            base: self.frame.plane_base_address(plane),
            stride: self.frame.plane_stride(plane),
            rows: self.frame.plane_rows(plane),
            _lock: PhantomData,
        }
    }
}

impl<F: HardwareFrame> Drop for ReadLock<'_, F> {
    fn drop(&mut self) {
        self.frame.unlock_read();
    }
}
