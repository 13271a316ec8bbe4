// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
In-memory stand-ins for the platform seams.

[`FakeContext`] records every GL call it receives, [`FakeFrame`] counts
retains, releases, locks and unlocks, and [`FakeSurface`] reports plane
sizes the way a real IOSurface would.  Used by this crate's own tests and
available to downstream tests with the `testing` feature.
*/

use crate::context::{GlVersion, GraphicsContext, TextureHandle, TextureTarget};
use crate::error::BindError;
use crate::formats::{HwPixelFormat, PlaneFormat};
use crate::frame::{HardwareFrame, SharedSurface};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A call made against a [`FakeContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    GenTextures(Vec<TextureHandle>),
    DeleteTextures(Vec<TextureHandle>),
    BindTexture(TextureTarget, Option<TextureHandle>),
    BindSurfacePlane {
        target: TextureTarget,
        /// Whatever texture was bound to `target` at the time.
        texture: Option<TextureHandle>,
        format: PlaneFormat,
        width: u32,
        height: u32,
        surface: u32,
        plane: usize,
    },
}

#[derive(Debug)]
pub struct FakeContext {
    version: GlVersion,
    current: bool,
    next_name: Cell<u32>,
    bound: Cell<Option<TextureHandle>>,
    failing_planes: RefCell<Vec<usize>>,
    calls: RefCell<Vec<GlCall>>,
}

impl Default for FakeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeContext {
    /// A current GL 3.2 context.
    pub fn new() -> Self {
        FakeContext {
            version: GlVersion::new(3, 2),
            current: true,
            next_name: Cell::new(1),
            bound: Cell::new(None),
            failing_planes: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_version(mut self, version: GlVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_current(mut self, current: bool) -> Self {
        self.current = current;
        self
    }

    /// Makes every later surface bind of `plane` fail.
    pub fn fail_plane(&self, plane: usize) {
        self.failing_planes.borrow_mut().push(plane);
    }

    pub fn clear_failures(&self) {
        self.failing_planes.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Just the surface binds, in order.
    pub fn surface_binds(&self) -> Vec<GlCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, GlCall::BindSurfacePlane { .. }))
            .cloned()
            .collect()
    }

    pub fn bound_texture(&self) -> Option<TextureHandle> {
        self.bound.get()
    }
}

impl GraphicsContext for FakeContext {
    type Surface = FakeSurface;

    fn version(&self) -> GlVersion {
        self.version
    }

    fn is_current(&self) -> bool {
        self.current
    }

    fn gen_textures(&self, out: &mut [TextureHandle]) {
        for slot in out.iter_mut() {
            *slot = TextureHandle(self.next_name.get());
            self.next_name.set(self.next_name.get() + 1);
        }
        self.calls
            .borrow_mut()
            .push(GlCall::GenTextures(out.to_vec()));
    }

    fn delete_textures(&self, textures: &[TextureHandle]) {
        self.calls
            .borrow_mut()
            .push(GlCall::DeleteTextures(textures.to_vec()));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.bound.set(texture);
        self.calls
            .borrow_mut()
            .push(GlCall::BindTexture(target, texture));
    }

    fn bind_surface_plane(
        &self,
        target: TextureTarget,
        format: &PlaneFormat,
        width: u32,
        height: u32,
        surface: &FakeSurface,
        plane: usize,
    ) -> Result<(), BindError> {
        self.calls.borrow_mut().push(GlCall::BindSurfacePlane {
            target,
            texture: self.bound.get(),
            format: *format,
            width,
            height,
            surface: surface.id,
            plane,
        });
        if self.failing_planes.borrow().contains(&plane) {
            //kCGLBadValue
            Err(BindError { code: 10015 })
        } else {
            Ok(())
        }
    }

    fn last_error(&self) -> u32 {
        if self.failing_planes.borrow().is_empty() {
            0
        } else {
            //GL_INVALID_OPERATION
            0x0502
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSurface {
    pub id: u32,
    /// Width and height of each plane.
    pub planes: Vec<(u32, u32)>,
}

impl SharedSurface for FakeSurface {
    fn plane_width(&self, plane: usize) -> u32 {
        self.planes.get(plane).map(|p| p.0).unwrap_or(0)
    }

    fn plane_height(&self, plane: usize) -> u32 {
        self.planes.get(plane).map(|p| p.1).unwrap_or(0)
    }
}

/// Something that happened to a [`FakeFrame`]'s buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    Retain(u32),
    Release(u32),
}

/// Shared record of retain/release events across several frames.
pub type EventLog = Rc<RefCell<Vec<FrameEvent>>>;

/// Counters shared by every clone of one [`FakeFrame`].
#[derive(Debug, Default)]
pub struct FrameCounters {
    retains: Cell<usize>,
    releases: Cell<usize>,
    locks: Cell<usize>,
    unlocks: Cell<usize>,
}

impl FrameCounters {
    pub fn retains(&self) -> usize {
        self.retains.get()
    }
    pub fn releases(&self) -> usize {
        self.releases.get()
    }
    pub fn locks(&self) -> usize {
        self.locks.get()
    }
    pub fn unlocks(&self) -> usize {
        self.unlocks.get()
    }
    /// References still held, counting the one the frame was created with.
    pub fn outstanding(&self) -> usize {
        1 + self.retains.get() - self.releases.get()
    }
}

#[derive(Debug)]
struct FakePlane {
    bytes: Vec<u8>,
    stride: usize,
    rows: usize,
}

#[derive(Debug)]
struct FrameInner {
    id: u32,
    format: HwPixelFormat,
    width: u32,
    height: u32,
    planar: bool,
    plane_count: usize,
    surface: Option<FakeSurface>,
    planes: Vec<FakePlane>,
    lock_fails: bool,
    counters: FrameCounters,
    log: Option<EventLog>,
}

/// A reference-counted fake pixel buffer.
#[derive(Debug)]
pub struct FakeFrame {
    inner: Rc<FrameInner>,
}

const STRIDE_ALIGN: usize = 16;

fn padded(bytes_per_row: usize) -> usize {
    bytes_per_row.div_ceil(STRIDE_ALIGN) * STRIDE_ALIGN
}

impl FakeFrame {
    /// A frame laid out the way the decoder would lay out `format`.
    ///
    /// Every byte is `plane * 64 + row + column` (wrapping), which makes
    /// copies easy to check.
    pub fn new(format: HwPixelFormat, width: u32, height: u32) -> Self {
        Self::with_id(format, width, height, 0)
    }

    pub fn with_id(format: HwPixelFormat, width: u32, height: u32, id: u32) -> Self {
        let (w, h) = (width, height);
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        // (plane width, plane height, bytes per pixel)
        let (planar, layout): (bool, Vec<(u32, u32, usize)>) = match format {
            HwPixelFormat::BIPLANAR_420_VIDEO => (true, vec![(w, h, 1), (cw, ch, 2)]),
            HwPixelFormat::PLANAR_420 => (true, vec![(w, h, 1), (cw, ch, 1), (cw, ch, 1)]),
            HwPixelFormat::PACKED_422 => (false, vec![(w, h, 2)]),
            _ => (false, vec![(w, h, 4)]),
        };
        let planes = layout
            .iter()
            .enumerate()
            .map(|(i, &(pw, ph, bpp))| {
                let stride = padded(pw as usize * bpp);
                let rows = ph as usize;
                let mut bytes = vec![0u8; stride * rows];
                for y in 0..rows {
                    for x in 0..stride {
                        bytes[y * stride + x] = (i * 64 + y + x) as u8;
                    }
                }
                FakePlane { bytes, stride, rows }
            })
            .collect();
        let surface = FakeSurface {
            id,
            planes: layout.iter().map(|&(pw, ph, _)| (pw, ph)).collect(),
        };
        FakeFrame {
            inner: Rc::new(FrameInner {
                id,
                format,
                width,
                height,
                planar,
                plane_count: if planar { layout.len() } else { 0 },
                surface: Some(surface),
                planes,
                lock_fails: false,
                counters: FrameCounters::default(),
                log: None,
            }),
        }
    }

    fn modify(mut self, f: impl FnOnce(&mut FrameInner)) -> Self {
        let inner =
            Rc::get_mut(&mut self.inner).expect("configure a FakeFrame before cloning it");
        f(inner);
        self
    }

    /// Not allocated from a surface-shareable pool.
    pub fn without_surface(self) -> Self {
        self.modify(|i| i.surface = None)
    }

    /// Overrides what the buffer reports about its planes.
    pub fn reporting_planes(self, planar: bool, plane_count: usize) -> Self {
        self.modify(|i| {
            i.planar = planar;
            i.plane_count = plane_count;
        })
    }

    pub fn with_lock_failure(self) -> Self {
        self.modify(|i| i.lock_fails = true)
    }

    pub fn with_log(self, log: EventLog) -> Self {
        self.modify(|i| i.log = Some(log))
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn counters(&self) -> &FrameCounters {
        &self.inner.counters
    }

    fn record(&self, event: FrameEvent) {
        if let Some(log) = &self.inner.log {
            log.borrow_mut().push(event);
        }
    }
}

impl Clone for FakeFrame {
    fn clone(&self) -> Self {
        let c = &self.inner.counters;
        c.retains.set(c.retains.get() + 1);
        self.record(FrameEvent::Retain(self.inner.id));
        FakeFrame {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for FakeFrame {
    fn drop(&mut self) {
        let c = &self.inner.counters;
        c.releases.set(c.releases.get() + 1);
        self.record(FrameEvent::Release(self.inner.id));
    }
}

//safe because plane bytes live in an Rc'd, never-mutated Vec for as long as any clone exists
unsafe impl HardwareFrame for FakeFrame {
    type Surface = FakeSurface;

    fn pixel_format(&self) -> HwPixelFormat {
        self.inner.format
    }

    fn width(&self) -> u32 {
        self.inner.width
    }

    fn height(&self) -> u32 {
        self.inner.height
    }

    fn is_planar(&self) -> bool {
        self.inner.planar
    }

    fn plane_count(&self) -> usize {
        self.inner.plane_count
    }

    fn surface(&self) -> Option<&FakeSurface> {
        self.inner.surface.as_ref()
    }

    fn lock_read(&self) -> bool {
        if self.inner.lock_fails {
            return false;
        }
        let c = &self.inner.counters;
        c.locks.set(c.locks.get() + 1);
        true
    }

    fn unlock_read(&self) {
        let c = &self.inner.counters;
        c.unlocks.set(c.unlocks.get() + 1);
    }

    fn plane_base_address(&self, plane: usize) -> *const u8 {
        self.inner
            .planes
            .get(plane)
            .map(|p| p.bytes.as_ptr())
            .unwrap_or(std::ptr::null())
    }

    fn plane_stride(&self, plane: usize) -> usize {
        self.inner.planes.get(plane).map(|p| p.stride).unwrap_or(0)
    }

    fn plane_rows(&self, plane: usize) -> usize {
        self.inner.planes.get(plane).map(|p| p.rows).unwrap_or(0)
    }
}
