// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Zero-copy import of hardware frames into textures.

An [`ImportSession`] owns one texture name per possible plane.  Each
[`ImportSession::import`] rebinds those textures to the planes of the new
frame's shared surface and hands back a [`MappedFrame`] describing what the
renderer should sample: texture, target, plane size and swizzle.

The session also keeps the most recently imported frame alive.  The
textures reference that frame's surface, so the buffer must not go back to
the decoder's pool while it's on screen.

# Partial failure

If one plane fails to bind, the rest are still bound and the import
succeeds with a [`PartialBindFailure`] warning.  A degraded frame beats a
dropped one during playback.  Only when no plane binds at all does import
fail with [`Error::BindFailed`].

# Examples

```
use hwdec_interop::config::InteropConfig;
use hwdec_interop::formats::HwPixelFormat;
use hwdec_interop::importer::ImportSession;
use hwdec_interop::testing::{FakeContext, FakeFrame};

let gl = FakeContext::new();
let mut session = ImportSession::<_, FakeFrame>::setup(&gl, &InteropConfig::default()).unwrap();

let frame = FakeFrame::new(HwPixelFormat::PLANAR_420, 64, 32);
let mapped = session.import(&frame).unwrap();
assert_eq!(mapped.planes().count(), 3);
assert_eq!(mapped.plane(1).unwrap().width, 32);

session.teardown();
```
*/

use crate::config::InteropConfig;
use crate::context::{GraphicsContext, TextureHandle, TextureTarget, check_context};
use crate::error::{Error, FormatQuery, PartialBindFailure, PlaneBindError};
use crate::formats::{FormatDescriptor, ImageFormat, MAX_PLANES, Swizzle, lookup_by_hw_format};
use crate::frame::{HardwareFrame, SharedSurface};
use logwise::privacy::LogIt;
use std::marker::PhantomData;

/// Where a session is in its life.
///
/// There's no `Destroyed` state to observe: [`ImportSession::teardown`]
/// consumes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Textures allocated, nothing imported yet.
    Ready,
    /// Textures currently back the retained frame's planes.
    Bound,
}

/// One bound plane, ready to be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedPlane {
    pub texture: TextureHandle,
    pub target: TextureTarget,
    /// Plane width in texels.  Subsampled chroma planes are narrower than the frame.
    pub width: u32,
    pub height: u32,
    pub swizzle: Swizzle,
}

/// The result of importing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedFrame {
    pub image_format: ImageFormat,
    plane_count: usize,
    planes: [Option<MappedPlane>; MAX_PLANES],
    warning: Option<PartialBindFailure>,
}

impl MappedFrame {
    /// The number of planes the frame's format has, bound or not.
    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    /// `None` for planes past the format's count and for planes that failed to bind.
    pub fn plane(&self, index: usize) -> Option<&MappedPlane> {
        self.planes.get(index).and_then(|p| p.as_ref())
    }

    /// The planes that were bound, in plane order.
    pub fn planes(&self) -> impl Iterator<Item = &MappedPlane> {
        self.planes[..self.plane_count].iter().flatten()
    }

    /// Set when some, but not all, planes failed to bind.
    pub fn warning(&self) -> Option<&PartialBindFailure> {
        self.warning.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Imports that succeeded, including partial ones.
    pub imported: u64,
    /// Successful imports that carried a [`PartialBindFailure`].
    pub partial: u64,
    /// Imports that returned an error.
    pub rejected: u64,
}

impl ImportStats {
    pub fn attempted(&self) -> u64 {
        self.imported + self.rejected
    }

    /// Percentage (0-100) of attempts that produced all planes.
    ///
    /// 0 before anything was attempted.
    pub fn complete_percentage(&self) -> f64 {
        if self.attempted() == 0 {
            return 0.0;
        }
        (self.imported - self.partial) as f64 / self.attempted() as f64 * 100.0
    }
}

/// Per-context zero-copy import state.
///
/// Borrows the graphics context for its whole life and must stay on the
/// thread where that context is current.
pub struct ImportSession<'c, C, F>
where
    C: GraphicsContext,
    F: HardwareFrame<Surface = C::Surface>,
{
    gl: &'c C,
    textures: [TextureHandle; MAX_PLANES],
    frame: Option<F>,
    state: SessionState,
    stats: ImportStats,
    debug_name: String,
    //GL objects are confined to the context's thread
    _not_send: PhantomData<*const ()>,
}

impl<'c, C, F> ImportSession<'c, C, F>
where
    C: GraphicsContext,
    F: HardwareFrame<Surface = C::Surface>,
{
    /// Checks the context and allocates the session's textures.
    pub fn setup(gl: &'c C, config: &InteropConfig<'_>) -> Result<Self, Error> {
        check_context(gl)?;
        let mut textures = [TextureHandle(0); MAX_PLANES];
        gl.gen_textures(&mut textures);
        logwise::info_sync!(
            "{name}: import session ready with {count} textures",
            name = LogIt(config.debug_name),
            count = MAX_PLANES
        );
        Ok(ImportSession {
            gl,
            textures,
            frame: None,
            state: SessionState::Ready,
            stats: ImportStats::default(),
            debug_name: config.debug_name.to_owned(),
            _not_send: PhantomData,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    pub fn textures(&self) -> &[TextureHandle; MAX_PLANES] {
        &self.textures
    }

    /// The frame whose surface the textures currently reference.
    pub fn retained_frame(&self) -> Option<&F> {
        self.frame.as_ref()
    }

    /// Binds `frame`'s planes to this session's textures.
    ///
    /// On error nothing about the session changes: the previous frame stays
    /// retained and its bindings stay in place.  The one exception is
    /// [`Error::BindFailed`], which happens after the textures were already
    /// pointed at the new frame, so that frame is retained.
    pub fn import(&mut self, frame: &F) -> Result<MappedFrame, Error> {
        let result = self.map_frame(frame);
        match &result {
            Ok(mapped) => {
                self.stats.imported += 1;
                if !mapped.is_complete() {
                    self.stats.partial += 1;
                }
            }
            Err(_) => self.stats.rejected += 1,
        }
        result
    }

    fn classify(&self, frame: &F) -> Result<&'static FormatDescriptor, Error> {
        let hw_format = frame.pixel_format();
        let Some(descriptor) = lookup_by_hw_format(hw_format) else {
            logwise::error_sync!(
                "{name}: hardware frame has unsupported format {format}",
                name = LogIt(&self.debug_name),
                format = LogIt(&hw_format.to_string())
            );
            return Err(Error::UnsupportedFormat(FormatQuery::Hardware(hw_format)));
        };
        let expected = descriptor.plane_count();
        //single-plane formats may come from non-planar buffers, which report 0 planes
        if expected > 1 && !(frame.is_planar() && frame.plane_count() == expected) {
            logwise::error_sync!(
                "{name}: {format} frame reports {found} planes, expected {expected}",
                name = LogIt(&self.debug_name),
                format = LogIt(&hw_format.to_string()),
                found = frame.plane_count(),
                expected = expected
            );
            return Err(Error::PlaneLayoutMismatch {
                expected,
                found: frame.plane_count(),
                planar: frame.is_planar(),
            });
        }
        Ok(descriptor)
    }

    fn map_frame(&mut self, frame: &F) -> Result<MappedFrame, Error> {
        let Some(surface) = frame.surface() else {
            logwise::error_sync!(
                "{name}: hardware frame has no shared surface",
                name = LogIt(&self.debug_name)
            );
            return Err(Error::NoSharedSurface);
        };
        let descriptor = self.classify(frame)?;

        //release before retain, so at most one extra reference is ever alive
        drop(self.frame.take());
        self.frame = Some(frame.clone());

        let target = TextureTarget::Rectangle;
        let mut planes = [None; MAX_PLANES];
        let mut failures = PartialBindFailure::default();
        for (i, format) in descriptor.planes.iter().enumerate() {
            let texture = self.textures[i];
            let width = surface.plane_width(i);
            let height = surface.plane_height(i);

            self.gl.bind_texture(target, Some(texture));
            let bound = self
                .gl
                .bind_surface_plane(target, format, width, height, surface, i);
            self.gl.bind_texture(target, None);

            match bound {
                Ok(()) => {
                    planes[i] = Some(MappedPlane {
                        texture,
                        target,
                        width,
                        height,
                        swizzle: format.swizzle,
                    });
                }
                Err(error) => {
                    logwise::warn_sync!(
                        "{name}: error creating surface texture for plane {plane}: {error} (gl error {gl_error})",
                        name = LogIt(&self.debug_name),
                        plane = i,
                        error = LogIt(&error.to_string()),
                        gl_error = self.gl.last_error()
                    );
                    failures.planes.push(PlaneBindError { plane: i, error });
                }
            }
        }
        self.state = SessionState::Bound;

        if failures.planes.len() == descriptor.plane_count() {
            return Err(Error::BindFailed(failures));
        }
        logwise::trace_sync!(
            "{name}: imported {format} frame",
            name = LogIt(&self.debug_name),
            format = LogIt(&descriptor.image_format.to_string())
        );
        Ok(MappedFrame {
            image_format: descriptor.image_format,
            plane_count: descriptor.plane_count(),
            planes,
            warning: if failures.is_empty() {
                None
            } else {
                Some(failures)
            },
        })
    }

    /// Releases the retained frame and deletes the textures.
    ///
    /// Dropping the session does the same; this just makes the end explicit.
    pub fn teardown(self) {
        logwise::info_sync!(
            "{name}: tearing down import session",
            name = LogIt(&self.debug_name)
        );
    }
}

impl<C, F> Drop for ImportSession<'_, C, F>
where
    C: GraphicsContext,
    F: HardwareFrame<Surface = C::Surface>,
{
    fn drop(&mut self) {
        drop(self.frame.take());
        self.gl.delete_textures(&self.textures);
    }
}

impl<C, F> std::fmt::Debug for ImportSession<'_, C, F>
where
    C: GraphicsContext,
    F: HardwareFrame<Surface = C::Surface>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSession")
            .field("debug_name", &self.debug_name)
            .field("textures", &self.textures)
            .field("state", &self.state)
            .field("retains_frame", &self.frame.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
