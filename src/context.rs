// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The graphics-context seam.

This crate never creates or owns a graphics context.  It borrows one through
[`GraphicsContext`], a deliberately small slice of GL: generate and delete
texture names, bind a texture, and bind one plane of a shared surface into
the bound texture (`CGLTexImageIOSurface2D` on macOS).

Contexts are not thread-safe.  Every call must come from the thread on which
the context is current, which is why [`crate::importer::ImportSession`] is
neither `Send` nor `Sync`.
*/

use crate::error::{BindError, ContextProblem, Error};
use crate::formats::PlaneFormat;
use crate::frame::SharedSurface;
use std::fmt::Display;

/// A GL version as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    pub major: u8,
    pub minor: u8,
}

impl GlVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        GlVersion { major, minor }
    }
}

impl Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Core rectangle textures arrived in GL 3.0.
pub const MIN_RECTANGLE_TEXTURE_VERSION: GlVersion = GlVersion::new(3, 0);

/// A texture name owned by an [`crate::importer::ImportSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Texture targets the import path binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    /// Non-normalized coordinates, any size.  Surfaces are bound here.
    Rectangle,
}

impl TextureTarget {
    pub const fn gl_enum(&self) -> u32 {
        match self {
            TextureTarget::Rectangle => 0x84F5,
                    }
    }
}

/// The GL operations the import path needs.
///
/// Methods take `&self`; implementations are thin wrappers over a function
/// table plus whatever interior state they keep.
pub trait GraphicsContext {
    /// The shared-surface type this context can bind.
    type Surface: SharedSurface;

    fn version(&self) -> GlVersion;

    /// Whether this context is current on the calling thread.
    fn is_current(&self) -> bool;

    fn gen_textures(&self, out: &mut [TextureHandle]);

    fn delete_textures(&self, textures: &[TextureHandle]);

    /// Binds `texture` to `target`, or unbinds the target when `None`.
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>);

    /// Backs the texture bound to `target` with `plane` of `surface`.
    ///
    /// `width` and `height` are the plane's own dimensions, which for
    /// subsampled chroma differ from the frame's.
    fn bind_surface_plane(
        &self,
        target: TextureTarget,
        format: &PlaneFormat,
        width: u32,
        height: u32,
        surface: &Self::Surface,
        plane: usize,
    ) -> Result<(), BindError>;

    /// The pending GL error, if any.  Only used to enrich log messages.
    fn last_error(&self) -> u32 {
        0
    }
}

/// Checks that `context` can host the zero-copy import path.
///
/// Both conditions are required: a GL with core rectangle textures, and the
/// context being current right now.
pub fn check_context<C: GraphicsContext>(context: &C) -> Result<(), Error> {
    let found = context.version();
    if found < MIN_RECTANGLE_TEXTURE_VERSION {
        let problem = ContextProblem::VersionTooOld {
            found,
            required: MIN_RECTANGLE_TEXTURE_VERSION,
        };
        logwise::error_sync!(
            "{problem}",
            problem = logwise::privacy::LogIt(&problem.to_string())
        );
        return Err(Error::UnsupportedContext(problem));
    }
    if !context.is_current() {
        logwise::error_sync!("need a current graphics context to bind shared surfaces");
        return Err(Error::UnsupportedContext(ContextProblem::NotCurrent));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeContext;

    #[test]
    fn accepts_current_gl3() {
        let gl = FakeContext::new();
        assert!(check_context(&gl).is_ok());
    }

    #[test]
    fn rejects_old_gl() {
        let gl = FakeContext::new().with_version(GlVersion::new(2, 1));
        match check_context(&gl) {
            Err(Error::UnsupportedContext(ContextProblem::VersionTooOld { found, required })) => {
                assert_eq!(found, GlVersion::new(2, 1));
                assert_eq!(required, MIN_RECTANGLE_TEXTURE_VERSION);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_non_current() {
        let gl = FakeContext::new().with_current(false);
        assert!(matches!(
            check_context(&gl),
            Err(Error::UnsupportedContext(ContextProblem::NotCurrent))
        ));
    }

    #[test]
    fn rejection_reads_as_text() {
        let gl = FakeContext::new().with_version(GlVersion::new(2, 1));
        let Err(Error::UnsupportedContext(problem)) = check_context(&gl) else {
            panic!("old context accepted");
        };
        assert_eq!(
            problem.to_string(),
            "need >= OpenGL 3.0 for core rectangle texture support, have 2.1"
        );
    }

    #[test]
    fn surfaces_bind_to_rectangle_textures() {
        assert_eq!(TextureTarget::Rectangle.gl_enum(), 0x84F5);
    }

    #[test]
    fn version_ordering() {
        assert!(GlVersion::new(2, 1) < GlVersion::new(3, 0));
        assert!(GlVersion::new(3, 2) > GlVersion::new(3, 0));
        assert_eq!(GlVersion::new(4, 1).to_string(), "4.1");
    }
}
