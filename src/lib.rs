/*! hwdec_interop gets hardware-decoded video frames onto the GPU.

A hardware decoder hands out opaque, reference-counted pixel buffers.  This crate turns them
into something a renderer can draw, in one of two ways:

| Path      | Entry point                              | Copies pixels | Produces                               |
|-----------|------------------------------------------|---------------|----------------------------------------|
| Zero-copy | [`importer::ImportSession::import`]      | No            | One texture per plane, plus swizzles   |
| Readback  | [`download::download_image`]             | Once          | An owned image from an [`download::ImagePool`] |

Both paths classify the frame through the same small registry ([`formats`]).  Each entry maps a
native pixel format to an internal [`formats::ImageFormat`] and to the exact sampling parameters
of every plane.  A wrong entry doesn't crash; it shows wrong colors, which is why the table is
tested structurally.

# Collaborators

The crate owns none of the platform objects it touches.  They come in through traits:

- [`context::GraphicsContext`]: texture names and surface binding on a current GL context.
- [`frame::HardwareFrame`] and [`frame::SharedSurface`]: the decoder's pixel buffer and the
  OS surface behind it.  `Clone` retains a buffer, `Drop` releases it.
- [`download::ImagePool`]: whatever allocates CPU images.

# Lifecycle

```text
setup ──► capability check ──► allocate textures ──► import / download per frame ──► teardown
```

Setup fails with [`Error::UnsupportedContext`] when the context can't do rectangle textures or
isn't current.  Stream setup goes through [`negotiate::reinit`], which swaps the opaque hardware
tag for the real format so the renderer prepares for planes it can sample.

Everything is synchronous and single-threaded.  Sessions are confined to the thread that owns
the graphics context.

# Backends

With `backend_wgpu` (on by default), registry plane formats convert to `wgpu::TextureFormat`
so a wgpu renderer can allocate matching textures for readback output.
*/

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

logwise::declare_logging_domain!();

pub mod config;
pub mod context;
pub mod download;
mod error;
pub mod formats;
pub mod frame;
mod imp;
pub mod importer;
pub mod negotiate;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{
    BindError, ContextProblem, Error, FormatQuery, PartialBindFailure, PlaneBindError,
};
