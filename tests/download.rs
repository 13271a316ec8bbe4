// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The CPU readback path: lock, view, copy, unlock.

#![cfg(feature = "testing")]

use hwdec_interop::download::{HeapPool, download_image};
use hwdec_interop::formats::{HwPixelFormat, ImageFormat};
use hwdec_interop::frame::{
    ColorInfo, ColorMatrix, ColorPrimaries, ColorRange, FrameAttributes, HwImage,
};
use hwdec_interop::testing::FakeFrame;

fn attributes() -> FrameAttributes {
    FrameAttributes {
        pts: Some(12.5),
        duration: Some(1.0 / 24.0),
        color: ColorInfo {
            matrix: ColorMatrix::Bt709,
            range: ColorRange::Limited,
            primaries: ColorPrimaries::Bt709,
        },
        rotate: 90,
    }
}

#[test]
fn unrecognized_format_returns_none_and_unlocks() {
    let frame = FakeFrame::new(HwPixelFormat::from_fourcc(*b"v210"), 16, 16);
    let image = HwImage::hardware(frame, attributes());
    let mut pool = HeapPool::new();

    assert!(download_image(&image, &mut pool).is_none());

    let counters = image.frame.counters();
    assert_eq!(counters.locks(), 1);
    assert_eq!(counters.unlocks(), 1);
    assert_eq!(pool.allocations(), 0);
}

#[test]
fn lock_failure_returns_none() {
    let frame = FakeFrame::new(HwPixelFormat::BGRA_32, 16, 16).with_lock_failure();
    let image = HwImage::hardware(frame, attributes());
    assert!(download_image(&image, &mut HeapPool::new()).is_none());
    assert_eq!(image.frame.counters().unlocks(), 0);
}

#[test]
fn nv12_copy_matches_source_bytes() {
    let frame = FakeFrame::new(HwPixelFormat::BIPLANAR_420_VIDEO, 20, 10);
    let image = HwImage::hardware(frame, attributes());
    let mut pool = HeapPool::new();

    let owned = download_image(&image, &mut pool).unwrap();

    assert_eq!(owned.format, ImageFormat::Nv12);
    assert_eq!((owned.width, owned.height), (20, 10));
    assert_eq!(owned.planes.len(), 2);
    //fake frames fill byte (x, y) of plane p with p * 64 + y + x
    let luma = &owned.planes[0];
    assert_eq!(luma.row(3).unwrap()[5], 8);
    let chroma = &owned.planes[1];
    assert_eq!(chroma.data.len(), chroma.stride * 5);
    assert_eq!(chroma.row(2).unwrap()[1], 64 + 2 + 1);
    assert!(chroma.row(5).is_none());
    assert_eq!(pool.bytes(), luma.data.len() + chroma.data.len());

    let counters = image.frame.counters();
    assert_eq!(counters.locks(), counters.unlocks());
    //the copy doesn't hold on to the buffer
    assert_eq!(counters.outstanding(), 1);
}

#[test]
fn attributes_are_carried_over() {
    let frame = FakeFrame::new(HwPixelFormat::PACKED_422, 8, 8);
    let image = HwImage::hardware(frame, attributes());
    let owned = download_image(&image, &mut HeapPool::new()).unwrap();
    assert_eq!(owned.format, ImageFormat::Uyvy);
    assert_eq!(owned.attributes, attributes());
}

#[test]
fn live_buffer_format_wins_over_stale_metadata() {
    //negotiated as NV12, but the decoder switched to BGRA mid-stream
    let frame = FakeFrame::new(HwPixelFormat::BGRA_32, 8, 4);
    let image = HwImage::hardware(frame, FrameAttributes::default());
    let owned = download_image(&image, &mut HeapPool::new()).unwrap();
    assert_eq!(owned.format, ImageFormat::Rgb0);
    assert_eq!(owned.planes.len(), 1);
    assert_eq!(owned.planes[0].stride, 32);
}

#[test]
fn repeated_downloads_balance_locks() {
    let frame = FakeFrame::new(HwPixelFormat::PLANAR_420, 8, 8);
    let image = HwImage::hardware(frame, FrameAttributes::default());
    let mut pool = HeapPool::new();
    for _ in 0..3 {
        assert!(download_image(&image, &mut pool).is_some());
    }
    let counters = image.frame.counters();
    assert_eq!((counters.locks(), counters.unlocks()), (3, 3));
    assert_eq!(pool.allocations(), 3);
}
