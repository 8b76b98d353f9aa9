// Property tests: frame bounds, island bounds and normalizer idempotence
use image::Rgba;
use proptest::prelude::*;
use sprite_slicer::sprite_sheet::{
    FrameNormalizer, FrameRect, GridFrameSlicer, GridGeometry, IslandDetector, PixelBuffer, PixelRect,
};

fn painted_buffer(width: u32, height: u32, blobs: &[(u32, u32, u32, u32)]) -> PixelBuffer {
    let mut buffer = PixelBuffer::new_transparent(width, height);
    for &(x, y, w, h) in blobs {
        for py in y..(y + h).min(height) {
            for px in x..(x + w).min(width) {
                buffer.put(px, py, Rgba([(px % 255) as u8, (py % 255) as u8, 90, 255]));
            }
        }
    }
    buffer
}

proptest! {
    #[test]
    fn auto_divide_frames_stay_inside_buffer(
        width in 1u32..300,
        height in 1u32..300,
        rows in 1u32..9,
        cols in 1u32..9,
        padding in 0u32..4,
    ) {
        let geometry = GridGeometry::auto_divide(width, height, rows, cols, padding);
        let mut warnings = Vec::new();

        let frames = GridFrameSlicer::slice(&geometry, width, height, "p", &mut warnings);

        prop_assert_eq!(frames.len() + warnings.len(), (rows * cols) as usize);
        for frame in &frames {
            prop_assert!(frame.rect().fits_within(width, height), "{:?} in {}x{}", frame, width, height);
        }
    }

    #[test]
    fn auto_divide_without_padding_is_exact_up_to_one_pixel(
        width in 16u32..400,
        height in 16u32..400,
        rows in 1u32..5,
        cols in 1u32..5,
    ) {
        let geometry = GridGeometry::auto_divide(width, height, rows, cols, 0);
        let mut warnings = Vec::new();

        let frames = GridFrameSlicer::slice(&geometry, width, height, "p", &mut warnings);

        prop_assert_eq!(frames.len(), (rows * cols) as usize);
        for frame in &frames {
            prop_assert!(frame.width.abs_diff(width / cols) <= 1);
            prop_assert!(frame.height.abs_diff(height / rows) <= 1);
        }
    }

    #[test]
    fn custom_grid_frames_stay_inside_buffer(
        width in 1u32..256,
        height in 1u32..256,
        offset_x in -64.0f32..256.0,
        offset_y in -64.0f32..256.0,
        cell_w in 1.0f32..80.0,
        cell_h in 1.0f32..80.0,
        spacing in 0.0f32..12.0,
    ) {
        let geometry = GridGeometry {
            rows: 3,
            cols: 3,
            cell: (cell_w, cell_h),
            offset: (offset_x, offset_y),
            spacing: (spacing, spacing),
            inner_padding: 0,
            snap_edges: false,
        };
        let mut warnings = Vec::new();

        let frames = GridFrameSlicer::slice(&geometry, width, height, "p", &mut warnings);

        for frame in &frames {
            prop_assert!(frame.rect().fits_within(width, height));
        }
        if let Some(bounds) = geometry.selection_bounds(width, height) {
            prop_assert!(bounds.rect.fits_within(width, height));
        }
    }

    #[test]
    fn islands_stay_inside_buffer(
        blobs in prop::collection::vec((0u32..60, 0u32..60, 1u32..8, 1u32..8), 0..12),
        padding in 0u32..6,
        min_pixels in 1u32..16,
    ) {
        let buffer = painted_buffer(64, 64, &blobs);

        let islands = IslandDetector::new(0.5, min_pixels, padding).detect(&buffer);

        for island in &islands {
            prop_assert!(island.rect.fits_within(64, 64));
            prop_assert!(island.pixel_count >= min_pixels as usize);
        }
        prop_assert_eq!(islands.clone(), IslandDetector::new(0.5, min_pixels, padding).detect(&buffer));
    }

    #[test]
    fn normalizer_is_idempotent(
        rects in prop::collection::vec((0u32..56, 0u32..56, 1u32..9, 1u32..9), 1..10),
        columns in prop::option::of(1u32..5),
    ) {
        let buffer = painted_buffer(64, 64, &rects);
        let frames: Vec<FrameRect> = rects
            .iter()
            .enumerate()
            .map(|(i, &(x, y, w, h))| FrameRect::new(format!("f_{i:02}"), PixelRect::new(x, y, w, h)))
            .collect();

        let once = FrameNormalizer::normalize(&buffer, &frames, columns)
            .expect("small atlas")
            .expect("non-empty frames");
        let twice = FrameNormalizer::normalize(&once.buffer, &once.frames, columns)
            .expect("small atlas")
            .expect("non-empty frames");

        prop_assert_eq!(&once.buffer, &twice.buffer);
        prop_assert_eq!(&once.frames, &twice.frames);
        for frame in &once.frames {
            prop_assert!(frame.rect().fits_within(once.buffer.width(), once.buffer.height()));
        }
    }
}
