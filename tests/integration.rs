use classic_bg_removal::{
    edges, grayscale, mask, segmentation, BackgroundRemover, Error, NoProgress, RemovalOptions,
};
use image::{Rgba, RgbaImage};

fn alpha(img: &RgbaImage) -> Vec<u8> {
    img.pixels().map(|px| px[3]).collect()
}

/// 5x5 dark field with one bright pixel in the centre.
fn bright_dot() -> RgbaImage {
    RgbaImage::from_fn(5, 5, |x, y| {
        if x == 2 && y == 2 {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([20, 20, 20, 255])
        }
    })
}

#[test]
fn uniform_image_becomes_fully_transparent() {
    let remover = BackgroundRemover::default();
    let mut img = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));

    let gray = grayscale::to_grayscale(&img);
    assert!(edges::sobel_edges(&gray, 4, 4).iter().all(|&e| e == 0));
    let samples = segmentation::sample_background(&img, 4, 4);
    assert!(segmentation::segment_foreground(&img, &samples, 30.0)
        .iter()
        .all(|&m| m == 0));

    remover.remove(&mut img, &mut NoProgress).unwrap();
    assert!(alpha(&img).iter().all(|&a| a == 0));
    assert!(img.pixels().all(|px| px.0[..3] == [128, 128, 128]));
}

#[test]
fn strong_edges_keep_background_colored_pixels() {
    let img = bright_dot();
    let gray = grayscale::to_grayscale(&img);
    let edge_map = edges::sobel_edges(&gray, 5, 5);
    let samples = segmentation::sample_background(&img, 5, 5);
    let foreground = segmentation::segment_foreground(&img, &samples, 30.0);
    let combined = mask::combine_masks(&edge_map, &foreground, 30);

    for y in 1..4 {
        for x in 1..4 {
            let i = y * 5 + x;
            if (x, y) != (2, 2) {
                assert_eq!(foreground[i], 0, "({x}, {y}) matches the background color");
                assert!(edge_map[i] > 30, "({x}, {y}) sits on the dot outline");
                assert_eq!(combined[i], 255);
            }
        }
    }
    assert_eq!(foreground[12], 255);
    assert_eq!(combined[12], 255);
}

#[test]
fn bright_dot_final_alpha() {
    let remover = BackgroundRemover::default();
    let mut img = bright_dot();
    remover.remove(&mut img, &mut NoProgress).unwrap();

    #[rustfmt::skip]
    let expected = vec![
        0,   0,   0,   0, 0,
        0, 255, 255, 255, 0,
        0, 255,   0, 255, 0,
        0, 255, 255, 255, 0,
        0,   0,   0,   0, 0,
    ];
    // The centre has only 9 opaque pixels in its 5x5 window and is eroded;
    // the ring lies within the refinement radius of the border.
    assert_eq!(alpha(&img), expected);
}

#[test]
fn disabling_refinement_keeps_the_dot() {
    let options = RemovalOptions {
        refine_density: 0.0,
        ..RemovalOptions::default()
    };
    let remover = BackgroundRemover::new(options).unwrap();
    let mut img = bright_dot();
    remover.remove(&mut img, &mut NoProgress).unwrap();
    assert_eq!(img.get_pixel(2, 2)[3], 255);
}

#[test]
fn tiny_images_run_without_panicking() {
    let remover = BackgroundRemover::default();

    let mut single = RgbaImage::from_pixel(1, 1, Rgba([200, 10, 10, 255]));
    let samples = segmentation::sample_background(&single, 1, 1);
    assert_eq!(samples.len(), 8);
    remover.remove(&mut single, &mut NoProgress).unwrap();
    assert_eq!(single.get_pixel(0, 0)[3], 0);

    let mut quad = RgbaImage::from_fn(2, 2, |x, y| {
        Rgba([
            u8::try_from(x * 200).unwrap(),
            u8::try_from(y * 200).unwrap(),
            90,
            255,
        ])
    });
    remover.remove(&mut quad, &mut NoProgress).unwrap();
    // Every pixel is a corner sample, so all of them match the background.
    assert!(alpha(&quad).iter().all(|&a| a == 0));
}

#[test]
fn square_on_plain_backdrop() {
    let remover = BackgroundRemover::default();
    let mut img = RgbaImage::from_fn(20, 20, |x, y| {
        if (5..15).contains(&x) && (5..15).contains(&y) {
            Rgba([250, 10, 10, 255])
        } else {
            Rgba([10, 10, 250, 255])
        }
    });
    remover.remove(&mut img, &mut NoProgress).unwrap();

    assert_eq!(img.get_pixel(10, 10)[3], 255, "square interior");
    assert_eq!(img.get_pixel(5, 10)[3], 255, "square edge");
    assert_eq!(img.get_pixel(1, 1)[3], 0, "backdrop");
    assert_eq!(img.get_pixel(17, 10)[3], 0, "backdrop");
    assert_eq!(img.get_pixel(4, 10)[3], 0, "thin outline outside the square");
}

#[test]
fn repeated_runs_are_identical() {
    let remover = BackgroundRemover::default();
    let source = RgbaImage::from_fn(32, 24, |x, y| {
        let v = (x * 31 + y * 17 + (x * y) % 7) % 256;
        let v = u8::try_from(v).unwrap();
        Rgba([v, v.wrapping_mul(3), 255 - v, 255])
    });

    let mut first = source.clone();
    let mut second = source.clone();
    remover.remove(&mut first, &mut NoProgress).unwrap();
    remover.remove(&mut second, &mut NoProgress).unwrap();
    assert_eq!(first, second);
}

#[test]
fn raw_buffer_with_wrong_length_is_rejected() {
    let remover = BackgroundRemover::default();
    let mut pixels = vec![0_u8; 4 * 4 * 4 - 1];
    let err = remover
        .remove_pixels(&mut pixels, 4, 4, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, Error::BufferSizeMismatch { .. }));

    let mut empty: Vec<u8> = Vec::new();
    let err = remover
        .remove_pixels(&mut empty, 0, 0, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDimensions { .. }));
}

#[test]
fn process_file_writes_png_with_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dot.png");
    let output = dir.path().join("out").join("dot_nobg.png");
    bright_dot().save(&input).unwrap();

    let remover = BackgroundRemover::default();
    let mut reported = Vec::new();
    let result = remover.process_file(&input, &output, &mut |p: u8| reported.push(p));
    assert!(result.success, "{}", result.message);
    assert_eq!(reported, vec![20, 40, 60, 80, 90, 100]);
    assert!((result.opaque_ratio - 8.0 / 25.0).abs() < 1e-6);

    let written = image::open(&output).unwrap().to_rgba8();
    assert_eq!(written.get_pixel(1, 1)[3], 255);
    assert_eq!(written.get_pixel(0, 0)[3], 0);
}

#[test]
fn process_file_reports_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"definitely not a png").unwrap();

    let mut reported = Vec::new();
    let result = BackgroundRemover::default().process_file(
        &input,
        &dir.path().join("x.png"),
        &mut |p: u8| reported.push(p),
    );
    assert!(!result.success);
    assert!(result.message.contains("decode"), "{}", result.message);
    assert!(reported.is_empty());
}

#[test]
fn process_file_rejects_oversized_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("huge.png");
    let len = usize::try_from(classic_bg_removal::MAX_INPUT_BYTES).unwrap() + 1;
    std::fs::write(&input, vec![0_u8; len]).unwrap();

    let result = BackgroundRemover::default().process_file(
        &input,
        &dir.path().join("x.png"),
        &mut NoProgress,
    );
    assert!(!result.success);
    assert!(result.message.contains("limit"), "{}", result.message);
}

#[test]
fn process_directory_handles_supported_files_only() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    bright_dot().save(input.path().join("a.png")).unwrap();
    RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 255]))
        .save(input.path().join("b.png"))
        .unwrap();
    std::fs::write(input.path().join("notes.txt"), b"skip me").unwrap();

    let results = BackgroundRemover::default().process_directory(input.path(), output.path());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert!(output.path().join("a_nobg.png").exists());
    assert!(output.path().join("b_nobg.png").exists());
}

#[test]
fn process_directory_keeps_same_stem_outputs_apart() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    bright_dot().save(input.path().join("shot.png")).unwrap();
    RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 255]))
        .save(input.path().join("shot.bmp"))
        .unwrap();

    let results = BackgroundRemover::default().process_directory(input.path(), output.path());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));

    let png = image::open(output.path().join("shot_png_nobg.png")).unwrap().to_rgba8();
    let bmp = image::open(output.path().join("shot_bmp_nobg.png")).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (5, 5));
    assert_eq!(bmp.dimensions(), (6, 6));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 2);
}

/// Rectangle, thin line and a lone speck on a slightly noisy backdrop.
fn mixed_scene() -> RgbaImage {
    RgbaImage::from_fn(12, 10, |x, y| {
        if (3..=8).contains(&x) && (2..=7).contains(&y) {
            Rgba([200, 40, 40, 255])
        } else if y == 8 && (1..=10).contains(&x) {
            Rgba([220, 220, 30, 255])
        } else if (x, y) == (10, 2) {
            Rgba([10, 250, 10, 255])
        } else {
            let shade = u8::try_from((x + y) % 3 * 5).unwrap();
            Rgba([30 + shade, 60, 90, 255])
        }
    })
}

#[test]
fn mixed_scene_matches_known_alpha() {
    let remover = BackgroundRemover::default();
    let mut img = mixed_scene();
    remover.remove(&mut img, &mut NoProgress).unwrap();

    // Same bytes with and without the `parallel` feature.
    #[rustfmt::skip]
    let expected: Vec<u8> = vec![
        0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
        0,   0, 255, 255, 255, 255, 255, 255, 255, 255, 255,   0,
        0,   0,   0,   0, 255, 255, 255, 255, 255,   0, 255,   0,
        0,   0,   0, 255, 255, 255, 255, 255, 255, 255, 255,   0,
        0,   0,   0, 255, 255, 255, 255, 255, 255,   0,   0,   0,
        0,   0,   0, 255, 255, 255, 255, 255, 255,   0,   0,   0,
        0,   0,   0, 255, 255, 255, 255, 255, 255,   0,   0,   0,
        0, 255,   0, 255, 255, 255, 255, 255, 255,   0, 255,   0,
        0, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,   0,
        0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    ];
    assert_eq!(alpha(&img), expected);
}
