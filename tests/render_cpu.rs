use std::io::Cursor;
use std::path::{Path, PathBuf};

use memekit::{
    CanvasSnapshot, CaptureFormat, CaptureOptions, CpuRasterizer, FrameRGBA, GestureEvent,
    ImageUri, MemeError, Overlay, RasterSettings, Rasterizer, TextRenderer,
};

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "memekit_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(dir: &Path, name: &str, w: u32, h: u32, px: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.join(name), &buf).unwrap();
}

fn settings(dir: &Path) -> RasterSettings {
    RasterSettings {
        view_width: 40.0,
        pixel_ratio: 1.0,
        asset_root: dir.to_path_buf(),
        output_dir: dir.join("out"),
        image_overlay_size: 10.0,
        ..RasterSettings::default()
    }
}

fn scene(overlays: Vec<Overlay>) -> CanvasSnapshot {
    CanvasSnapshot {
        background_uri: ImageUri::new("bg.png"),
        aspect_ratio: memekit::AspectRatio::new(4.0 / 3.0).unwrap(),
        overlays,
    }
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn fixture(name: &str) -> (PathBuf, CpuRasterizer) {
    let dir = temp_dir(name);
    write_png(&dir, "bg.png", 4, 3, WHITE);
    write_png(&dir, "blue.png", 2, 2, BLUE);
    let r = CpuRasterizer::new(settings(&dir)).unwrap();
    (dir, r)
}

#[test]
fn background_fills_canvas_at_aspect() {
    let (dir, mut r) = fixture("bg_only");
    let frame = r.render(&scene(vec![])).unwrap();
    assert_eq!((frame.width, frame.height), (40, 30));
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|p| p == WHITE));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn image_overlay_starts_top_centre() {
    let (dir, mut r) = fixture("overlay_default");
    let frame = r
        .render(&scene(vec![Overlay::image(ImageUri::new("blue.png"))]))
        .unwrap();
    assert_eq!(px(&frame, 15, 0), BLUE);
    assert_eq!(px(&frame, 24, 9), BLUE);
    assert_eq!(px(&frame, 14, 0), WHITE);
    assert_eq!(px(&frame, 25, 0), WHITE);
    assert_eq!(px(&frame, 15, 10), WHITE);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn pan_moves_and_pinch_scales_about_centre() {
    let (dir, mut r) = fixture("overlay_transform");

    let mut moved = Overlay::image(ImageUri::new("blue.png"));
    moved.transform.apply(GestureEvent::Pan { dx: 5.0, dy: 10.0 });
    let frame = r.render(&scene(vec![moved])).unwrap();
    assert_eq!(px(&frame, 20, 10), BLUE);
    assert_eq!(px(&frame, 29, 19), BLUE);
    assert_eq!(px(&frame, 19, 10), WHITE);
    assert_eq!(px(&frame, 15, 0), WHITE);

    let mut scaled = Overlay::image(ImageUri::new("blue.png"));
    scaled.transform.apply(GestureEvent::Pinch { scale: 2.0 });
    let frame = r.render(&scene(vec![scaled])).unwrap();
    assert_eq!(px(&frame, 10, 0), BLUE);
    assert_eq!(px(&frame, 29, 14), BLUE);
    assert_eq!(px(&frame, 9, 0), WHITE);
    assert_eq!(px(&frame, 30, 14), WHITE);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn later_overlays_paint_over_earlier_ones() {
    let dir = temp_dir("paint_order");
    write_png(&dir, "bg.png", 4, 3, WHITE);
    write_png(&dir, "blue.png", 2, 2, BLUE);
    write_png(&dir, "red.png", 2, 2, [255, 0, 0, 255]);
    let mut r = CpuRasterizer::new(settings(&dir)).unwrap();

    let frame = r
        .render(&scene(vec![
            Overlay::image(ImageUri::new("blue.png")),
            Overlay::image(ImageUri::new("red.png")),
        ]))
        .unwrap();
    assert_eq!(px(&frame, 20, 5), [255, 0, 0, 255]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn capture_writes_numbered_files_at_device_resolution() {
    let dir = temp_dir("capture_files");
    write_png(&dir, "bg.png", 4, 3, WHITE);
    let mut r = CpuRasterizer::new(RasterSettings {
        pixel_ratio: 2.0,
        ..settings(&dir)
    })
    .unwrap();

    let opts = CaptureOptions::default();
    let first = r.capture(&scene(vec![]), &opts).unwrap();
    let second = r.capture(&scene(vec![]), &opts).unwrap();
    assert!(first.as_str().ends_with("generated-1.jpg"));
    assert!(second.as_str().ends_with("generated-2.jpg"));

    let path = first.to_path(&dir).unwrap();
    assert_eq!(image::image_dimensions(&path).unwrap(), (80, 60));

    let png = r
        .capture(
            &scene(vec![]),
            &CaptureOptions {
                format: CaptureFormat::Png,
                file_name: "still".to_string(),
                ..CaptureOptions::default()
            },
        )
        .unwrap();
    let decoded = image::open(png.to_path(&dir).unwrap()).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn transparent_background_flattens_onto_matte() {
    let dir = temp_dir("matte");
    write_png(&dir, "bg.png", 4, 3, [0, 0, 0, 0]);
    let mut r = CpuRasterizer::new(RasterSettings {
        matte_rgb: [10, 20, 30],
        ..settings(&dir)
    })
    .unwrap();
    let opts = CaptureOptions {
        format: CaptureFormat::Png,
        ..CaptureOptions::default()
    };
    let uri = r.capture(&scene(vec![]), &opts).unwrap();
    let decoded = image::open(uri.to_path(&dir).unwrap()).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(3, 3).0, [10, 20, 30]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_assets_fail_the_capture() {
    let dir = temp_dir("missing");
    let mut r = CpuRasterizer::new(settings(&dir)).unwrap();
    let err = r
        .capture(&scene(vec![]), &CaptureOptions::default())
        .unwrap_err();
    assert!(matches!(err, MemeError::Capture(_)));

    write_png(&dir, "bg.png", 4, 3, WHITE);
    let err = r
        .capture(
            &scene(vec![Overlay::image(ImageUri::new("nope.png"))]),
            &CaptureOptions::default(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("nope.png"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn text_overlays_are_skipped_without_a_font() {
    let (dir, mut r) = fixture("text_no_font");
    let frame = r.render(&scene(vec![Overlay::text(1, "hello")])).unwrap();
    assert!(frame.data.chunks_exact(4).all(|p| p == WHITE));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn text_overlays_draw_dark_ink_near_the_top() {
    let font = Path::new(SYSTEM_FONT);
    if !font.exists() {
        eprintln!("skipping: {SYSTEM_FONT} not present");
        return;
    }
    let dir = temp_dir("text_font");
    write_png(&dir, "bg.png", 4, 3, WHITE);
    let mut r = CpuRasterizer::new(RasterSettings {
        view_width: 360.0,
        ..settings(&dir)
    })
    .unwrap()
    .with_text_renderer(TextRenderer::from_file(font).unwrap());

    let frame = r.render(&scene(vec![Overlay::text(1, "MEME")])).unwrap();
    let dark_rows: Vec<u32> = (0..frame.height)
        .filter(|&y| (0..frame.width).any(|x| px(&frame, x, y)[0] < 64))
        .collect();
    assert!(!dark_rows.is_empty());
    assert!(dark_rows.iter().all(|&y| y < 60));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn extreme_background_aspect_is_rejected_without_allocating() {
    let dir = temp_dir("tall_bg");
    write_png(&dir, "tall.png", 1, 200_000, WHITE);
    let probe = memekit::FsAspectProbe::new(dir.clone());
    let aspect = memekit::AspectProbe::aspect_ratio(&probe, &ImageUri::new("tall.png")).unwrap();
    let mut r = CpuRasterizer::new(RasterSettings {
        pixel_ratio: 2.0,
        view_width: 360.0,
        ..settings(&dir)
    })
    .unwrap();
    let tall = CanvasSnapshot {
        background_uri: ImageUri::new("tall.png"),
        aspect_ratio: aspect,
        overlays: vec![],
    };

    assert!(matches!(r.render(&tall), Err(MemeError::Validation(_))));
    let err = r.capture(&tall, &CaptureOptions::default()).unwrap_err();
    assert!(matches!(err, MemeError::Capture(_)));
    assert!(!dir.join("out").join("generated-1.jpg").exists());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn edited_assets_are_reloaded_on_the_next_render() {
    let (dir, mut r) = fixture("reload");
    let frame = r.render(&scene(vec![])).unwrap();
    assert_eq!(px(&frame, 0, 0), WHITE);

    write_png(&dir, "bg.png", 4, 3, BLUE);
    let frame = r.render(&scene(vec![])).unwrap();
    assert_eq!(px(&frame, 0, 0), BLUE);
    std::fs::remove_dir_all(&dir).ok();
}
