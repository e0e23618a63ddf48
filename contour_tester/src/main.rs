use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use contour_vision::core_modules::block_index::BlockIndex;
use contour_vision::core_modules::strip::strips_to_segments;
use contour_vision::core_modules::strip_codec::{StripCodec, legacy};
use contour_vision::{ContourPipeline, CoordWidth, LineSegment, PipelineConfig, PixelSampler, RgbaFrame};
use image::{Rgba, RgbaImage};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "contour_tester")]
#[command(about = "Trace PNG frames into strip files and render strip files back to PNG")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trace one PNG, or every PNG in a directory, into a single strip stream.
    #[command(name = "generate")]
    Generate(GenerateArgs),
    /// Draw frames of a strip stream into PNG images.
    #[command(name = "render")]
    Render(RenderArgs),
    /// Draw a fixed-record segment file into a PNG image.
    #[command(name = "legacy-render")]
    LegacyRender(LegacyRenderArgs),
}

#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// JSON file with pipeline settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    grey_threshold: Option<u8>,
    /// Cluster cutoff distance.
    #[arg(long)]
    ccd: Option<f32>,
    /// Line cutoff distance.
    #[arg(long)]
    lcd: Option<f32>,
    /// Line cutoff angle (cosine).
    #[arg(long)]
    lca: Option<f32>,
    /// Long line distance.
    #[arg(long)]
    lld: Option<f32>,
    /// Optimization cutoff angle (cosine).
    #[arg(long)]
    oca: Option<f32>,
    #[arg(long)]
    block_size: Option<u32>,
    /// Coordinate width in bits, 8 or 16.
    #[arg(long)]
    bits: Option<u8>,
    /// Rescale segment endpoints into this size, e.g. 256x192.
    #[arg(long, value_parser = parse_size)]
    rescale: Option<(u32, u32)>,
    #[arg(long)]
    no_optimize: bool,
    #[arg(long)]
    no_local_search: bool,
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    input: PathBuf,
    output: PathBuf,
    /// Also save the detected contour points as a PNG (single-file input only).
    #[arg(long)]
    contour_image: Option<PathBuf>,
    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args, Debug, Clone)]
struct RenderArgs {
    input: PathBuf,
    /// Output PNG with `--frame`, otherwise a directory receiving one PNG per frame.
    output: PathBuf,
    #[arg(long, default_value_t = 960)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
    #[arg(long, default_value_t = 16)]
    bits: u8,
    #[arg(long)]
    frame: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct LegacyRenderArgs {
    input: PathBuf,
    output: PathBuf,
    #[arg(long, default_value_t = 960)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => run_generate(&args),
        Command::Render(args) => run_render(&args),
        Command::LegacyRender(args) => run_legacy_render(&args),
    }
}

fn parse_size(raw: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = raw
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw}"))?;
    let w = w.parse::<u32>().map_err(|e| format!("bad width {w}: {e}"))?;
    let h = h.parse::<u32>().map_err(|e| format!("bad height {h}: {e}"))?;
    Ok((w, h))
}

fn load_config(tuning: &TuningArgs) -> Result<PipelineConfig> {
    let mut config = match &tuning.config {
        Some(path) => {
            let data = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str(&data).with_context(|| format!("parse config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(v) = tuning.grey_threshold {
        config.grey_threshold = v;
    }
    if let Some(v) = tuning.ccd {
        config.cluster_cutoff_distance = v;
    }
    if let Some(v) = tuning.lcd {
        config.line_cutoff_distance = v;
    }
    if let Some(v) = tuning.lca {
        config.line_cutoff_angle = v;
    }
    if let Some(v) = tuning.lld {
        config.long_line_distance = v;
    }
    if let Some(v) = tuning.oca {
        config.optimization_cutoff_angle = v;
    }
    if let Some(v) = tuning.block_size {
        config.block_size = v;
    }
    if let Some(bits) = tuning.bits {
        config.coord_width = CoordWidth::try_from(bits)?;
    }
    if tuning.rescale.is_some() {
        config.rescale = tuning.rescale;
    }
    if tuning.no_optimize {
        config.optimize = false;
    }
    if tuning.no_local_search {
        config.local_search = false;
    }
    Ok(config)
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    // --- 1. Pipeline Initialization ---
    let config = load_config(&args.tuning)?;
    info!("pipeline config: {config:?}");
    let mut pipeline = ContourPipeline::new(config).context("invalid pipeline config")?;

    // --- 2. Frame Discovery ---
    let frames = if args.input.is_dir() {
        list_pngs(&args.input)?
    } else {
        vec![args.input.clone()]
    };
    if frames.is_empty() {
        bail!("no PNG frames found in {}", args.input.display());
    }
    let single = frames.len() == 1 && !args.input.is_dir();
    if args.contour_image.is_some() && !single {
        warn!("--contour-image is ignored for directory input");
    }
    let contour_image = args.contour_image.as_deref().filter(|_| single);

    // --- 3. Main Processing Loop ---
    let mut stream = Vec::new();
    let mut written = 0usize;
    for path in &frames {
        match trace_frame(&mut pipeline, path, &mut stream, contour_image) {
            Ok(bytes) => {
                written += 1;
                info!("{}: {bytes} bytes", path.display());
            }
            Err(err) if !single => warn!("skipping {}: {err:#}", path.display()),
            Err(err) => return Err(err),
        }
    }

    // --- 4. Output ---
    fs::write(&args.output, &stream).with_context(|| format!("write {}", args.output.display()))?;
    info!(
        "wrote {written}/{} frames, {} bytes to {}",
        frames.len(),
        stream.len(),
        args.output.display()
    );
    Ok(())
}

fn trace_frame(
    pipeline: &mut ContourPipeline,
    path: &Path,
    stream: &mut Vec<u8>,
    contour_image: Option<&Path>,
) -> Result<usize> {
    let img = image::open(path)
        .with_context(|| format!("decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    let frame_buffer = RgbaFrame::new(width, height, img.as_raw())?;
    if let Some(out) = contour_image {
        let points = render_contour_points(&frame_buffer, pipeline.config())?;
        save_png(&points, out)?;
    }
    let frame = pipeline.process_frame(&frame_buffer)?;
    let bytes = pipeline.encode_frame(&frame, stream)?;
    Ok(bytes)
}

fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let data = fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let codec = StripCodec::new(CoordWidth::try_from(args.bits)?);
    let frames = codec
        .decode_stream(&data)
        .with_context(|| format!("decode {}", args.input.display()))?;
    info!("{} frames in {}", frames.len(), args.input.display());

    if let Some(n) = args.frame {
        let Some(strips) = frames.get(n) else {
            bail!("frame {n} requested but the stream holds {}", frames.len());
        };
        let img = render_segments(&strips_to_segments(strips), args.width, args.height);
        return save_png(&img, &args.output);
    }

    fs::create_dir_all(&args.output).with_context(|| format!("create {}", args.output.display()))?;
    for (i, strips) in frames.iter().enumerate() {
        let img = render_segments(&strips_to_segments(strips), args.width, args.height);
        save_png(&img, &args.output.join(format!("frame_{i:05}.png")))?;
    }
    Ok(())
}

fn run_legacy_render(args: &LegacyRenderArgs) -> Result<()> {
    let data = fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let segments = legacy::decode_segments(&data).with_context(|| format!("decode {}", args.input.display()))?;
    info!("{} segments in {}", segments.len(), args.input.display());
    let img = render_segments(&segments, args.width, args.height);
    save_png(&img, &args.output)
}

fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save(path).with_context(|| format!("save {}", path.display()))
}

/// Every contour point the block scan finds, white on an opaque black background.
fn render_contour_points<S: PixelSampler>(sampler: &S, config: &PipelineConfig) -> Result<RgbaImage> {
    let mut index = BlockIndex::new(sampler.width(), sampler.height(), config.block_size)?;
    let (points, stats) = index.extract_contour_points(sampler, config.grey_threshold);
    info!("{} contour points in {} blocks", stats.points, stats.blocks_scanned);

    let mut img = RgbaImage::from_pixel(sampler.width(), sampler.height(), Rgba([0, 0, 0, 255]));
    for p in &points {
        img.put_pixel(p.pt.x as u32, p.pt.y as u32, Rgba([255, 255, 255, 255]));
    }
    Ok(img)
}

/// White lines on an opaque black background.
fn render_segments(segments: &[LineSegment], width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    for ls in segments {
        draw_line(&mut img, ls, Rgba([255, 255, 255, 255]));
    }
    img
}

/// DDA rasterization; pixels outside the image are skipped.
fn draw_line(img: &mut RgbaImage, ls: &LineSegment, color: Rgba<u8>) {
    let dx = (ls.end.x - ls.start.x) as f32;
    let dy = (ls.end.y - ls.start.y) as f32;
    let steps = dx.abs().max(dy.abs()).max(1.0);
    let (x_inc, y_inc) = (dx / steps, dy / steps);

    let (mut x, mut y) = (ls.start.x as f32, ls.start.y as f32);
    for _ in 0..=steps as u32 {
        let (px, py) = (x.round() as i64, y.round() as i64);
        if px >= 0 && py >= 0 && px < img.width() as i64 && py < img.height() as i64 {
            img.put_pixel(px as u32, py as u32, color);
        }
        x += x_inc;
        y += y_inc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_vision::Point;

    #[test]
    fn parse_size_reads_width_and_height() {
        assert_eq!(parse_size("256x192"), Ok((256, 192)));
        assert!(parse_size("256").is_err());
        assert!(parse_size("ax3").is_err());
    }

    #[test]
    fn draw_line_covers_both_endpoints() {
        let mut img = RgbaImage::new(10, 10);
        let ls = LineSegment::new(Point::new(1, 1), Point::new(8, 4));
        draw_line(&mut img, &ls, Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(8, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn draw_line_clips_to_the_image() {
        let mut img = RgbaImage::new(4, 4);
        let ls = LineSegment::new(Point::new(-5, 2), Point::new(10, 2));
        draw_line(&mut img, &ls, Rgba([1, 2, 3, 255]));
        assert!((0..4).all(|x| img.get_pixel(x, 2).0 == [1, 2, 3, 255]));
    }

    #[test]
    fn contour_image_marks_edge_pixels_only() {
        let mut grey = image::GrayImage::new(16, 16);
        grey.put_pixel(5, 5, image::Luma([255]));
        let img = render_contour_points(&grey, &PipelineConfig::default()).expect("valid config");

        assert_eq!(img.dimensions(), (16, 16));
        let lit: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, px)| px.0 == [255, 255, 255, 255])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit, vec![(5, 5), (6, 5), (5, 6)]);
    }

    #[test]
    fn flags_override_the_defaults() {
        let tuning = TuningArgs {
            config: None,
            grey_threshold: Some(10),
            ccd: None,
            lcd: Some(12.0),
            lca: None,
            lld: None,
            oca: None,
            block_size: None,
            bits: Some(8),
            rescale: Some((256, 192)),
            no_optimize: true,
            no_local_search: false,
        };
        let config = load_config(&tuning).expect("valid flags");
        assert_eq!(config.grey_threshold, 10);
        assert_eq!(config.line_cutoff_distance, 12.0);
        assert_eq!(config.coord_width, CoordWidth::U8);
        assert_eq!(config.rescale, Some((256, 192)));
        assert!(!config.optimize);
        assert!(config.local_search);
    }
}
