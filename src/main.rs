use clap::Parser;
use std::path::PathBuf;
use towebp::convert::{Converter, ProgressEvent};
use towebp::output;
use towebp::settings::{ConversionSettings, Orientation, ToneSettings};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OrientationArg {
    Horizontal,
    Vertical,
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::Horizontal => Orientation::Horizontal,
            OrientationArg::Vertical => Orientation::Vertical,
        }
    }
}

#[derive(Parser)]
#[command(name = "towebp")]
#[command(about = "Convert images to WebP in bulk, mirroring folder structure")]
#[command(long_about = "\
Convert images to WebP in bulk, mirroring folder structure

Point towebp at a folder and it creates a `<folder>_WebP` sibling with the
same directory layout: supported images (jpg, jpeg, png, bmp, tiff, tif,
gif) become .webp files, everything else is copied as-is. Existing output
folders are never touched — reruns get `_WebP_2`, `_WebP_3`, and so on.
Point it at a single image and the .webp lands beside it.

Processing order per image:

  resize/crop  →  alpha handling  →  tone adjustments  →  WebP encode

Resizing is proportional to a target width. --make-horizontal additionally
crops portrait images to a square against that width. --uniform-size first
analyzes the whole folder (median aspect ratio) and crops every image to
one shared box, horizontal or vertical.

Transparency is kept by default; --flatten-alpha composites onto white
instead. --grayscale writes a `_bw` luminance companion next to every
color output.

Tone adjustments are off until a flag is given. --auto-tone runs a fixed
automatic correction (contrast stretch, highlight/shadow recovery, white
balance, vibrance, exposure) and overrides all manual values.")]
#[command(version = version_string())]
struct Cli {
    /// Source folder or single image file
    source: PathBuf,

    /// Custom output folder (used verbatim, no version suffix)
    #[arg(long)]
    output: Option<PathBuf>,

    /// WebP quality for lossy encoding
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Lossless WebP encoding
    #[arg(long)]
    lossless: bool,

    /// Encoder effort (0-6, higher = smaller files, slower)
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=6))]
    method: u8,

    /// Resize proportionally to this width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Crop portrait images to a square against the target width
    #[arg(long, requires = "width")]
    make_horizontal: bool,

    /// Crop every image in the batch to one analyzed box
    #[arg(long, requires = "width")]
    uniform_size: bool,

    /// Orientation of the uniform box
    #[arg(long, value_enum, default_value = "horizontal")]
    orientation: OrientationArg,

    /// Composite transparency onto white instead of keeping it
    #[arg(long)]
    flatten_alpha: bool,

    /// Also write a `_bw` grayscale companion per image
    #[arg(long)]
    grayscale: bool,

    /// Automatic tone correction (overrides all manual adjustments)
    #[arg(long)]
    auto_tone: bool,

    /// Exposure (-2.0 to 2.0)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    exposure: f32,

    /// Contrast (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    contrast: f32,

    /// Highlights (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    highlights: f32,

    /// Shadows (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    shadows: f32,

    /// Whites (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    whites: f32,

    /// Blacks (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    blacks: f32,

    /// Temperature: positive warms, negative cools (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    temperature: f32,

    /// Tint: positive shifts green (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    tint: f32,

    /// Vibrance (0 to 100)
    #[arg(long, default_value_t = 0.0)]
    vibrance: f32,

    /// Saturation (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    saturation: f32,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn tone_settings(&self) -> Option<ToneSettings> {
        let tone = ToneSettings {
            auto_tone: self.auto_tone,
            exposure: self.exposure,
            contrast: self.contrast,
            highlights: self.highlights,
            shadows: self.shadows,
            whites: self.whites,
            blacks: self.blacks,
            temperature: self.temperature,
            tint: self.tint,
            vibrance: self.vibrance,
            saturation: self.saturation,
        };
        (!tone.is_neutral()).then_some(tone)
    }

    fn settings(&self) -> ConversionSettings {
        ConversionSettings {
            quality: self.quality,
            lossless: self.lossless,
            method: self.method,
            target_width: self.width,
            preserve_alpha: !self.flatten_alpha,
            grayscale: self.grayscale,
            tone: self.tone_settings(),
            make_horizontal: self.make_horizontal,
            uniform_size: self.uniform_size,
            orientation: self.orientation.into(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let converter = Converter::new(cli.settings());

    let mut progress = |event: &ProgressEvent| {
        println!("{}", output::format_progress(event));
    };

    let result = if cli.source.is_dir() {
        converter.convert_folder(&cli.source, cli.output.as_deref(), Some(&mut progress))?
    } else {
        converter.convert_single_file(&cli.source, cli.output.as_deref(), Some(&mut progress))?
    };

    output::print_summary(&result);
    if let Some(report) = &cli.report {
        output::write_report(&result, report)?;
    }

    Ok(())
}
