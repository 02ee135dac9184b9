use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use thumbnail_watermark::{
    default_output_path, Geometry, ProcessResult, WatermarkConfig, WatermarkEngine,
    WatermarkOptions,
};

#[derive(Parser)]
#[command(
    name = "thumb-watermark",
    about = "Create thumbnails and overlay a watermark image",
    version,
    after_help = "Simple usage: thumb-watermark <image> -g 300x300 --watermark logo.png\n\n\
                  Watermark settings come from either --config (YAML) or the\n\
                  --static-root, --watermark, --opacity, --min-size and --manual flags."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_thumb.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Thumbnail geometry, WxH
    #[arg(short, long, default_value = "200x200")]
    geometry: Geometry,

    /// YAML watermark configuration file
    #[arg(
        short,
        long,
        conflicts_with_all = ["static_root", "watermark", "opacity", "min_size", "manual"]
    )]
    config: Option<PathBuf>,

    /// Directory the watermark path is relative to
    #[arg(long, default_value = ".")]
    static_root: PathBuf,

    /// Watermark image, relative to --static-root
    #[arg(long)]
    watermark: Option<PathBuf>,

    /// Default watermark opacity (0.0-1.0)
    #[arg(long, default_value = "1.0")]
    opacity: f32,

    /// Thumbnails smaller than this (WxH) are not watermarked automatically
    #[arg(long)]
    min_size: Option<String>,

    /// Only watermark when a per-image watermark option is given
    #[arg(long)]
    manual: bool,

    /// Do not watermark
    #[arg(long)]
    no_watermark: bool,

    /// Watermark with the configured defaults, even in manual mode
    #[arg(short = 'w', long)]
    force_watermark: bool,

    /// Watermark opacity for this run (0.0-1.0)
    #[arg(long)]
    alpha: Option<f32>,

    /// Watermark size for this run, e.g. 120x40, 120 or 25%
    #[arg(long)]
    size: Option<String>,

    /// Watermark position for this run, e.g. "south east", "-10 -10" or tile
    #[arg(long, allow_hyphen_values = true)]
    position: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> thumbnail_watermark::Result<WatermarkConfig> {
    if let Some(path) = &cli.config {
        return WatermarkConfig::from_file(path);
    }
    let mut builder = WatermarkConfig::builder(&cli.static_root)
        .always(!cli.manual)
        .opacity(cli.opacity);
    if let Some(watermark) = &cli.watermark {
        builder = builder.watermark(watermark);
    }
    if let Some(min_size) = &cli.min_size {
        builder = builder.min_applicable_size(min_size);
    }
    builder.build()
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Fatal: {e}");
            process::exit(1);
        }
    };
    let engine = WatermarkEngine::new(config);

    let options = WatermarkOptions {
        no_watermark: cli.no_watermark,
        watermark: cli.force_watermark,
        watermark_pos: cli.position.clone(),
        watermark_size: cli.size.clone(),
        watermark_alpha: cli.alpha,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: thumb-watermark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, cli.geometry, &options)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, cli.geometry, &options)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if result.watermarked {
            eprintln!("[OK] {filename} (watermarked)");
        } else {
            eprintln!("[OK] {filename}");
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if cli.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
