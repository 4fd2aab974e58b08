use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use classic_bg_removal::{
    default_output_path, BackgroundRemover, NoProgress, ProcessResult, RemovalOptions,
    DEFAULT_COLOR_THRESHOLD, DEFAULT_EDGE_THRESHOLD, DEFAULT_REFINE_DENSITY,
    DEFAULT_REFINE_RADIUS,
};

#[derive(Parser)]
#[command(
    name = "bg-remove",
    about = "Remove uniform backgrounds using edge detection and color sampling",
    version,
    after_help = "Simple usage: bg-remove <image>  (writes <image>_nobg.png next to it)\n\n\
                  NOTE: The background is sampled at the image corners and edge midpoints.\n\
                  Works best for objects on a plain, roughly uniform backdrop."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_nobg.png)
    #[arg(short, long)]
    output: Option<String>,

    /// RGB distance below which a pixel counts as background
    #[arg(long, default_value_t = DEFAULT_COLOR_THRESHOLD)]
    color_threshold: f32,

    /// Sobel magnitude above which a pixel is always kept (0-255)
    #[arg(long, default_value_t = DEFAULT_EDGE_THRESHOLD)]
    edge_threshold: u8,

    /// Half-width of the edge refinement window
    #[arg(long, default_value_t = DEFAULT_REFINE_RADIUS)]
    refine_radius: usize,

    /// Opaque-neighbor ratio (0.0-1.0) needed to survive refinement
    #[arg(long, default_value_t = DEFAULT_REFINE_DENSITY)]
    refine_density: f32,

    /// Skip the edge refinement pass
    #[arg(long)]
    no_refine: bool,

    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let options = RemovalOptions {
        color_threshold: cli.color_threshold,
        edge_threshold: cli.edge_threshold,
        refine_radius: cli.refine_radius,
        refine_density: if cli.no_refine {
            0.0
        } else {
            cli.refine_density
        },
    };

    let remover = match BackgroundRemover::new(options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
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
            eprintln!("Usage: bg-remove <input_dir> -o <output_dir>");
            process::exit(1);
        };
        remover.process_directory(input_path, &output_dir)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_single(&remover, input_path, &output_path, cli.quiet)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.quiet);
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

fn process_single(
    remover: &BackgroundRemover,
    input: &Path,
    output: &Path,
    quiet: bool,
) -> ProcessResult {
    if quiet {
        return remover.process_file(input, output, &mut NoProgress);
    }

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Processing");
    let result = remover.process_file(input, output, &mut |percent: u8| {
        pb.set_position(u64::from(percent));
    });
    pb.finish_and_clear();
    result
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!(
                "[OK] {filename} ({:.0}% opaque)",
                result.opaque_ratio * 100.0
            );
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
