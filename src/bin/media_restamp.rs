// media_restamp - write sidecar timestamps and locations back into media

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use media_restamp::command::is_installed;
use media_restamp::{Config, Dispatcher, Summary};

#[derive(Parser)]
#[command(
    name = "media_restamp",
    version,
    about = "Restore capture time and GPS location into photos and videos from JSON sidecars"
)]
struct Args {
    /// Directory holding the media files and their .json sidecars
    directory: PathBuf,

    /// ImageMagick binary used to bridge HEIC files
    #[arg(long, default_value = "magick")]
    magick: PathBuf,

    /// ffmpeg binary used to remux videos
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&args) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<Summary> {
    let config = Config::new(&args.directory)
        .with_magick(&args.magick)
        .with_ffmpeg(&args.ffmpeg);
    config.validate().context("Invalid input directory")?;

    for tool in [&config.tools.magick, &config.tools.ffmpeg] {
        if !is_installed(tool) {
            warn!("{} not found; files that need it will fail", tool.display());
        }
    }

    info!("Restamping media in {}", config.directory.display());
    let dispatcher = Dispatcher::new(config);
    let summary = dispatcher.run().context("Failed to read sidecars")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        println!("{summary}");
        for failure in &summary.failures {
            println!("  {}: {}", failure.sidecar.display(), failure.error);
        }
    }

    Ok(summary)
}
