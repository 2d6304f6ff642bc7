use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slimesim::{server, video, viewer, Palette, SimConfig};

#[derive(Parser)]
#[command(name = "slimesim")]
#[command(version)]
#[command(about = "Slime mold simulation rendered as animated GIFs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a parameter, e.g. --set width=200 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and write it as an animated GIF
    Render {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output path (defaults to tmp/<name derived from parameters>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save every frame as a PNG in this directory
        #[arg(long)]
        frames_dir: Option<PathBuf>,
    },

    /// Serve GET /gen, rendering one GIF per request
    Serve {
        #[arg(short, long, default_value = server::DEFAULT_BIND)]
        bind: SocketAddr,

        /// Directory rendered GIFs are written to
        #[arg(short, long, default_value = "tmp")]
        output_dir: PathBuf,
    },

    /// Watch a simulation live in a window
    View {
        #[command(flatten)]
        config: ConfigArgs,

        /// Screen pixels per grid cell
        #[arg(long, default_value = "2.0")]
        scale: f32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            output,
            frames_dir,
        } => render(config, output, frames_dir),
        Commands::Serve { bind, output_dir } => serve(bind, output_dir),
        Commands::View { config, scale } => {
            let config = resolve_config(config)?;
            viewer::run_viewer(config, scale).context("viewer failed")
        }
    }
}

fn resolve_config(args: ConfigArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut params = HashMap::new();
    for entry in &args.overrides {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("expected KEY=VALUE, got {entry:?}");
        };
        params.insert(key.trim().to_string(), value.trim().to_string());
    }
    config.apply_params(&params);

    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn render(args: ConfigArgs, output: Option<PathBuf>, frames_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(args)?.with_resolved_seed();
    let output = output.unwrap_or_else(|| PathBuf::from("tmp").join(config.artifact_name()));

    let frames = slimesim::run(config.clone())?;
    let palette = Palette::default();

    video::write_gif(&output, &frames, config.loop_count, &palette)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if let Some(dir) = frames_dir {
        video::write_png_frames(&dir, &frames, &config, &palette)
            .with_context(|| format!("failed to write frames to {}", dir.display()))?;
    }

    println!("{}", output.display());
    Ok(())
}

fn serve(bind: SocketAddr, output_dir: PathBuf) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime
        .block_on(server::run_server(bind, server::ServerState { output_dir }))
        .context("server stopped")
}
