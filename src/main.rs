use apod_wallpaper::config::{self, AppConfig, ConfigError};
use apod_wallpaper::imaging::{self, LayoutPolicy, TargetSpec};
use apod_wallpaper::page::PageSelector;
use apod_wallpaper::pipeline::{Pipeline, RenderRequest};
use apod_wallpaper::{desktop, output, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "apod-wallpaper")]
#[command(about = "Astronomy Picture of the Day as a desktop wallpaper")]
#[command(long_about = "\
Astronomy Picture of the Day as a desktop wallpaper

Fetches today's (or a dated) picture, fits it to an exact resolution and
draws its explanation in a translucent panel in the bottom-right corner.

Layouts:
  fit    scale to fit, black bars on the free axis (nothing cropped)
  cover  scale to fill, centered crop of the overflow

Downloaded originals are cached by URL, so re-rendering at another size
does not download the picture again.

Run 'apod-wallpaper gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); stock defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct FetchArgs {
    /// File to write; the format follows the extension (PNG if none)
    #[arg(short, long)]
    output: PathBuf,

    /// Output width in pixels (detected from the screen when omitted)
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Output height in pixels (detected from the screen when omitted)
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Picture to fetch: "latest" or a date (YYYY-MM-DD)
    #[arg(short, long, default_value = "latest")]
    date: String,

    /// How to map the picture onto the output size
    #[arg(long, value_enum)]
    layout: Option<LayoutPolicy>,

    /// Do not draw the caption panel
    #[arg(long)]
    no_caption: bool,

    /// Apply the result as the desktop background
    #[arg(long)]
    set_background: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render a wallpaper to a file
    Fetch(FetchArgs),
    /// Serve GET /latest.png over HTTP
    Serve {
        /// Address to listen on (overrides server.listen)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `--debug`, else a per-command default.
fn init_logging(cli: &Cli) {
    let default_level = match (&cli.command, cli.debug) {
        (_, true) => "debug",
        (Command::Serve { .. }, false) => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Fetch(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            fetch(&config, args)?;
        }
        Command::Serve { listen } => {
            let config = config::load_config(cli.config.as_deref())?;
            let listen = listen.unwrap_or_else(|| config.server.listen.clone());
            // The blocking HTTP client must be created outside the runtime
            let pipeline = Arc::new(Pipeline::from_config(&config)?);
            let state = server::AppState::new(pipeline, &config);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&listen, state))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn fetch(config: &AppConfig, args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let page: PageSelector = args.date.parse().map_err(ConfigError::Validation)?;
    let (width, height) = target_size(config, args.width, args.height)?;
    let layout = args.layout.unwrap_or(config.output.layout);

    let pipeline = Pipeline::from_config(config)?;
    let request = RenderRequest {
        page,
        target: TargetSpec::new(width, height, layout),
        caption: config.caption.enabled && !args.no_caption,
    };
    let wallpaper = pipeline.run(&request)?;

    imaging::save(&wallpaper.image, &args.output)?;
    info!(path = %args.output.display(), "Wrote wallpaper");
    output::print_run_summary(&wallpaper, &args.output, layout, &pipeline.cache_stats());

    if args.set_background {
        desktop::set_background(&config.desktop.set_command, &args.output)?;
    }
    Ok(())
}

/// Explicit `-W`/`-H`, else the detected screen size for the missing ones.
fn target_size(
    config: &AppConfig,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (w, h) => {
            let (screen_w, screen_h) =
                desktop::detect_resolution(&config.desktop.resolution_command)?;
            (w.unwrap_or(screen_w), h.unwrap_or(screen_h))
        }
    };
    Ok(config::check_output_size(width, height)?)
}
