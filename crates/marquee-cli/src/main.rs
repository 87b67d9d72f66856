use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::AppConfig;

mod commands;

const DEFAULT_TEXT: &str =
    "This line is longer than the box it lives in, so it scrolls to reveal the rest";

#[derive(Parser)]
#[command(name = "marquee")]
#[command(author, version, about = "Self-scrolling text in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: MarqueeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the marquee in the terminal (default)
    Run(MarqueeArgs),
    /// Print the overflow distance and scroll duration, then exit
    Measure(MarqueeArgs),
}

#[derive(Args)]
struct MarqueeArgs {
    /// Text to display
    #[arg(short, long)]
    text: Option<String>,
    /// Width of the marquee box in cells
    #[arg(short, long)]
    width: Option<u16>,
    /// Scroll speed in cells per second
    #[arg(short, long)]
    speed: Option<f64>,
    /// Restart after every cycle
    #[arg(short = 'l', long = "loop")]
    looping: bool,
    /// Delay before the first cycle (ms)
    #[arg(long)]
    delay: Option<u64>,
    /// Delay before each restart (ms, at least 100)
    #[arg(long)]
    reset_delay: Option<u64>,
}

impl MarqueeArgs {
    /// Apply command line overrides on top of the file configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.ui.width = width;
        }
        if let Some(speed) = self.speed {
            config.marquee.speed = speed;
        }
        if self.looping {
            config.marquee.looping = true;
        }
        if let Some(delay) = self.delay {
            config.marquee.marquee_delay_ms = delay;
        }
        if let Some(reset_delay) = self.reset_delay {
            config.marquee.marquee_reset_delay_ms = reset_delay;
        }
    }

    fn text(&self) -> String {
        self.text.clone().unwrap_or_else(|| DEFAULT_TEXT.to_string())
    }
}

fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
    );

    if to_file {
        // Keep the alternate screen clean: log to a file instead
        let path = config.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load()?;

    match cli.command {
        Some(Commands::Measure(args)) => {
            args.apply(&mut config);
            config.marquee.validate()?;
            init_logging(&config, false)?;
            commands::measure::run(&config, &args.text()).await
        }
        Some(Commands::Run(args)) => {
            args.apply(&mut config);
            config.marquee.validate()?;
            init_logging(&config, true)?;
            commands::run::run(config, args.text()).await
        }
        None => {
            cli.options.apply(&mut config);
            config.marquee.validate()?;
            init_logging(&config, true)?;
            commands::run::run(config, cli.options.text()).await
        }
    }
}
