use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eframe::egui;
use env_logger::Env;
use log::info;

use vectorlab::app::LabApp;
use vectorlab::config::{ConfigLoader, LabConfig};
use vectorlab::lessons::SLUGS;

#[derive(Parser)]
#[command(
    name = "vectorlab",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive linear algebra and vector calculus lab"
)]
struct Cli {
    /// Configuration file (defaults to $VECTORLAB_CONFIG, then ./vectorlab.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Lesson to open first
    #[arg(long, value_name = "SLUG")]
    lesson: Option<String>,

    /// Log filter, e.g. `debug` or `vectorlab=trace`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);

    if cli.print_config {
        let text = toml::to_string_pretty(&config).context("failed to serialize configuration")?;
        println!("{text}");
        return Ok(());
    }

    init_logging(&config, cli.log_level.is_some());

    match ConfigLoader::locate(cli.config.as_deref()) {
        Some(path) => info!(target: "vectorlab", "using configuration from {}", path.display()),
        None => info!(target: "vectorlab", "using default configuration"),
    }

    if let Some(slug) = cli.lesson.as_deref() {
        if !SLUGS.contains(&slug) {
            bail!("unknown lesson '{slug}', expected one of: {}", SLUGS.join(", "));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("vectorlab")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    let lesson = cli.lesson;
    eframe::run_native(
        "vectorlab",
        options,
        Box::new(move |_cc| Box::new(LabApp::new(config, lesson.as_deref()))),
    )
    .map_err(|e| anyhow::anyhow!("window closed with an error: {e}"))
}

fn apply_cli_overrides(config: &mut LabConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

/// `--log-level` wins over `RUST_LOG`, which wins over the config file.
fn init_logging(config: &LabConfig, forced: bool) {
    let mut builder = if forced {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&config.logging.level);
        builder
    } else {
        env_logger::Builder::from_env(Env::default().default_filter_or(config.logging.level.as_str()))
    };
    builder.format_timestamp_millis().init();
}
