//! The native CLI. The wasm32 build of this package is the browser library;
//! this binary compiles to an empty `main` there.

#[cfg(not(target_arch = "wasm32"))]
use clap::{Parser, Subcommand};
#[cfg(not(target_arch = "wasm32"))]
use stagehand::countdown::{Remaining, parse_target};
#[cfg(not(target_arch = "wasm32"))]
use stagehand::logging::{LogConfig, LogFormat, init_logging};
#[cfg(not(target_arch = "wasm32"))]
use stagehand::memory::Layout;
#[cfg(not(target_arch = "wasm32"))]
use stagehand::simulate::{Script, Simulation};
#[cfg(not(target_arch = "wasm32"))]
use stagehand::{config, output};
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Interactive behaviors for static conference sites")]
#[command(long_about = "\
Interactive behaviors for static conference sites

The browser build mounts itself on page load. This CLI checks
configuration and runs the same behaviors against a headless page.

Markup hooks (stock selectors):

  header#pageHeader, .top-header      scrolled / solid states
  .hero-slideshow .slide              slides, with .carousel-indicators .dot
                                      and .hero-inner .hero-text
  .overview-timeline .timeline-item   revealed once 22% visible
  .nav-center .has-submenu            .nav-link toggle + .submenu panel
  #backToTop                          shown past 320px
  nav a[href=\"#contact\"]              smooth scroll to #contact
  .countdown[data-date]               [data-unit=days|hours|minutes|seconds]

Run 'stagehand gen-config' to generate a documented stagehand.toml.")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Subcommand)]
enum Command {
    /// Print a stock stagehand.toml with all options documented
    GenConfig,
    /// Load and validate a config file
    CheckConfig {
        /// Config file merged over stock defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render the countdown fields for a target time
    Countdown {
        /// Target time (RFC 3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD", UTC unless offset)
        #[arg(long)]
        target: String,
        /// Render as of this time instead of now
        #[arg(long)]
        now: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a script against a headless page and print the final state
    Simulate {
        /// Page layout (TOML); stock layout when omitted
        #[arg(long)]
        layout: Option<PathBuf>,
        /// Interaction script (TOML)
        #[arg(long)]
        script: Option<PathBuf>,
        /// Config file merged over stock defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the snapshot as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,
        /// Write an HTML report to this file
        #[arg(long)]
        html: Option<PathBuf>,
    },
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig { config: path } => {
            let config = config::load_config(path.as_deref())?;
            output::print_config_summary(&config);
        }
        Command::Countdown { target, now, json } => {
            let target = parse_target(&target)?;
            let now = match now {
                Some(now) => parse_target(&now)?,
                None => chrono::Utc::now(),
            };
            let remaining = Remaining::between(target.timestamp_millis(), now.timestamp_millis());
            if json {
                println!("{}", serde_json::to_string_pretty(&remaining)?);
            } else {
                output::print_countdown(&remaining);
            }
        }
        Command::Simulate {
            layout,
            script,
            config: config_path,
            json,
            html,
        } => {
            let config = config::load_config(config_path.as_deref())?;
            let layout = match layout {
                Some(path) => Layout::from_toml(&std::fs::read_to_string(path)?)?,
                None => Layout::default(),
            };
            let script = match script {
                Some(path) => Script::from_toml(&std::fs::read_to_string(path)?)?,
                None => Script::default(),
            };

            let mut simulation = Simulation::new(&layout, &config, script.start_ms()?);
            simulation.run(&script)?;
            let snapshot = simulation.snapshot();

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else if let Some(path) = html {
                let report = output::render_html_report("Stagehand simulation", &snapshot);
                std::fs::write(&path, report.into_string())?;
                println!("==> Report written to {}", path.display());
            } else {
                output::print_snapshot(&snapshot);
            }
        }
    }

    Ok(())
}
