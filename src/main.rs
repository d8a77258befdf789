mod acquisition;
mod app;
mod channel;
mod config;
mod constants;
mod display;
mod error;
mod gate;
mod landmarks;
mod presentation;
mod sensor;
mod smoothing;
mod state;
mod ui;
mod volume;

use clap::Parser;
use dialoguer::{Select, theme::ColorfulTheme};
use std::fs::OpenOptions;
use std::path::Path;

fn select_sink() -> Result<(), Box<dyn std::error::Error>> {
    let sinks = volume::list_sinks()?;

    if sinks.is_empty() {
        println!("No audio output sinks found.");
        return Ok(());
    }

    let items: Vec<String> = sinks
        .iter()
        .map(|(name, details)| format!("{}  ({})", name, details))
        .collect();

    // Interactive selection
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an audio output sink")
        .items(&items)
        .default(0)
        .interact()?;

    println!("{}", sinks[selection].0);

    Ok(())
}

/// Default log filter. The terminal overlay owns the screen, so only errors
/// go to stderr unless a log file takes the output.
fn default_log_level(headless: bool, log_file: Option<&Path>) -> &'static str {
    match (headless, log_file) {
        (true, _) => "info",
        (false, Some(_)) => "warn",
        (false, None) => "error",
    }
}

/// Log to stderr, or to a file so the terminal overlay stays intact
fn init_logging(default_level: &str, log_file: Option<&Path>) -> std::io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() {
    use app::ExitCode;
    use config::{Args, Commands};

    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            let config = match config::Config::from_run_args(run_args) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(ExitCode::Error as i32);
                }
            };

            let default_level = default_log_level(config.headless, config.log_file.as_deref());
            if let Err(e) = init_logging(default_level, config.log_file.as_deref()) {
                eprintln!("Cannot open log file: {}", e);
                std::process::exit(ExitCode::Error as i32);
            }

            match app::App::new_with_config(config) {
                Ok(app) => {
                    let run_result = app.run().await;
                    if let Err(e) = run_result.result {
                        eprintln!("Application error: {}", e);
                    }
                    std::process::exit(run_result.exit_code as i32);
                }
                Err(e) => {
                    eprintln!("Setup error: {}", e);
                    std::process::exit(ExitCode::Error as i32);
                }
            }
        }
        Commands::Sinks(_) => {
            if let Err(e) = select_sink() {
                eprintln!("Error listing sinks: {}", e);
                std::process::exit(ExitCode::Error as i32);
            }
        }
    }
}
