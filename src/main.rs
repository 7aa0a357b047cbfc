use clap::Parser;
use tracing_subscriber::EnvFilter;

use veo_scene::cli::{handle_config_action, run_generate, Args, Command, GenerateOutcome};
use veo_scene::config::Config;
use veo_scene::veo::API_KEY_ENV;

/// Load the .env file.
///
/// Does not override existing environment variables. Runs before logging is
/// set up so RUST_LOG may come from .env.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Route `log` records through a fmt subscriber filtered by RUST_LOG.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    load_env();
    init_logging();

    if std::env::var(API_KEY_ENV).is_err() {
        log::warn!("{} is not set; generation will fail until it is", API_KEY_ENV);
    }

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Generate(generate) => match run_generate(generate, &config) {
            Ok(GenerateOutcome::Played(_)) => {}
            Ok(GenerateOutcome::Failed(lines)) => {
                eprintln!("Generation Failed");
                for line in lines {
                    eprintln!("  {}", line);
                }
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Command::Config { action } => {
            handle_config_action(action, &config, args.config.as_deref());
        }
    }
}
