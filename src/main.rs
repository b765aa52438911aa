//! Brigade binary: bring up the configured bridges, run the admin
//! console, tear everything down on exit.

use brigade::cli::{Cli, Commands};
use brigade::error::Result;
use brigade::registry::Registry;
use brigade::stack::MemStack;
use brigade::{config, console};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let mut config = config::load(&cli.config)?;

    match cli.command {
        Commands::Check => {
            println!("Configuration OK: {} bridge(s)", config.num_bridges);
            Ok(())
        }

        Commands::Run { num_bridges } => {
            if let Some(n) = num_bridges {
                config.num_bridges = n;
                config.validate()?;
            }

            let stack = Arc::new(MemStack::new());
            let mut registry = Registry::new(stack);

            let created = registry.create_bridges(config.num_bridges);
            if created < config.num_bridges {
                warn!(
                    requested = config.num_bridges,
                    created, "bridge bring-up shortfall"
                );
            }
            println!("brigade: {} bridge(s) loaded", created);

            let result = console::run(&mut registry);

            registry.teardown_all();
            println!("brigade: all bridges unloaded");
            result
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
