mod cli;
mod encoder;
mod error;
mod generator;
mod models;
mod request;
#[cfg(feature = "server")]
mod server;
mod settings;
mod taxonomy;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::generate::GenerateArgs;
use cli::{Cli, Commands};
use request::GenerateParams;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { taxonomy, force } => cli::init::run(taxonomy, force),
        Commands::Generate {
            data_sample_count,
            unique_sample_count,
            txn_type,
            year,
            file_type,
            schema,
            output,
            taxonomy,
        } => cli::generate::run(GenerateArgs {
            params: GenerateParams {
                file_type: Some(file_type),
                data_sample_count,
                unique_sample_count,
                txn_type,
                year,
            },
            schema: schema.into(),
            output,
            taxonomy,
        }),
        Commands::Categories { parent_of, taxonomy } => cli::categories::list(parent_of, taxonomy),
        #[cfg(feature = "server")]
        Commands::Serve { addr, taxonomy } => cli::serve::run(addr, taxonomy),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
