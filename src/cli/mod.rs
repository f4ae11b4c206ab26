pub mod categories;
pub mod generate;
pub mod init;
#[cfg(feature = "server")]
pub mod serve;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::encoder::CsvSchema;
use crate::error::Result;
use crate::generator::{Generator, TxnUidCounter};
use crate::settings::{shellexpand_path, Settings};
use crate::taxonomy::Taxonomy;

/// Taxonomy from the flag, else the settings file, else the built-in one.
pub(crate) fn load_taxonomy(settings: &Settings, flag: Option<&str>) -> Result<Taxonomy> {
    let path = flag
        .or(settings.taxonomy_path.as_deref())
        .map(shellexpand_path);
    Taxonomy::load_or_builtin(path.as_deref())
}

pub(crate) fn build_generator(settings: &Settings, taxonomy_flag: Option<&str>) -> Result<Generator> {
    let taxonomy = load_taxonomy(settings, taxonomy_flag)?;
    Ok(Generator::new(Arc::new(taxonomy), Arc::new(TxnUidCounter::new()))
        .with_products(settings.product_codes.clone()))
}

#[derive(Parser)]
#[command(name = "txn-sampler", about = "Synthetic financial-transaction generator.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SchemaArg {
    /// All fourteen columns
    Full,
    /// Twelve columns, without category_guid and debit_credit_indicator
    Legacy,
}

impl From<SchemaArg> for CsvSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Full => CsvSchema::Full,
            SchemaArg::Legacy => CsvSchema::Legacy,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default settings file.
    Init {
        /// Taxonomy JSON file to record in the settings
        #[arg(long)]
        taxonomy: Option<String>,
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Generate transaction records as CSV.
    Generate {
        /// Total number of records (default from settings)
        #[arg(long = "count")]
        data_sample_count: Option<i64>,
        /// Number of unique base records (default: same as --count)
        #[arg(long = "unique")]
        unique_sample_count: Option<i64>,
        /// Transaction type filter: PURCHASE, FEE, PAYMENT
        #[arg(long = "txn-type")]
        txn_type: Option<String>,
        /// Year for posted dates (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Output file type; only CSV is supported
        #[arg(long = "file-type", default_value = "CSV")]
        file_type: String,
        /// Column layout
        #[arg(long, value_enum, default_value = "full")]
        schema: SchemaArg,
        /// Output path (default: stdout)
        #[arg(long)]
        output: Option<String>,
        /// Taxonomy JSON file (default from settings, else built-in)
        #[arg(long)]
        taxonomy: Option<String>,
    },
    /// List root categories and their subcategories.
    Categories {
        /// Show only the root category a subcategory belongs to
        #[arg(long = "parent-of", value_name = "SUBCATEGORY")]
        parent_of: Option<String>,
        /// Taxonomy JSON file (default from settings, else built-in)
        #[arg(long)]
        taxonomy: Option<String>,
    },
    /// Serve the generate endpoint over HTTP.
    #[cfg(feature = "server")]
    Serve {
        /// Listen address (default from settings)
        #[arg(long)]
        addr: Option<String>,
        /// Taxonomy JSON file (default from settings, else built-in)
        #[arg(long)]
        taxonomy: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args_parse() {
        let cli = Cli::try_parse_from([
            "txn-sampler", "generate", "--count", "20", "--unique", "5", "--txn-type", "fee",
            "--year", "2024", "--schema", "legacy",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { data_sample_count, unique_sample_count, txn_type, year, schema, .. } => {
                assert_eq!(data_sample_count, Some(20));
                assert_eq!(unique_sample_count, Some(5));
                assert_eq!(txn_type.as_deref(), Some("fee"));
                assert_eq!(year, Some(2024));
                assert_eq!(CsvSchema::from(schema), CsvSchema::Legacy);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_categories_parent_of_parse() {
        let cli = Cli::try_parse_from(["txn-sampler", "categories", "--parent-of", "Late Payment Fee"]).unwrap();
        match cli.command {
            Commands::Categories { parent_of, taxonomy } => {
                assert_eq!(parent_of.as_deref(), Some("Late Payment Fee"));
                assert!(taxonomy.is_none());
            }
            _ => panic!("expected categories"),
        }
    }
}
