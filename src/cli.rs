//! Command-line argument parsing for NovAi.
//!
//! Uses clap to parse CLI arguments. Flags override the config file.

use crate::config::{Config, WarehouseConfig};
use crate::render::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Ask questions about a Snowflake table in plain language.
#[derive(Parser, Debug)]
#[command(name = "novai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Snowflake account identifier (e.g., xy12345.us-east-1)
    #[arg(short = 'a', long, value_name = "ACCOUNT")]
    pub account: Option<String>,

    /// Virtual warehouse to run statements on
    #[arg(short = 'w', long, value_name = "WAREHOUSE")]
    pub warehouse: Option<String>,

    /// Role to run statements as
    #[arg(short = 'r', long, value_name = "ROLE")]
    pub role: Option<String>,

    /// Cortex model used for generation and summaries
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Database of the target table
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Schema of the target table
    #[arg(short = 's', long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Target table
    #[arg(short = 't', long, value_name = "TABLE")]
    pub table: Option<String>,

    /// Extra context added to every generation prompt
    #[arg(long, value_name = "TEXT")]
    pub context: Option<String>,

    /// Answer a single question and exit
    #[arg(short = 'q', long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Output format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write each non-empty result to <DIR>/query_results.csv
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Skip result summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Print the generation prompt sent to the model
    #[arg(long)]
    pub show_prompt: bool,

    /// Use the in-memory warehouse and completion service (for demos and testing)
    #[arg(long)]
    pub mock: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the warehouse settings given on the command line.
    pub fn to_warehouse_config(&self) -> WarehouseConfig {
        WarehouseConfig {
            account: self.account.clone(),
            warehouse: self.warehouse.clone(),
            role: self.role.clone(),
            ..Default::default()
        }
    }

    /// Applies command-line overrides to a loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        config.warehouse.merge(&self.to_warehouse_config());

        if let Some(database) = &self.database {
            config.target.database = database.clone();
        }
        if let Some(schema) = &self.schema {
            config.target.schema = schema.clone();
        }
        if let Some(table) = &self.table {
            config.target.table = table.clone();
        }
        if let Some(model) = &self.model {
            config.completion.model = model.clone();
        }
        if let Some(context) = &self.context {
            config.completion.context = Some(context.clone());
        }
        if self.no_summary {
            config.completion.summarize = false;
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns true if a single question was given with --query.
    pub fn is_one_shot(&self) -> bool {
        self.query.is_some()
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }
}
