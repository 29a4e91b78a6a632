use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use linetrack_core::SchemaVariant;
use linetrack_core::schema::DEFAULT_DATA_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Fluid-line commissioning progress tracker", long_about = None)]
pub struct Cli {
    /// Progress file (CSV)
    #[arg(long, global = true, default_value = DEFAULT_DATA_FILE)]
    pub file: PathBuf,

    /// Fluid-line and stage layout to track against
    #[arg(long, global = true, value_enum, default_value_t = SchemaArg::Canonical)]
    pub schema: SchemaArg,

    /// Substitute 0 for unreadable cells instead of refusing the file
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Do not write the file after each update
    #[arg(long, global = true)]
    pub no_autosave: bool,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// -v for info logs, -vv for debug (RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemaArg {
    /// Current seven-stage checklist
    Canonical,
    /// First form revision (eight stages, split WT lines)
    PreFlushing,
}

impl From<SchemaArg> for SchemaVariant {
    fn from(a: SchemaArg) -> Self {
        match a {
            SchemaArg::Canonical => SchemaVariant::Canonical,
            SchemaArg::PreFlushing => SchemaVariant::PreFlushing,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the table, per-line progress and total
    Show,

    /// Set one stage percentage for one fluid line
    Update {
        fluid_line: String,
        stage: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: u8,
    },

    /// Write the current table to the progress file
    Save,

    /// Reload the table from the progress file
    Load,

    /// List fluid lines and stages of the selected layout
    Schema,

    /// Read commands from stdin, keeping the table in memory
    Session {
        /// Save after every update (off by default in a session)
        #[arg(long)]
        autosave: bool,
    },
}
