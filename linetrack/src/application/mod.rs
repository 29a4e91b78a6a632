pub mod handlers;
pub mod logging;
pub mod session;

use crate::presentation::cli::{Cli, Commands};
use anyhow::Result;
use clap::Parser;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ctx = handlers::Context::from_cli(&cli);
    match cli.command {
        Commands::Show => handlers::handle_show(&ctx),
        Commands::Update {
            fluid_line,
            stage,
            percentage,
        } => handlers::handle_update(&ctx, fluid_line, stage, percentage),
        Commands::Save => handlers::handle_save(&ctx),
        Commands::Load => handlers::handle_load(&ctx),
        Commands::Schema => handlers::handle_schema(&ctx),
        Commands::Session { autosave } => handlers::handle_session(&ctx, autosave),
    }
}
