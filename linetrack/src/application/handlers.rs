use std::io::{self, IsTerminal};

use anyhow::{Context as _, Result};
use linetrack_core::store::StoreParams;
use linetrack_core::store_factory::{Backend, open_store};
use linetrack_core::{Controller, LoadPolicy, Schema, Status};
use tracing::info;

use crate::application::session;
use crate::presentation::cli::Cli;
use crate::presentation::render::{OutputFormat, write_payload, write_schema};

/// Options shared by every subcommand.
pub struct Context {
    pub schema: Schema,
    pub params: StoreParams,
    pub autosave: bool,
    pub format: OutputFormat,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            schema: Schema::for_variant(cli.schema.into()),
            params: StoreParams {
                path: cli.file.clone(),
                policy: if cli.lenient {
                    LoadPolicy::Lenient
                } else {
                    LoadPolicy::Strict
                },
            },
            autosave: !cli.no_autosave,
            format: if cli.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
        }
    }
}

fn fresh_controller(ctx: &Context, autosave: bool) -> Controller {
    let store = open_store(Backend::Csv, ctx.params.clone());
    Controller::new(ctx.schema, store, autosave)
}

fn controller(ctx: &Context, autosave: bool) -> Result<Controller> {
    let store = open_store(Backend::Csv, ctx.params.clone());
    Controller::open(ctx.schema, store, autosave).with_context(|| {
        format!("failed to load progress data from {}", ctx.params.path.display())
    })
}

fn emit(ctx: &Context, c: &Controller, status: Option<Status>) -> Result<()> {
    let mut out = io::stdout().lock();
    write_payload(&mut out, &c.render(status), ctx.format)
}

pub fn handle_show(ctx: &Context) -> Result<()> {
    let c = controller(ctx, false)?;
    emit(ctx, &c, None)
}

pub fn handle_update(ctx: &Context, fluid_line: String, stage: String, percentage: u8) -> Result<()> {
    let mut c = controller(ctx, ctx.autosave)?;
    c.update_cell(&fluid_line, &stage, f64::from(percentage))
        .with_context(|| format!("update of {fluid_line} / {stage} rejected"))?;
    info!(fluid_line = %fluid_line, stage = %stage, percentage, autosave = ctx.autosave, "updated");
    let msg = if ctx.autosave {
        format!("{fluid_line} / {stage} set to {percentage}% and saved")
    } else {
        format!("{fluid_line} / {stage} set to {percentage}% (not saved)")
    };
    emit(ctx, &c, Some(Status::success(msg)))
}

pub fn handle_save(ctx: &Context) -> Result<()> {
    let c = controller(ctx, false)?;
    c.save_command()
        .with_context(|| format!("failed to save progress data to {}", ctx.params.path.display()))?;
    emit(ctx, &c, Some(Status::saved(c.store().location())))
}

pub fn handle_load(ctx: &Context) -> Result<()> {
    let mut c = fresh_controller(ctx, false);
    let outcome = c.load_command().with_context(|| {
        format!("failed to load progress data from {}", ctx.params.path.display())
    })?;
    let status = Status::loaded(outcome, c.store().location());
    emit(ctx, &c, Some(status))
}

pub fn handle_schema(ctx: &Context) -> Result<()> {
    let mut out = io::stdout().lock();
    write_schema(&mut out, &ctx.schema, ctx.format)
}

pub fn handle_session(ctx: &Context, autosave: bool) -> Result<()> {
    let mut c = controller(ctx, autosave)?;
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    let mut out = io::stdout().lock();
    session::run(&mut c, stdin.lock(), &mut out, ctx.format, prompt)
}
