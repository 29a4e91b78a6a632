//! Line-oriented command loop. The table stays in memory between commands,
//! so `save` and `load` act on the live table rather than re-reading per command.

use std::io::{BufRead, Write};

use anyhow::Result;
use linetrack_core::{Command, Controller};

use crate::presentation::render::{OutputFormat, write_payload};

pub const HELP: &str = "\
commands:
  show
  update <fluid line> <stage> <percent>   (quote names with spaces)
  save
  load
  help
  quit";

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Help,
    Quit,
}

pub fn run<R: BufRead, W: Write>(
    controller: &mut Controller,
    input: R,
    out: &mut W,
    format: OutputFormat,
    prompt: bool,
) -> Result<()> {
    if prompt {
        writeln!(out, "{HELP}")?;
    }
    write_payload(out, &controller.render(None), format)?;

    let mut lines = input.lines();
    loop {
        if prompt {
            write!(out, "linetrack> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Help) => writeln!(out, "{HELP}")?,
            Ok(Input::Command(cmd)) => {
                let payload = controller.dispatch(cmd);
                write_payload(out, &payload, format)?;
            }
            Err(msg) => writeln!(out, "[error] {msg}")?,
        }
    }
    Ok(())
}

fn parse(line: &str) -> std::result::Result<Input, String> {
    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["show"] => Ok(Input::Command(Command::Show)),
        ["save"] => Ok(Input::Command(Command::Save)),
        ["load"] => Ok(Input::Command(Command::Load)),
        ["help" | "?"] => Ok(Input::Help),
        ["quit" | "exit"] => Ok(Input::Quit),
        ["update", fluid_line, stage, pct] => {
            let percentage: u32 = pct
                .parse()
                .map_err(|_| format!("percentage must be a whole number, got {pct:?}"))?;
            Ok(Input::Command(Command::SelectAndUpdate {
                fluid_line: fluid_line.to_string(),
                stage: stage.to_string(),
                percentage: f64::from(percentage),
            }))
        }
        ["update", ..] => Err("usage: update <fluid line> <stage> <percent>".to_string()),
        [other, ..] => Err(format!("unknown command {other:?}; try `help`")),
        [] => Err("empty command".to_string()),
    }
}
