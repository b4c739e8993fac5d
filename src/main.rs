use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod eapi;
mod logging;
mod probe;
mod run;
mod te;

fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    logging::init(&args.log_level)?;
    let mut api = eapi::EapiClient::new(&args.socket).context("starting command API client")?;
    let status = run::run(&args, &mut api, &mut std::io::stdout().lock())?;
    Ok(status.exit_code())
}
