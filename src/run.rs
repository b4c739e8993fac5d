use anyhow::{Context, Result};
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};

use crate::cli::Cli;
use crate::eapi::CommandApi;
use crate::probe::{self, TwpingParser};
use crate::te;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Updated,
    MeasurementFailed,
    ConfigurationFailed,
}

impl RunStatus {
    pub fn code(self) -> u8 {
        match self {
            RunStatus::Updated => 0,
            RunStatus::MeasurementFailed => 3,
            RunStatus::ConfigurationFailed => 4,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// One measurement, then at most one configuration attempt.
pub fn run(opts: &Cli, api: &mut dyn CommandApi, out: &mut dyn Write) -> Result<RunStatus> {
    info!(endpoint = %opts.ip, interface = %opts.interface, "starting delay probe");

    let delay = match probe::measure(api, &TwpingParser, &opts.ip) {
        Ok(d) => d,
        Err(e) => {
            error!(endpoint = %opts.ip, "measurement failed: {}", e);
            writeln!(out, "Error in measuring delay...no changes will be made.")?;
            match e.raw_output() {
                Some(raw) => writeln!(out, "twping result: {}", raw)?,
                None => writeln!(out, "twping result: {}", e)?,
            }
            return Ok(RunStatus::MeasurementFailed);
        }
    };

    let outcome = te::apply(api, &opts.interface, delay);
    outcome.log();
    writeln!(out, "{}", outcome).context("writing outcome")?;
    Ok(if outcome.is_success() {
        RunStatus::Updated
    } else {
        RunStatus::ConfigurationFailed
    })
}
