//! Link delay measurement via `twping` on the device.

use thiserror::Error;
use tracing::{debug, info};

use crate::eapi::{CommandApi, EapiError};

pub mod parser;

pub use parser::{DelayParser, ParseError, TwpingParser};

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("twping failed: {0}")]
    Rpc(#[from] EapiError),
    #[error("twping returned no message text")]
    MissingOutput,
    #[error("{source}")]
    Parse {
        #[source]
        source: ParseError,
        raw: String,
    },
}

impl MeasurementError {
    /// Probe output that failed to parse, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            MeasurementError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// TWAMP light test port the remote reflector listens on.
pub const TWAMP_PORT: u16 = 50099;

pub fn twping_command(endpoint: &str) -> String {
    format!("twping address {} port {}", endpoint, TWAMP_PORT)
}

/// Runs one TWAMP probe and returns the round-trip median in microseconds.
pub fn measure(
    api: &mut dyn CommandApi,
    parser: &dyn DelayParser,
    endpoint: &str,
) -> Result<u64, MeasurementError> {
    let cmd = twping_command(endpoint);
    let out = api.run_cmds(std::slice::from_ref(&cmd))?;

    // Unconverted commands come back as {"messages": ["<cli text>"]}
    let raw = out
        .first()
        .and_then(|r| r.get("messages"))
        .and_then(|m| m.get(0))
        .and_then(|m| m.as_str())
        .ok_or(MeasurementError::MissingOutput)?;
    debug!(endpoint, bytes = raw.len(), "twping output");

    let delay = parser.parse(raw).map_err(|source| MeasurementError::Parse {
        source,
        raw: raw.to_string(),
    })?;
    info!(endpoint, delay_us = delay, "measured round-trip median");
    Ok(delay)
}
