//! Traffic-engineering min-delay configuration.

use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use crate::eapi::{CommandApi, EapiError, is_empty_result};

/// One configuration command that did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub command: String,
    pub detail: String,
}

/// Result of applying a min-delay value to one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub interface: String,
    pub delay_us: u64,
    pub errors: Vec<CommandError>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn log(&self) {
        if self.is_success() {
            info!(interface = %self.interface, delay_us = self.delay_us, "min-delay updated");
        } else {
            for e in &self.errors {
                warn!(interface = %self.interface, command = %e.command, detail = %e.detail, "config command failed");
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            return write!(
                f,
                "Min-delay setting on {} successfully updated to {} microseconds",
                self.interface, self.delay_us
            );
        }
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Error applying command: {}: {}", e.command, e.detail)?;
        }
        Ok(())
    }
}

pub fn min_delay_commands(interface: &str, delay_us: u64) -> Vec<String> {
    vec![
        "enable".to_string(),
        "configure".to_string(),
        format!("interface {}", interface),
        format!("traffic-engineering min-delay static {} microseconds", delay_us),
    ]
}

/// Sets the static min-delay on `interface`. Never fails; every problem ends
/// up in the returned [`Outcome`].
pub fn apply(api: &mut dyn CommandApi, interface: &str, delay_us: u64) -> Outcome {
    let cmds = min_delay_commands(interface, delay_us);
    let errors = match api.run_cmds(&cmds) {
        Ok(results) => collect_errors(&cmds, &results),
        Err(EapiError::Rpc {
            code,
            message,
            data,
        }) if !data.is_empty() => {
            let mut errors = collect_errors(&cmds, &data);
            if errors.is_empty() {
                errors.push(CommandError {
                    command: cmds[data.len().min(cmds.len()) - 1].clone(),
                    detail: format!("error {}: {}", code, message),
                });
            }
            errors.extend(cmds.iter().skip(data.len()).map(|c| CommandError {
                command: c.clone(),
                detail: "not executed".to_string(),
            }));
            errors
        }
        Err(e) => vec![CommandError {
            command: cmds.join("; "),
            detail: e.to_string(),
        }],
    };
    Outcome {
        interface: interface.to_string(),
        delay_us,
        errors,
    }
}

fn collect_errors(cmds: &[String], results: &[Value]) -> Vec<CommandError> {
    cmds.iter()
        .zip(results)
        .filter(|(_, r)| !is_empty_result(r))
        .map(|(c, r)| CommandError {
            command: c.clone(),
            detail: r.to_string(),
        })
        .collect()
}
