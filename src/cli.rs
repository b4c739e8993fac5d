use clap::Parser;
use std::path::PathBuf;

/// Default path of the local command API socket.
pub const DEFAULT_SOCKET: &str = "/var/run/command-api.sock";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "delaymon",
    about = "Link delay monitoring for use in config",
    long_about = "Measures link delay with twping and writes it into the \
                  interface's traffic-engineering min-delay setting"
)]
pub struct Cli {
    /// Remote IP of link to monitor
    #[arg(long = "ip")]
    pub ip: String,
    /// Interface to monitor
    #[arg(long)]
    pub interface: String,
    /// Command API socket path
    #[arg(long, default_value = DEFAULT_SOCKET)]
    pub socket: PathBuf,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_layout() {
        let cli = Cli::try_parse_from(["delaymon", "--ip", "1.1.1.2", "--interface", "Ethernet47"])
            .unwrap();
        assert_eq!(cli.ip, "1.1.1.2");
        assert_eq!(cli.interface, "Ethernet47");
        assert_eq!(cli.socket, PathBuf::from(DEFAULT_SOCKET));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn both_targets_required() {
        assert!(Cli::try_parse_from(["delaymon", "--ip", "1.1.1.2"]).is_err());
        assert!(Cli::try_parse_from(["delaymon", "--interface", "Ethernet1"]).is_err());
    }

    #[test]
    fn port_and_dry_run_are_not_options() {
        let base = ["delaymon", "--ip", "1.1.1.2", "--interface", "Ethernet1"];
        let with = |extra: &[&'static str]| {
            let mut args = base.to_vec();
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };
        assert!(with(&["--port", "862"]).is_err());
        assert!(with(&["--dry-run"]).is_err());
        assert!(with(&["--timeout-ms", "10"]).is_err());
    }
}
