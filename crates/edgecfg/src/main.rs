mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, DeviceArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "edgecfg", version, about = "Edge tracker configurator")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.device, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_with_global_flags() {
        let cli = Cli::try_parse_from([
            "edgecfg",
            "--schema",
            "tracker.json",
            "set",
            "0x10",
            "300",
            "--settle",
            "10ms",
        ])
        .expect("set args should parse");

        assert!(matches!(cli.command, Command::Set(_)));
        assert_eq!(cli.device.settle, "10ms");
        assert_eq!(cli.device.device, "sim");
    }

    #[test]
    fn parses_decode_value() {
        let cli = Cli::try_parse_from(["edgecfg", "decode-value", "uint16", "2c01"])
            .expect("decode-value args should parse");
        assert!(matches!(cli.command, Command::DecodeValue(_)));
    }

    #[test]
    fn set_requires_a_value() {
        let err = Cli::try_parse_from(["edgecfg", "set", "0x10"])
            .expect_err("missing value should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
