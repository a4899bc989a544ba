use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod device;
pub mod dump;
pub mod read;
pub mod schema;
pub mod status;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Request and print a status telegram.
    Status,
    /// Read one setting.
    Get(IdArgs),
    /// Read one runtime value.
    ReadValue(IdArgs),
    /// Validate, write and read back a setting.
    Set(SetArgs),
    /// Write a setting's schema default and read it back.
    Reset(IdArgs),
    /// Read every setting, grouped by name prefix.
    Dump,
    /// List the schema's settings and values.
    Schema,
    /// Decode a status telegram given in hex.
    DecodeStatus(DecodeStatusArgs),
    /// Decode a value payload given in hex.
    DecodeValue(DecodeValueArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Status => status::run(device, format),
        Command::Get(args) => read::run_setting(args, device, format),
        Command::ReadValue(args) => read::run_value(args, device, format),
        Command::Set(args) => write::run_set(args, device, format),
        Command::Reset(args) => write::run_reset(args, device, format),
        Command::Dump => dump::run(device, format),
        Command::Schema => schema::run(device, format),
        Command::DecodeStatus(args) => decode::run_status(args, format),
        Command::DecodeValue(args) => decode::run_value(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by every command that talks to a device.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Schema file listing the device's settings and values.
    #[arg(long, value_name = "FILE", env = "EDGECFG_SCHEMA", global = true)]
    pub schema: Option<PathBuf>,
    /// Device to talk to: `sim`, `ble`, or `ble:<name-or-address>`.
    #[arg(
        long,
        value_name = "DEVICE",
        default_value = "sim",
        env = "EDGECFG_DEVICE",
        global = true
    )]
    pub device: String,
    /// Response timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
    /// Pause between writing a setting and reading it back.
    #[arg(long, default_value = "1s", global = true)]
    pub settle: String,
    /// Print the session activity log to stderr when done.
    #[arg(long, global = true)]
    pub show_log: bool,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Id (`0x10` or `16`) or entry name.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Id (`0x10` or `16`) or entry name.
    pub id: String,
    /// New value as text (`300`, `true`, `{0x01, 0xFF}`).
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DecodeStatusArgs {
    /// Telegram bytes in hex (`08003200...`); separators are ignored.
    pub hex: String,
    /// The input starts with the status port byte.
    #[arg(long)]
    pub with_port: bool,
}

#[derive(Args, Debug)]
pub struct DecodeValueArgs {
    /// Conversion name (`uint16`, `float`, `byte_array`, ...).
    pub conversion: String,
    /// Payload bytes in hex.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}
