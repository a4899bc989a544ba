use crate::cmd::device::load_registry;
use crate::cmd::DeviceArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_schema, OutputFormat};

pub fn run(device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(device)?;
    print_schema(&registry, format);
    Ok(SUCCESS)
}
