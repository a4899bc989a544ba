use crate::cmd::device::{load_registry, runtime, session_config, DeviceSession, DeviceSpec};
use crate::cmd::DeviceArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = DeviceSpec::parse(&device.device)?;
    let registry = load_registry(device)?;
    let config = session_config(device)?;

    runtime()?.block_on(async {
        let conn = DeviceSession::open(&spec, registry, config).await?;
        let result = conn.session.request_status().await;
        conn.close(device.show_log).await;

        let status = result.map_err(|err| session_error("status failed", err))?;
        print_status(&status, format);
        Ok(SUCCESS)
    })
}
