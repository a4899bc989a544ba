use crate::cmd::device::{load_registry, runtime, session_config, DeviceSession, DeviceSpec};
use crate::cmd::DeviceArgs;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::{print_settings, OutputFormat};

/// Exits with `FAILURE` when any setting could not be read; the rest are
/// still printed.
pub fn run(device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = DeviceSpec::parse(&device.device)?;
    let registry = load_registry(device)?;
    let config = session_config(device)?;

    runtime()?.block_on(async {
        let conn = DeviceSession::open(&spec, registry, config).await?;
        let fetched = conn
            .session
            .fetch_all_settings_with_progress(|done, total, entry| {
                tracing::info!(done, total, name = %entry.name, "setting read");
            })
            .await;
        conn.close(device.show_log).await;

        print_settings(&fetched, format);
        if fetched.iter().all(|f| f.result.is_ok()) {
            Ok(SUCCESS)
        } else {
            Ok(FAILURE)
        }
    })
}
