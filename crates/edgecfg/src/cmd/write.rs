use crate::cmd::device::{load_registry, resolve_id, runtime, session_config, DeviceSession, DeviceSpec};
use crate::cmd::{DeviceArgs, IdArgs, SetArgs};
use crate::exit::{schema_error, session_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run_set(args: SetArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    write(&args.id, Some(&args.value), device, format)
}

pub fn run_reset(args: IdArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    write(&args.id, None, device, format)
}

/// `Some(text)` writes the operator's value, `None` the schema default.
fn write(id: &str, text: Option<&str>, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = DeviceSpec::parse(&device.device)?;
    let registry = load_registry(device)?;
    let id = resolve_id(&registry, id)?;
    let config = session_config(device)?;
    let context = if text.is_some() { "set failed" } else { "reset failed" };

    runtime()?.block_on(async {
        let conn = DeviceSession::open(&spec, registry, config).await?;
        let result = match text {
            Some(text) => conn.session.update_setting(id, text).await,
            None => conn.session.reset_setting(id).await,
        };
        let registry = conn.session.registry();
        conn.close(device.show_log).await;

        let reply = result.map_err(|err| session_error(context, err))?;
        let entry = registry
            .lookup(reply.id)
            .map_err(|err| schema_error(context, err))?;
        print_value(&reply, entry, format);
        Ok(SUCCESS)
    })
}
