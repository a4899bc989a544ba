use crate::cmd::device::{load_registry, resolve_id, runtime, session_config, DeviceSession, DeviceSpec};
use crate::cmd::{DeviceArgs, IdArgs};
use crate::exit::{schema_error, session_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

#[derive(Clone, Copy)]
enum ReadKind {
    Setting,
    Value,
}

pub fn run_setting(args: IdArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    run(ReadKind::Setting, &args.id, device, format)
}

pub fn run_value(args: IdArgs, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    run(ReadKind::Value, &args.id, device, format)
}

fn run(kind: ReadKind, id: &str, device: &DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = DeviceSpec::parse(&device.device)?;
    let registry = load_registry(device)?;
    let id = resolve_id(&registry, id)?;
    let config = session_config(device)?;

    runtime()?.block_on(async {
        let conn = DeviceSession::open(&spec, registry, config).await?;
        let result = match kind {
            ReadKind::Setting => conn.session.request_setting(id).await,
            ReadKind::Value => conn.session.request_value(id).await,
        };
        let registry = conn.session.registry();
        conn.close(device.show_log).await;

        let reply = result.map_err(|err| session_error("read failed", err))?;
        let entry = registry
            .lookup(reply.id)
            .map_err(|err| schema_error("read failed", err))?;
        print_value(&reply, entry, format);
        Ok(SUCCESS)
    })
}
