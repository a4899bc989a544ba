use std::fmt;

use edgecfg_channel::ChannelError;
use edgecfg_codec::CodecError;
use edgecfg_schema::SchemaError;
use edgecfg_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CHANNEL_ERROR: i32 = 3;
pub const NOT_FOUND: i32 = 4;
pub const BUSY: i32 = 16;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CONFIG: i32 = 78;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    let code = match err {
        ChannelError::NotFound(_) | ChannelError::MissingEndpoint(_) => NOT_FOUND,
        _ => CHANNEL_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    let code = match err {
        CodecError::UnsupportedConversion { .. } => CONFIG,
        _ => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) | SchemaError::InvalidJson(_) | SchemaError::DuplicateId { .. } => {
            CliError::new(CONFIG, format!("{context}: {err}"))
        }
        SchemaError::UnknownSettingId(_) => CliError::new(NOT_FOUND, format!("{context}: {err}")),
        SchemaError::InvalidId(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SchemaError::Codec(err) => codec_error(context, err),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::RequestAlreadyPending => CliError::new(BUSY, format!("{context}: {err}")),
        SessionError::Channel(err) => channel_error(context, err),
        SessionError::Schema(err) => schema_error(context, err),
        SessionError::Codec(err) => codec_error(context, err),
        SessionError::NoDefault(_) => CliError::new(CONFIG, format!("{context}: {err}")),
        SessionError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::UnknownPort(_)
        | SessionError::EmptyFrame
        | SessionError::TruncatedResponse { .. }
        | SessionError::UnexpectedReply { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use edgecfg_schema::SettingId;

    use super::*;

    #[test]
    fn timeout_maps_to_124() {
        let err = session_error("read failed", SessionError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn nested_errors_keep_their_code() {
        let err = session_error(
            "get",
            SessionError::Schema(SchemaError::UnknownSettingId(SettingId::new(1))),
        );
        assert_eq!(err.code, NOT_FOUND);

        let err = session_error(
            "set",
            SessionError::Schema(SchemaError::Codec(CodecError::UnsupportedConversion {
                entry: "x".to_string(),
                conversion: "uint64".to_string(),
            })),
        );
        assert_eq!(err.code, CONFIG);

        let err = session_error("send", SessionError::Channel(ChannelError::Closed));
        assert_eq!(err.code, CHANNEL_ERROR);
    }
}
