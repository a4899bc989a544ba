use edgecfg::codec::{decode, decode_status, Conversion, STATUS_PORT};

use crate::cmd::{DecodeStatusArgs, DecodeValueArgs};
use crate::exit::{codec_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_decoded, print_status, OutputFormat};

pub fn run_status(args: DecodeStatusArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let body = if args.with_port {
        match bytes.split_first() {
            Some((&STATUS_PORT, body)) => body,
            Some((&port, _)) => {
                return Err(CliError::new(
                    DATA_INVALID,
                    format!("port {port} is not the status port {STATUS_PORT}"),
                ))
            }
            None => &[][..],
        }
    } else {
        &bytes[..]
    };

    let status = decode_status(body).map_err(|err| codec_error("decode failed", err))?;
    print_status(&status, format);
    Ok(SUCCESS)
}

pub fn run_value(args: DecodeValueArgs, format: OutputFormat) -> CliResult<i32> {
    let conversion = Conversion::from_name(&args.conversion).ok_or_else(|| {
        let known: Vec<&str> = Conversion::ALL.iter().map(|c| c.as_str()).collect();
        CliError::new(
            USAGE,
            format!(
                "unknown conversion {:?} (expected one of: {})",
                args.conversion,
                known.join(", ")
            ),
        )
    })?;
    let bytes = parse_hex(&args.hex)?;

    let value = decode(&bytes, conversion).map_err(|err| codec_error("decode failed", err))?;
    print_decoded(conversion, &value, format);
    Ok(SUCCESS)
}

/// Hex digits with optional `0x` prefix; whitespace, `:` and `-` are ignored.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':' && *b != b'-')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|text| u8::from_str_radix(text, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex input: {input}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_with_separators() {
        assert_eq!(parse_hex("2c01").unwrap(), vec![0x2C, 0x01]);
        assert_eq!(parse_hex("0x2C 01").unwrap(), vec![0x2C, 0x01]);
        assert_eq!(parse_hex("de:ad-be ef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn bad_hex_is_usage_error() {
        assert_eq!(parse_hex("abc").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("zz").unwrap_err().code, USAGE);
    }
}
