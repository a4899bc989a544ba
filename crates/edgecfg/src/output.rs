use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use edgecfg_codec::{Conversion, StatusRecord, Value};
use edgecfg_schema::{group_by_prefix, SchemaEntry, SchemaRegistry};
use edgecfg_session::{FetchedSetting, LogEntry, ValueReply};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

fn print_json<T: Serialize + ?Sized>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    #[serde(flatten)]
    reply: &'a ValueReply,
    is_default: bool,
}

pub fn print_value(reply: &ValueReply, entry: &SchemaEntry, format: OutputFormat) {
    let is_default = entry.is_default(&reply.value);
    match format {
        OutputFormat::Json => print_json(&ValueOutput { reply, is_default }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "NAME", "CONVERSION", "VALUE", "DEFAULT"]);
            table.add_row(vec![
                reply.id.to_string(),
                reply.name.clone(),
                entry.conversion_name.clone(),
                reply.value.to_string(),
                default_marker(is_default).to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} ({}) = {}{}", reply.name, reply.id, reply.value, default_suffix(is_default));
        }
    }
}

pub fn print_status(status: &StatusRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, value) in status_rows(status) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in status_rows(status) {
                println!("{field:<14} {value}");
            }
        }
    }
}

fn status_rows(status: &StatusRecord) -> Vec<(&'static str, String)> {
    let errors = status.active_errors();
    vec![
        ("reset", status.reset.to_string()),
        ("battery", format!("{} mV", status.battery_mv)),
        ("charge", format!("{} mV", status.charge_mv)),
        ("temperature", format!("{:.2}", status.temperature)),
        ("uptime", format!("{} days", status.uptime_days)),
        (
            "acceleration",
            format!("{:.2} / {:.2} / {:.2}", status.acc_x, status.acc_y, status.acc_z),
        ),
        ("locked", status.locked.to_string()),
        ("msg pending", status.message_pending.to_string()),
        ("lr joined", status.lr_joined.to_string()),
        ("lr satellites", status.lr_satellites.to_string()),
        (
            "errors",
            if errors.is_empty() {
                "none".to_string()
            } else {
                errors.join(", ")
            },
        ),
        ("hardware", format!("{} {}", status.hw_type, status.hw_version())),
        ("firmware", format!("{} {}", status.fw_type, status.fw_version())),
        ("sat support", status.sat_support.to_string()),
        ("sat tries", status.sat_tries.to_string()),
        ("rf scan", status.rf_scan.to_string()),
        ("fence", status.fence.to_string()),
    ]
}

#[derive(Serialize)]
struct DumpRow<'a> {
    group: String,
    id: String,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    is_default: bool,
}

pub fn print_settings(fetched: &[FetchedSetting], format: OutputFormat) {
    let entries: Vec<&SchemaEntry> = fetched.iter().map(|f| &f.entry).collect();
    let mut rows = Vec::with_capacity(fetched.len());
    for group in group_by_prefix(entries) {
        for &entry in &group.entries {
            let Some(item) = fetched.iter().find(|f| f.entry.id == entry.id) else {
                continue;
            };
            rows.push(DumpRow {
                group: group.title(),
                id: entry.id.to_string(),
                name: &entry.name,
                value: item.result.as_ref().ok(),
                error: item.result.as_ref().err().map(ToString::to_string),
                is_default: item.is_default(),
            });
        }
    }

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(vec!["GROUP", "ID", "NAME", "VALUE", "DEFAULT"]);
            for row in &rows {
                table.add_row(vec![
                    row.group.clone(),
                    row.id.clone(),
                    row.name.to_string(),
                    dump_cell(row),
                    default_marker(row.is_default).to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut current = None;
            for row in &rows {
                if current != Some(&row.group) {
                    println!("[{}]", row.group);
                    current = Some(&row.group);
                }
                println!("  {} ({}) = {}{}", row.name, row.id, dump_cell(row), default_suffix(row.is_default));
            }
        }
    }
}

fn dump_cell(row: &DumpRow<'_>) -> String {
    match (row.value, &row.error) {
        (Some(value), _) => value.to_string(),
        (None, Some(error)) => format!("<{error}>"),
        (None, None) => String::new(),
    }
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    settings: Vec<&'a SchemaEntry>,
    values: Vec<&'a SchemaEntry>,
}

pub fn print_schema(registry: &SchemaRegistry, format: OutputFormat) {
    let settings = registry.settings();
    let values = registry.values();
    match format {
        OutputFormat::Json => print_json(&SchemaOutput { settings, values }),
        OutputFormat::Table => {
            let mut table = new_table(vec![
                "GROUP", "ID", "NAME", "CONVERSION", "MIN", "MAX", "DEFAULT",
            ]);
            for group in group_by_prefix(settings) {
                for entry in &group.entries {
                    table.add_row(schema_row(group.title(), entry));
                }
            }
            for entry in values {
                table.add_row(schema_row("values".to_string(), entry));
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for group in group_by_prefix(settings) {
                println!("[{}]", group.title());
                for entry in &group.entries {
                    println!("  {} ({}) {}", entry.name, entry.id, entry.conversion_name);
                }
            }
            println!("[values]");
            for entry in values {
                println!("  {} ({}) {}", entry.name, entry.id, entry.conversion_name);
            }
        }
    }
}

fn schema_row(group: String, entry: &SchemaEntry) -> Vec<String> {
    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    vec![
        group,
        entry.id.to_string(),
        entry.name.clone(),
        entry.conversion_name.clone(),
        opt(entry.min),
        opt(entry.max),
        entry
            .default
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    ]
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    conversion: &'static str,
    value: &'a Value,
}

pub fn print_decoded(conversion: Conversion, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodedOutput {
            conversion: conversion.as_str(),
            value,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["CONVERSION", "VALUE"]);
            table.add_row(vec![conversion.to_string(), value.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{conversion}: {value}"),
    }
}

pub fn print_activity(entries: &[LogEntry]) {
    for entry in entries {
        eprintln!("{entry}");
    }
}

fn default_marker(is_default: bool) -> &'static str {
    if is_default {
        "yes"
    } else {
        ""
    }
}

fn default_suffix(is_default: bool) -> &'static str {
    if is_default {
        " (default)"
    } else {
        ""
    }
}
