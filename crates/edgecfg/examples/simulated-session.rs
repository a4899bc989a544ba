//! Walk a simulated tracker through a read, an update and a full dump.
//!
//! Run with:
//!   cargo run -p edgecfg --example simulated-session

use std::time::Duration;

use edgecfg::schema::SchemaRegistry;
use edgecfg::session::SessionConfig;
use edgecfg::sim::simulated_session;

const SCHEMA: &str = r#"{
    "settings": {
        "gps_interval": { "id": "0x10", "conversion": "uint16", "min": 1, "max": 3600, "default": 600 },
        "gps_mode":     { "id": "0x11", "conversion": "uint8", "default": 1 },
        "lr_adr":       { "id": "0x20", "conversion": "bool", "default": true },
        "ble_name":     { "id": "0x30", "conversion": "string", "default": "edge" }
    },
    "values": {
        "battery": { "id": "0x80", "conversion": "float" }
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = SchemaRegistry::from_json(SCHEMA)?;
    let config = SessionConfig {
        write_settle_delay: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    let (session, tracker) = simulated_session(registry, config);

    let status = session.request_status().await?;
    println!(
        "status: battery {} mV, firmware {} {}",
        status.battery_mv,
        status.fw_type,
        status.fw_version()
    );

    println!("before: {}", session.request_setting("0x10").await?);
    println!("after:  {}", session.update_setting(0x10u8, "300").await?);

    if let Err(err) = session.update_setting(0x10u8, "9000").await {
        println!("rejected: {err}");
    }

    for fetched in session.fetch_all_settings().await {
        match fetched.result {
            Ok(value) => println!("  {} = {value}", fetched.entry.name),
            Err(err) => println!("  {} failed: {err}", fetched.entry.name),
        }
    }

    println!("activity:");
    for entry in session.activity() {
        println!("  {entry}");
    }

    drop(session);
    tracker.await?;
    Ok(())
}
