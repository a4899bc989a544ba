//! Nordic UART link over BLE.
//!
//! The tracker advertises manufacturer data under company id `0x0A61` and
//! exposes the Nordic UART service. Commands are written to the RX
//! characteristic; responses arrive as notifications on TX.

use std::collections::BTreeSet;
use std::pin::Pin;
use std::time::Duration;

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{ChannelError, Result};
use crate::traits::{DuplexChannel, FrameSink};

/// Bluetooth SIG company identifier carried in the tracker's advertisement.
pub const COMPANY_ID: u16 = 0x0A61;

/// Nordic UART service.
pub const UART_SERVICE_UUID: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// Host → device characteristic.
pub const UART_RX_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// Device → host characteristic (notifications).
pub const UART_TX_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// Connection parameters for [`connect`].
#[derive(Debug, Clone)]
pub struct BleConfig {
    /// Name or address fragment. `None` picks the first tracker advertising [`COMPANY_ID`].
    pub target: Option<String>,
    /// How long to scan before choosing a peripheral.
    pub scan_duration: Duration,
    /// Capacity of the inbound notification queue.
    pub notification_queue: usize,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            target: None,
            scan_duration: Duration::from_secs(5),
            notification_queue: 32,
        }
    }
}

/// Outbound half of a BLE link.
pub struct BleSink {
    peripheral: Peripheral,
    rx_char: Characteristic,
}

impl FrameSink for BleSink {
    async fn send_frame(&self, frame: Bytes) -> Result<()> {
        self.peripheral
            .write(&self.rx_char, &frame, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}

/// Connection handle kept alive alongside the channel.
pub struct BleLink {
    peripheral: Peripheral,
    name: String,
    pump: JoinHandle<()>,
}

impl BleLink {
    /// Advertised device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop forwarding notifications and drop the connection.
    pub async fn disconnect(self) -> Result<()> {
        self.pump.abort();
        self.peripheral.disconnect().await?;
        tracing::info!(device = %self.name, "disconnected");
        Ok(())
    }
}

/// Scan, connect and subscribe to the tracker's UART notifications.
///
/// A failure after the connection is made disconnects again before
/// returning the error.
pub async fn connect(config: &BleConfig) -> Result<(DuplexChannel<BleSink>, BleLink)> {
    let adapter = default_adapter().await?;
    let (peripheral, name) = find_tracker(&adapter, config).await?;

    peripheral.connect().await?;
    let (rx_char, mut stream) = match open_uart(&peripheral).await {
        Ok(parts) => parts,
        Err(err) => {
            if let Err(disconnect_err) = peripheral.disconnect().await {
                tracing::warn!(device = %name, %disconnect_err, "disconnect after failed setup");
            }
            return Err(err);
        }
    };

    let (tx, notifications) = mpsc::channel(config.notification_queue.max(1));
    let pump = tokio::spawn(async move {
        while let Some(notification) = stream.next().await {
            if notification.uuid != UART_TX_UUID {
                continue;
            }
            if tx.send(Bytes::from(notification.value)).await.is_err() {
                break;
            }
        }
        tracing::debug!("notification stream ended");
    });

    tracing::info!(device = %name, "connected");

    let sink = BleSink {
        peripheral: peripheral.clone(),
        rx_char,
    };
    let link = BleLink {
        peripheral,
        name,
        pump,
    };
    Ok((DuplexChannel::new(sink, notifications), link))
}

/// Discover the UART service, subscribe to TX and return RX plus the
/// notification stream.
async fn open_uart(peripheral: &Peripheral) -> Result<(Characteristic, NotificationStream)> {
    peripheral.discover_services().await?;
    let (tx_char, rx_char) = uart_endpoints(&peripheral.characteristics())?;
    peripheral.subscribe(&tx_char).await?;
    let stream = peripheral.notifications().await?;
    Ok((rx_char, stream))
}

/// Pick the TX and RX characteristics, in that order.
fn uart_endpoints(characteristics: &BTreeSet<Characteristic>) -> Result<(Characteristic, Characteristic)> {
    let find = |uuid: Uuid| {
        characteristics
            .iter()
            .find(|c| c.uuid == uuid)
            .cloned()
            .ok_or_else(|| ChannelError::MissingEndpoint(uuid.to_string()))
    };
    Ok((find(UART_TX_UUID)?, find(UART_RX_UUID)?))
}

async fn default_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ChannelError::NotFound("no Bluetooth adapter".to_string()))
}

/// Scan for `scan_duration` and pick a peripheral. The scan is stopped on
/// every path.
async fn find_tracker(adapter: &Adapter, config: &BleConfig) -> Result<(Peripheral, String)> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(config.scan_duration).await;

    let found = pick_tracker(adapter, config.target.as_deref()).await;
    let stopped = adapter.stop_scan().await;
    let found = found?;
    stopped?;

    found.ok_or_else(|| {
        ChannelError::NotFound(
            config
                .target
                .clone()
                .unwrap_or_else(|| format!("no peripheral advertising company id {COMPANY_ID:#06x}")),
        )
    })
}

async fn pick_tracker(adapter: &Adapter, target: Option<&str>) -> Result<Option<(Peripheral, String)>> {
    for peripheral in adapter.peripherals().await? {
        let Some(props) = peripheral.properties().await? else {
            continue;
        };
        let name = props.local_name.clone().unwrap_or_default();
        let address = peripheral.address().to_string();
        let advertises = props.manufacturer_data.contains_key(&COMPANY_ID);
        if is_tracker(&name, &address, advertises, target) {
            return Ok(Some((peripheral, name)));
        }
    }
    Ok(None)
}

/// A target filter matches name or address; without one, the company id
/// in the advertisement decides.
fn is_tracker(name: &str, address: &str, advertises_company: bool, target: Option<&str>) -> bool {
    match target {
        Some(target) => name.contains(target) || address.contains(target),
        None => advertises_company,
    }
}

#[cfg(test)]
mod tests {
    use btleplug::api::CharPropFlags;

    use super::*;

    fn characteristic(uuid: Uuid, properties: CharPropFlags) -> Characteristic {
        Characteristic {
            uuid,
            service_uuid: UART_SERVICE_UUID,
            properties,
            descriptors: BTreeSet::new(),
        }
    }

    #[test]
    fn picks_uart_endpoints() {
        let set: BTreeSet<_> = [
            characteristic(UART_RX_UUID, CharPropFlags::WRITE),
            characteristic(UART_TX_UUID, CharPropFlags::NOTIFY),
        ]
        .into_iter()
        .collect();

        let (tx, rx) = uart_endpoints(&set).unwrap();
        assert_eq!(tx.uuid, UART_TX_UUID);
        assert_eq!(rx.uuid, UART_RX_UUID);
    }

    #[test]
    fn missing_tx_is_reported() {
        let set: BTreeSet<_> = [characteristic(UART_RX_UUID, CharPropFlags::WRITE)]
            .into_iter()
            .collect();

        let err = uart_endpoints(&set).unwrap_err();
        assert!(matches!(err, ChannelError::MissingEndpoint(ref uuid) if *uuid == UART_TX_UUID.to_string()));
    }

    #[test]
    fn tracker_selection() {
        assert!(is_tracker("Rhino-01", "AA:BB", false, Some("Rhino")));
        assert!(is_tracker("", "AA:BB:CC", false, Some("BB:CC")));
        assert!(!is_tracker("Other", "AA:BB", true, Some("Rhino")));
        assert!(is_tracker("", "AA:BB", true, None));
        assert!(!is_tracker("Rhino-01", "AA:BB", false, None));
    }
}
