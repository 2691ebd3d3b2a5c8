//! btleplug-backed desk transport.
//!
//! Scanning, connection, and GATT I/O run on a private tokio runtime; the
//! notification stream is bridged into a crossbeam channel so the core's
//! synchronous plumbing can consume it. Link-level operations carry the
//! caller-specified timeouts from [`BleOptions`].

use std::sync::Arc;
use std::time::Duration;

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use crossbeam_channel as xch;
use desk_traits::{MoveSink, PositionSource};
use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::error::{LinkError, Result};
use crate::{MOVE_CHARACTERISTIC_UUID, POSITION_CHARACTERISTIC_UUID, POSITION_SERVICE_UUID};

/// Discovery and link timeouts, caller-specified per operation.
#[derive(Debug, Clone)]
pub struct BleOptions {
    /// Peripheral name substring to match while scanning (desks advertise as
    /// "Desk NNNN").
    pub name_pattern: String,
    pub scan_timeout: Duration,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for BleOptions {
    fn default() -> Self {
        Self {
            name_pattern: "Desk".to_string(),
            scan_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
        }
    }
}

fn ble_err(e: btleplug::Error) -> LinkError {
    LinkError::Ble(e.to_string())
}

/// A connected desk peripheral with its characteristics resolved and
/// notifications subscribed.
pub struct BleDesk {
    runtime: Arc<Runtime>,
    peripheral: Peripheral,
    position_char: Characteristic,
    move_char: Characteristic,
    notifications: xch::Receiver<Vec<u8>>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl BleDesk {
    /// Scan for the first peripheral whose advertised name matches, connect,
    /// resolve the position/move characteristics, and enable notifications.
    pub fn connect(opts: &BleOptions) -> Result<Self> {
        let runtime = Arc::new(Runtime::new()?);
        let read_timeout = opts.read_timeout;
        let write_timeout = opts.write_timeout;
        let opts = opts.clone();

        let (peripheral, position_char, move_char, notifications) =
            runtime.block_on(async move {
                let manager = Manager::new().await.map_err(ble_err)?;
                let adapter = manager
                    .adapters()
                    .await
                    .map_err(ble_err)?
                    .into_iter()
                    .next()
                    .ok_or(LinkError::NoAdapter)?;

                let peripheral = scan_for_desk(&adapter, &opts).await?;
                let name = peripheral
                    .properties()
                    .await
                    .map_err(ble_err)?
                    .and_then(|p| p.local_name)
                    .unwrap_or_else(|| peripheral.id().to_string());
                tracing::info!(%name, "connecting to desk");

                tokio::time::timeout(opts.connect_timeout, peripheral.connect())
                    .await
                    .map_err(|_| LinkError::Timeout)?
                    .map_err(ble_err)?;
                peripheral.discover_services().await.map_err(ble_err)?;

                let chars = peripheral.characteristics();
                let position_char = chars
                    .iter()
                    .find(|c| c.uuid == POSITION_CHARACTERISTIC_UUID)
                    .cloned()
                    .ok_or(LinkError::CharacteristicMissing("position"))?;
                let move_char = chars
                    .iter()
                    .find(|c| c.uuid == MOVE_CHARACTERISTIC_UUID)
                    .cloned()
                    .ok_or(LinkError::CharacteristicMissing("move"))?;

                peripheral.subscribe(&position_char).await.map_err(ble_err)?;

                // Bridge the async notification stream into a channel the
                // synchronous core can drain. The task ends when the stream
                // does; dropping the sender signals end-of-stream downstream.
                let mut stream = peripheral.notifications().await.map_err(ble_err)?;
                let (tx, rx) = xch::unbounded();
                tokio::spawn(async move {
                    while let Some(notification) = stream.next().await {
                        if notification.uuid != POSITION_CHARACTERISTIC_UUID {
                            continue;
                        }
                        if tx.send(notification.value).is_err() {
                            break;
                        }
                    }
                    tracing::debug!("ble notification stream ended");
                });

                Ok::<_, LinkError>((peripheral, position_char, move_char, rx))
            })?;

        Ok(Self {
            runtime,
            peripheral,
            position_char,
            move_char,
            notifications,
            read_timeout,
            write_timeout,
        })
    }

    /// Read the position characteristic directly (initial height at connect).
    pub fn read_position(&self) -> Result<Vec<u8>> {
        let peripheral = self.peripheral.clone();
        let characteristic = self.position_char.clone();
        let timeout = self.read_timeout;
        self.runtime.block_on(async move {
            tokio::time::timeout(timeout, peripheral.read(&characteristic))
                .await
                .map_err(|_| LinkError::Timeout)?
                .map_err(ble_err)
        })
    }

    pub fn disconnect(&self) -> Result<()> {
        let peripheral = self.peripheral.clone();
        self.runtime
            .block_on(async move { peripheral.disconnect().await.map_err(ble_err) })
    }

    /// Split into the trait halves consumed by the core.
    pub fn split(self) -> (BlePositionSource, BleMoveSink) {
        let source = BlePositionSource {
            rx: self.notifications,
        };
        let sink = BleMoveSink {
            runtime: self.runtime,
            peripheral: self.peripheral,
            move_char: self.move_char,
            write_timeout: self.write_timeout,
        };
        (source, sink)
    }
}

async fn scan_for_desk(adapter: &Adapter, opts: &BleOptions) -> Result<Peripheral> {
    let filter = ScanFilter {
        services: vec![POSITION_SERVICE_UUID],
    };
    adapter.start_scan(filter).await.map_err(ble_err)?;

    let deadline = tokio::time::Instant::now() + opts.scan_timeout;
    let found = 'scan: loop {
        for peripheral in adapter.peripherals().await.map_err(ble_err)? {
            let name = peripheral
                .properties()
                .await
                .map_err(ble_err)?
                .and_then(|p| p.local_name);
            if let Some(name) = name
                && name.contains(&opts.name_pattern)
            {
                tracing::debug!(%name, "discovered desk peripheral");
                break 'scan Some(peripheral);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            break None;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };

    let _ = adapter.stop_scan().await;
    found.ok_or(LinkError::DeskNotFound)
}

pub struct BlePositionSource {
    rx: xch::Receiver<Vec<u8>>,
}

impl PositionSource for BlePositionSource {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(xch::RecvTimeoutError::Timeout) => Err(Box::new(LinkError::Timeout)),
            Err(xch::RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

pub struct BleMoveSink {
    runtime: Arc<Runtime>,
    peripheral: Peripheral,
    move_char: Characteristic,
    write_timeout: Duration,
}

impl MoveSink for BleMoveSink {
    fn write(
        &mut self,
        frame: [u8; 2],
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let peripheral = self.peripheral.clone();
        let characteristic = self.move_char.clone();
        let timeout = self.write_timeout;
        let result = self.runtime.block_on(async move {
            tokio::time::timeout(
                timeout,
                peripheral.write(&characteristic, &frame, WriteType::WithoutResponse),
            )
            .await
            .map_err(|_| LinkError::Timeout)?
            .map_err(ble_err)
        });
        result.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}
