//! MIDI input device management
//!
//! Enumerates input ports and opens one connection per device, with the
//! relay as the single callback sink. Devices are enumerated once at startup;
//! hot-plugging is not tracked.

use std::sync::Arc;

use midir::{Ignore, MidiInput, MidiInputConnection};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::relay::RelaySender;

/// An available input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend port identifier, stable while the device stays plugged in
    pub id: String,
    /// Display name, also used as the event source name
    pub name: String,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create MIDI input client: {0}")]
    Init(#[from] midir::InitError),
    #[error("device '{0}' is no longer available")]
    NotFound(String),
    #[error("failed to connect to '{name}': {reason}")]
    Connect { name: String, reason: String },
}

/// Device enumeration and enabling, as seen by the dispatcher
pub trait DeviceManager {
    fn available_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Open `device` and route its messages into `sink`
    fn enable_device(&self, device: &DeviceInfo, sink: RelaySender) -> Result<(), DeviceError>;
}

/// Enable every available device whose name matches one of `filters`
/// (case-insensitive substring; no filters means all devices).
///
/// Failures are logged and skipped. Returns the number of enabled devices.
pub fn enable_all(manager: &dyn DeviceManager, sink: &RelaySender, filters: &[String]) -> usize {
    let devices = match manager.available_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate MIDI inputs: {}", e);
            return 0;
        }
    };

    let mut enabled = 0;
    for device in devices.iter().filter(|d| matches_filters(&d.name, filters)) {
        debug!("Enabling MIDI input '{}'", device.name);
        match manager.enable_device(device, sink.clone()) {
            Ok(()) => {
                info!("MIDI input enabled: {}", device.name);
                enabled += 1;
            }
            Err(e) => warn!("Failed to enable MIDI input '{}': {}", device.name, e),
        }
    }

    info!("{} of {} MIDI input(s) enabled", enabled, devices.len());
    enabled
}

fn matches_filters(name: &str, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    filters.iter().any(|f| name.contains(&f.to_lowercase()))
}

/// midir-backed device manager.
///
/// Connections stay open for as long as the manager lives.
pub struct MidirDeviceManager {
    client_name: String,
    connections: Mutex<Vec<MidiInputConnection<()>>>,
}

impl MidirDeviceManager {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            connections: Mutex::new(Vec::new()),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Close every open connection
    pub fn disconnect_all(&self) {
        let connections = std::mem::take(&mut *self.connections.lock());
        for connection in connections {
            connection.close();
        }
        info!("MIDI inputs disconnected");
    }
}

impl DeviceManager for MidirDeviceManager {
    fn available_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let midi_in = MidiInput::new(&format!("{}-scanner", self.client_name))?;

        let devices = midi_in
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| DeviceInfo {
                id: port.id(),
                name: midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index)),
            })
            .collect();

        Ok(devices)
    }

    fn enable_device(&self, device: &DeviceInfo, sink: RelaySender) -> Result<(), DeviceError> {
        let mut midi_in = MidiInput::new(&self.client_name)?;
        midi_in.ignore(Ignore::None);

        let port = midi_in
            .find_port_by_id(device.id.clone())
            .ok_or_else(|| DeviceError::NotFound(device.name.clone()))?;

        let source: Arc<str> = Arc::from(device.name.as_str());
        let connection = midi_in
            .connect(
                &port,
                &format!("{}-in", self.client_name),
                move |_timestamp, data, _| {
                    sink.on_hardware_message(&source, data);
                },
                (),
            )
            .map_err(|e| DeviceError::Connect {
                name: device.name.clone(),
                reason: e.to_string(),
            })?;

        self.connections.lock().push(connection);
        Ok(())
    }
}

impl Drop for MidirDeviceManager {
    fn drop(&mut self) {
        if self.connection_count() > 0 {
            self.disconnect_all();
        }
    }
}
