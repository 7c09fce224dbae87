//! Serial device discovery: host enumeration and bridge-chip port resolution.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
pub use linux::{describe, device_path};
#[cfg(target_os = "macos")]
pub use macos::{describe, device_path};
#[cfg(target_os = "windows")]
pub use windows::{describe, device_path};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serialport::{SerialPortInfo, SerialPortType};
use thiserror::Error;

/// Name fragment the OS reports for the camera's USB-to-serial bridge.
pub const BRIDGE_FRAGMENT: &str = "USB-SERIAL CH34";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("serial port enumeration failed: {0}")]
    Enumeration(#[from] serialport::Error),
    #[error("no port designator in {0:?}")]
    MissingDesignator(String),
    #[error("bad port number {number:?} in {descriptor:?}")]
    BadNumber { descriptor: String, number: String },
    #[error("no device matching {0:?} found")]
    NoDevice(String),
}

/// Source of human-readable serial device descriptors, e.g.
/// `"USB-SERIAL CH340 (COM5)"`.
pub trait PortEnumerator: Send {
    /// Never fails; an unusable platform facility yields an empty list.
    fn list_serial_devices(&self) -> Vec<String>;
}

/// Enumerates the ports the host OS currently exposes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn list_serial_devices(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => ports.iter().map(describe).collect(),
            Err(err) => {
                warn!("{}", DiscoveryError::from(err));
                Vec::new()
            }
        }
    }
}

/// Fixed descriptor list, returned verbatim in order.
#[derive(Debug, Default, Clone)]
pub struct StaticPorts(pub Vec<String>);

impl PortEnumerator for StaticPorts {
    fn list_serial_devices(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[derive(PartialEq)]
struct UsbId(u16, u16);

static BRIDGE_IDS: &[UsbId] = &[
    UsbId(0x1a86, 0x7523), // QinHeng Electronics HL-340 USB-Serial adapter
    UsbId(0x1a86, 0x5523), // QinHeng Electronics CH341 in serial converter mode
];

const BRIDGE_LABEL: &str = "USB-SERIAL CH340";

/// Label used on hosts whose enumeration does not report a friendly name.
fn usb_label(info: &SerialPortInfo) -> String {
    match &info.port_type {
        SerialPortType::UsbPort(usb_info) => {
            if BRIDGE_IDS.contains(&UsbId(usb_info.vid, usb_info.pid)) {
                BRIDGE_LABEL.to_string()
            } else {
                usb_info
                    .product
                    .clone()
                    .or_else(|| usb_info.manufacturer.clone())
                    .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb_info.vid, usb_info.pid))
            }
        }
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::Unknown => "Serial port".to_string(),
    }
}

fn port_number(descriptor: &str) -> Result<u32, DiscoveryError> {
    lazy_static! {
        static ref DESIGNATOR: Regex =
            Regex::new(r"\((?:COM|/dev/ttyUSB|/dev/cu\.wchusbserial)([^)]*)\)").unwrap();
    }

    let number = DESIGNATOR
        .captures(descriptor)
        .and_then(|c| c.get(1))
        .ok_or_else(|| DiscoveryError::MissingDesignator(descriptor.to_string()))?
        .as_str();

    number.parse::<u32>().map_err(|_| DiscoveryError::BadNumber {
        descriptor: descriptor.to_string(),
        number: number.to_string(),
    })
}

/// Picks a port number out of `devices`.
///
/// Only descriptors containing `fragment` are considered, in the order given.
/// Without a `requested` port the first parsable match wins; otherwise the
/// requested number is returned only if some match carries it. Descriptors
/// whose designator cannot be parsed are logged and skipped.
pub fn resolve_port(devices: &[String], fragment: &str, requested: Option<u32>) -> Option<u32> {
    devices
        .iter()
        .filter(|device| device.contains(fragment))
        .filter_map(|device| match port_number(device) {
            Ok(number) => Some(number),
            Err(err) => {
                warn!("skipping device: {}", err);
                None
            }
        })
        .find(|&number| requested.map_or(true, |r| r == number))
}

pub struct PortResolver {
    enumerator: Box<dyn PortEnumerator>,
    fragment: String,
}

impl PortResolver {
    pub fn new(enumerator: Box<dyn PortEnumerator>, fragment: &str) -> Self {
        Self {
            enumerator,
            fragment: fragment.to_string(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn is_bridge(&self, descriptor: &str) -> bool {
        descriptor.contains(&self.fragment)
    }

    pub fn list_serial_devices(&self) -> Vec<String> {
        self.enumerator.list_serial_devices()
    }

    pub fn resolve(&self, requested: Option<u32>) -> Option<u32> {
        let devices = self.enumerator.list_serial_devices();
        debug!("serial devices: {:?}", devices);

        let port = resolve_port(&devices, &self.fragment, requested);
        if port.is_none() {
            debug!("{}", DiscoveryError::NoDevice(self.fragment.clone()));
        }
        port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_first_bridge() {
        let list = devices(&["Foo (COM3)", "USB-SERIAL CH340 (COM5)", "Bar"]);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, None), Some(5));
    }

    #[test]
    fn resolve_requested_without_bridge() {
        let list = devices(&["Foo (COM3)", "USB-SERIAL CH340 (COM5)", "Bar"]);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, Some(3)), None);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, Some(5)), Some(5));
    }

    #[test]
    fn resolve_skips_malformed() {
        let list = devices(&[
            "USB-SERIAL CH340 (COMX)",
            "USB-SERIAL CH340 COM4",
            "USB-SERIAL CH341 (COM7)",
        ]);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, None), Some(7));
    }

    #[test]
    fn resolve_keeps_os_order() {
        let list = devices(&["USB-SERIAL CH340 (COM9)", "USB-SERIAL CH340 (COM2)"]);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, None), Some(9));
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, Some(2)), Some(2));
    }

    #[test]
    fn resolve_unix_designators() {
        let list = devices(&[
            "USB-SERIAL CH340 (/dev/ttyUSB1)",
            "USB-SERIAL CH340 (/dev/cu.wchusbserial1420)",
        ]);
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, None), Some(1));
        assert_eq!(resolve_port(&list, BRIDGE_FRAGMENT, Some(1420)), Some(1420));
    }

    #[test]
    fn resolve_empty() {
        assert_eq!(resolve_port(&[], BRIDGE_FRAGMENT, None), None);
    }

    #[test]
    fn port_number_errors() {
        assert!(matches!(
            port_number("USB-SERIAL CH340"),
            Err(DiscoveryError::MissingDesignator(_))
        ));
        assert!(matches!(
            port_number("USB-SERIAL CH340 (COM)"),
            Err(DiscoveryError::BadNumber { .. })
        ));
    }

    #[test]
    fn resolver_uses_enumerator() {
        let resolver = PortResolver::new(
            Box::new(StaticPorts(devices(&["Prolific (COM1)", "USB-SERIAL CH340 (COM12)"]))),
            BRIDGE_FRAGMENT,
        );
        assert_eq!(resolver.resolve(None), Some(12));
        assert_eq!(resolver.resolve(Some(1)), None);
        assert!(resolver.is_bridge("USB-SERIAL CH340 (COM12)"));
        assert!(!resolver.is_bridge("Prolific (COM1)"));
    }
}
