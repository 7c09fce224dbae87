use super::usb_label;
use serialport::{SerialPortInfo, SerialPortType};

pub fn device_path(port: u32) -> String {
    format!("COM{}", port)
}

/// Prefers the device manager's friendly name, which already ends in `(COMn)`.
pub fn describe(info: &SerialPortInfo) -> String {
    let friendly = match &info.port_type {
        SerialPortType::UsbPort(usb_info) => usb_info.product.clone(),
        _ => None,
    };

    match friendly {
        Some(name) if name.contains('(') => name,
        Some(name) => format!("{} ({})", name, info.port_name),
        None => format!("{} ({})", usb_label(info), info.port_name),
    }
}
