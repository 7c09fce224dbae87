use super::usb_label;
use serialport::SerialPortInfo;

/// Ports are numbered after the usb-serial driver's tty nodes.
pub fn device_path(port: u32) -> String {
    format!("/dev/ttyUSB{}", port)
}

pub fn describe(info: &SerialPortInfo) -> String {
    format!("{} ({})", usb_label(info), info.port_name)
}
