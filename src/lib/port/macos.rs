use super::usb_label;
use serialport::SerialPortInfo;

/// The CH34x driver publishes call-out nodes with a location-derived suffix.
pub fn device_path(port: u32) -> String {
    format!("/dev/cu.wchusbserial{}", port)
}

pub fn describe(info: &SerialPortInfo) -> String {
    format!("{} ({})", usb_label(info), info.port_name)
}
