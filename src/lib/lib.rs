pub mod camera;
pub mod connection;
pub mod port;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod mock;

pub use camera::{make_camera, Camera, CameraModel};
pub use connection::{ConnectError, Connection, PortSelection};
pub use protocol::{Action, Frame};
pub use transport::{Transport, TransportError};
