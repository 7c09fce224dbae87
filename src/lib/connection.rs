//! Ownership of the camera's serial handle: opening, reopening and closing.

use std::fmt::{self, Display};
use std::io::{self, Read, Write};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use thiserror::Error;

use crate::port::{self, PortResolver};

pub const BAUDRATE: u32 = 38400;

/// Highest port number tried when searching.
pub const SEARCH_LIMIT: u32 = 255;

const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Bidirectional byte stream to the camera.
pub trait Link: Read + Write + Send {}

impl<T: Read + Write + Send> Link for T {}

/// Opens the platform serial port with the given number.
pub trait PortOpener: Send {
    fn open(&mut self, port: u32) -> serialport::Result<Box<dyn Link>>;
}

/// Opens real serial ports at 38400 8-N-1.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(&mut self, port: u32) -> serialport::Result<Box<dyn Link>> {
        let port = serialport::new(port::device_path(port), BAUDRATE)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(Box::new(port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSelection {
    Search,
    Fixed(u32),
}

impl Display for PortSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSelection::Search => "auto".fmt(f),
            PortSelection::Fixed(port) => port.fmt(f),
        }
    }
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("invalid port '{0}', expected 'auto' or a port number")]
    BadPort(String),
}

impl FromStr for PortSelection {
    type Err = SelectionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "auto" | "search" => Ok(PortSelection::Search),
            _ => input
                .parse::<u32>()
                .map(PortSelection::Fixed)
                .map_err(|_| SelectionError::BadPort(input.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("failed to open serial port {port_name}")]
    OpenFailed {
        port_name: String,
        #[source]
        source: serialport::Error,
    },
    #[error("no serial port could be opened in range {first}..={last}")]
    PortNotFound { first: u32, last: u32 },
}

pub struct Connection {
    selection: PortSelection,
    simulation: bool,
    resolver: PortResolver,
    opener: Box<dyn PortOpener>,
    link: Option<Box<dyn Link>>,
    port: Option<u32>,
}

impl Connection {
    pub fn with_parts(
        selection: PortSelection,
        simulation: bool,
        resolver: PortResolver,
        opener: Box<dyn PortOpener>,
    ) -> Self {
        Self {
            selection,
            simulation,
            resolver,
            opener,
            link: None,
            port: None,
        }
    }

    pub fn is_simulation(&self) -> bool {
        self.simulation
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Number of the port currently open, if any.
    pub fn port(&self) -> Option<u32> {
        self.port
    }

    /// (Re)opens the serial port, dropping any handle held before.
    ///
    /// A fixed selection makes a single attempt. Searching first asks the
    /// resolver for a bridge-chip port and tries only that one; if no bridge
    /// is listed, ports `0..=SEARCH_LIMIT` are tried in ascending order.
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        if self.simulation {
            debug!("simulation mode, serial port left closed");
            return Ok(());
        }

        self.close();

        match self.selection {
            PortSelection::Fixed(port) => self.open_at(port),
            PortSelection::Search => match self.resolver.resolve(None) {
                Some(port) => {
                    debug!("{} listed at port {}", self.resolver.fragment(), port);
                    self.open_at(port)
                }
                None => self.scan(0, SEARCH_LIMIT),
            },
        }
    }

    fn open_at(&mut self, port: u32) -> Result<(), ConnectError> {
        match self.opener.open(port) {
            Ok(link) => {
                self.attach(port, link);
                Ok(())
            }
            Err(source) => Err(ConnectError::OpenFailed {
                port_name: port::device_path(port),
                source,
            }),
        }
    }

    fn scan(&mut self, first: u32, last: u32) -> Result<(), ConnectError> {
        for port in first..=last {
            match self.opener.open(port) {
                Ok(link) => {
                    self.attach(port, link);
                    return Ok(());
                }
                Err(err) => debug!("scan {}: {}", port::device_path(port), err),
            }
        }
        Err(ConnectError::PortNotFound { first, last })
    }

    fn attach(&mut self, port: u32, link: Box<dyn Link>) {
        info!(
            "serial port {} open @ {} baud",
            port::device_path(port),
            BAUDRATE
        );
        self.link = Some(link);
        self.port = Some(port);
    }

    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            if let Some(port) = self.port {
                debug!("closing serial port {}", port::device_path(port));
            }
            drop(link);
        }
        self.port = None;
    }

    pub fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        let link = self
            .link
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port not open"))?;
        link.write_all(bytes)?;
        link.flush()
    }

    /// Reads at most one byte; a timeout or read error yields `None`.
    pub fn read_byte(&mut self) -> Option<u8> {
        let link = self.link.as_mut()?;
        let mut buffer = [0u8; 1];
        match link.read(&mut buffer) {
            Ok(1) => Some(buffer[0]),
            Ok(_) => None,
            Err(err) => {
                if err.kind() != io::ErrorKind::TimedOut {
                    debug!("read: {}", err);
                }
                None
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
