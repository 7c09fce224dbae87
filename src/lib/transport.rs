//! Frame delivery with a single reconnect-and-retry on write failure.

use std::io;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::connection::{ConnectError, Connection};
use crate::protocol::Frame;

/// Quiet period that ends a response drain.
pub const DRAIN_IDLE: Duration = Duration::from_millis(10);

const MAX_RESPONSE_LEN: usize = 64;

fn simulated_request(frame: &Frame) -> String {
    format!("simulate request: {}", frame)
}

pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("camera connection failed")]
    ConnectFailed(#[from] ConnectError),
    #[error("failed writing to port")]
    WriteFailed(#[source] io::Error),
}

pub struct Transport {
    connection: Connection,
    sleeper: Box<dyn Sleeper>,
}

impl Transport {
    pub fn new(connection: Connection) -> Self {
        Self::with_sleeper(connection, Box::new(ThreadSleeper))
    }

    pub fn with_sleeper(connection: Connection, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            connection,
            sleeper,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connect(&mut self) -> Result<(), TransportError> {
        Ok(self.connection.connect()?)
    }

    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Writes `frame`, connecting first if needed.
    ///
    /// A failed write triggers exactly one reconnect and one retry. Whatever
    /// the camera answers is drained and logged but never checked.
    pub fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        if self.connection.is_simulation() {
            info!("{}", simulated_request(frame));
            return Ok(());
        }

        if !self.connection.is_connected() {
            self.connection.connect()?;
        }

        if let Err(err) = self.connection.write_frame(frame) {
            warn!("failed writing to port: {}, try reconnect...", err);
            self.connection.connect()?;
            self.connection
                .write_frame(frame)
                .map_err(TransportError::WriteFailed)?;
        }
        debug!("wrote {} bytes: {}", frame.len(), frame);

        let response = self.drain();
        debug!("response: {}", hex::encode(&response));

        Ok(())
    }

    fn drain(&mut self) -> Vec<u8> {
        let mut response = Vec::new();
        let mut received = true;

        while response.len() < MAX_RESPONSE_LEN {
            match self.connection.read_byte() {
                Some(byte) => {
                    response.push(byte);
                    received = true;
                }
                None if received => {
                    self.sleeper.sleep(DRAIN_IDLE);
                    received = false;
                }
                None => break,
            }
        }
        response
    }
}
