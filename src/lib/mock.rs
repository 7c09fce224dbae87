//! Scripted serial hardware for unit tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::connection::{Link, PortOpener};
use crate::transport::Sleeper;

#[derive(Default)]
struct BusState {
    available: Vec<u32>,
    opens: Vec<u32>,
    write_results: VecDeque<bool>,
    write_attempts: usize,
    written: Vec<Vec<u8>>,
    response: VecDeque<Option<u8>>,
}

/// Shared view of every port and link handed out by its opener.
#[derive(Clone, Default)]
pub struct MockBus(Arc<Mutex<BusState>>);

impl MockBus {
    /// Only ports listed in `available` open successfully.
    pub fn new(available: &[u32]) -> Self {
        let bus = Self::default();
        bus.0.lock().unwrap().available = available.to_vec();
        bus
    }

    pub fn opener(&self) -> MockOpener {
        MockOpener(self.clone())
    }

    /// Outcome of upcoming writes in order, `false` fails; afterwards writes succeed.
    pub fn script_writes(&self, results: &[bool]) {
        self.0.lock().unwrap().write_results = results.iter().cloned().collect();
    }

    /// Upcoming reads in order, `None` is a read timeout; afterwards reads time out.
    pub fn script_response(&self, bytes: &[Option<u8>]) {
        self.0.lock().unwrap().response = bytes.iter().cloned().collect();
    }

    pub fn opens(&self) -> Vec<u32> {
        self.0.lock().unwrap().opens.clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.0.lock().unwrap().write_attempts
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().written.clone()
    }
}

pub struct MockOpener(MockBus);

impl PortOpener for MockOpener {
    fn open(&mut self, port: u32) -> serialport::Result<Box<dyn Link>> {
        let mut state = (self.0).0.lock().unwrap();
        state.opens.push(port);
        if state.available.contains(&port) {
            Ok(Box::new(MockLink(self.0.clone())))
        } else {
            Err(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                "no such port",
            ))
        }
    }
}

pub struct MockLink(MockBus);

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = (self.0).0.lock().unwrap();
        state.write_attempts += 1;
        if state.write_results.pop_front().unwrap_or(true) {
            state.written.push(buf.to_vec());
            Ok(buf.len())
        } else {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = (self.0).0.lock().unwrap();
        match state.response.pop_front() {
            Some(Some(byte)) => {
                buf[0] = byte;
                Ok(1)
            }
            _ => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
        }
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Clone, Default)]
pub struct MockSleeper(Arc<Mutex<Vec<Duration>>>);

impl MockSleeper {
    pub fn naps(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}
