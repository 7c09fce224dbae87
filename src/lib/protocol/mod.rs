//! Command frames for the camera's Pelco-D style serial protocol.
//!
//! Every frame is `[0xFF, address, p0, p1, p2, p3, checksum]` where the
//! checksum is the byte sum of everything after the sync byte.

use std::fmt::{self, Display};
use std::ops::Deref;

pub const FRAME_LEN: usize = 7;

const SYNC: u8 = 0xFF;

// The NV10U ignores pan/tilt speed, only zoom speed is honoured.
const PAN_SPEED: u8 = 0x00;
const TILT_SPEED: u8 = 0x00;

const CMD_RIGHT: u8 = 0x02;
const CMD_LEFT: u8 = 0x04;
const CMD_UP: u8 = 0x08;
const CMD_DOWN: u8 = 0x10;
const CMD_ZOOM_IN: u8 = 0x20;
const CMD_ZOOM_OUT: u8 = 0x40;
const CMD_PRESET_SAVE: u8 = 0x03;
const CMD_PRESET_RESET: u8 = 0x05;
const CMD_PRESET_SELECT: u8 = 0x07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    PtStop,
    ZoomIn(u8),
    ZoomOut(u8),
    ZoomStop,
    PresetSelect(u8),
    PresetSave(u8),
    PresetReset(u8),
}

impl Action {
    pub fn payload(self) -> [u8; 4] {
        match self {
            Action::Up => [0x00, CMD_UP, 0x00, TILT_SPEED],
            Action::Down => [0x00, CMD_DOWN, 0x00, TILT_SPEED],
            Action::Left => [0x00, CMD_LEFT, PAN_SPEED, 0x00],
            Action::Right => [0x00, CMD_RIGHT, PAN_SPEED, 0x00],
            Action::PtStop | Action::ZoomStop => [0x00; 4],
            Action::ZoomIn(speed) => [0x00, CMD_ZOOM_IN, speed, 0x00],
            Action::ZoomOut(speed) => [0x00, CMD_ZOOM_OUT, speed, 0x00],
            Action::PresetSelect(id) => [0x00, CMD_PRESET_SELECT, 0x00, id],
            Action::PresetSave(id) => [0x00, CMD_PRESET_SAVE, 0x00, id],
            Action::PresetReset(id) => [0x00, CMD_PRESET_RESET, 0x00, id],
        }
    }

    pub fn encode(self, address: u8) -> Frame {
        encode(address, self.payload())
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Up => write!(f, "up"),
            Action::Down => write!(f, "down"),
            Action::Left => write!(f, "left"),
            Action::Right => write!(f, "right"),
            Action::PtStop => write!(f, "stop pt"),
            Action::ZoomIn(speed) => write!(f, "zoom in @ {}", speed),
            Action::ZoomOut(speed) => write!(f, "zoom out @ {}", speed),
            Action::ZoomStop => write!(f, "zoom stop"),
            Action::PresetSelect(id) => write!(f, "preset select {}", id),
            Action::PresetSave(id) => write!(f, "preset save {}", id),
            Action::PresetReset(id) => write!(f, "preset reset {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn address(&self) -> u8 {
        self.0[1]
    }

    pub fn payload(&self) -> [u8; 4] {
        [self.0[2], self.0[3], self.0[4], self.0[5]]
    }

    pub fn checksum(&self) -> u8 {
        self.0[FRAME_LEN - 1]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .cloned()
        .fold(0u8, |x, y| x.overflowing_add(y).0)
}

pub fn encode(address: u8, payload: [u8; 4]) -> Frame {
    let mut buffer = [0u8; FRAME_LEN];

    buffer[0] = SYNC;
    buffer[1] = address;
    buffer[2..6].copy_from_slice(&payload);
    buffer[6] = checksum(&buffer[1..6]);

    Frame(buffer)
}
