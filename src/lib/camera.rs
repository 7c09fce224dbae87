//! Device-agnostic camera actions and the models that implement them.

use std::{fmt::Display, str::FromStr};

use log::info;
use thiserror::Error;

use crate::protocol::Action;
use crate::transport::{Transport, TransportError};

/// Presets are grouped in banks of nine views.
pub const PRESETS_PER_BANK: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraModel {
    TenveoNv10u,
}

impl Display for CameraModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraModel::TenveoNv10u => "nv10u".fmt(f),
        }
    }
}

#[derive(Error, Debug)]
pub enum CameraModelError {
    #[error("invalid camera model '{0}'")]
    BadModel(String),
}

impl FromStr for CameraModel {
    type Err = CameraModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "nv10u" | "tenveo-nv10u" => Ok(CameraModel::TenveoNv10u),
            _ => Err(CameraModelError::BadModel(input.to_string())),
        }
    }
}

pub fn make_camera(model: CameraModel, address: u8, transport: Transport) -> Box<dyn Camera> {
    match model {
        CameraModel::TenveoNv10u => Box::new(TenveoNv10u::new(address, transport)),
    }
}

/// Preset id of `view` within `bank`, `None` if it does not fit a byte.
pub fn preset_slot(bank: u8, view: u8) -> Option<u8> {
    bank.checked_mul(PRESETS_PER_BANK)?.checked_add(view)
}

pub trait Camera: Send {
    fn up(&mut self) -> Result<(), TransportError>;
    fn down(&mut self) -> Result<(), TransportError>;
    fn left(&mut self) -> Result<(), TransportError>;
    fn right(&mut self) -> Result<(), TransportError>;
    fn pt_stop(&mut self) -> Result<(), TransportError>;

    fn zoom_in(&mut self, speed: u8) -> Result<(), TransportError>;
    fn zoom_out(&mut self, speed: u8) -> Result<(), TransportError>;
    fn zoom_stop(&mut self) -> Result<(), TransportError>;

    fn preset_select(&mut self, preset: u8) -> Result<(), TransportError>;
    fn preset_save(&mut self, preset: u8) -> Result<(), TransportError>;
    fn preset_reset(&mut self, preset: u8) -> Result<(), TransportError>;

    fn close(&mut self);
    fn model(&self) -> CameraModel;
}

/// Tenveo NV10U, driven with a reduced Pelco-D command set.
pub struct TenveoNv10u {
    address: u8,
    transport: Transport,
}

impl TenveoNv10u {
    pub fn new(address: u8, transport: Transport) -> Self {
        Self { address, transport }
    }

    fn command(&mut self, action: Action) -> Result<(), TransportError> {
        info!("cam {}", action);
        self.transport.send(&action.encode(self.address))
    }
}

impl Camera for TenveoNv10u {
    fn up(&mut self) -> Result<(), TransportError> {
        self.command(Action::Up)
    }

    fn down(&mut self) -> Result<(), TransportError> {
        self.command(Action::Down)
    }

    fn left(&mut self) -> Result<(), TransportError> {
        self.command(Action::Left)
    }

    fn right(&mut self) -> Result<(), TransportError> {
        self.command(Action::Right)
    }

    fn pt_stop(&mut self) -> Result<(), TransportError> {
        self.command(Action::PtStop)
    }

    fn zoom_in(&mut self, speed: u8) -> Result<(), TransportError> {
        self.command(Action::ZoomIn(speed))
    }

    fn zoom_out(&mut self, speed: u8) -> Result<(), TransportError> {
        self.command(Action::ZoomOut(speed))
    }

    fn zoom_stop(&mut self) -> Result<(), TransportError> {
        self.command(Action::ZoomStop)
    }

    fn preset_select(&mut self, preset: u8) -> Result<(), TransportError> {
        self.command(Action::PresetSelect(preset))
    }

    fn preset_save(&mut self, preset: u8) -> Result<(), TransportError> {
        self.command(Action::PresetSave(preset))
    }

    fn preset_reset(&mut self, preset: u8) -> Result<(), TransportError> {
        self.command(Action::PresetReset(preset))
    }

    fn close(&mut self) {
        self.transport.close();
    }

    fn model(&self) -> CameraModel {
        CameraModel::TenveoNv10u
    }
}
