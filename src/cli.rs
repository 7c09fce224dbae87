use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use camcontrol::port::BRIDGE_FRAGMENT;
use camcontrol::{CameraModel, PortSelection};

const COARSE_HOLD: Duration = Duration::from_millis(500);
const FINE_HOLD: Duration = Duration::from_millis(5);
const COARSE_ZOOM_SPEED: u8 = 0x1f;
const FINE_ZOOM_SPEED: u8 = 0x02;

fn parse_with_radix<T>(input: &str) -> Result<T, T::FromStrRadixErr>
where
    T: num_traits::Num,
    <T as num_traits::Num>::FromStrRadixErr: std::error::Error + Send + Sync,
{
    if let Some(hex) = input.strip_prefix("0x") {
        T::from_str_radix(hex, 16)
    } else if let Some(bin) = input.strip_prefix("0b") {
        T::from_str_radix(bin, 2)
    } else {
        T::from_str_radix(input, 10)
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// enable debug output
    #[clap(long, short)]
    pub debug: bool,

    /// Append log output to this file instead of stderr
    #[clap(long, short)]
    pub log_file: Option<PathBuf>,

    /// Serial port number or 'auto'
    #[clap(long, short, default_value = "auto")]
    pub port: PortSelection,

    /// Camera device address
    #[clap(long, short, default_value_t = 1, parse(try_from_str=parse_with_radix))]
    pub address: u8,

    /// Camera model
    #[clap(long, short, default_value = "nv10u")]
    pub model: CameraModel,

    /// Only log frames, never touch a serial port
    #[clap(long, short, env = "CAMCONTROL_SIMULATION")]
    pub simulate: bool,

    /// Device name fragment of the USB-serial bridge
    #[clap(long, default_value = BRIDGE_FRAGMENT)]
    pub bridge: String,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial devices, bridge matches marked with '*'
    ListPorts {
        /// Use json-formatted output
        #[clap(long, short)]
        json: bool,
    },

    /// Print the port number of the USB-serial bridge
    Resolve {
        /// Only accept this port number
        #[clap(parse(try_from_str=parse_with_radix))]
        port: Option<u32>,
    },

    /// Tilt up
    Up(Pulse),

    /// Tilt down
    Down(Pulse),

    /// Pan left
    Left(Pulse),

    /// Pan right
    Right(Pulse),

    /// Stop pan/tilt movement
    Stop,

    /// Zoom in
    ZoomIn(ZoomPulse),

    /// Zoom out
    ZoomOut(ZoomPulse),

    /// Stop zooming
    ZoomStop,

    /// Recall, store or clear a preset view
    Preset {
        #[clap(subcommand)]
        command: PresetCommand,
    },

    /// Print bash completion script
    Completions,
}

#[derive(Args, Debug)]
pub struct Pulse {
    /// Short nudge for fine positioning
    #[clap(long, short)]
    pub fine: bool,

    /// Movement time in milliseconds before stopping
    #[clap(long)]
    pub hold: Option<u64>,
}

impl Pulse {
    pub fn hold(&self) -> Duration {
        match self.hold {
            Some(ms) => Duration::from_millis(ms),
            None if self.fine => FINE_HOLD,
            None => COARSE_HOLD,
        }
    }
}

#[derive(Args, Debug)]
pub struct ZoomPulse {
    #[clap(flatten)]
    pub pulse: Pulse,

    /// Zoom speed, overrides the --fine default
    #[clap(long, parse(try_from_str=parse_with_radix))]
    pub speed: Option<u8>,
}

impl ZoomPulse {
    pub fn speed(&self) -> u8 {
        match self.speed {
            Some(speed) => speed,
            None if self.pulse.fine => FINE_ZOOM_SPEED,
            None => COARSE_ZOOM_SPEED,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// Move to a stored view
    Select(PresetSpec),

    /// Store the current view
    Save(PresetSpec),

    /// Clear a stored view
    Reset(PresetSpec),
}

#[derive(Args, Debug)]
pub struct PresetSpec {
    /// View number within the bank
    #[clap(parse(try_from_str=parse_with_radix))]
    pub view: u8,

    /// Preset bank, nine views each
    #[clap(long, short, default_value_t = 0, parse(try_from_str=parse_with_radix))]
    pub bank: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_radix() {
        assert_eq!(parse_with_radix::<u8>("31").unwrap(), 31);
        assert_eq!(parse_with_radix::<u8>("0x1f").unwrap(), 0x1f);
        assert_eq!(parse_with_radix::<u8>("0b11").unwrap(), 3);
        assert!(parse_with_radix::<u8>("256").is_err());
        assert_eq!(parse_with_radix::<u32>("0x100").unwrap(), 256);
    }

    #[test]
    fn pulse_defaults() {
        let cli = Cli::parse_from(["camcontrol", "zoom-in", "--fine"]);
        match cli.command {
            Commands::ZoomIn(zoom) => {
                assert_eq!(zoom.speed(), FINE_ZOOM_SPEED);
                assert_eq!(zoom.pulse.hold(), FINE_HOLD);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::parse_from(["camcontrol", "left", "--hold", "40"]);
        match cli.command {
            Commands::Left(pulse) => assert_eq!(pulse.hold(), Duration::from_millis(40)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_accepts_hex() {
        let cli = Cli::parse_from(["camcontrol", "resolve", "0x0c"]);
        match cli.command {
            Commands::Resolve { port } => assert_eq!(port, Some(12)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn global_options() {
        let cli = Cli::parse_from([
            "camcontrol", "-p", "7", "-a", "0x02", "preset", "save", "3", "--bank", "1",
        ]);
        assert_eq!(cli.port, PortSelection::Fixed(7));
        assert_eq!(cli.address, 2);
        assert_eq!(cli.model, CameraModel::TenveoNv10u);
        match cli.command {
            Commands::Preset {
                command: PresetCommand::Save(spec),
            } => {
                assert_eq!(spec.view, 3);
                assert_eq!(spec.bank, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
