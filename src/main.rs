mod cli;

use std::fs::OpenOptions;
use std::io;
use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells::Bash};
use env_logger::TimestampPrecision;
use log::error;

use camcontrol::camera::{make_camera, preset_slot, Camera};
use camcontrol::connection::{Connection, SerialOpener};
use camcontrol::port::{PortResolver, SystemPorts};
use camcontrol::transport::{Transport, TransportError};

use cli::{Cli, Commands, PresetCommand, PresetSpec};

enum OutputFormat {
    Plain,
    Json,
}

fn init_logger(cli: &Cli) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.debug { "debug" } else { "info" }),
    );
    builder
        .format_timestamp(Some(TimestampPrecision::Millis))
        .format_target(false);

    let mut log_file_error = None;
    if let Some(path) = &cli.log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(err) => log_file_error = Some((path, err)),
        }
    }

    builder.init();

    if let Some((path, err)) = log_file_error {
        error!("log file {} open failed: {}", path.display(), err);
    }
}

fn cmd_list_ports(resolver: &PortResolver, fmt: OutputFormat) -> Result<String> {
    let devices = resolver.list_serial_devices();

    Ok(match fmt {
        OutputFormat::Plain => devices
            .iter()
            .map(|device| {
                let mark = if resolver.is_bridge(device) { '*' } else { ' ' };
                format!("{} {}", mark, device)
            })
            .collect::<Vec<String>>()
            .join("\n"),
        OutputFormat::Json => {
            let mut list = json::JsonValue::new_array();
            for device in &devices {
                let mut entry = json::JsonValue::new_object();
                entry["name"] = device.as_str().into();
                entry["bridge"] = resolver.is_bridge(device).into();
                list.push(entry)?;
            }
            list.dump()
        }
    })
}

fn cmd_resolve(resolver: &PortResolver, port: Option<u32>) -> Result<String> {
    resolver
        .resolve(port)
        .map(|port| port.to_string())
        .ok_or_else(|| match port {
            Some(port) => anyhow!("no '{}' device at port {}", resolver.fragment(), port),
            None => anyhow!("no '{}' device found", resolver.fragment()),
        })
}

fn cmd_pulse<S, T>(cam: &mut dyn Camera, start: S, stop: T, hold: Duration) -> Result<String>
where
    S: FnOnce(&mut dyn Camera) -> Result<(), TransportError>,
    T: FnOnce(&mut dyn Camera) -> Result<(), TransportError>,
{
    start(&mut *cam).context("Failed to start camera movement")?;
    thread::sleep(hold);
    stop(&mut *cam).context("Failed to stop camera movement")?;
    Ok(String::new())
}

fn cmd_preset<F>(cam: &mut dyn Camera, spec: &PresetSpec, action: F) -> Result<String>
where
    F: FnOnce(&mut dyn Camera, u8) -> Result<(), TransportError>,
{
    let preset = preset_slot(spec.bank, spec.view)
        .ok_or_else(|| anyhow!("view {} of bank {} is out of range", spec.view, spec.bank))?;

    action(cam, preset).with_context(|| format!("Failed to apply preset {}", preset))?;
    Ok(String::new())
}

fn do_main(cli: &Cli) -> Result<String> {
    let resolver = || PortResolver::new(Box::new(SystemPorts), &cli.bridge);

    match &cli.command {
        Commands::ListPorts { json } => {
            let fmt = if *json {
                OutputFormat::Json
            } else {
                OutputFormat::Plain
            };
            cmd_list_ports(&resolver(), fmt)
        }
        Commands::Resolve { port } => cmd_resolve(&resolver(), *port),
        Commands::Completions => {
            generate(Bash, &mut Cli::command(), "camcontrol", &mut io::stdout());
            Ok(String::default())
        }
        command => {
            let connection = Connection::with_parts(
                cli.port,
                cli.simulate,
                resolver(),
                Box::new(SerialOpener),
            );
            let mut cam_box = make_camera(cli.model, cli.address, Transport::new(connection));
            let cam = cam_box.as_mut();

            let result = match command {
                Commands::Up(p) => cmd_pulse(cam, |c| c.up(), |c| c.pt_stop(), p.hold()),
                Commands::Down(p) => cmd_pulse(cam, |c| c.down(), |c| c.pt_stop(), p.hold()),
                Commands::Left(p) => cmd_pulse(cam, |c| c.left(), |c| c.pt_stop(), p.hold()),
                Commands::Right(p) => cmd_pulse(cam, |c| c.right(), |c| c.pt_stop(), p.hold()),
                Commands::ZoomIn(z) => {
                    let speed = z.speed();
                    cmd_pulse(cam, |c| c.zoom_in(speed), |c| c.zoom_stop(), z.pulse.hold())
                }
                Commands::ZoomOut(z) => {
                    let speed = z.speed();
                    cmd_pulse(cam, |c| c.zoom_out(speed), |c| c.zoom_stop(), z.pulse.hold())
                }
                Commands::Stop => cam
                    .pt_stop()
                    .map(|_| String::new())
                    .context("Failed to stop camera"),
                Commands::ZoomStop => cam
                    .zoom_stop()
                    .map(|_| String::new())
                    .context("Failed to stop zoom"),
                Commands::Preset { command } => match command {
                    PresetCommand::Select(spec) => {
                        cmd_preset(cam, spec, |c, id| c.preset_select(id))
                    }
                    PresetCommand::Save(spec) => {
                        cmd_preset(cam, spec, |c, id| c.preset_save(id))
                    }
                    PresetCommand::Reset(spec) => {
                        cmd_preset(cam, spec, |c, id| c.preset_reset(id))
                    }
                },
                _ => Err(anyhow!("unexpected command (this is a bug!)")),
            };

            cam.close();
            result
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(&cli);

    match do_main(&cli) {
        Ok(s) => {
            if !s.is_empty() {
                println!("{}", s)
            }
        }
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
