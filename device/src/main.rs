use std::io::BufRead;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{error, info, warn};

use monitor_device::config::Config;
use monitor_device::connection::ServerConnection;
use monitor_device::device::Device;
use monitor_device::indicator::{Indicator, LogIndicator};
use monitor_device::operator::{OperatorCommand, HELP};
use monitor_device::sensor::BlinkingSensors;
use monitor_device::worker::{DeviceHandle, DeviceWorker};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!("Workstation {}", config.workstation_code);

    let connection = ServerConnection::connect(&config.connect_addr)
        .with_context(|| format!("cannot reach ledger at {}", config.connect_addr))?;
    let sensors = BlinkingSensors::start(config.sensors(), config.blink_interval)?;
    let mut device = Device::new(config.workstation_code.clone(), sensors, connection);

    // the LED only changes on transitions
    let indicator = Arc::new(Mutex::new(LogIndicator::default()));
    indicator
        .lock()
        .map_err(|_| anyhow::anyhow!("indicator lock poisoned"))?
        .show_state(device.workstation_state());
    let mut last_state = device.workstation_state();
    let led = indicator.clone();
    device.subscribe_state(move |state| {
        if *state != last_state {
            last_state = *state;
            if let Ok(mut led) = led.lock() {
                led.show_state(*state);
            }
        }
    });
    device.subscribe_num_workers(|n| info!("Workers: {n}"));
    device.subscribe_batch_name(|name| info!("Batch name: {name:?}"));
    device.subscribe_sensors(|sensors| {
        let active: Vec<&str> = sensors
            .iter()
            .filter(|s| s.active)
            .map(|s| s.name.as_str())
            .collect();
        info!("Active sensors: {active:?}");
    });

    let worker = DeviceWorker::spawn(device)?;
    println!("{HELP}");
    run_console(worker.handle())?;

    worker.shutdown();
    Ok(())
}

fn run_console(device: DeviceHandle) -> Result<()> {
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<OperatorCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        let result = match command {
            OperatorCommand::Workers(n) => device.set_num_workers(n),
            OperatorCommand::Batch(code) => device.set_batch_code(&code),
            OperatorCommand::State => device.snapshot().map(|s| {
                println!(
                    "{} {} workers={} batch={:?} ({:?})",
                    s.workstation_code, s.state, s.num_workers, s.batch_code, s.batch_name
                );
                for sensor in s.sensors {
                    println!("  {} {}", sensor.name, if sensor.active { "on" } else { "off" });
                }
            }),
            OperatorCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("{e}");
            if let Some(server) = e.server_error() {
                for cause in &server.trace {
                    error!("  caused by: {cause}");
                }
            }
        }
    }

    info!("Console closed");
    Ok(())
}
