use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::connection::LedgerClient;
use crate::device::{Device, DeviceError};
use crate::sensor::{Sensor, SensorSource};
use crate::state::WorkstationState;

type Reply<T> = mpsc::Sender<Result<T, DeviceError>>;

enum Command {
    SensorChanged(Sensor),
    ProximityChanged(bool),
    SetNumWorkers(i32, Reply<()>),
    SetBatchCode(String, Reply<()>),
    Refresh,
    Snapshot(mpsc::Sender<Snapshot>),
    Shutdown,
}

/// Point-in-time view of a device, for the operator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub workstation_code: String,
    pub state: WorkstationState,
    pub num_workers: u8,
    pub batch_code: String,
    pub batch_name: String,
    pub sensors: Vec<Sensor>,
}

impl<S: SensorSource, L: LedgerClient> From<&Device<S, L>> for Snapshot {
    fn from(device: &Device<S, L>) -> Self {
        Self {
            workstation_code: device.workstation_code().to_string(),
            state: device.workstation_state(),
            num_workers: device.num_workers(),
            batch_code: device.batch_code().to_string(),
            batch_name: device.batch_name().to_string(),
            sensors: device.sensors(),
        }
    }
}

/// Owns a [`Device`] on a dedicated thread. Sensor edges, proximity changes
/// and operator commands are queued and applied one at a time.
pub struct DeviceWorker<S, L> {
    handle: DeviceHandle,
    thread: Option<JoinHandle<Device<S, L>>>,
}

impl<S, L> DeviceWorker<S, L>
where
    S: SensorSource + 'static,
    L: LedgerClient + 'static,
{
    pub fn spawn(mut device: Device<S, L>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let sensor_tx = sender.clone();
        device
            .sensor_source_mut()
            .on_sensor_change(Box::new(move |sensor| {
                if sensor_tx.send(Command::SensorChanged(sensor)).is_err() {
                    warn!("Sensor change dropped, device worker has stopped");
                }
            }));

        let thread = thread::Builder::new()
            .name(format!("device-{}", device.workstation_code()))
            .spawn(move || run(device, receiver))?;

        Ok(Self {
            handle: DeviceHandle { sender },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle.clone()
    }

    /// Stops the worker after the queued commands and hands the device back.
    pub fn shutdown(mut self) -> Option<Device<S, L>> {
        self.stop()
    }

    fn stop(&mut self) -> Option<Device<S, L>> {
        let thread = self.thread.take()?;
        if let Err(err) = self.handle.sender.send(Command::Shutdown) {
            error!("Failed to send shutdown to device worker: {err}");
        }
        match thread.join() {
            Ok(device) => Some(device),
            Err(err) => {
                error!("Failed to join device worker: {err:?}");
                None
            }
        }
    }
}

impl<S, L> Drop for DeviceWorker<S, L> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.handle.sender.send(Command::Shutdown).ok();
            thread.join().ok();
        }
    }
}

fn run<S: SensorSource, L: LedgerClient>(
    mut device: Device<S, L>,
    receiver: mpsc::Receiver<Command>,
) -> Device<S, L> {
    info!("Device worker for {} started", device.workstation_code());

    while let Ok(command) = receiver.recv() {
        match command {
            Command::SensorChanged(sensor) => {
                if let Err(err) = device.on_sensor_changed(&sensor) {
                    error!("Failed to apply change of sensor {}: {err}", sensor.name);
                }
            }
            Command::ProximityChanged(present) => {
                if let Err(err) = device.on_proximity_changed(present) {
                    error!("Failed to apply proximity change: {err}");
                }
            }
            Command::SetNumWorkers(num_workers, reply) => {
                reply.send(device.set_num_workers(num_workers)).ok();
            }
            Command::SetBatchCode(batch_code, reply) => {
                reply.send(device.set_batch_code(&batch_code)).ok();
            }
            Command::Refresh => {
                if let Err(err) = device.refresh() {
                    error!("Failed to refresh: {err}");
                }
            }
            Command::Snapshot(reply) => {
                reply.send(Snapshot::from(&device)).ok();
            }
            Command::Shutdown => break,
        }
    }

    info!("Device worker for {} shutting down", device.workstation_code());
    device
}

/// Cloneable sender side of a [`DeviceWorker`].
#[derive(Clone)]
pub struct DeviceHandle {
    sender: mpsc::Sender<Command>,
}

impl DeviceHandle {
    pub fn set_num_workers(&self, num_workers: i32) -> Result<(), DeviceError> {
        self.request(|reply| Command::SetNumWorkers(num_workers, reply))?
    }

    pub fn set_batch_code(&self, batch_code: &str) -> Result<(), DeviceError> {
        let batch_code = batch_code.to_string();
        self.request(|reply| Command::SetBatchCode(batch_code, reply))?
    }

    pub fn proximity_changed(&self, present: bool) -> Result<(), DeviceError> {
        self.send(Command::ProximityChanged(present))
    }

    pub fn refresh(&self) -> Result<(), DeviceError> {
        self.send(Command::Refresh)
    }

    pub fn snapshot(&self) -> Result<Snapshot, DeviceError> {
        self.request(Command::Snapshot)
    }

    fn send(&self, command: Command) -> Result<(), DeviceError> {
        self.sender
            .send(command)
            .map_err(|_| DeviceError::WorkerStopped)
    }

    fn request<T>(&self, command: impl FnOnce(mpsc::Sender<T>) -> Command) -> Result<T, DeviceError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(command(reply_tx))?;
        reply_rx.recv().map_err(|_| DeviceError::WorkerStopped)
    }
}
