use log::{debug, info};

use crate::connection::{ConnectionError, LedgerClient, ServerError};
use crate::listeners::{ListenerId, Listeners};
use crate::sensor::{Sensor, SensorSource};
use crate::state::WorkstationState;

pub const MAX_WORKERS: u8 = 4;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("num_workers must be within 0..={}, was {0}", MAX_WORKERS)]
    WorkersOutOfRange(i32),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("device worker has stopped")]
    WorkerStopped,
}

impl DeviceError {
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            DeviceError::Connection(ConnectionError::Server(err)) => Some(err),
            _ => None,
        }
    }
}

/// Client-side classifier of one workstation. Derives the workstation state
/// from sensors and operator input and keeps the ledger in step with it.
///
/// Methods take `&mut self`, so one device is never mutated concurrently;
/// see [`crate::worker::DeviceWorker`] for running it on its own thread.
pub struct Device<S, L> {
    workstation_code: String,
    sensor_source: S,
    ledger: L,

    num_workers: u8,
    batch_code: String, // empty: no batch
    batch_name: String,
    previous_state: WorkstationState,

    state_listeners: Listeners<WorkstationState>,
    num_workers_listeners: Listeners<u8>,
    sensors_listeners: Listeners<Vec<Sensor>>,
    batch_name_listeners: Listeners<String>,
}

impl<S: SensorSource, L: LedgerClient> Device<S, L> {
    pub fn new(workstation_code: impl Into<String>, sensor_source: S, ledger: L) -> Self {
        Self {
            workstation_code: workstation_code.into(),
            sensor_source,
            ledger,
            num_workers: 0,
            batch_code: String::new(),
            batch_name: String::new(),
            previous_state: WorkstationState::Empty,
            state_listeners: Listeners::new(),
            num_workers_listeners: Listeners::new(),
            sensors_listeners: Listeners::new(),
            batch_name_listeners: Listeners::new(),
        }
    }

    pub fn workstation_code(&self) -> &str {
        &self.workstation_code
    }

    pub fn num_workers(&self) -> u8 {
        self.num_workers
    }

    pub fn batch_code(&self) -> &str {
        &self.batch_code
    }

    pub fn batch_name(&self) -> &str {
        &self.batch_name
    }

    pub fn sensors(&self) -> Vec<Sensor> {
        self.sensor_source.sensors()
    }

    pub fn workstation_state(&self) -> WorkstationState {
        WorkstationState::derive(self.num_workers, &self.sensor_source.sensors())
    }

    pub fn sensor_source_mut(&mut self) -> &mut S {
        &mut self.sensor_source
    }

    pub fn subscribe_state(
        &mut self,
        listener: impl FnMut(&WorkstationState) + Send + 'static,
    ) -> ListenerId {
        self.state_listeners.subscribe(listener)
    }

    pub fn subscribe_num_workers(&mut self, listener: impl FnMut(&u8) + Send + 'static) -> ListenerId {
        self.num_workers_listeners.subscribe(listener)
    }

    pub fn subscribe_sensors(
        &mut self,
        listener: impl FnMut(&Vec<Sensor>) + Send + 'static,
    ) -> ListenerId {
        self.sensors_listeners.subscribe(listener)
    }

    pub fn subscribe_batch_name(&mut self, listener: impl FnMut(&String) + Send + 'static) -> ListenerId {
        self.batch_name_listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.state_listeners.unsubscribe(id)
            || self.num_workers_listeners.unsubscribe(id)
            || self.sensors_listeners.unsubscribe(id)
            || self.batch_name_listeners.unsubscribe(id)
    }

    /// Reacts to a sensor edge. The pushed sensor is only a trigger; the full
    /// set is re-read from the source.
    pub fn on_sensor_changed(&mut self, changed: &Sensor) -> Result<(), DeviceError> {
        debug!("Sensor {} changed to {}", changed.name, changed.active);
        let sensors = self.sensor_source.sensors();
        let state = WorkstationState::derive(self.num_workers, &sensors);

        self.sensors_listeners.notify(&sensors);
        self.state_listeners.notify(&state);
        self.sync_work_run(state)
    }

    /// Losing proximity means the operators left.
    pub fn on_proximity_changed(&mut self, present: bool) -> Result<(), DeviceError> {
        if present {
            return Ok(());
        }
        self.set_num_workers(0)
    }

    /// Sets the operator-entered head count. The activity period is closed and,
    /// for a non-zero count, reopened before the new count is stored.
    pub fn set_num_workers(&mut self, num_workers: i32) -> Result<(), DeviceError> {
        let num_workers = u8::try_from(num_workers)
            .ok()
            .filter(|n| *n <= MAX_WORKERS)
            .ok_or(DeviceError::WorkersOutOfRange(num_workers))?;

        if num_workers != self.num_workers {
            self.ledger.stop_activity_period(&self.workstation_code)?;
            if num_workers > 0 {
                self.ledger
                    .start_activity_period(&self.workstation_code, i32::from(num_workers))?;
            }

            info!(
                "Workers on {}: {} -> {num_workers}",
                self.workstation_code, self.num_workers
            );
            self.num_workers = num_workers;
            self.num_workers_listeners.notify(&num_workers);
        }

        self.refresh()
    }

    /// Selects the batch being worked on; an empty code clears it.
    ///
    /// `batch_code` is only updated once every ledger call went through. A
    /// failing `start_work` leaves the preceding `stop_work` in effect.
    pub fn set_batch_code(&mut self, batch_code: &str) -> Result<(), DeviceError> {
        if batch_code == self.batch_code {
            return Ok(());
        }

        if !batch_code.is_empty() {
            let name = self.ledger.get_batch_name(batch_code)?.unwrap_or_default();
            self.batch_name = name.clone();
            self.batch_name_listeners.notify(&name);
        }

        self.ledger.stop_work(&self.workstation_code)?;
        if !batch_code.is_empty() {
            self.ledger.start_work(&self.workstation_code, batch_code)?;
        }

        info!("Batch on {}: {batch_code:?}", self.workstation_code);
        self.batch_code = batch_code.to_string();
        Ok(())
    }

    /// Re-evaluates the state and notifies state listeners without touching
    /// the activity period.
    pub fn refresh(&mut self) -> Result<(), DeviceError> {
        let state = self.workstation_state();
        self.state_listeners.notify(&state);
        self.sync_work_run(state)
    }

    // edge-transition rule: the ledger only hears about changes into or out of ACTIVE
    fn sync_work_run(&mut self, state: WorkstationState) -> Result<(), DeviceError> {
        let previous = std::mem::replace(&mut self.previous_state, state);
        if state == previous {
            return Ok(());
        }

        info!("{}: {previous} -> {state}", self.workstation_code);
        if state == WorkstationState::Active {
            self.ledger.start_work_run(&self.workstation_code)?;
        } else if previous == WorkstationState::Active {
            self.ledger.stop_work_run(&self.workstation_code)?;
        }
        Ok(())
    }
}
