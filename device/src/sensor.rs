use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub identifier: i32,
    pub name: String,
    pub active: bool,
}

impl Sensor {
    pub fn new(identifier: i32, name: impl Into<String>, active: bool) -> Self {
        Self {
            identifier,
            name: name.into(),
            active,
        }
    }
}

/// Receives the single sensor that changed.
pub type SensorListener = Box<dyn Fn(Sensor) + Send>;

/// Where sensor readings come from. Implementations debounce the raw signal
/// and only report edges of the `active` flag.
pub trait SensorSource: Send {
    /// Snapshot of every sensor, in a stable order.
    fn sensors(&self) -> Vec<Sensor>;

    fn on_sensor_change(&mut self, listener: SensorListener);
}

/// Sensor set fed from outside, e.g. by GPIO glue code. Clones share state.
#[derive(Clone, Default)]
pub struct SharedSensors {
    sensors: Arc<Mutex<Vec<Sensor>>>,
    listeners: Arc<Mutex<Vec<SensorListener>>>,
}

impl SharedSensors {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors: Arc::new(Mutex::new(sensors)),
            listeners: Arc::default(),
        }
    }

    /// Updates one sensor and notifies listeners if its state flipped.
    /// Returns false for an unknown identifier.
    pub fn set_active(&self, identifier: i32, active: bool) -> bool {
        let changed = {
            let mut sensors = lock(&self.sensors);
            let Some(sensor) = sensors.iter_mut().find(|s| s.identifier == identifier) else {
                return false;
            };
            if sensor.active == active {
                return true;
            }
            *sensor = Sensor {
                active,
                ..sensor.clone()
            };
            sensor.clone()
        };

        debug!("Sensor {} active: {}", changed.name, changed.active);
        for listener in lock(&self.listeners).iter() {
            listener(changed.clone());
        }
        true
    }

    pub fn toggle(&self, identifier: i32) -> bool {
        let current = lock(&self.sensors)
            .iter()
            .find(|s| s.identifier == identifier)
            .map(|s| s.active);
        match current {
            Some(active) => self.set_active(identifier, !active),
            None => false,
        }
    }
}

impl SensorSource for SharedSensors {
    fn sensors(&self) -> Vec<Sensor> {
        lock(&self.sensors).clone()
    }

    fn on_sensor_change(&mut self, listener: SensorListener) {
        lock(&self.listeners).push(listener);
    }
}

/// Simulated hardware: flips a random sensor every `interval`.
pub struct BlinkingSensors {
    sensors: SharedSensors,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BlinkingSensors {
    pub fn start(sensors: Vec<Sensor>, interval: Duration) -> std::io::Result<Self> {
        let shared = SharedSensors::new(sensors);
        let running = Arc::new(AtomicBool::new(true));

        let blinker = shared.clone();
        let keep_running = running.clone();
        let thread = thread::Builder::new()
            .name("sensor-blinker".into())
            .spawn(move || {
                let mut rng = rand::thread_rng();
                while keep_running.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    let ids: Vec<i32> = blinker.sensors().iter().map(|s| s.identifier).collect();
                    if ids.is_empty() {
                        continue;
                    }
                    blinker.toggle(ids[rng.gen_range(0..ids.len())]);
                }
            })?;

        info!("Simulating sensors, blinking every {interval:?}");
        Ok(Self {
            sensors: shared,
            running,
            thread: Some(thread),
        })
    }
}

impl SensorSource for BlinkingSensors {
    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.sensors()
    }

    fn on_sensor_change(&mut self, listener: SensorListener) {
        self.sensors.on_sensor_change(listener);
    }
}

impl Drop for BlinkingSensors {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
