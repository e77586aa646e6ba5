use std::sync::{Arc, Mutex};
use std::thread;

use common::message::ErrorKind;
use monitor_backend::db::Db;
use monitor_backend::ledger::Ledger;
use monitor_backend::server;
use monitor_device::connection::{LedgerClient, ServerConnection};
use monitor_device::device::Device;
use monitor_device::sensor::{Sensor, SensorSource, SharedSensors};
use monitor_device::state::WorkstationState;
use monitor_device::worker::DeviceWorker;

/// Serves an in-memory ledger on a background runtime.
fn start_ledger() -> (String, Arc<Mutex<Ledger>>) {
    let ledger = Arc::new(Mutex::new(Ledger::new(Db::in_memory().unwrap())));

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let served = ledger.clone();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            server::serve(listener, served).await.unwrap();
        });
    });

    (addr, ledger)
}

fn sensor(sensors: &SharedSensors, id: i32) -> Sensor {
    sensors
        .sensors()
        .into_iter()
        .find(|s| s.identifier == id)
        .unwrap()
}

#[test]
fn staffed_active_workstation_has_one_open_period_and_run() {
    let (addr, ledger) = start_ledger();
    let sensors = SharedSensors::new(vec![Sensor::new(1, "vibration", false)]);
    let mut device = Device::new(
        "SAW-1",
        sensors.clone(),
        ServerConnection::connect(&addr).unwrap(),
    );

    device.set_num_workers(1).unwrap();
    sensors.set_active(1, true);
    device.on_sensor_changed(&sensor(&sensors, 1)).unwrap();
    assert_eq!(device.workstation_state(), WorkstationState::Active);

    let mut ledger = ledger.lock().unwrap();
    let db = ledger.db();
    let open = db.open_intervals("SAW-1").unwrap();
    assert_eq!(open.activity_period.unwrap().num_workers, 1);
    assert!(open.work_run.is_some());
    assert!(open.work.is_none());
    assert_eq!(db.activity_periods("SAW-1").unwrap().len(), 1);
    assert_eq!(db.work_runs("SAW-1").unwrap().len(), 1);
}

#[test]
fn leaving_closes_every_open_interval() {
    let (addr, ledger) = start_ledger();
    let sensors = SharedSensors::new(vec![Sensor::new(1, "vibration", true)]);
    let mut device = Device::new(
        "SAW-2",
        sensors.clone(),
        ServerConnection::connect(&addr).unwrap(),
    );

    device.set_num_workers(2).unwrap();
    device.set_num_workers(3).unwrap();
    device.on_proximity_changed(false).unwrap();
    assert_eq!(device.workstation_state(), WorkstationState::Empty);

    let mut ledger = ledger.lock().unwrap();
    let db = ledger.db();
    let open = db.open_intervals("SAW-2").unwrap();
    assert!(open.activity_period.is_none());
    assert!(open.work_run.is_none());

    let periods = db.activity_periods("SAW-2").unwrap();
    let counts: Vec<i32> = periods.iter().map(|p| p.num_workers).collect();
    assert_eq!(counts, vec![2, 3]);
    assert!(periods.iter().all(|p| p.stop.is_some()));
}

#[test]
fn batch_flow_through_worker() {
    let (addr, ledger) = start_ledger();

    let mut manager = ServerConnection::connect(&addr).unwrap();
    manager.associate_batch("B-17", "Pine 50x100").unwrap();
    assert_eq!(manager.get_batch_name("B-17").unwrap().as_deref(), Some("Pine 50x100"));
    assert_eq!(manager.get_batch_name("B-99").unwrap(), None);

    let sensors = SharedSensors::new(vec![
        Sensor::new(1, "vibration", false),
        Sensor::new(2, "current", false),
    ]);
    let device = Device::new(
        "PLANER",
        sensors.clone(),
        ServerConnection::connect(&addr).unwrap(),
    );
    let worker = DeviceWorker::spawn(device).unwrap();
    let handle = worker.handle();

    handle.set_batch_code("B-17").unwrap();
    handle.set_num_workers(1).unwrap();
    sensors.set_active(2, true);

    let snapshot = handle.snapshot().unwrap();
    assert_eq!(snapshot.state, WorkstationState::Active);
    assert_eq!(snapshot.batch_name, "Pine 50x100");

    let err = handle.set_batch_code("B-99").unwrap_err();
    assert_eq!(err.server_error().map(|e| e.kind), Some(ErrorKind::BatchNotFound));
    assert_eq!(handle.snapshot().unwrap().batch_code, "B-17");

    worker.shutdown().unwrap();

    let mut ledger = ledger.lock().unwrap();
    let db = ledger.db();
    let open = db.open_intervals("PLANER").unwrap();
    let batch_id = db.batches().unwrap()[0].id;
    assert!(open.work.is_none());
    assert_eq!(open.work_run.unwrap().batch_id, Some(batch_id));
    assert_eq!(db.works("PLANER").unwrap().len(), 1);
}
