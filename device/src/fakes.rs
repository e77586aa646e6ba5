// In-process ledger double that records every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::message::ErrorKind;

use crate::connection::{ConnectionError, LedgerClient, ServerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetBatchName(String),
    AssociateBatch(String, String),
    StartActivityPeriod(String, i32),
    StopActivityPeriod(String),
    StartWorkRun(String),
    StopWorkRun(String),
    StartWork(String, String),
    StopWork(String),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    batches: HashMap<String, String>,
    fail_on: Option<&'static str>,
}

#[derive(Clone, Default)]
pub struct RecordingLedger {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingLedger {
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.inner.lock().unwrap().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn add_batch(&self, code: &str, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .batches
            .insert(code.to_string(), name.to_string());
    }

    /// Every later call of the named operation answers with an internal error.
    pub fn fail_on(&self, operation: &'static str) {
        self.inner.lock().unwrap().fail_on = Some(operation);
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<(), ConnectionError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        if inner.fail_on == Some(operation) {
            return Err(server_error(ErrorKind::Internal, format!("{operation} failed")));
        }
        Ok(())
    }
}

fn server_error(kind: ErrorKind, message: String) -> ConnectionError {
    ServerError {
        kind,
        message,
        trace: Vec::new(),
    }
    .into()
}

impl LedgerClient for RecordingLedger {
    fn get_batch_name(&mut self, batch_code: &str) -> Result<Option<String>, ConnectionError> {
        self.record("get_batch_name", Call::GetBatchName(batch_code.into()))?;
        Ok(self.inner.lock().unwrap().batches.get(batch_code).cloned())
    }

    fn associate_batch(&mut self, batch_code: &str, batch_name: &str) -> Result<i32, ConnectionError> {
        self.record(
            "associate_batch",
            Call::AssociateBatch(batch_code.into(), batch_name.into()),
        )?;
        let mut inner = self.inner.lock().unwrap();
        inner.batches.insert(batch_code.into(), batch_name.into());
        Ok(inner.batches.len() as i32)
    }

    fn start_activity_period(
        &mut self,
        workstation_code: &str,
        num_workers: i32,
    ) -> Result<(), ConnectionError> {
        self.record(
            "start_activity_period",
            Call::StartActivityPeriod(workstation_code.into(), num_workers),
        )
    }

    fn stop_activity_period(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.record("stop_activity_period", Call::StopActivityPeriod(workstation_code.into()))
    }

    fn start_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.record("start_work_run", Call::StartWorkRun(workstation_code.into()))
    }

    fn stop_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.record("stop_work_run", Call::StopWorkRun(workstation_code.into()))
    }

    fn start_work(&mut self, workstation_code: &str, batch_code: &str) -> Result<(), ConnectionError> {
        self.record(
            "start_work",
            Call::StartWork(workstation_code.into(), batch_code.into()),
        )?;
        if !self.inner.lock().unwrap().batches.contains_key(batch_code) {
            return Err(server_error(
                ErrorKind::BatchNotFound,
                format!("batch doesn't exist: {batch_code}"),
            ));
        }
        Ok(())
    }

    fn stop_work(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.record("stop_work", Call::StopWork(workstation_code.into()))
    }
}
