use common::message::*;
use common::wire;
use log::{debug, warn};

use crate::db::Db;
use crate::error::Result;

/// Request dispatcher in front of the ledger store. Every request kind has
/// exactly one handler; every failure becomes an [`ErrorResponse`].
pub struct Ledger {
    db: Db,
}

impl Ledger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&mut self) -> &mut Db {
        &mut self.db
    }

    /// Decodes one frame and executes it. Undecodable input is answered with
    /// [`ErrorKind::InvalidMessage`].
    pub fn handle_frame(&mut self, frame: &mut [u8]) -> Response {
        match wire::decode::<Request>(frame) {
            Ok(request) => self.execute(request),
            Err(e) => {
                warn!("Rejecting undecodable request: {e}");
                let mut resp = ErrorResponse::new(ErrorKind::InvalidMessage, "invalid message");
                resp.trace.push(e.to_string());
                Response::Error(resp)
            }
        }
    }

    pub fn execute(&mut self, request: Request) -> Response {
        let kind = request.kind();
        debug!("Handling {request:?}");

        match self.dispatch(request) {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{kind} failed: {e}");
                Response::Error((&e).into())
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::BatchNameQuery(req) => self.handle_batch_name_query(req),
            Request::BatchAssociation(req) => self.handle_batch_association(req),
            Request::StartActivityPeriod(req) => self.handle_start_activity_period(req),
            Request::StopActivityPeriod(req) => self.handle_stop_activity_period(req),
            Request::StartWorkRun(req) => self.handle_start_work_run(req),
            Request::StopWorkRun(req) => self.handle_stop_work_run(req),
            Request::StartWork(req) => self.handle_start_work(req),
            Request::StopWork(req) => self.handle_stop_work(req),
        }
    }

    fn handle_batch_name_query(&mut self, req: BatchNameQueryRequest) -> Result<Response> {
        let batch = self.db.find_batch_by_code(&req.batch_code)?;
        Ok(Response::BatchNameQuery(BatchNameQueryResponse {
            batch_name: batch.map(|b| b.name),
        }))
    }

    fn handle_batch_association(&mut self, req: BatchAssociationRequest) -> Result<Response> {
        let batch = self.db.associate_batch(&req.batch_code, &req.batch_name)?;
        Ok(Response::BatchAssociation(BatchAssociationResponse {
            batch_id: batch.id,
        }))
    }

    fn handle_start_activity_period(&mut self, req: StartActivityPeriodRequest) -> Result<Response> {
        self.db
            .start_activity_period(&req.workstation_code, req.num_workers)?;
        Ok(Response::StartActivityPeriod)
    }

    fn handle_stop_activity_period(&mut self, req: StopActivityPeriodRequest) -> Result<Response> {
        self.db.stop_activity_period(&req.workstation_code)?;
        Ok(Response::StopActivityPeriod)
    }

    fn handle_start_work_run(&mut self, req: StartWorkRunRequest) -> Result<Response> {
        self.db.start_work_run(&req.workstation_code)?;
        Ok(Response::StartWorkRun)
    }

    fn handle_stop_work_run(&mut self, req: StopWorkRunRequest) -> Result<Response> {
        self.db.stop_work_run(&req.workstation_code)?;
        Ok(Response::StopWorkRun)
    }

    fn handle_start_work(&mut self, req: StartWorkRequest) -> Result<Response> {
        self.db.start_work(&req.workstation_code, &req.batch_code)?;
        Ok(Response::StartWork)
    }

    fn handle_stop_work(&mut self, req: StopWorkRequest) -> Result<Response> {
        self.db.stop_work(&req.workstation_code)?;
        Ok(Response::StopWork)
    }
}
