use std::io::BufReader;
use std::net::TcpStream;

use common::message::*;
use common::wire::{self, WireError};
use log::{debug, info};

/// Error reported by the ledger service, decoded from an [`ErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServerError {
    pub kind: ErrorKind,
    pub message: String,
    pub trace: Vec<String>,
}

impl From<ErrorResponse> for ServerError {
    fn from(resp: ErrorResponse) -> Self {
        Self {
            kind: resp.kind,
            message: resp.message,
            trace: resp.trace,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("server error: {0}")]
    Server(#[from] ServerError),
    #[error("transport error: {0}")]
    Transport(#[from] WireError),
    #[error("expected {expected} response, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        ConnectionError::Transport(WireError::Io(err))
    }
}

/// Ledger operations the device issues. Every call blocks until the reply
/// arrives or the transport fails; nothing is retried.
pub trait LedgerClient: Send {
    /// `None` when no batch carries the code.
    fn get_batch_name(&mut self, batch_code: &str) -> Result<Option<String>, ConnectionError>;
    fn associate_batch(&mut self, batch_code: &str, batch_name: &str) -> Result<i32, ConnectionError>;
    fn start_activity_period(
        &mut self,
        workstation_code: &str,
        num_workers: i32,
    ) -> Result<(), ConnectionError>;
    fn stop_activity_period(&mut self, workstation_code: &str) -> Result<(), ConnectionError>;
    fn start_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError>;
    fn stop_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError>;
    fn start_work(&mut self, workstation_code: &str, batch_code: &str) -> Result<(), ConnectionError>;
    fn stop_work(&mut self, workstation_code: &str) -> Result<(), ConnectionError>;
}

/// Long-lived request/reply connection to the ledger service, one request in
/// flight at a time.
pub struct ServerConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl ServerConnection {
    pub fn connect(address: &str) -> Result<Self, ConnectionError> {
        let writer = TcpStream::connect(address)?;
        writer.set_nodelay(true)?;
        let reader = BufReader::new(writer.try_clone()?);
        info!("Connected to ledger at {address}");

        Ok(Self { reader, writer })
    }

    /// Sends one request and waits for its reply. An error reply is returned
    /// as [`ConnectionError::Server`].
    pub fn communicate(&mut self, request: &Request) -> Result<Response, ConnectionError> {
        debug!("-> {request:?}");
        wire::write_frame(&mut self.writer, request)?;
        let mut frame = wire::read_frame(&mut self.reader)?;
        let response = wire::decode::<Response>(&mut frame)?;
        debug!("<- {response:?}");

        match response {
            Response::Error(err) => Err(ServerError::from(err).into()),
            response => Ok(response),
        }
    }

    fn acknowledge(&mut self, request: Request, expected: Response) -> Result<(), ConnectionError> {
        let response = self.communicate(&request)?;
        if response == expected {
            Ok(())
        } else {
            Err(unexpected(expected.kind(), &response))
        }
    }
}

fn unexpected(expected: &'static str, actual: &Response) -> ConnectionError {
    ConnectionError::UnexpectedResponse {
        expected,
        actual: actual.kind(),
    }
}

impl LedgerClient for ServerConnection {
    fn get_batch_name(&mut self, batch_code: &str) -> Result<Option<String>, ConnectionError> {
        let request = Request::BatchNameQuery(BatchNameQueryRequest {
            batch_code: batch_code.to_string(),
        });
        match self.communicate(&request)? {
            Response::BatchNameQuery(resp) => Ok(resp.batch_name),
            other => Err(unexpected("BatchNameQuery", &other)),
        }
    }

    fn associate_batch(&mut self, batch_code: &str, batch_name: &str) -> Result<i32, ConnectionError> {
        let request = Request::BatchAssociation(BatchAssociationRequest {
            batch_code: batch_code.to_string(),
            batch_name: batch_name.to_string(),
        });
        match self.communicate(&request)? {
            Response::BatchAssociation(resp) => Ok(resp.batch_id),
            other => Err(unexpected("BatchAssociation", &other)),
        }
    }

    fn start_activity_period(
        &mut self,
        workstation_code: &str,
        num_workers: i32,
    ) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StartActivityPeriod(StartActivityPeriodRequest {
                workstation_code: workstation_code.to_string(),
                num_workers,
            }),
            Response::StartActivityPeriod,
        )
    }

    fn stop_activity_period(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StopActivityPeriod(StopActivityPeriodRequest {
                workstation_code: workstation_code.to_string(),
            }),
            Response::StopActivityPeriod,
        )
    }

    fn start_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StartWorkRun(StartWorkRunRequest {
                workstation_code: workstation_code.to_string(),
            }),
            Response::StartWorkRun,
        )
    }

    fn stop_work_run(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StopWorkRun(StopWorkRunRequest {
                workstation_code: workstation_code.to_string(),
            }),
            Response::StopWorkRun,
        )
    }

    fn start_work(&mut self, workstation_code: &str, batch_code: &str) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StartWork(StartWorkRequest {
                workstation_code: workstation_code.to_string(),
                batch_code: batch_code.to_string(),
            }),
            Response::StartWork,
        )
    }

    fn stop_work(&mut self, workstation_code: &str) -> Result<(), ConnectionError> {
        self.acknowledge(
            Request::StopWork(StopWorkRequest {
                workstation_code: workstation_code.to_string(),
            }),
            Response::StopWork,
        )
    }
}
