// keep in sync with ledger.rs of backend and connection.rs of device

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchNameQueryRequest {
    pub batch_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchNameQueryResponse {
    pub batch_name: Option<String>, // None: unknown code
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchAssociationRequest {
    pub batch_code: String,
    pub batch_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchAssociationResponse {
    pub batch_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StartActivityPeriodRequest {
    pub workstation_code: String,
    pub num_workers: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StopActivityPeriodRequest {
    pub workstation_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StartWorkRunRequest {
    pub workstation_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StopWorkRunRequest {
    pub workstation_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StartWorkRequest {
    pub workstation_code: String,
    pub batch_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StopWorkRequest {
    pub workstation_code: String,
}

/// Every request the ledger understands. The variant index is the wire tag,
/// so new kinds are appended at the end.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Request {
    BatchNameQuery(BatchNameQueryRequest),
    BatchAssociation(BatchAssociationRequest),
    StartActivityPeriod(StartActivityPeriodRequest),
    StopActivityPeriod(StopActivityPeriodRequest),
    StartWorkRun(StartWorkRunRequest),
    StopWorkRun(StopWorkRunRequest),
    StartWork(StartWorkRequest),
    StopWork(StopWorkRequest),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::BatchNameQuery(_) => "BatchNameQuery",
            Request::BatchAssociation(_) => "BatchAssociation",
            Request::StartActivityPeriod(_) => "StartActivityPeriod",
            Request::StopActivityPeriod(_) => "StopActivityPeriod",
            Request::StartWorkRun(_) => "StartWorkRun",
            Request::StopWorkRun(_) => "StopWorkRun",
            Request::StartWork(_) => "StartWork",
            Request::StopWork(_) => "StopWork",
        }
    }
}

/// Replies mirror [`Request`] one to one; the start/stop kinds carry no data.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Response {
    BatchNameQuery(BatchNameQueryResponse),
    BatchAssociation(BatchAssociationResponse),
    StartActivityPeriod,
    StopActivityPeriod,
    StartWorkRun,
    StopWorkRun,
    StartWork,
    StopWork,
    Error(ErrorResponse),
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::BatchNameQuery(_) => "BatchNameQuery",
            Response::BatchAssociation(_) => "BatchAssociation",
            Response::StartActivityPeriod => "StartActivityPeriod",
            Response::StopActivityPeriod => "StopActivityPeriod",
            Response::StartWorkRun => "StartWorkRun",
            Response::StopWorkRun => "StopWorkRun",
            Response::StartWork => "StartWork",
            Response::StopWork => "StopWork",
            Response::Error(_) => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The request could not be decoded into a known kind.
    InvalidMessage,
    /// `StartWork` named a batch code with no batch behind it.
    BatchNotFound,
    /// The persistent store rejected or failed the operation.
    Database,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidMessage => "invalid message",
            ErrorKind::BatchNotFound => "batch not found",
            ErrorKind::Database => "database",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    pub trace: Vec<String>, // source chain, outermost first
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
        }
    }
}
