use std::fmt;
use serde::Serialize;
use crate::core::error::{Error, ErrorKind};
use crate::core::types::Document;

pub const CREATED_MESSAGE: &str = "Document created successfully";
pub const LISTED_MESSAGE: &str = "Document fetched successfully";
pub const SEARCHED_MESSAGE: &str = "Search results fetched successfully";

/// Outcome of a create call, tagged by `status`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CreateResponse {
    Created {
        message: String,
        #[serde(rename = "totalCount")]
        total_count: usize,
        data: Document,
    },
    Error {
        message: String,
        #[serde(skip)]
        code: u16,
    },
}

impl CreateResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            CreateResponse::Created { .. } => 201,
            CreateResponse::Error { code, .. } => *code,
        }
    }
}

impl From<ApiError> for CreateResponse {
    fn from(err: ApiError) -> Self {
        CreateResponse::Error {
            code: err.status_code(),
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub message: String,
    pub count: usize,
    pub data: Vec<Document>,
}

impl ListResponse {
    pub fn new(message: &str, data: Vec<Document>) -> Self {
        ListResponse {
            message: message.to_string(),
            count: data.len(),
            data,
        }
    }
}

/// Engine error as seen by an HTTP wrapper; serializes as `{"error": ..}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::Validation
            | ErrorKind::UniqueConstraintViolation
            | ErrorKind::UnsupportedQuery
            | ErrorKind::InvalidInput
            | ErrorKind::Serialization => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::DeadlineExceeded | ErrorKind::Closed => 503,
            ErrorKind::InternalIndexInconsistency => 500,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError {
            kind: err.kind,
            message: err.context,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.status_code(), self.message)
    }
}

impl std::error::Error for ApiError {}
