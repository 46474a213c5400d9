use std::{error::Error, fmt};

pub mod assembler;
pub mod client;
pub mod credentials;
pub mod database;
pub mod geocoding;
pub mod memory;
pub mod proximity;
pub mod query;

#[derive(Debug)]
pub enum RequestError {
    /// The addressed record does not exist, or its id is not even well formed.
    NotFound,
    Validation(String),
    UnknownCategory(String),
    Unauthorized(String),
    Forbidden,
    Conflict(String),
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "the requested item does not exist"),
            Self::Validation(message) => write!(f, "invalid request: {}", message),
            Self::UnknownCategory(category) => {
                write!(f, "unknown category '{}'", category)
            }
            Self::Unauthorized(message) => write!(f, "unauthorized: {}", message),
            Self::Forbidden => write!(f, "not allowed to modify this item"),
            Self::Conflict(message) => write!(f, "conflict: {}", message),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl Error for RequestError {}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::Conflict(message) => Self::Conflict(message),
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

impl From<tokio::task::JoinError> for RequestError {
    fn from(why: tokio::task::JoinError) -> Self {
        Self::other(why)
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

pub fn not_found_to_none<O>(result: RequestResult<O>) -> RequestResult<Option<O>> {
    if let Err(RequestError::NotFound) = result {
        Ok(None)
    } else {
        result.map(Some)
    }
}
