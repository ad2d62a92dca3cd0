use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
