use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to load context: {0}")]
    Assembly(String),

    #[error("Failed to generate answer: {0}")]
    Generation(String),

    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: &'static str, after: Duration },
}

impl Error {
    /// Text safe to show to an end user. Collaborator details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(reason) => format!("Invalid request: {reason}"),
            Error::Assembly(_) => "Could not load the documents for this question. Please try again.".to_string(),
            Error::Generation(_) => "The answer could not be generated. Please try again.".to_string(),
            Error::Timeout { stage, .. } => format!("The request took too long while {stage}. Please try again."),
            Error::InvalidConfig(_) | Error::NotFound(_) | Error::Operation(_) => {
                "Something went wrong while answering. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
