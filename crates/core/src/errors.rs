use thiserror::Error;

use crate::exchange::ImportError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("item index {index} is out of range for {len} items")]
    ItemIndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl InterfaceError {
    /// Text shown to the person operating the tool. Never carries internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "Não foi possível processar os dados. Verifique e tente novamente.",
            Self::StorageUnavailable { .. } => {
                "Armazenamento indisponível. O orçamento não foi salvo."
            }
            Self::Internal { .. } => "Ocorreu um erro inesperado.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message }
            | Self::StorageUnavailable { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest { message: error.to_string() },
            ApplicationError::Import(error) => Self::BadRequest { message: error.to_string() },
            ApplicationError::Persistence(message) => Self::StorageUnavailable { message },
            ApplicationError::Configuration(message) => Self::Internal { message },
        }
    }
}
