//! Order Manager errors

use meridian_ports::BrokerError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid reference price: {0}")]
    InvalidPrice(Decimal),

    #[error("Pending order not found: {0}")]
    PendingNotFound(Uuid),

    #[error("Pending order {0} is already being processed")]
    AlreadyProcessing(Uuid),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("Invalid execution config: {0}")]
    Config(String),
}

impl Error {
    /// Whether the same call may succeed later
    ///
    /// `AlreadyProcessing` resolves once the in-flight confirm finishes;
    /// broker failures other than a malformed order may be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::AlreadyProcessing(_) => true,
            Error::Broker(BrokerError::InvalidOrder(_)) => false,
            Error::Broker(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
