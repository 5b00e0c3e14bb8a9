//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NoAccountSpecified`] thrown when a movement references no account at all.
//! - [`AccountInUse`] thrown when deleting an account still referenced by
//!   movements.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//! [`NoAccountSpecified`]: EngineError::NoAccountSpecified
//! [`AccountInUse`]: EngineError::AccountInUse
//! [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no account specified: set account_in, account_out or both")]
    NoAccountSpecified,
    #[error("account \"{0}\" is still referenced by movements")]
    AccountInUse(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NoAccountSpecified, Self::NoAccountSpecified) => true,
            (Self::AccountInUse(a), Self::AccountInUse(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
