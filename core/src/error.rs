//! Core error types

use thiserror::Error;

use crate::epoch::Phase;
use crate::roles::Role;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("governance has not started yet")]
    NotStarted,

    #[error("operation is only legal in the {required:?} phase")]
    WrongPhase { required: Phase },

    #[error("{caller} lacks the {role:?} role")]
    Unauthorized { caller: String, role: Role },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("insufficient allowance: requested {requested}, approved {approved}")]
    InsufficientAllowance { requested: u64, approved: u64 },

    #[error("invalid document hash: {0}")]
    InvalidDocHash(String),

    #[error("amount overflow")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, CoreError>;
