// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error type shared by the ledger, aggregation and month operations.

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Transactions can only be added to an existing, active month.
    #[error("cannot add transaction to month {month_id}: month is closed or does not exist")]
    MonthClosed { month_id: i64 },

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("month {year}-{month:02} already exists")]
    DuplicateMonth { year: i32, month: u32 },

    #[error("invalid amount {0}: must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("invalid input: {0}")]
    Invalid(String),

    /// The row is still referenced by ledger transactions and cannot be removed.
    #[error("{entity} {id} is still referenced by transactions")]
    InUse { entity: &'static str, id: i64 },

    /// A query needed at least one row of this kind and found none.
    #[error("no {0} recorded yet")]
    NoData(&'static str),

    /// An aggregate left the range of a 96-bit decimal.
    #[error("amount overflow while computing {0}")]
    Overflow(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::MonthClosed { .. } => "MONTH_CLOSED",
            Error::InvalidTransfer(_) => "INVALID_TRANSFER",
            Error::DuplicateMonth { .. } => "DUPLICATE_MONTH",
            Error::InvalidAmount(_) => "INVALID_AMOUNT",
            Error::Invalid(_) => "INVALID_INPUT",
            Error::InUse { .. } => "IN_USE",
            Error::NoData(_) => "NO_DATA",
            Error::Overflow(_) => "AMOUNT_OVERFLOW",
            Error::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP-class status a JSON front end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } | Error::NoData(_) => 404,
            Error::InUse { .. } => 409,
            Error::Storage(_) => 500,
            _ => 400,
        }
    }

    /// `{"error": "..."}` response body.
    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.to_string() })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
