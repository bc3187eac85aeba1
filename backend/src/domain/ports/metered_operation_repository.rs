//! Port for the shared store of metered operation records.
//!
//! The store is the only shared mutable resource in quota enforcement. Its
//! `reserve` operation is the admission guard: it must count and insert
//! atomically with respect to other reservations for the same user and kind,
//! so concurrent requests cannot over-admit past the limit.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    MeteredOperationRecord, NewMeteredOperation, OperationId, OperationKind, QuotaPeriod, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by metered operation adapters.
    pub enum OperationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "operation store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "operation store query failed: {message}",
    }
}

/// Result of an atomic count-and-insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// The record was inserted; `usage` includes it.
    Reserved { usage: u32 },
    /// The period allowance is spent; nothing was inserted.
    Exhausted { usage: u32 },
}

/// Page request over a user's own records, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub user_id: UserId,
    pub kind: Option<OperationKind>,
    pub offset: u64,
    pub limit: u32,
}

/// One page of records plus the unpaged total.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub records: Vec<MeteredOperationRecord>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeteredOperationRepository: Send + Sync {
    /// Count records of `kind` for `user_id` created inside `period`.
    async fn count_in_period(
        &self,
        user_id: &UserId,
        kind: OperationKind,
        period: &QuotaPeriod,
    ) -> Result<u32, OperationPersistenceError>;

    /// Insert `operation` only while fewer than `limit` records of its kind
    /// exist for its user in `period`.
    async fn reserve(
        &self,
        operation: &NewMeteredOperation,
        period: &QuotaPeriod,
        limit: u32,
    ) -> Result<ReservationOutcome, OperationPersistenceError>;

    /// Insert `operation` unconditionally.
    async fn insert(&self, operation: &NewMeteredOperation)
    -> Result<(), OperationPersistenceError>;

    /// Attach the result and mark the record completed.
    async fn complete(
        &self,
        id: &OperationId,
        result: &Value,
    ) -> Result<(), OperationPersistenceError>;

    /// Page through a user's records, newest first.
    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, OperationPersistenceError>;
}
