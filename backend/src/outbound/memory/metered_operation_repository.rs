//! `MeteredOperationRepository` over a vector guarded by an async mutex.
//!
//! `reserve` counts and inserts under one lock acquisition, which gives the
//! same no-over-admission guarantee as the PostgreSQL advisory lock.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::ports::{
    HistoryPage, HistoryQuery, MeteredOperationRepository, OperationPersistenceError,
    ReservationOutcome,
};
use crate::domain::{
    MeteredOperationRecord, NewMeteredOperation, OperationId, OperationKind, OperationStatus,
    QuotaPeriod, UserId,
};

#[derive(Default)]
pub struct InMemoryMeteredOperationRepository {
    records: Mutex<Vec<MeteredOperationRecord>>,
}

impl InMemoryMeteredOperationRepository {
    /// Snapshot of every stored record, oldest first.
    pub async fn records(&self) -> Vec<MeteredOperationRecord> {
        self.records.lock().await.clone()
    }

    /// Store a record as-is, bypassing admission.
    pub async fn seed(&self, record: MeteredOperationRecord) {
        self.records.lock().await.push(record);
    }
}

fn count(
    records: &[MeteredOperationRecord],
    user_id: &UserId,
    kind: OperationKind,
    period: &QuotaPeriod,
) -> u32 {
    let matching = records
        .iter()
        .filter(|record| {
            &record.user_id == user_id && record.kind == kind && period.contains(record.created_at)
        })
        .count();
    u32::try_from(matching).unwrap_or(u32::MAX)
}

#[async_trait]
impl MeteredOperationRepository for InMemoryMeteredOperationRepository {
    async fn count_in_period(
        &self,
        user_id: &UserId,
        kind: OperationKind,
        period: &QuotaPeriod,
    ) -> Result<u32, OperationPersistenceError> {
        Ok(count(&self.records.lock().await, user_id, kind, period))
    }

    async fn reserve(
        &self,
        operation: &NewMeteredOperation,
        period: &QuotaPeriod,
        limit: u32,
    ) -> Result<ReservationOutcome, OperationPersistenceError> {
        let mut records = self.records.lock().await;
        let usage = count(&records, &operation.user_id, operation.kind, period);
        if usage >= limit {
            return Ok(ReservationOutcome::Exhausted { usage });
        }
        records.push(MeteredOperationRecord::from(operation.clone()));
        Ok(ReservationOutcome::Reserved { usage: usage + 1 })
    }

    async fn insert(
        &self,
        operation: &NewMeteredOperation,
    ) -> Result<(), OperationPersistenceError> {
        self.records
            .lock()
            .await
            .push(MeteredOperationRecord::from(operation.clone()));
        Ok(())
    }

    async fn complete(
        &self,
        id: &OperationId,
        result: &Value,
    ) -> Result<(), OperationPersistenceError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| OperationPersistenceError::query(format!("operation {id} not found")))?;
        record.status = OperationStatus::Completed;
        record.result = Some(result.clone());
        Ok(())
    }

    async fn history(
        &self,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, OperationPersistenceError> {
        let records = self.records.lock().await;
        let mut owned: Vec<&MeteredOperationRecord> = records
            .iter()
            .filter(|record| {
                record.user_id == query.user_id && query.kind.is_none_or(|kind| kind == record.kind)
            })
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = u64::try_from(owned.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let page = owned
            .into_iter()
            .skip(offset)
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(HistoryPage {
            records: page,
            total,
        })
    }
}
