//! Driving port for reading a user's own usage and history.

use async_trait::async_trait;

use crate::domain::{Error, MembershipTier, MeteredOperationRecord, OperationKind, User};

/// Usage of one operation kind in the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindUsage {
    pub used: u32,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
}

/// Per-kind usage for the current calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageStats {
    pub membership: MembershipTier,
    /// `YYYY-MM`.
    pub current_month: String,
    pub diagnosis: KindUsage,
    pub drug_analysis: KindUsage,
}

/// Default page size for history listings.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
/// Largest accepted page size.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Raw paging request; normalised by [`HistoryRequest::normalised`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryRequest {
    pub kind: Option<OperationKind>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl HistoryRequest {
    /// Page defaults to 1; limit defaults to 10 and is clamped to `1..=100`.
    ///
    /// # Examples
    /// ```
    /// use careline::domain::ports::HistoryRequest;
    ///
    /// let request = HistoryRequest { kind: None, page: Some(0), limit: Some(500) };
    /// assert_eq!(request.normalised(), (1, 100));
    /// ```
    #[must_use]
    pub fn normalised(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        (page, limit)
    }
}

/// One page of the caller's history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryListing {
    pub records: Vec<MeteredOperationRecord>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[async_trait]
pub trait UsageQuery: Send + Sync {
    /// Current-month usage per operation kind.
    async fn usage_stats(&self, user: &User) -> Result<UsageStats, Error>;

    /// The caller's records, newest first.
    async fn history(&self, user: &User, request: HistoryRequest)
    -> Result<HistoryListing, Error>;
}
