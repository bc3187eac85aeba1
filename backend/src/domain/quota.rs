//! Monthly quota period and tier-based allowance policy.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};

use super::{AccessDenial, Error, MembershipTier, Role, User};

/// Default monthly allowance per operation kind on the free tier.
pub const DEFAULT_FREE_TIER_LIMIT: u32 = 3;

/// Half-open UTC calendar month `[start, end)` in which usage is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QuotaPeriod {
    /// The calendar month containing `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use careline::domain::QuotaPeriod;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).single().expect("valid");
    /// let period = QuotaPeriod::containing(now).expect("period");
    /// assert_eq!(period.label(), "2024-12");
    /// let next = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid");
    /// assert_eq!(period.end(), next);
    /// ```
    pub fn containing(now: DateTime<Utc>) -> Result<Self, Error> {
        let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .ok_or_else(|| Error::internal("quota period start out of range"))?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| Error::internal("quota period end out of range"))?;
        Ok(Self {
            start: first.and_time(NaiveTime::MIN).and_utc(),
            end: next.and_time(NaiveTime::MIN).and_utc(),
        })
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `instant` falls inside the period.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// `YYYY-MM` label reported to clients.
    #[must_use]
    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

/// Allowance for one operation kind in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLimit {
    Unlimited,
    Capped(u32),
}

impl UsageLimit {
    /// `None` for unlimited tiers, matching the wire contract.
    #[must_use]
    pub const fn as_option(self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Capped(limit) => Some(limit),
        }
    }

    /// Operations left in the period, or `None` when unlimited.
    #[must_use]
    pub const fn remaining(self, usage: u32) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Capped(limit) => Some(limit.saturating_sub(usage)),
        }
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny { usage: u32, limit: u32 },
}

impl QuotaDecision {
    /// Convert a refusal into the matching access denial.
    pub fn into_result(self) -> Result<(), AccessDenial> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { usage, limit } => Err(AccessDenial::QuotaExceeded { usage, limit }),
        }
    }
}

/// Tier-based policy: administrators and premium members are unlimited, free
/// members get a fixed monthly allowance per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    free_tier_limit: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_TIER_LIMIT)
    }
}

impl QuotaPolicy {
    #[must_use]
    pub const fn new(free_tier_limit: u32) -> Self {
        Self { free_tier_limit }
    }

    /// Allowance applying to `user`.
    #[must_use]
    pub fn limit_for(&self, user: &User) -> UsageLimit {
        match (user.role(), user.membership()) {
            (Role::Admin, _) | (_, MembershipTier::Premium) => UsageLimit::Unlimited,
            (_, MembershipTier::Free) => UsageLimit::Capped(self.free_tier_limit),
        }
    }

    /// Decide whether one more operation may start given current `usage`.
    #[must_use]
    pub fn decide(&self, limit: UsageLimit, usage: u32) -> QuotaDecision {
        match limit {
            UsageLimit::Unlimited => QuotaDecision::Allow,
            UsageLimit::Capped(limit) if usage < limit => QuotaDecision::Allow,
            UsageLimit::Capped(limit) => QuotaDecision::Deny { usage, limit },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(at(2024, 2, 29, 12), at(2024, 2, 1, 0), at(2024, 3, 1, 0))]
    #[case(at(2023, 2, 28, 23), at(2023, 2, 1, 0), at(2023, 3, 1, 0))]
    #[case(at(2024, 4, 30, 8), at(2024, 4, 1, 0), at(2024, 5, 1, 0))]
    #[case(at(2024, 12, 15, 8), at(2024, 12, 1, 0), at(2025, 1, 1, 0))]
    fn period_spans_calendar_month(
        #[case] now: DateTime<Utc>,
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
    ) {
        let period = QuotaPeriod::containing(now).expect("period");
        assert_eq!(period.start(), start);
        assert_eq!(period.end(), end);
    }

    #[rstest]
    fn period_is_half_open() {
        let period = QuotaPeriod::containing(at(2024, 6, 10, 0)).expect("period");
        assert!(period.contains(at(2024, 6, 1, 0)));
        assert!(!period.contains(at(2024, 7, 1, 0)));
        assert!(!period.contains(at(2024, 5, 31, 23)));
    }

    #[rstest]
    #[case(Role::Admin, MembershipTier::Free, UsageLimit::Unlimited)]
    #[case(Role::Patient, MembershipTier::Premium, UsageLimit::Unlimited)]
    #[case(Role::Doctor, MembershipTier::Premium, UsageLimit::Unlimited)]
    #[case(Role::Patient, MembershipTier::Free, UsageLimit::Capped(3))]
    #[case(Role::Doctor, MembershipTier::Free, UsageLimit::Capped(3))]
    fn limit_follows_role_and_tier(
        #[case] role: Role,
        #[case] tier: MembershipTier,
        #[case] expected: UsageLimit,
    ) {
        let user = User::builder(UserId::random(), role).membership(tier).build();
        assert_eq!(QuotaPolicy::default().limit_for(&user), expected);
    }

    #[rstest]
    #[case(0, QuotaDecision::Allow)]
    #[case(2, QuotaDecision::Allow)]
    #[case(3, QuotaDecision::Deny { usage: 3, limit: 3 })]
    #[case(7, QuotaDecision::Deny { usage: 7, limit: 3 })]
    fn capped_limit_denies_at_threshold(#[case] usage: u32, #[case] expected: QuotaDecision) {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.decide(UsageLimit::Capped(3), usage), expected);
    }

    #[rstest]
    fn unlimited_never_denies() {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.decide(UsageLimit::Unlimited, u32::MAX), QuotaDecision::Allow);
    }

    #[rstest]
    fn remaining_saturates_at_zero() {
        assert_eq!(UsageLimit::Capped(3).remaining(5), Some(0));
        assert_eq!(UsageLimit::Unlimited.remaining(5), None);
    }
}
