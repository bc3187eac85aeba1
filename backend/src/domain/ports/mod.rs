//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, `*Source`, `*Codec`) are implemented by
//! outbound adapters and carry typed errors. Driving ports (`*Verifier`,
//! `*Command`, `*Query`) are called by inbound adapters and return the
//! transport-agnostic domain [`Error`](crate::domain::Error).

mod macros;
pub(crate) use macros::define_port_error;

mod access_token_codec;
mod ai_completion_source;
mod identity_verifier;
mod membership_command;
mod metered_ai_command;
mod metered_operation_repository;
mod usage_query;
mod user_repository;

#[cfg(test)]
pub use access_token_codec::MockAccessTokenCodec;
pub use access_token_codec::{AccessClaims, AccessTokenCodec, AccessTokenError};
#[cfg(test)]
pub use ai_completion_source::MockAiCompletionSource;
pub use ai_completion_source::{
    AiCompletionError, AiCompletionSource, CompletionRequest, UnconfiguredAiSource,
};
pub use identity_verifier::IdentityVerifier;
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use membership_command::MembershipCommand;
pub use metered_ai_command::{MeteredAiCommand, MeteredOutcome};
#[cfg(test)]
pub use metered_operation_repository::MockMeteredOperationRepository;
pub use metered_operation_repository::{
    HistoryPage, HistoryQuery, MeteredOperationRepository, OperationPersistenceError,
    ReservationOutcome,
};
pub use usage_query::{
    DEFAULT_HISTORY_LIMIT, HistoryListing, HistoryRequest, KindUsage, MAX_HISTORY_LIMIT,
    UsageQuery, UsageStats,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
