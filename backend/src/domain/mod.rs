//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed entities and use-cases behind metered
//! access to AI operations. Types here know nothing about HTTP or SQL; the
//! adapters in `inbound` and `outbound` translate at the edges.
//!
//! Public surface:
//! - Error / ErrorCode — transport-agnostic failure payload.
//! - User / Role / MembershipTier — the resolved caller.
//! - AccessDenial / RoleGate — the refusal taxonomy and role allow-lists.
//! - QuotaPeriod / QuotaPolicy — calendar-month allowances by tier.
//! - MeteredAiService, UsageService, MembershipService, BearerIdentityVerifier
//!   — implementations of the driving ports in [`ports`].

pub mod access;
pub mod ai_fallback;
pub(crate) mod ai_prompts;
pub mod ai_requests;
pub mod ai_results;
pub mod error;
mod identity_service;
mod membership_service;
mod metered_ai_service;
pub mod metered_operation;
mod persistence_error_mapping;
pub mod ports;
pub mod quota;
pub mod trace_id;
mod usage_counter;
mod usage_service;
pub mod user;

pub use self::access::{ADMIN_ROLES, AI_ROLES, AccessDenial, RoleGate};
pub use self::ai_fallback::{
    FallbackReason, fracture_unavailable, heuristic_diagnosis, local_drug_analysis,
    parse_symptoms,
};
pub use self::ai_requests::{
    AiRequestValidationError, DiagnosisRequest, DrugAnalysisRequest, FractureRequest,
};
pub use self::ai_results::{
    DiagnosisResult, DrugAnalysisResult, FractureFinding, ResultSource, Severity,
    parse_diagnosis, parse_drug_analysis, parse_fracture,
};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identity_service::BearerIdentityVerifier;
pub use self::membership_service::MembershipService;
pub use self::metered_ai_service::MeteredAiService;
pub use self::metered_operation::{
    MeteredOperationRecord, NewMeteredOperation, OperationId, OperationKind, OperationStatus,
    UnknownOperationValue,
};
pub use self::quota::{
    DEFAULT_FREE_TIER_LIMIT, QuotaDecision, QuotaPeriod, QuotaPolicy, UsageLimit,
};
pub use self::trace_id::TraceId;
pub use self::usage_counter::UsageCounter;
pub use self::usage_service::UsageService;
pub use self::user::{MembershipTier, Role, User, UserBuilder, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use careline::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
