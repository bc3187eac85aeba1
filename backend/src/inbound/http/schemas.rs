//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their wire shape so `utoipa` can document them.

#![expect(
    dead_code,
    reason = "Schema mirrors are only read by utoipa during document generation"
)]

use utoipa::ToSchema;

/// Stable machine-readable error codes.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    /// The monthly allowance is spent; `data` holds `usageCount` and `limit`.
    #[schema(rename = "quota_exceeded")]
    QuotaExceeded,
    #[schema(rename = "rate_limited")]
    RateLimited,
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Failure envelope returned with every non-2xx JSON response.
#[derive(ToSchema)]
#[schema(as = Failure, rename_all = "camelCase")]
pub struct FailureSchema {
    /// Always `false`.
    success: bool,
    code: ErrorCodeSchema,
    #[schema(example = "Free usage limit exceeded. Please upgrade to premium for unlimited access.")]
    message: String,
    /// Structured context: the denial reason, the offending field, or quota usage.
    #[schema(example = json!({ "usageCount": 3, "limit": 3 }))]
    data: Option<serde_json::Value>,
    #[schema(example = "6f1c0b2e-8d4b-4b7a-9a57-3d0c1e5f2a10")]
    trace_id: Option<String>,
}

#[derive(ToSchema)]
#[schema(as = Severity)]
pub enum SeveritySchema {
    #[schema(rename = "mild")]
    Mild,
    #[schema(rename = "moderate")]
    Moderate,
    #[schema(rename = "severe")]
    Severe,
}

/// Whether a result is live or a local fallback, and why.
#[derive(ToSchema)]
#[schema(as = ResultSource)]
pub enum ResultSourceSchema {
    #[schema(rename = "ai")]
    Ai,
    #[schema(rename = "fallback_unconfigured")]
    FallbackUnconfigured,
    #[schema(rename = "fallback_upstream_error")]
    FallbackUpstreamError,
    #[schema(rename = "fallback_unparseable")]
    FallbackUnparseable,
}

#[derive(ToSchema)]
#[schema(as = DiagnosisResult)]
pub struct DiagnosisResultSchema {
    #[schema(example = "Viral Upper Respiratory Infection")]
    condition: String,
    #[schema(minimum = 0, maximum = 100, example = 70)]
    confidence_level: u8,
    description: String,
    symptoms: Vec<String>,
    recommendations: Vec<String>,
    severity: SeveritySchema,
    when_to_consult: String,
    source: ResultSourceSchema,
}

#[derive(ToSchema)]
#[schema(as = DrugAnalysisResult)]
pub struct DrugAnalysisResultSchema {
    #[schema(example = "Ibuprofen")]
    drug_name: String,
    generic_name: String,
    uses: Vec<String>,
    dosage: String,
    side_effects: Vec<String>,
    warnings: Vec<String>,
    interactions: Vec<String>,
    contraindications: Vec<String>,
    source: ResultSourceSchema,
}

#[derive(ToSchema)]
#[schema(as = FractureFinding)]
pub struct FractureFindingSchema {
    fracture: bool,
    finding: String,
    source: ResultSourceSchema,
}
