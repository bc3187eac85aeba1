//! AI operation handlers.
//!
//! ```text
//! POST /api/v1/ai/diagnose        {"input_text":"fever, cough"}
//! POST /api/v1/ai/drug-analyze    {"drug_name":"Ibuprofen"}
//! POST /api/v1/ai/detect-fracture  {"input_image":"https://..."}
//! POST /api/v1/ai/detect-tablet    {"input_image":"https://..."}
//! GET  /api/v1/ai/usage-stats
//! GET  /api/v1/ai/history?type=diagnosis&page=1&limit=10
//! ```
//!
//! Request bodies keep the snake_case field names clients already send;
//! response envelopes are camelCase. Every route here sits behind the
//! per-client request rate limit.

use actix_web::http::header::CACHE_CONTROL;
use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{HistoryListing, HistoryRequest, KindUsage, UsageStats};
use crate::domain::{
    DiagnosisRequest, DiagnosisResult, DrugAnalysisRequest, DrugAnalysisResult, FractureFinding,
    FractureRequest, MeteredOperationRecord,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{Envelope, PRIVATE_NO_CACHE};
use crate::inbound::http::schemas::{
    DiagnosisResultSchema, DrugAnalysisResultSchema, FailureSchema, FractureFindingSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_operation_kind;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DiagnosisBody {
    /// Free-text symptoms, comma separated. At most 5000 characters.
    #[schema(example = "fever, cough")]
    pub input_text: Option<String>,
    /// Optional http(s) URL of a supporting photo.
    pub input_image: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DrugAnalysisBody {
    #[schema(example = "Ibuprofen")]
    pub drug_name: Option<String>,
    /// http(s) URL of a packaging or tablet photo.
    pub drug_image: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct FractureBody {
    /// http(s) URL of the radiograph.
    pub input_image: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TabletBody {
    /// http(s) URL of the tablet photo.
    pub input_image: Option<String>,
}

/// `data` of a successful diagnosis.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisData {
    #[schema(value_type = DiagnosisResultSchema)]
    pub diagnosis: DiagnosisResult,
    pub diagnosis_id: Uuid,
    /// Diagnoses recorded this month, including this one.
    pub usage_count: u32,
    /// Monthly allowance; `null` for unlimited tiers.
    pub limit: Option<u32>,
}

/// `data` of a successful drug analysis.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugAnalysisData {
    #[schema(value_type = DrugAnalysisResultSchema)]
    pub analysis: DrugAnalysisResult,
    pub analysis_id: Uuid,
    pub usage_count: u32,
    pub limit: Option<u32>,
}

/// A per-kind counter triple.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KindCounts {
    pub diagnosis: u32,
    pub drug_analysis: u32,
}

/// `data` of `GET /ai/usage-stats`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    #[schema(example = "free")]
    pub membership_type: String,
    #[schema(example = "2025-04")]
    pub current_month: String,
    pub usage: KindCounts,
    /// `null` for unlimited tiers.
    pub limits: Option<KindCounts>,
    /// `null` for unlimited tiers.
    pub remaining: Option<KindCounts>,
}

fn both(diagnosis: Option<u32>, drug_analysis: Option<u32>) -> Option<KindCounts> {
    Some(KindCounts {
        diagnosis: diagnosis?,
        drug_analysis: drug_analysis?,
    })
}

impl From<UsageStats> for UsageData {
    fn from(stats: UsageStats) -> Self {
        let UsageStats {
            membership,
            current_month,
            diagnosis,
            drug_analysis,
        } = stats;
        let KindUsage {
            used: diagnosis_used,
            limit: diagnosis_limit,
            remaining: diagnosis_remaining,
        } = diagnosis;
        Self {
            membership_type: membership.as_str().to_owned(),
            current_month,
            usage: KindCounts {
                diagnosis: diagnosis_used,
                drug_analysis: drug_analysis.used,
            },
            limits: both(diagnosis_limit, drug_analysis.limit),
            remaining: both(diagnosis_remaining, drug_analysis.remaining),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// `diagnosis` or `drug_analysis`; omit for both.
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, clamped to `1..=100`.
    pub limit: Option<u32>,
}

/// One stored operation in the caller's history.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    #[schema(example = "diagnosis")]
    pub kind: String,
    #[schema(example = "completed")]
    pub status: String,
    pub request: Value,
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<MeteredOperationRecord> for HistoryItem {
    fn from(record: MeteredOperationRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            kind: record.kind.as_str().to_owned(),
            status: record.status.as_str().to_owned(),
            request: record.request,
            result: record.result,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// History envelope; pagination sits beside `data`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<HistoryItem>,
    pub pagination: Pagination,
}

impl From<HistoryListing> for HistoryResponse {
    fn from(listing: HistoryListing) -> Self {
        let HistoryListing {
            records,
            page,
            limit,
            total,
        } = listing;
        Self {
            success: true,
            message: "AI service history retrieved successfully".to_owned(),
            data: records.into_iter().map(HistoryItem::from).collect(),
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(u64::from(limit.max(1))),
            },
        }
    }
}

/// Generate a preliminary diagnosis from free-text symptoms.
///
/// Counted against the monthly diagnosis allowance. When the AI provider is
/// unavailable the response still succeeds with a local heuristic result.
#[utoipa::path(
    post,
    path = "/api/v1/ai/diagnose",
    request_body = DiagnosisBody,
    responses(
        (status = 200, description = "Diagnosis generated", body = DiagnosisData),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Role not permitted", body = FailureSchema),
        (status = 429, description = "Monthly allowance spent", body = FailureSchema),
        (status = 503, description = "Usage store unavailable", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "createDiagnosis"
)]
#[post("/diagnose")]
pub async fn create_diagnosis(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<DiagnosisBody>,
) -> ApiResult<HttpResponse> {
    let DiagnosisBody {
        input_text,
        input_image,
    } = payload.into_inner();
    let request = DiagnosisRequest::try_new(input_text.unwrap_or_default(), input_image)?;
    let outcome = state.metered_ai.diagnose(&user, request).await?;
    let data = DiagnosisData {
        diagnosis: outcome.result,
        diagnosis_id: *outcome.operation_id.as_uuid(),
        usage_count: outcome.usage_count,
        limit: outcome.limit,
    };
    Ok(Envelope::ok("Diagnosis generated successfully", data).into_response())
}

/// Describe a medication by name or photo.
#[utoipa::path(
    post,
    path = "/api/v1/ai/drug-analyze",
    request_body = DrugAnalysisBody,
    responses(
        (status = 200, description = "Drug analysed", body = DrugAnalysisData),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Role not permitted", body = FailureSchema),
        (status = 429, description = "Monthly allowance spent", body = FailureSchema),
        (status = 503, description = "Usage store unavailable", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "createDrugAnalysis"
)]
#[post("/drug-analyze")]
pub async fn create_drug_analysis(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<DrugAnalysisBody>,
) -> ApiResult<HttpResponse> {
    let DrugAnalysisBody {
        drug_name,
        drug_image,
    } = payload.into_inner();
    let request = DrugAnalysisRequest::try_new(drug_name, drug_image)?;
    let outcome = state.metered_ai.analyse_drug(&user, request).await?;
    let data = DrugAnalysisData {
        analysis: outcome.result,
        analysis_id: *outcome.operation_id.as_uuid(),
        usage_count: outcome.usage_count,
        limit: outcome.limit,
    };
    Ok(Envelope::ok("Drug analysis completed successfully", data).into_response())
}

/// Identify a tablet from a photo.
///
/// Runs a drug analysis on the image alone and counts against the monthly
/// drug-analysis allowance.
#[utoipa::path(
    post,
    path = "/api/v1/ai/detect-tablet",
    request_body = TabletBody,
    responses(
        (status = 200, description = "Tablet analysed", body = DrugAnalysisData),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Role not permitted", body = FailureSchema),
        (status = 429, description = "Monthly allowance spent", body = FailureSchema),
        (status = 503, description = "Usage store unavailable", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "detectTablet"
)]
#[post("/detect-tablet")]
pub async fn detect_tablet(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<TabletBody>,
) -> ApiResult<HttpResponse> {
    let request = DrugAnalysisRequest::from_tablet_image(payload.into_inner().input_image)?;
    let outcome = state.metered_ai.analyse_drug(&user, request).await?;
    let data = DrugAnalysisData {
        analysis: outcome.result,
        analysis_id: *outcome.operation_id.as_uuid(),
        usage_count: outcome.usage_count,
        limit: outcome.limit,
    };
    Ok(Envelope::ok("Tablet analysis completed successfully", data).into_response())
}

/// Screen a radiograph for fractures. Not metered.
#[utoipa::path(
    post,
    path = "/api/v1/ai/detect-fracture",
    request_body = FractureBody,
    responses(
        (status = 200, description = "Screening finished", body = FractureFindingSchema),
        (status = 400, description = "Invalid request", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 403, description = "Role not permitted", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "detectFracture"
)]
#[post("/detect-fracture")]
pub async fn detect_fracture(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<FractureBody>,
) -> ApiResult<HttpResponse> {
    let FractureBody { input_image, notes } = payload.into_inner();
    let request = FractureRequest::try_new(input_image, notes)?;
    let finding: FractureFinding = state.metered_ai.detect_fracture(&user, request).await?;
    Ok(Envelope::ok("Fracture screening completed", finding).into_response())
}

/// Current-month usage, allowance, and remaining operations per kind.
#[utoipa::path(
    get,
    path = "/api/v1/ai/usage-stats",
    responses(
        (status = 200, description = "Usage statistics", body = UsageData),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema),
        (status = 503, description = "Usage store unavailable", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "getUsage"
)]
#[get("/usage-stats")]
pub async fn get_usage(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let stats = state.usage.usage_stats(&user).await?;
    Ok(Envelope::ok(
        "Usage statistics retrieved successfully",
        UsageData::from(stats),
    )
    .into_response())
}

/// The caller's own operations, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/ai/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "History page", body = HistoryResponse),
        (status = 400, description = "Invalid filter", body = FailureSchema),
        (status = 401, description = "Missing or invalid credential", body = FailureSchema)
    ),
    tags = ["ai"],
    operation_id = "getHistory"
)]
#[get("/history")]
pub async fn get_history(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<HistoryParams>,
) -> ApiResult<HttpResponse> {
    let HistoryParams { kind, page, limit } = params.into_inner();
    let request = HistoryRequest {
        kind: parse_operation_kind(kind.as_deref(), "type")?,
        page,
        limit,
    };
    let listing = state.usage.history(&user, request).await?;
    Ok(HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, PRIVATE_NO_CACHE))
        .json(HistoryResponse::from(listing)))
}

#[cfg(test)]
#[path = "ai_tests.rs"]
mod tests;
