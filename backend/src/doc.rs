//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the schema mirrors from
//! [`crate::inbound::http::schemas`], and the bearer security scheme. The
//! document backs Swagger UI in debug builds and the `openapi-dump` binary.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::admin::{MembershipBody, VerificationBody};
use crate::inbound::http::ai::{
    DiagnosisBody, DiagnosisData, DrugAnalysisBody, DrugAnalysisData, FractureBody,
    HistoryItem, HistoryResponse, KindCounts, Pagination, TabletBody, UsageData,
};
use crate::inbound::http::schemas::{
    DiagnosisResultSchema, DrugAnalysisResultSchema, ErrorCodeSchema, FailureSchema,
    FractureFindingSchema, ResultSourceSchema, SeveritySchema,
};
use crate::inbound::http::users::UserProfile;

/// Adds the JWT bearer scheme referenced by the default security requirement.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("HS256 access token; see the issue-token binary."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Careline API",
        description = "Metered AI diagnosis and drug analysis with role and quota checks."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::users::current_user,
        crate::inbound::http::ai::create_diagnosis,
        crate::inbound::http::ai::create_drug_analysis,
        crate::inbound::http::ai::detect_fracture,
        crate::inbound::http::ai::detect_tablet,
        crate::inbound::http::ai::get_usage,
        crate::inbound::http::ai::get_history,
        crate::inbound::http::admin::update_membership,
        crate::inbound::http::admin::update_verification,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        FailureSchema,
        ErrorCodeSchema,
        DiagnosisResultSchema,
        DrugAnalysisResultSchema,
        FractureFindingSchema,
        SeveritySchema,
        ResultSourceSchema,
        DiagnosisBody,
        DiagnosisData,
        DrugAnalysisBody,
        DrugAnalysisData,
        FractureBody,
        TabletBody,
        UsageData,
        KindCounts,
        HistoryItem,
        HistoryResponse,
        Pagination,
        UserProfile,
        MembershipBody,
        VerificationBody,
    )),
    tags(
        (name = "ai", description = "Metered AI operations and usage"),
        (name = "users", description = "The authenticated caller"),
        (name = "admin", description = "Account administration"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/api/v1/ai/diagnose")]
    #[case("/api/v1/ai/drug-analyze")]
    #[case("/api/v1/ai/detect-fracture")]
    #[case("/api/v1/ai/detect-tablet")]
    #[case("/api/v1/ai/usage-stats")]
    #[case("/api/v1/ai/history")]
    #[case("/api/v1/users/me")]
    #[case("/api/v1/admin/users/{id}/membership")]
    #[case("/health/ready")]
    fn documents_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn registers_bearer_scheme_and_failure_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.schemas.contains_key("Failure"));
    }

    #[rstest]
    fn failure_schema_shows_quota_usage_example() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        let failure = components.schemas.get("Failure").expect("failure schema");
        let rendered = serde_json::to_string(failure).expect("serialises");
        assert!(rendered.contains("usageCount"), "{rendered}");
    }
}
