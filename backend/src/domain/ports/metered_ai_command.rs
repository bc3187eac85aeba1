//! Driving port for AI-assisted operations.

use async_trait::async_trait;

use crate::domain::{
    DiagnosisRequest, DiagnosisResult, DrugAnalysisRequest, DrugAnalysisResult, Error,
    FractureFinding, FractureRequest, OperationId, User,
};

/// Result of a metered operation with the caller's updated usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeteredOutcome<T> {
    pub operation_id: OperationId,
    pub result: T,
    /// Operations of this kind recorded in the current period.
    pub usage_count: u32,
    /// `None` for unlimited tiers.
    pub limit: Option<u32>,
}

#[async_trait]
pub trait MeteredAiCommand: Send + Sync {
    /// Produce a preliminary diagnosis, counted against the diagnosis quota.
    async fn diagnose(
        &self,
        user: &User,
        request: DiagnosisRequest,
    ) -> Result<MeteredOutcome<DiagnosisResult>, Error>;

    /// Describe a medication, counted against the drug-analysis quota.
    async fn analyse_drug(
        &self,
        user: &User,
        request: DrugAnalysisRequest,
    ) -> Result<MeteredOutcome<DrugAnalysisResult>, Error>;

    /// Screen a radiograph. Role-gated but neither metered nor recorded.
    async fn detect_fracture(
        &self,
        user: &User,
        request: FractureRequest,
    ) -> Result<FractureFinding, Error>;
}
