//! Metered AI operations: role gate, quota admission, execution, recording.
//!
//! Admission for capped tiers is reserve-then-confirm. A snapshot count gives
//! the fast-path denial; the store's atomic `reserve` then inserts a pending
//! record only while the period allowance is not spent, so concurrent requests
//! cannot over-admit. The AI call runs after admission and degrades to a local
//! result instead of failing. Storing the result afterwards is best-effort:
//! the caller still receives the result when that write fails.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use tracing::{error, warn};

use crate::domain::persistence_error_mapping::map_operation_store_error;
use crate::domain::ports::{
    AiCompletionError, AiCompletionSource, CompletionRequest, MeteredAiCommand,
    MeteredOperationRepository, MeteredOutcome, ReservationOutcome,
};
use crate::domain::{
    AI_ROLES, AccessDenial, DiagnosisRequest, DiagnosisResult, DrugAnalysisRequest,
    DrugAnalysisResult, Error, FallbackReason, FractureFinding, FractureRequest,
    NewMeteredOperation, OperationId, OperationKind, QuotaPeriod, QuotaPolicy, ResultSource,
    UsageCounter, UsageLimit, User, ai_prompts, fracture_unavailable, heuristic_diagnosis,
    local_drug_analysis, parse_diagnosis, parse_drug_analysis, parse_fracture,
};

/// Admitted operation awaiting execution.
struct Admission {
    record: NewMeteredOperation,
    period: QuotaPeriod,
    limit: UsageLimit,
    /// Whether a record was actually written at admission.
    recorded: bool,
    /// Usage including this operation as observed at admission.
    usage_at_admission: u32,
}

/// Service implementing [`MeteredAiCommand`].
#[derive(Clone)]
pub struct MeteredAiService<R, A> {
    operations: Arc<R>,
    ai: Arc<A>,
    counter: UsageCounter<R>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl<R, A> MeteredAiService<R, A>
where
    R: MeteredOperationRepository,
    A: AiCompletionSource,
{
    pub fn new(operations: Arc<R>, ai: Arc<A>, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            counter: UsageCounter::new(Arc::clone(&operations)),
            operations,
            ai,
            policy,
            clock,
        }
    }

    async fn admit(
        &self,
        user: &User,
        kind: OperationKind,
        request: serde_json::Value,
    ) -> Result<Admission, Error> {
        AI_ROLES.check(user)?;

        let now = self.clock.utc();
        let period = QuotaPeriod::containing(now)?;
        let limit = self.policy.limit_for(user);
        let record = NewMeteredOperation {
            id: OperationId::random(),
            user_id: user.id().clone(),
            kind,
            request,
            created_at: now,
        };

        match limit {
            UsageLimit::Capped(cap) => {
                let usage = self.counter.count_in(user.id(), kind, &period).await?;
                self.policy.decide(limit, usage).into_result()?;
                let outcome = self
                    .operations
                    .reserve(&record, &period, cap)
                    .await
                    .map_err(map_operation_store_error)?;
                match outcome {
                    ReservationOutcome::Reserved { usage } => Ok(Admission {
                        record,
                        period,
                        limit,
                        recorded: true,
                        usage_at_admission: usage,
                    }),
                    ReservationOutcome::Exhausted { usage } => {
                        Err(AccessDenial::QuotaExceeded { usage, limit: cap }.into())
                    }
                }
            }
            UsageLimit::Unlimited => {
                let recorded = match self.operations.insert(&record).await {
                    Ok(()) => true,
                    Err(err) => {
                        error!(
                            user_id = %user.id(),
                            kind = %kind,
                            error = %err,
                            "operation record not stored"
                        );
                        false
                    }
                };
                Ok(Admission {
                    record,
                    period,
                    limit,
                    recorded,
                    // Uncounted tiers know only that their own record exists.
                    usage_at_admission: u32::from(recorded),
                })
            }
        }
    }

    async fn confirm<T>(&self, admission: Admission, result: T) -> MeteredOutcome<T>
    where
        T: Serialize + Send,
    {
        let Admission {
            record,
            period,
            limit,
            recorded,
            usage_at_admission,
        } = admission;

        if recorded {
            match serde_json::to_value(&result) {
                Ok(value) => {
                    if let Err(err) = self.operations.complete(&record.id, &value).await {
                        error!(
                            user_id = %record.user_id,
                            kind = %record.kind,
                            operation_id = %record.id,
                            error = %err,
                            "operation result not stored"
                        );
                    }
                }
                Err(err) => error!(
                    operation_id = %record.id,
                    error = %err,
                    "operation result not serialisable"
                ),
            }
        }

        let usage_count = match self
            .counter
            .count_in(&record.user_id, record.kind, &period)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    user_id = %record.user_id,
                    kind = %record.kind,
                    error = %err,
                    "post-operation usage count failed; reporting admission count"
                );
                usage_at_admission
            }
        };

        MeteredOutcome {
            operation_id: record.id,
            result,
            usage_count,
            limit: limit.as_option(),
        }
    }

    /// Ask the provider, returning the fallback reason on failure.
    async fn complete_or_degrade(
        &self,
        user: &User,
        operation: &'static str,
        request: CompletionRequest,
    ) -> Result<String, FallbackReason> {
        match self.ai.complete(&request).await {
            Ok(text) => Ok(text),
            Err(AiCompletionError::Unconfigured) => Err(FallbackReason::Unconfigured),
            Err(err) => {
                warn!(
                    user_id = %user.id(),
                    operation,
                    error = %err,
                    "AI provider degraded; using local fallback"
                );
                Err(FallbackReason::UpstreamError)
            }
        }
    }

    fn note_unparseable(user: &User, operation: &'static str, source: ResultSource) {
        if source == ResultSource::FallbackUnparseable {
            warn!(
                user_id = %user.id(),
                operation,
                "AI provider returned no structured result"
            );
        }
    }

    async fn run_diagnosis(&self, user: &User, request: &DiagnosisRequest) -> DiagnosisResult {
        let completion = CompletionRequest {
            prompt: ai_prompts::diagnosis_prompt(
                request.input_text(),
                request.input_image().is_some(),
            ),
            image_url: request.input_image().map(str::to_owned),
        };
        let operation = OperationKind::Diagnosis.as_str();
        match self.complete_or_degrade(user, operation, completion).await {
            Ok(text) => {
                let result = parse_diagnosis(&text, &request.symptoms());
                Self::note_unparseable(user, operation, result.source);
                result
            }
            Err(reason) => heuristic_diagnosis(request.input_text(), reason),
        }
    }

    async fn run_drug_analysis(
        &self,
        user: &User,
        request: &DrugAnalysisRequest,
    ) -> DrugAnalysisResult {
        let completion = CompletionRequest {
            prompt: ai_prompts::drug_analysis_prompt(
                request.drug_name(),
                request.drug_image().is_some(),
            ),
            image_url: request.drug_image().map(str::to_owned),
        };
        let operation = OperationKind::DrugAnalysis.as_str();
        match self.complete_or_degrade(user, operation, completion).await {
            Ok(text) => {
                let result = parse_drug_analysis(&text, request.drug_name());
                Self::note_unparseable(user, operation, result.source);
                result
            }
            Err(reason) => local_drug_analysis(request.drug_name(), reason),
        }
    }
}

#[async_trait]
impl<R, A> MeteredAiCommand for MeteredAiService<R, A>
where
    R: MeteredOperationRepository + 'static,
    A: AiCompletionSource + 'static,
{
    async fn diagnose(
        &self,
        user: &User,
        request: DiagnosisRequest,
    ) -> Result<MeteredOutcome<DiagnosisResult>, Error> {
        let admission = self
            .admit(user, OperationKind::Diagnosis, request.to_record())
            .await?;
        let result = self.run_diagnosis(user, &request).await;
        Ok(self.confirm(admission, result).await)
    }

    async fn analyse_drug(
        &self,
        user: &User,
        request: DrugAnalysisRequest,
    ) -> Result<MeteredOutcome<DrugAnalysisResult>, Error> {
        let admission = self
            .admit(user, OperationKind::DrugAnalysis, request.to_record())
            .await?;
        let result = self.run_drug_analysis(user, &request).await;
        Ok(self.confirm(admission, result).await)
    }

    async fn detect_fracture(
        &self,
        user: &User,
        request: FractureRequest,
    ) -> Result<FractureFinding, Error> {
        AI_ROLES.check(user)?;
        let completion = CompletionRequest {
            prompt: ai_prompts::fracture_prompt(request.notes()),
            image_url: Some(request.image_url().to_owned()),
        };
        let finding = match self
            .complete_or_degrade(user, "fracture_detection", completion)
            .await
        {
            Ok(text) => parse_fracture(&text),
            Err(reason) => fracture_unavailable(reason),
        };
        Ok(finding)
    }
}

#[cfg(test)]
#[path = "metered_ai_service_tests.rs"]
mod tests;
