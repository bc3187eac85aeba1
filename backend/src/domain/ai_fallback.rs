//! Deterministic local results used when the AI provider is unavailable.

use super::ai_results::{
    DiagnosisResult, DrugAnalysisResult, FractureFinding, GENERAL_CONDITION, ResultSource,
    Severity,
};

/// Why the local fallback was used instead of a live completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No provider credentials are configured.
    Unconfigured,
    /// The provider failed, timed out, or refused the request.
    UpstreamError,
}

impl FallbackReason {
    const fn source(self) -> ResultSource {
        match self {
            Self::Unconfigured => ResultSource::FallbackUnconfigured,
            Self::UpstreamError => ResultSource::FallbackUpstreamError,
        }
    }
}

/// Split free-text symptom input on commas, trimming and dropping blanks.
///
/// # Examples
/// ```
/// use careline::domain::parse_symptoms;
///
/// assert_eq!(parse_symptoms(" fever, ,cough "), vec!["fever", "cough"]);
/// ```
#[must_use]
pub fn parse_symptoms(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|symptom| !symptom.is_empty())
        .map(str::to_owned)
        .collect()
}

fn heuristic_condition(text: &str) -> &'static str {
    let has = |needle: &str| text.contains(needle);
    if has("fever") && has("cough") {
        "Viral Upper Respiratory Infection"
    } else if has("chest") && has("pain") {
        "Possible Costochondritis"
    } else if has("headache") {
        "Tension Headache"
    } else if has("rash") {
        "Dermatitis"
    } else {
        GENERAL_CONDITION
    }
}

fn heuristic_recommendations(text: &str) -> Vec<String> {
    let mut recommendations = vec![
        "Hydrate adequately and rest".to_owned(),
        "Monitor symptoms for 24–48 hours".to_owned(),
        "Use OTC analgesics if appropriate".to_owned(),
    ];
    if text.contains("fever") {
        recommendations.push("Use antipyretics such as paracetamol".to_owned());
    }
    if text.contains("cough") {
        recommendations.push("Use warm fluids and throat lozenges".to_owned());
    }
    recommendations
}

/// Keyword-matched preliminary diagnosis.
#[must_use]
pub fn heuristic_diagnosis(input_text: &str, reason: FallbackReason) -> DiagnosisResult {
    let text = input_text.to_lowercase();
    let (confidence_level, severity, description, when_to_consult) = match reason {
        FallbackReason::Unconfigured => (
            70,
            Severity::Mild,
            "Preliminary, non-AI fallback based on provided symptoms. Configure an AI \
             provider key for live analysis.",
            "Consult a doctor if symptoms worsen or persist beyond 48 hours.",
        ),
        FallbackReason::UpstreamError => (
            60,
            Severity::Moderate,
            "Temporary fallback due to an AI service error. Verify the AI provider \
             configuration.",
            "If symptoms worsen or persist, consult a doctor.",
        ),
    };

    DiagnosisResult {
        condition: heuristic_condition(&text).to_owned(),
        confidence_level,
        description: description.to_owned(),
        symptoms: parse_symptoms(input_text),
        recommendations: heuristic_recommendations(&text),
        severity,
        when_to_consult: when_to_consult.to_owned(),
        source: reason.source(),
    }
}

/// Reference-only medication record.
#[must_use]
pub fn local_drug_analysis(drug_name: Option<&str>, reason: FallbackReason) -> DrugAnalysisResult {
    let name = drug_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown Medication");
    DrugAnalysisResult {
        drug_name: name.to_owned(),
        generic_name: name.to_owned(),
        uses: vec!["Information for reference only".to_owned()],
        dosage: "Consult a healthcare professional for personalized dosage".to_owned(),
        side_effects: vec!["Nausea".to_owned(), "Headache".to_owned()],
        warnings: vec![
            "Read the label carefully".to_owned(),
            "Avoid overdose".to_owned(),
        ],
        interactions: vec!["May interact with blood thinners and NSAIDs".to_owned()],
        contraindications: vec!["Known allergy to components".to_owned()],
        source: reason.source(),
    }
}

/// Negative fracture finding explaining why no screen ran.
#[must_use]
pub fn fracture_unavailable(reason: FallbackReason) -> FractureFinding {
    let finding = match reason {
        FallbackReason::Unconfigured => {
            "Fracture detection unavailable (AI provider key not configured)."
        }
        FallbackReason::UpstreamError => "Fracture detection failed due to AI error.",
    };
    FractureFinding {
        fracture: false,
        finding: finding.to_owned(),
        source: reason.source(),
    }
}
