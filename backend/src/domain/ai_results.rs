//! Strict result schemas for AI-assisted operations and the lenient parser
//! that fills them from semi-structured completions.
//!
//! Completions are untrusted text that may or may not embed a JSON object.
//! Parsing takes the span from the first `{` to the last `}`, reads each field
//! independently, and substitutes a default for anything missing or
//! ill-typed. A caller always receives a fully populated result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Parsed from a live completion.
    Ai,
    /// Local heuristic because no provider is configured.
    FallbackUnconfigured,
    /// Local heuristic because the provider failed or timed out.
    FallbackUpstreamError,
    /// The provider answered with text that held no JSON object.
    FallbackUnparseable,
}

/// Clinical severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mild" | "low" => Some(Self::Mild),
            "moderate" | "medium" => Some(Self::Moderate),
            "severe" | "high" | "critical" => Some(Self::Severe),
            _ => None,
        }
    }
}

/// Preliminary diagnosis returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub condition: String,
    /// Percentage in `0..=100`.
    pub confidence_level: u8,
    pub description: String,
    pub symptoms: Vec<String>,
    pub recommendations: Vec<String>,
    pub severity: Severity,
    pub when_to_consult: String,
    pub source: ResultSource,
}

/// Reference information about a medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugAnalysisResult {
    pub drug_name: String,
    pub generic_name: String,
    pub uses: Vec<String>,
    pub dosage: String,
    pub side_effects: Vec<String>,
    pub warnings: Vec<String>,
    pub interactions: Vec<String>,
    pub contraindications: Vec<String>,
    pub source: ResultSource,
}

/// Outcome of a radiograph fracture screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractureFinding {
    pub fracture: bool,
    pub finding: String,
    pub source: ResultSource,
}

pub(crate) const GENERAL_CONDITION: &str = "General Health Concern";
const DEFAULT_CONFIDENCE: u8 = 70;
const DEFAULT_WHEN_TO_CONSULT: &str = "If symptoms worsen or persist, consult a doctor.";
const UNKNOWN_MEDICATION: &str = "Unknown Medication";
const NOT_AVAILABLE: &str = "Information not available";

/// Return the slice from the first `{` to the last `}` when both exist.
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

fn extract_object(text: &str) -> Option<Map<String, Value>> {
    let span = json_object_span(text)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn list_field(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = match map.get(key)? {
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        Value::String(raw) if !raw.trim().is_empty() => vec![raw.trim().to_owned()],
        _ => Vec::new(),
    };
    (!items.is_empty()).then_some(items)
}

fn confidence_field(map: &Map<String, Value>, key: &str) -> Option<u8> {
    let raw = match map.get(key)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let clamped = raw.round().clamp(0.0, 100.0);
    // Clamped to 0..=100 above, so the cast is lossless.
    Some(clamped as u8)
}

fn bool_field(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// Parse a diagnosis completion. `symptoms` are the symptoms the caller
/// submitted and back-fill the field when the model omits it.
#[must_use]
pub fn parse_diagnosis(completion: &str, symptoms: &[String]) -> DiagnosisResult {
    let Some(map) = extract_object(completion) else {
        return unstructured_diagnosis(completion, symptoms);
    };

    DiagnosisResult {
        condition: text_field(&map, "condition").unwrap_or_else(|| GENERAL_CONDITION.to_owned()),
        confidence_level: confidence_field(&map, "confidence_level")
            .unwrap_or(DEFAULT_CONFIDENCE),
        description: text_field(&map, "description")
            .unwrap_or_else(|| "No description was provided.".to_owned()),
        symptoms: list_field(&map, "symptoms").unwrap_or_else(|| symptoms.to_vec()),
        recommendations: list_field(&map, "recommendations")
            .unwrap_or_else(|| owned(&UNSTRUCTURED_RECOMMENDATIONS)),
        severity: text_field(&map, "severity")
            .and_then(|raw| Severity::parse_lenient(&raw))
            .unwrap_or(Severity::Moderate),
        when_to_consult: text_field(&map, "when_to_consult")
            .unwrap_or_else(|| DEFAULT_WHEN_TO_CONSULT.to_owned()),
        source: ResultSource::Ai,
    }
}

const UNSTRUCTURED_RECOMMENDATIONS: [&str; 3] = [
    "Monitor symptoms closely",
    "Stay hydrated and get adequate rest",
    "Consult a healthcare provider if symptoms persist",
];

fn unstructured_diagnosis(completion: &str, symptoms: &[String]) -> DiagnosisResult {
    let text = completion.trim();
    DiagnosisResult {
        condition: GENERAL_CONDITION.to_owned(),
        confidence_level: DEFAULT_CONFIDENCE,
        description: if text.is_empty() {
            "The AI service returned an empty response.".to_owned()
        } else {
            text.to_owned()
        },
        symptoms: symptoms.to_vec(),
        recommendations: owned(&UNSTRUCTURED_RECOMMENDATIONS),
        severity: Severity::Moderate,
        when_to_consult: DEFAULT_WHEN_TO_CONSULT.to_owned(),
        source: ResultSource::FallbackUnparseable,
    }
}

/// Parse a drug-analysis completion. `requested_name` is what the caller
/// asked about, if they supplied a name rather than only an image.
#[must_use]
pub fn parse_drug_analysis(completion: &str, requested_name: Option<&str>) -> DrugAnalysisResult {
    let fallback_name = requested_name.unwrap_or(UNKNOWN_MEDICATION).to_owned();
    let Some(map) = extract_object(completion) else {
        return DrugAnalysisResult {
            drug_name: fallback_name,
            generic_name: "Not identified".to_owned(),
            uses: owned(&[NOT_AVAILABLE]),
            dosage: "Consult a healthcare professional".to_owned(),
            side_effects: owned(&[NOT_AVAILABLE]),
            warnings: owned(&["Consult a healthcare professional before use"]),
            interactions: owned(&[NOT_AVAILABLE]),
            contraindications: owned(&[NOT_AVAILABLE]),
            source: ResultSource::FallbackUnparseable,
        };
    };

    let list = |key: &str| list_field(&map, key).unwrap_or_else(|| owned(&[NOT_AVAILABLE]));
    DrugAnalysisResult {
        drug_name: text_field(&map, "drug_name").unwrap_or_else(|| fallback_name.clone()),
        generic_name: text_field(&map, "generic_name")
            .unwrap_or_else(|| "Not identified".to_owned()),
        uses: list("uses"),
        dosage: text_field(&map, "dosage")
            .unwrap_or_else(|| "Consult a healthcare professional".to_owned()),
        side_effects: list("side_effects"),
        warnings: list("warnings"),
        interactions: list("interactions"),
        contraindications: list("contraindications"),
        source: ResultSource::Ai,
    }
}

/// Parse a fracture-screen completion.
#[must_use]
pub fn parse_fracture(completion: &str) -> FractureFinding {
    match extract_object(completion) {
        Some(map) => FractureFinding {
            fracture: bool_field(&map, "fracture").unwrap_or(false),
            finding: text_field(&map, "finding")
                .unwrap_or_else(|| "No finding was provided.".to_owned()),
            source: ResultSource::Ai,
        },
        None => FractureFinding {
            fracture: false,
            finding: "Fracture detection returned an unreadable response.".to_owned(),
            source: ResultSource::FallbackUnparseable,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn symptoms() -> Vec<String> {
        vec!["fever".to_owned(), "cough".to_owned()]
    }

    #[rstest]
    fn reads_json_embedded_in_prose() {
        let completion = r#"Here is my assessment:
```json
{"condition": "Influenza", "confidence_level": 82, "description": "Seasonal flu",
 "symptoms": ["fever", "aches"], "recommendations": ["Rest"], "severity": "moderate",
 "when_to_consult": "If breathing becomes difficult"}
```
Stay well."#;

        let result = parse_diagnosis(completion, &symptoms());
        assert_eq!(result.condition, "Influenza");
        assert_eq!(result.confidence_level, 82);
        assert_eq!(result.symptoms, vec!["fever", "aches"]);
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.source, ResultSource::Ai);
    }

    #[rstest]
    fn fills_missing_and_ill_typed_fields() {
        let completion = r#"{"condition": "", "confidence_level": "250%", "symptoms": 4}"#;

        let result = parse_diagnosis(completion, &symptoms());
        assert_eq!(result.condition, GENERAL_CONDITION);
        assert_eq!(result.confidence_level, 100);
        assert_eq!(result.symptoms, symptoms());
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.source, ResultSource::Ai);
    }

    #[rstest]
    #[case("I think it is a cold.")]
    #[case("")]
    #[case("} backwards {")]
    #[case("{ not json }")]
    fn non_json_completion_yields_unstructured_result(#[case] completion: &str) {
        let result = parse_diagnosis(completion, &symptoms());
        assert_eq!(result.condition, GENERAL_CONDITION);
        assert_eq!(result.source, ResultSource::FallbackUnparseable);
        assert!(!result.description.is_empty());
    }

    #[rstest]
    fn negative_confidence_clamps_to_zero() {
        let result = parse_diagnosis(r#"{"confidence_level": -12.6}"#, &[]);
        assert_eq!(result.confidence_level, 0);
    }

    #[rstest]
    fn drug_analysis_keeps_requested_name_when_model_omits_it() {
        let result = parse_drug_analysis(r#"{"uses": ["Pain relief"]}"#, Some("Ibuprofen"));
        assert_eq!(result.drug_name, "Ibuprofen");
        assert_eq!(result.uses, vec!["Pain relief"]);
        assert_eq!(result.warnings, vec![NOT_AVAILABLE]);
    }

    #[rstest]
    fn drug_analysis_without_json_names_unknown_medication() {
        let result = parse_drug_analysis("no idea", None);
        assert_eq!(result.drug_name, UNKNOWN_MEDICATION);
        assert_eq!(result.source, ResultSource::FallbackUnparseable);
    }

    #[rstest]
    #[case(r#"{"fracture": true, "finding": "Distal radius fracture"}"#, true)]
    #[case(r#"{"fracture": "no", "finding": "Normal study"}"#, false)]
    fn fracture_flag_accepts_bool_or_word(#[case] completion: &str, #[case] expected: bool) {
        let finding = parse_fracture(completion);
        assert_eq!(finding.fracture, expected);
        assert_eq!(finding.source, ResultSource::Ai);
    }
}
