//! Validated payloads for AI-assisted operations.

use std::fmt;

use serde_json::{Value, json};
use url::Url;

use super::ai_fallback::parse_symptoms;

/// Maximum accepted length of free-text symptom input, in characters.
pub const INPUT_TEXT_MAX: usize = 5000;
/// Maximum accepted length of a drug name, in characters.
pub const DRUG_NAME_MAX: usize = 200;

/// Validation errors for AI request payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiRequestValidationError {
    EmptyInputText,
    InputTextTooLong { max: usize },
    MissingDrugSubject,
    DrugNameTooLong { max: usize },
    InvalidImageUrl { field: &'static str },
}

impl AiRequestValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyInputText | Self::InputTextTooLong { .. } => "input_text",
            Self::MissingDrugSubject | Self::DrugNameTooLong { .. } => "drug_name",
            Self::InvalidImageUrl { field } => field,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyInputText => "empty_input_text",
            Self::InputTextTooLong { .. } => "input_text_too_long",
            Self::MissingDrugSubject => "missing_drug_subject",
            Self::DrugNameTooLong { .. } => "drug_name_too_long",
            Self::InvalidImageUrl { .. } => "invalid_image_url",
        }
    }
}

impl fmt::Display for AiRequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInputText => write!(f, "input_text must not be empty"),
            Self::InputTextTooLong { max } => {
                write!(f, "input_text must be at most {max} characters")
            }
            Self::MissingDrugSubject => {
                write!(f, "either drug_name or drug_image must be provided")
            }
            Self::DrugNameTooLong { max } => {
                write!(f, "drug_name must be at most {max} characters")
            }
            Self::InvalidImageUrl { field } => write!(f, "{field} must be an http(s) URL"),
        }
    }
}

impl std::error::Error for AiRequestValidationError {}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

fn image_url(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, AiRequestValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };
    match Url::parse(&raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(raw)),
        _ => Err(AiRequestValidationError::InvalidImageUrl { field }),
    }
}

/// Free-text symptom description with an optional image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisRequest {
    input_text: String,
    input_image: Option<String>,
}

impl DiagnosisRequest {
    /// Validate raw request fields.
    ///
    /// # Examples
    /// ```
    /// use careline::domain::DiagnosisRequest;
    ///
    /// let request = DiagnosisRequest::try_new("fever, cough", None).expect("valid");
    /// assert_eq!(request.symptoms(), vec!["fever", "cough"]);
    /// assert!(DiagnosisRequest::try_new("   ", None).is_err());
    /// ```
    pub fn try_new(
        input_text: impl Into<String>,
        input_image: Option<String>,
    ) -> Result<Self, AiRequestValidationError> {
        let input_text = input_text.into().trim().to_owned();
        if input_text.is_empty() {
            return Err(AiRequestValidationError::EmptyInputText);
        }
        if input_text.chars().count() > INPUT_TEXT_MAX {
            return Err(AiRequestValidationError::InputTextTooLong { max: INPUT_TEXT_MAX });
        }
        Ok(Self {
            input_text,
            input_image: image_url(input_image, "input_image")?,
        })
    }

    #[must_use]
    pub fn input_text(&self) -> &str {
        self.input_text.as_str()
    }

    #[must_use]
    pub fn input_image(&self) -> Option<&str> {
        self.input_image.as_deref()
    }

    /// Comma-separated symptoms from the input text.
    #[must_use]
    pub fn symptoms(&self) -> Vec<String> {
        parse_symptoms(&self.input_text)
    }

    /// Payload stored alongside the operation record.
    #[must_use]
    pub fn to_record(&self) -> Value {
        json!({
            "input_text": self.input_text,
            "input_image": self.input_image,
        })
    }
}

/// Medication named directly or shown in an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugAnalysisRequest {
    drug_name: Option<String>,
    drug_image: Option<String>,
}

impl DrugAnalysisRequest {
    /// Validate raw request fields. At least one of the two must be present.
    pub fn try_new(
        drug_name: Option<String>,
        drug_image: Option<String>,
    ) -> Result<Self, AiRequestValidationError> {
        let drug_name = non_blank(drug_name);
        if drug_name
            .as_deref()
            .is_some_and(|name| name.chars().count() > DRUG_NAME_MAX)
        {
            return Err(AiRequestValidationError::DrugNameTooLong { max: DRUG_NAME_MAX });
        }
        let drug_image = image_url(drug_image, "drug_image")?;
        if drug_name.is_none() && drug_image.is_none() {
            return Err(AiRequestValidationError::MissingDrugSubject);
        }
        Ok(Self {
            drug_name,
            drug_image,
        })
    }

    /// Image-only analysis of a photographed tablet. The photo arrives as
    /// `input_image` and is required.
    pub fn from_tablet_image(input_image: Option<String>) -> Result<Self, AiRequestValidationError> {
        let drug_image = image_url(input_image, "input_image")?
            .ok_or(AiRequestValidationError::InvalidImageUrl { field: "input_image" })?;
        Ok(Self {
            drug_name: None,
            drug_image: Some(drug_image),
        })
    }

    #[must_use]
    pub fn drug_name(&self) -> Option<&str> {
        self.drug_name.as_deref()
    }

    #[must_use]
    pub fn drug_image(&self) -> Option<&str> {
        self.drug_image.as_deref()
    }

    /// Payload stored alongside the operation record.
    #[must_use]
    pub fn to_record(&self) -> Value {
        json!({
            "drug_name": self.drug_name,
            "drug_image": self.drug_image,
        })
    }
}

/// Radiograph to screen for fractures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractureRequest {
    image_url: String,
    notes: Option<String>,
}

impl FractureRequest {
    /// Validate raw request fields. The image is mandatory.
    pub fn try_new(
        image_url_raw: Option<String>,
        notes: Option<String>,
    ) -> Result<Self, AiRequestValidationError> {
        let image_url = image_url(image_url_raw, "input_image")?
            .ok_or(AiRequestValidationError::InvalidImageUrl { field: "input_image" })?;
        Ok(Self {
            image_url,
            notes: non_blank(notes),
        })
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image_url.as_str()
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn diagnosis_trims_input() {
        let request = DiagnosisRequest::try_new("  headache  ", None).expect("valid");
        assert_eq!(request.input_text(), "headache");
    }

    #[rstest]
    fn diagnosis_rejects_overlong_input() {
        let text = "a".repeat(INPUT_TEXT_MAX + 1);
        assert_eq!(
            DiagnosisRequest::try_new(text, None),
            Err(AiRequestValidationError::InputTextTooLong { max: INPUT_TEXT_MAX })
        );
    }

    #[rstest]
    #[case(Some("ftp://host/scan.png".to_owned()))]
    #[case(Some("not a url".to_owned()))]
    fn diagnosis_rejects_non_http_images(#[case] image: Option<String>) {
        let err = DiagnosisRequest::try_new("rash", image).expect_err("invalid image");
        assert_eq!(err.field(), "input_image");
    }

    #[rstest]
    #[case(None, None, false)]
    #[case(Some("  ".to_owned()), None, false)]
    #[case(Some("Ibuprofen".to_owned()), None, true)]
    #[case(None, Some("https://cdn.example.com/pill.jpg".to_owned()), true)]
    fn drug_analysis_needs_a_subject(
        #[case] name: Option<String>,
        #[case] image: Option<String>,
        #[case] valid: bool,
    ) {
        assert_eq!(DrugAnalysisRequest::try_new(name, image).is_ok(), valid);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("javascript:alert(1)".to_owned()))]
    fn tablet_photo_must_be_an_http_url(#[case] image: Option<String>) {
        let err = DrugAnalysisRequest::from_tablet_image(image).expect_err("invalid photo");
        assert_eq!(err.field(), "input_image");
    }

    #[rstest]
    fn tablet_photo_becomes_the_drug_image() {
        let request =
            DrugAnalysisRequest::from_tablet_image(Some("https://cdn.example.com/pill.jpg".to_owned()))
                .expect("valid photo");
        assert_eq!(request.drug_name(), None);
        assert_eq!(request.drug_image(), Some("https://cdn.example.com/pill.jpg"));
    }

    #[rstest]
    fn fracture_requires_image() {
        let err = FractureRequest::try_new(None, Some("fall".to_owned())).expect_err("no image");
        assert_eq!(err.code(), "invalid_image_url");
        assert_eq!(err.field(), "input_image");
    }
}
