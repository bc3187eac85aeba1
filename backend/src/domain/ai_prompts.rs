//! Prompt templates sent to the AI completion source.

/// Prompt asking for a structured preliminary diagnosis.
#[must_use]
pub fn diagnosis_prompt(input_text: &str, has_image: bool) -> String {
    let image_note = if has_image {
        "An image supplied by the patient is attached; take it into account.\n"
    } else {
        ""
    };
    format!(
        "You are a careful medical triage assistant. Based on the symptoms below, \
give a preliminary assessment. This is not a replacement for a doctor.\n\
{image_note}\
Symptoms: {input_text}\n\n\
Respond with a single JSON object and nothing else, using exactly these keys:\n\
{{\n\
  \"condition\": string,\n\
  \"confidence_level\": integer from 0 to 100,\n\
  \"description\": string,\n\
  \"symptoms\": array of strings,\n\
  \"recommendations\": array of strings,\n\
  \"severity\": \"mild\" | \"moderate\" | \"severe\",\n\
  \"when_to_consult\": string\n\
}}"
    )
}

/// Prompt asking for reference information about a medication.
#[must_use]
pub fn drug_analysis_prompt(drug_name: Option<&str>, has_image: bool) -> String {
    let subject = match (drug_name, has_image) {
        (Some(name), true) => format!("the medication \"{name}\" shown in the attached image"),
        (Some(name), false) => format!("the medication \"{name}\""),
        (None, _) => "the medication shown in the attached image".to_owned(),
    };
    format!(
        "You are a pharmacist providing general reference information about {subject}. \
Respond with a single JSON object and nothing else, using exactly these keys:\n\
{{\n\
  \"drug_name\": string,\n\
  \"generic_name\": string,\n\
  \"uses\": array of strings,\n\
  \"dosage\": string,\n\
  \"side_effects\": array of strings,\n\
  \"warnings\": array of strings,\n\
  \"interactions\": array of strings,\n\
  \"contraindications\": array of strings\n\
}}"
    )
}

/// Prompt asking for a fracture screen of an attached radiograph.
#[must_use]
pub fn fracture_prompt(notes: Option<&str>) -> String {
    let notes = notes
        .map(|text| format!("Clinical notes: {text}\n"))
        .unwrap_or_default();
    format!(
        "You are assisting a radiologist. Inspect the attached X-ray for bone fractures.\n\
{notes}\
Respond with a single JSON object and nothing else: \
{{ \"fracture\": true | false, \"finding\": string }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_prompt_embeds_symptoms_and_schema() {
        let prompt = diagnosis_prompt("fever, cough", false);
        assert!(prompt.contains("Symptoms: fever, cough"));
        assert!(prompt.contains("\"when_to_consult\""));
        assert!(!prompt.contains("attached"));
    }

    #[test]
    fn drug_prompt_describes_image_only_requests() {
        let prompt = drug_analysis_prompt(None, true);
        assert!(prompt.contains("shown in the attached image"));
    }
}
