//! Wire types for `generateContent`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct GenerateContentRequestDto<'a> {
    pub(super) contents: [ContentDto<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto<'a> {
    pub(super) parts: Vec<PartDto<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct PartDto<'a> {
    pub(super) text: &'a str,
}

impl<'a> GenerateContentRequestDto<'a> {
    pub(super) fn from_parts(parts: Vec<PartDto<'a>>) -> Self {
        Self {
            contents: [ContentDto { parts }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateContentResponseDto {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    #[serde(default)]
    parts: Vec<CandidatePartDto>,
}

#[derive(Debug, Deserialize)]
struct CandidatePartDto {
    text: Option<String>,
}

impl GenerateContentResponseDto {
    /// Text of the first part of the first candidate.
    pub(super) fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}
