//! Core domain types for edugen runs and their persisted output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EdugenError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ContentRequest
// ---------------------------------------------------------------------------

/// What to generate: one request per pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Target audience, e.g. "5th grade".
    pub grade_level: String,
    pub subject: String,
    pub topic: String,
    /// Extra learning objectives or focus points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_details: Option<String>,
}

impl ContentRequest {
    pub fn new(
        grade_level: impl Into<String>,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            grade_level: grade_level.into(),
            subject: subject.into(),
            topic: topic.into(),
            topic_details: None,
        }
    }

    /// Attach optional topic details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.topic_details = (!details.trim().is_empty()).then_some(details);
        self
    }

    /// Reject requests with blank required fields.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("grade_level", &self.grade_level),
            ("subject", &self.subject),
            ("topic", &self.topic),
        ] {
            if value.trim().is_empty() {
                return Err(EdugenError::validation(format!(
                    "content request field `{name}` must not be empty"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// A single web search hit used to enrich the simplification prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of the search stage, recorded in run metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// At least one result was used.
    Ok,
    /// The provider answered with no hits.
    Empty,
    /// The provider call failed; the run continued without enrichment.
    Failed,
}

// ---------------------------------------------------------------------------
// Simplified output
// ---------------------------------------------------------------------------

/// One headed block of simplified content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

/// The JSON object the simplification model is instructed to emit.
///
/// Field names match the schema embedded in the simplification prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level_appropriateness_assessment: Option<String>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SimplifiedDraft {
    /// Schema checks that serde alone cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("`title` is empty".into());
        }
        if self.sections.is_empty() {
            return Err("`sections` is empty".into());
        }
        if self.sections.iter().all(|s| s.content.trim().is_empty()) {
            return Err("every section has empty `content`".into());
        }
        Ok(())
    }
}

/// Metadata recorded alongside each persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub generation_model: String,
    pub simplification_model: String,
    pub search_query: String,
    pub search_result_count: usize,
    pub search_status: SearchStatus,
    pub elapsed_ms: u64,
    pub readability: ReadabilityReport,
}

/// The canonical persisted unit: one file per successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedContent {
    pub title: String,
    pub grade_level: String,
    pub subject: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level_assessment: Option<String>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub metadata: RunMetadata,
}

// ---------------------------------------------------------------------------
// Readability
// ---------------------------------------------------------------------------

/// Raw counts the readability formulas are computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
    /// Alphabetic characters only.
    pub letters: usize,
    /// Letters and digits, the ARI character count.
    pub characters: usize,
    /// Words of three or more syllables.
    pub polysyllables: usize,
    /// Words not on the Dale-Chall familiar list.
    pub difficult_words: usize,
}

/// The six published readability scores for a body of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityReport {
    pub flesch_kincaid_grade: f64,
    pub smog_index: f64,
    pub coleman_liau_index: f64,
    pub automated_readability_index: f64,
    pub linsear_write_formula: f64,
    pub dale_chall_score: f64,
    pub stats: TextStats,
}

/// Identifies one of the six readability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    FleschKincaidGrade,
    Smog,
    ColemanLiau,
    AutomatedReadability,
    LinsearWrite,
    DaleChall,
}

impl Metric {
    /// All metrics in report order.
    pub const ALL: [Metric; 6] = [
        Metric::FleschKincaidGrade,
        Metric::Smog,
        Metric::ColemanLiau,
        Metric::AutomatedReadability,
        Metric::LinsearWrite,
        Metric::DaleChall,
    ];

    /// Human-readable label used in printed reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FleschKincaidGrade => "Flesch-Kincaid Grade Level",
            Self::Smog => "SMOG Grade",
            Self::ColemanLiau => "Coleman-Liau Index",
            Self::AutomatedReadability => "ARI",
            Self::LinsearWrite => "Linsear Write Formula",
            Self::DaleChall => "Dale-Chall Score",
        }
    }
}

impl ReadabilityReport {
    /// Look up a single score.
    pub fn score(&self, metric: Metric) -> f64 {
        match metric {
            Metric::FleschKincaidGrade => self.flesch_kincaid_grade,
            Metric::Smog => self.smog_index,
            Metric::ColemanLiau => self.coleman_liau_index,
            Metric::AutomatedReadability => self.automated_readability_index,
            Metric::LinsearWrite => self.linsear_write_formula,
            Metric::DaleChall => self.dale_chall_score,
        }
    }

    /// `(metric, score)` pairs in report order.
    pub fn scores(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.score(m)))
    }

    /// False when the text had no words, in which case every score is zero.
    pub fn is_sufficient(&self) -> bool {
        self.stats.words > 0
    }
}

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// Linear pipeline states; a run moves through them in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Requested,
    Generated,
    SearchEnriched,
    Simplified,
    Analyzed,
    Persisted,
}

impl PipelineStage {
    /// Name of the work performed to reach this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "request",
            Self::Generated => "generation",
            Self::SearchEnriched => "search",
            Self::Simplified => "simplification",
            Self::Analyzed => "analysis",
            Self::Persisted => "persistence",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn request_validation_rejects_blank_fields() {
        let ok = ContentRequest::new("5th grade", "Science", "Photosynthesis");
        assert!(ok.validate().is_ok());

        let bad = ContentRequest::new("5th grade", "  ", "Photosynthesis");
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn blank_details_are_dropped() {
        let req = ContentRequest::new("3rd Grade", "Science", "Water").with_details("   ");
        assert!(req.topic_details.is_none());
    }

    #[test]
    fn draft_fixture_deserializes() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/simplified-draft.fixture.json")
            .expect("read fixture");
        let draft: SimplifiedDraft = serde_json::from_str(&fixture).expect("deserialize draft");
        assert_eq!(draft.title, "The Amazing Water Cycle");
        assert_eq!(draft.sections.len(), 3);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_validation_requires_content() {
        let draft = SimplifiedDraft {
            title: "Plants".into(),
            grade_level_appropriateness_assessment: None,
            sections: vec![Section {
                heading: "Intro".into(),
                content: " ".into(),
            }],
            summary: None,
        };
        assert!(draft.validate().unwrap_err().contains("content"));
    }

    #[test]
    fn simplified_content_uses_camel_case() {
        let content = SimplifiedContent {
            title: "Photosynthesis".into(),
            grade_level: "5th grade".into(),
            subject: "Science".into(),
            topic: "Photosynthesis".into(),
            topic_details: None,
            grade_level_assessment: Some("Good".into()),
            sections: vec![Section {
                heading: "Intro".into(),
                content: "Plants make food from light.".into(),
            }],
            summary: None,
            metadata: RunMetadata {
                run_id: RunId::new(),
                generated_at: Utc::now(),
                generation_model: "llama".into(),
                simplification_model: "gemini".into(),
                search_query: "photosynthesis".into(),
                search_result_count: 0,
                search_status: SearchStatus::Empty,
                elapsed_ms: 12,
                readability: ReadabilityReport::default(),
            },
        };

        let value = serde_json::to_value(&content).expect("serialize");
        assert_eq!(value["gradeLevel"], "5th grade");
        assert_eq!(value["metadata"]["searchStatus"], "empty");
        assert!(value["metadata"]["readability"]["fleschKincaidGrade"].is_number());
        assert!(value.get("topicDetails").is_none());
    }

    #[test]
    fn stage_order_is_linear() {
        assert!(PipelineStage::Requested < PipelineStage::Generated);
        assert!(PipelineStage::Analyzed < PipelineStage::Persisted);
        assert_eq!(PipelineStage::SearchEnriched.to_string(), "search");
    }
}
