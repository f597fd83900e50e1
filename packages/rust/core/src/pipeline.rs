//! End-to-end content pipeline: request → draft → search → simplify → score → file.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use edugen_llm::{GeminiClient, GenerationRequest, GroqClient, Simplifier, TextGenerator};
use edugen_search::{DuckDuckGoClient, WebSearch};
use edugen_shared::{
    AppConfig, ContentRequest, EdugenError, PipelineStage, Result, RunId, RunMetadata,
    SearchResult, SearchStatus, Secrets, SimplifiedContent,
};

use crate::{persist, prompts};

/// Configuration for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the content files are written to.
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.defaults.output_dir),
        }
    }
}

/// Result of one successful run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path of the written content file.
    pub path: PathBuf,
    /// The persisted document.
    pub content: SimplifiedContent,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, stage: PipelineStage, detail: &str);
    /// Called when the run completes.
    fn done(&self, result: &PipelineResult);
    /// Called when the run aborts.
    fn failed(&self, error: &EdugenError);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _stage: PipelineStage, _detail: &str) {}
    fn done(&self, _result: &PipelineResult) {}
    fn failed(&self, _error: &EdugenError) {}
}

/// Sequential orchestrator over the three external services.
pub struct Pipeline {
    config: PipelineConfig,
    generator: Box<dyn TextGenerator>,
    search: Box<dyn WebSearch>,
    simplifier: Box<dyn Simplifier>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Box<dyn TextGenerator>,
        search: Box<dyn WebSearch>,
        simplifier: Box<dyn Simplifier>,
    ) -> Self {
        Self {
            config,
            generator,
            search,
            simplifier,
        }
    }

    /// Build a pipeline backed by the Groq, DuckDuckGo and Gemini clients.
    pub fn from_app_config(config: &AppConfig, secrets: &Secrets) -> Result<Self> {
        let generator = GroqClient::new(&config.generation, &secrets.generation_api_key)?;
        let search = DuckDuckGoClient::new(&config.search)?;
        let simplifier = GeminiClient::new(&config.simplification, &secrets.simplification_api_key)?;

        Ok(Self::new(
            PipelineConfig::from_app_config(config),
            Box::new(generator),
            Box::new(search),
            Box::new(simplifier),
        ))
    }

    /// Run one request through every stage.
    ///
    /// A failure aborts the run as [`EdugenError::Stage`] naming the stage
    /// and nothing is written. Search failure is the exception: the run
    /// continues without enrichment and records `searchStatus = "failed"`.
    #[instrument(skip_all, fields(subject = %request.subject, topic = %request.topic))]
    pub async fn run(
        &self,
        request: &ContentRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineResult> {
        match self.run_stages(request, progress).await {
            Ok(result) => {
                progress.done(&result);
                Ok(result)
            }
            Err(e) => {
                progress.failed(&e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &ContentRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        let run_id = RunId::new();

        info!(%run_id, grade = %request.grade_level, "starting content pipeline");

        // --- Requested ---
        progress.phase(PipelineStage::Requested, &request.topic);
        request
            .validate()
            .map_err(|e| e.at_stage(PipelineStage::Requested))?;

        // --- Generated ---
        progress.phase(PipelineStage::Generated, self.generator.model());
        let draft = self
            .generator
            .generate(&GenerationRequest::new(prompts::generation_prompt(request)))
            .await
            .map_err(|e| e.at_stage(PipelineStage::Generated))?;
        info!(chars = draft.len(), "draft generated");

        // --- SearchEnriched ---
        let query = prompts::search_query(request, &draft);
        progress.phase(PipelineStage::SearchEnriched, &query);
        let (results, search_status) = self.enrich(&query).await;
        let context = edugen_search::format_context(&results);

        // --- Simplified ---
        progress.phase(PipelineStage::Simplified, self.simplifier.model());
        let prompt = prompts::simplification_prompt(request, &draft, &context);
        let simplified = self
            .simplifier
            .simplify(&prompt)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Simplified))?;

        // --- Analyzed ---
        progress.phase(PipelineStage::Analyzed, &simplified.title);
        let text = edugen_readability::compose_text(
            &simplified.title,
            simplified.summary.as_deref(),
            &simplified.sections,
        );
        let readability = edugen_readability::analyze(&text);
        if !readability.is_sufficient() {
            return Err(EdugenError::validation("simplified content has no scorable text")
                .at_stage(PipelineStage::Analyzed));
        }

        // --- Persisted ---
        progress.phase(PipelineStage::Persisted, &self.config.output_dir.to_string_lossy());
        let content = SimplifiedContent {
            title: simplified.title,
            grade_level: request.grade_level.clone(),
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            topic_details: request.topic_details.clone(),
            grade_level_assessment: simplified.grade_level_appropriateness_assessment,
            sections: simplified.sections,
            summary: simplified.summary,
            metadata: RunMetadata {
                run_id: run_id.clone(),
                generated_at: chrono::Utc::now(),
                generation_model: self.generator.model().to_string(),
                simplification_model: self.simplifier.model().to_string(),
                search_query: query,
                search_result_count: results.len(),
                search_status,
                elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                readability,
            },
        };

        let path = persist::write_content(&self.config.output_dir, &content)
            .map_err(|e| e.at_stage(PipelineStage::Persisted))?;

        let result = PipelineResult {
            path,
            content,
            elapsed: start.elapsed(),
        };

        info!(
            %run_id,
            path = %result.path.display(),
            fk = result.content.metadata.readability.flesch_kincaid_grade,
            elapsed_ms = result.elapsed.as_millis(),
            "content pipeline complete"
        );

        Ok(result)
    }

    /// Search is the one non-fatal stage.
    async fn enrich(&self, query: &str) -> (Vec<SearchResult>, SearchStatus) {
        match self.search.search(query).await {
            Ok(results) if results.is_empty() => {
                info!("search returned no results");
                (results, SearchStatus::Empty)
            }
            Ok(results) => {
                info!(count = results.len(), "search results collected");
                (results, SearchStatus::Ok)
            }
            Err(e) => {
                warn!(error = %e, "search failed, continuing without enrichment");
                (Vec::new(), SearchStatus::Failed)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use edugen_llm::{RetryPolicy, parse_draft};
    use edugen_shared::{GenerationConfig, SearchConfig, SimplificationConfig, SimplifiedDraft};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const DRAFT_FIXTURE: &str = "../../../fixtures/json/simplified-draft.fixture.json";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("edugen-pipeline-test-{}", RunId::new()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn json_files(dir: &std::path::Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|x| x == "json"))
                    .collect()
            })
            .unwrap_or_default()
    }

    struct FakeGenerator;

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok("# Photosynthesis\n\n## How Plants Make Food\n\nPlants use light.".into())
        }
        fn model(&self) -> &str {
            "fake-gen"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Err(EdugenError::api("generation", "HTTP 401 Unauthorized: invalid key"))
        }
        fn model(&self) -> &str {
            "failing-gen"
        }
    }

    /// `None` simulates a transport failure.
    struct FakeSearch(Option<Vec<SearchResult>>);

    impl FakeSearch {
        fn ok(results: Vec<SearchResult>) -> Self {
            Self(Some(results))
        }

        fn failing() -> Self {
            Self(None)
        }
    }

    #[async_trait]
    impl WebSearch for FakeSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            self.0
                .clone()
                .ok_or_else(|| EdugenError::transient("search", "connection reset"))
        }
    }

    struct FakeSimplifier {
        output: String,
    }

    #[async_trait]
    impl Simplifier for FakeSimplifier {
        async fn simplify(&self, _prompt: &str) -> Result<SimplifiedDraft> {
            parse_draft("simplification", &self.output)
        }
        fn model(&self) -> &str {
            "fake-simplifier"
        }
    }

    fn fixture() -> String {
        std::fs::read_to_string(DRAFT_FIXTURE).expect("read fixture")
    }

    fn pipeline(dir: &std::path::Path, search: FakeSearch, output: String) -> Pipeline {
        Pipeline::new(
            PipelineConfig {
                output_dir: dir.to_path_buf(),
            },
            Box::new(FakeGenerator),
            Box::new(search),
            Box::new(FakeSimplifier { output }),
        )
    }

    fn photosynthesis() -> ContentRequest {
        ContentRequest::new("5th grade", "Science", "Photosynthesis")
    }

    #[tokio::test]
    async fn successful_run_writes_exactly_one_file() {
        let tmp = temp_dir();
        let search = FakeSearch::ok(vec![SearchResult {
            title: "Photosynthesis for kids".into(),
            snippet: "Plants turn light into food.".into(),
            url: Some("https://example.org/p".into()),
        }]);
        let p = pipeline(&tmp, search, fixture());

        let result = p.run(&photosynthesis(), &SilentProgress).await.unwrap();

        let files = json_files(&tmp);
        assert_eq!(files, vec![result.path.clone()]);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.path).unwrap()).unwrap();
        assert!(!value["title"].as_str().unwrap().is_empty());
        assert!(!value["sections"].as_array().unwrap().is_empty());
        assert_eq!(value["gradeLevel"], "5th grade");
        assert_eq!(value["subject"], "Science");
        assert_eq!(value["topic"], "Photosynthesis");
        assert_eq!(value["metadata"]["searchStatus"], "ok");
        assert_eq!(value["metadata"]["searchResultCount"], 1);
        assert_eq!(value["metadata"]["generationModel"], "fake-gen");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn photosynthesis_scores_are_finite() {
        let tmp = temp_dir();
        let p = pipeline(&tmp, FakeSearch::ok(vec![]), fixture());

        let result = p.run(&photosynthesis(), &SilentProgress).await.unwrap();
        let report = result.content.metadata.readability;
        assert!(report.flesch_kincaid_grade.is_finite());
        assert!(report.is_sufficient());
        assert_eq!(result.content.metadata.search_status, SearchStatus::Empty);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn malformed_simplification_writes_nothing() {
        let tmp = temp_dir();
        let p = pipeline(
            &tmp,
            FakeSearch::ok(vec![]),
            "I could not produce JSON for this topic.".into(),
        );

        let err = p.run(&photosynthesis(), &SilentProgress).await.unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Simplified));
        assert!(matches!(err.root(), EdugenError::MalformedResponse { .. }));
        assert!(json_files(&tmp).is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn search_failure_is_not_fatal() {
        let tmp = temp_dir();
        let p = pipeline(&tmp, FakeSearch::failing(), fixture());

        let result = p.run(&photosynthesis(), &SilentProgress).await.unwrap();
        assert_eq!(result.content.metadata.search_status, SearchStatus::Failed);
        assert_eq!(result.content.metadata.search_result_count, 0);
        assert_eq!(json_files(&tmp).len(), 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn invalid_request_fails_before_generation() {
        let tmp = temp_dir();
        let p = pipeline(&tmp, FakeSearch::ok(vec![]), fixture());

        let request = ContentRequest::new("5th grade", "Science", "  ");
        let err = p.run(&request, &SilentProgress).await.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Requested));
        assert!(json_files(&tmp).is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn generation_failure_names_stage_and_writes_nothing() {
        let tmp = temp_dir();
        let p = Pipeline::new(
            PipelineConfig {
                output_dir: tmp.clone(),
            },
            Box::new(FailingGenerator),
            Box::new(FakeSearch::ok(vec![])),
            Box::new(FakeSimplifier { output: fixture() }),
        );

        let err = p.run(&photosynthesis(), &SilentProgress).await.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Generated));
        assert!(matches!(err.root(), EdugenError::ExternalApi { .. }));
        assert!(json_files(&tmp).is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unwritable_output_fails_at_persistence() {
        let tmp = temp_dir();
        // A regular file where the output directory's parent should be.
        let blocker = tmp.join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let p = pipeline(&blocker.join("out"), FakeSearch::ok(vec![]), fixture());

        let err = p.run(&photosynthesis(), &SilentProgress).await.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Persisted));
        assert!(matches!(err.root(), EdugenError::Io { .. }));
        assert!(json_files(&tmp).is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn long_topic_still_persists() {
        let tmp = temp_dir();
        let p = pipeline(&tmp, FakeSearch::ok(vec![]), fixture());

        let request = ContentRequest::new("5th grade", "Science", "a".repeat(250));
        let result = p.run(&request, &SilentProgress).await.unwrap();
        assert_eq!(json_files(&tmp), vec![result.path]);
        assert!(!result.content.metadata.search_query.is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn search_query_is_derived_from_request_and_draft() {
        let tmp = temp_dir();
        let p = pipeline(&tmp, FakeSearch::ok(vec![]), fixture());

        let result = p.run(&photosynthesis(), &SilentProgress).await.unwrap();
        assert_eq!(
            result.content.metadata.search_query,
            "Photosynthesis Science 5th grade How Plants Make Food"
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn end_to_end_over_mock_services() {
        let server = MockServer::start().await;
        let tmp = temp_dir();

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "# The Water Cycle\n\nWater moves."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": fixture()}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = GroqClient::new(
            &GenerationConfig {
                base_url: format!("{}/openai/v1", server.uri()),
                ..Default::default()
            },
            "gsk-test",
        )
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(0));
        let search = DuckDuckGoClient::new(&SearchConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();
        let simplifier = GeminiClient::new(
            &SimplificationConfig {
                base_url: server.uri(),
                ..Default::default()
            },
            "gm-test",
        )
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(0));

        let p = Pipeline::new(
            PipelineConfig {
                output_dir: tmp.clone(),
            },
            Box::new(generator),
            Box::new(search),
            Box::new(simplifier),
        );

        let request = ContentRequest::new("3rd Grade", "Science", "The Water Cycle");
        let result = p.run(&request, &SilentProgress).await.unwrap();

        assert_eq!(result.content.title, "The Amazing Water Cycle");
        assert_eq!(result.content.metadata.search_status, SearchStatus::Failed);
        assert_eq!(result.content.metadata.generation_model, "llama-3.3-70b-versatile");
        assert_eq!(json_files(&tmp).len(), 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
