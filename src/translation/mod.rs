pub mod client;
pub mod prompt;
pub mod retry;

pub use client::TranslationClient;
pub use prompt::build_system_prompt;
pub use retry::RetryPolicy;

use crate::json_processor::{
    collect_translatable, count_translatable, file_exists, replace_translations, split_response,
    BatchPlanner, JsonDocumentReader, JsonDocumentWriter,
};
use crate::state::{SessionMap, SessionState, SessionTracker};
use crate::utils::{JsonTranslatorError, Result, TranslationSessionConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// A text-completion backend: takes one joined batch, returns the translated text.
#[allow(async_fn_in_trait)]
pub trait Translate {
    async fn translate(&self, text: &str) -> Result<String>;
}

impl<T: Translate> Translate for &T {
    async fn translate(&self, text: &str) -> Result<String> {
        (**self).translate(text).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranslationReport {
    pub entries_total: usize,
    pub batches_total: usize,
    pub batches_translated: usize,
    pub failures: Vec<BatchFailure>,
}

impl TranslationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn entries_untranslated(&self) -> usize {
        self.failures.iter().map(|f| f.entries).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub entries: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub document: Value,
    pub report: TranslationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranslationSession {
    pub session_id: String,
    pub status: String,
    pub progress: f32,
    pub entries_processed: usize,
    pub entries_total: usize,
    pub batches_completed: usize,
    pub batches_total: usize,
    pub failed_batches: usize,
    pub estimated_time_remaining: Option<u64>,
    pub output_file: Option<String>,
    pub error: Option<String>,
}

impl From<&SessionState> for TranslationSession {
    fn from(state: &SessionState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            status: state.status.to_string(),
            progress: state.progress,
            entries_processed: state.entries_processed,
            entries_total: state.entries_total,
            batches_completed: state.batches_completed,
            batches_total: state.batches_total,
            failed_batches: state.failed_batches,
            estimated_time_remaining: state.estimated_time_remaining,
            output_file: state.output_file.clone(),
            error: state.error.clone(),
        }
    }
}

/// Collect, translate in sequential batches, replace.
///
/// Batches whose request fails (after retries) or whose response splits into the
/// wrong number of segments keep their original strings; the document itself
/// never fails because of the remote service.
pub struct TranslationPipeline<T> {
    translator: T,
    planner: BatchPlanner,
    delimiter: String,
    retry: RetryPolicy,
}

impl<T: Translate> TranslationPipeline<T> {
    pub fn new(translator: T, config: &TranslationSessionConfig) -> Self {
        Self {
            translator,
            planner: BatchPlanner::new(config.batch_size),
            delimiter: config.delimiter.clone(),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn translate_document(
        &self,
        value: &Value,
        tracker: Option<&SessionTracker>,
    ) -> Result<TranslationOutcome> {
        let collected = collect_translatable(value);

        if collected.is_empty() {
            if let Some(tracker) = tracker {
                tracker.start(0, 0).await;
            }
            return Ok(TranslationOutcome {
                document: collected.skeleton,
                report: TranslationReport::default(),
            });
        }

        let (translated, report) = self.translate_entries(&collected.entries, tracker).await;
        let document = replace_translations(collected.skeleton, &translated)?;

        info!(
            entries = report.entries_total,
            batches = report.batches_total,
            failed_batches = report.failures.len(),
            "Translated entries"
        );

        Ok(TranslationOutcome { document, report })
    }

    /// Returns one output string per input entry, in order.
    pub async fn translate_entries(
        &self,
        entries: &[String],
        tracker: Option<&SessionTracker>,
    ) -> (Vec<String>, TranslationReport) {
        let ranges = self.planner.calculate_batches(entries.len());
        let mut report = TranslationReport {
            entries_total: entries.len(),
            batches_total: ranges.len(),
            ..Default::default()
        };
        let mut translated = Vec::with_capacity(entries.len());

        if let Some(tracker) = tracker {
            tracker.start(entries.len(), ranges.len()).await;
        }

        for batch in self.planner.batches(&ranges, entries) {
            info!(
                batch_index = batch.range.index,
                progress = batch.range.start,
                total = entries.len(),
                "Translating batch"
            );

            let joined = batch.join(&self.delimiter);
            let translator = &self.translator;
            let request = joined.as_str();
            let outcome = self
                .retry
                .run(move |_| translator.translate(request))
                .await
                .and_then(|response| {
                    let segments = split_response(&response, &self.delimiter);
                    if segments.len() == batch.entries.len() {
                        Ok(segments)
                    } else {
                        Err(JsonTranslatorError::SegmentCountMismatch {
                            expected: batch.entries.len(),
                            got: segments.len(),
                        })
                    }
                });

            let failed = match outcome {
                Ok(segments) => {
                    translated.extend(segments);
                    report.batches_translated += 1;
                    false
                }
                Err(e) => {
                    warn!(
                        batch_index = batch.range.index,
                        entries = batch.entries.len(),
                        error = %e,
                        "Batch left untranslated"
                    );
                    translated.extend(batch.entries.iter().cloned());
                    report.failures.push(BatchFailure {
                        batch_index: batch.range.index,
                        entries: batch.entries.len(),
                        reason: e.to_string(),
                    });
                    true
                }
            };

            if let Some(tracker) = tracker {
                tracker
                    .record_batch(batch.range.end, batch.range.index + 1, failed)
                    .await;
            }
        }

        (translated, report)
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }
}

/// Reads `input_file`, translates it and writes `output_file`.
pub async fn translate_file<T: Translate>(
    pipeline: &TranslationPipeline<T>,
    input_file: &str,
    output_file: &str,
    tracker: Option<&SessionTracker>,
) -> Result<TranslationReport> {
    let value = JsonDocumentReader::new(input_file).read().await?;
    let outcome = pipeline.translate_document(&value, tracker).await?;
    JsonDocumentWriter::new(output_file)
        .write(&outcome.document)
        .await?;
    Ok(outcome.report)
}

/// Starts a background translation of `input_file` and returns its session immediately.
pub async fn start_translation_session(
    input_file: &str,
    output_file: &str,
    config: &TranslationSessionConfig,
    sessions: SessionMap,
) -> Result<TranslationSession> {
    config.validate()?;
    if !file_exists(input_file) {
        return Err(JsonTranslatorError::FileNotFound(input_file.to_string()));
    }

    // Malformed input fails here, before a session exists.
    let value = JsonDocumentReader::new(input_file).read().await?;
    let client = TranslationClient::new(config.clone())?;

    let session_id = Uuid::new_v4().to_string();
    let tracker = SessionTracker::new(sessions.clone(), session_id.clone());

    let entries_total = count_translatable(&value);
    let state = SessionState::new(
        session_id.clone(),
        entries_total,
        BatchPlanner::new(config.batch_size).batch_count(entries_total),
    );
    let session = TranslationSession::from(&state);
    sessions.write().await.insert(session_id, state);

    let pipeline = TranslationPipeline::new(client, config);
    let output_file = output_file.to_string();

    tokio::spawn(async move {
        let result = async {
            let outcome = pipeline.translate_document(&value, Some(&tracker)).await?;
            JsonDocumentWriter::new(&output_file)
                .write(&outcome.document)
                .await?;
            Ok::<_, JsonTranslatorError>(outcome.report)
        }
        .await;

        match result {
            Ok(report) => {
                tracker.complete(Some(output_file.clone())).await;
                info!(
                    session_id = %tracker.session_id(),
                    output_file = %output_file,
                    failed_batches = report.failures.len(),
                    "Translation completed"
                );
            }
            Err(e) => {
                tracing::error!(session_id = %tracker.session_id(), error = %e, "Translation session failed");
                tracker.fail(e.to_string()).await;
            }
        }
    });

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, SessionStatus};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DELIM: &str = "\n🚀";

    /// Echoes the request back.
    struct Identity;

    impl Translate for Identity {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    /// Maps each segment through a dictionary, leaving unknown segments as-is.
    struct Dictionary(HashMap<&'static str, &'static str>);

    impl Translate for Dictionary {
        async fn translate(&self, text: &str) -> Result<String> {
            let segments: Vec<&str> = text
                .split(DELIM)
                .map(|s| self.0.get(s).copied().unwrap_or(s))
                .collect();
            Ok(segments.join(DELIM))
        }
    }

    /// Appends a segment that was never asked for.
    struct Chatty;

    impl Translate for Chatty {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(format!("{}{}Hope this helps!", text, DELIM))
        }
    }

    struct Broken {
        calls: AtomicUsize,
    }

    impl Translate for Broken {
        async fn translate(&self, _text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(JsonTranslatorError::ApiError("503 Service Unavailable".into()))
        }
    }

    fn config(batch_size: usize) -> TranslationSessionConfig {
        TranslationSessionConfig {
            batch_size,
            retry_base_delay_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_example_document() {
        let dictionary = Dictionary(HashMap::from([("你好", "Hello"), ("再见", "Bye")]));
        let pipeline = TranslationPipeline::new(dictionary, &config(30));

        let input = json!({"a": "你好", "b": ["world", "再见"]});
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, json!({"a": "Hello", "b": ["world", "Bye"]}));
        assert_eq!(outcome.report.batches_total, 1);
        assert!(outcome.report.is_complete());
    }

    #[tokio::test]
    async fn test_identity_roundtrip_across_batches() {
        let input = json!({
            "paths": {
                "/invoice": {"summary": "开具发票", "params": [{"name": "no", "desc": "发票号码"}]},
                "/red": {"summary": "红字发票", "tags": ["发票", "tax"]}
            },
            "version": 3,
            "deprecated": false,
            "extra": null,
            "notes": ["第一行\n第二行", "plain"]
        });

        let pipeline = TranslationPipeline::new(Identity, &config(2));
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, input);
        assert_eq!(outcome.report.entries_total, 5);
        assert_eq!(outcome.report.batches_total, 3);
        assert_eq!(outcome.report.batches_translated, 3);
    }

    #[tokio::test]
    async fn test_wide_numbers_survive_translation() {
        let input = crate::json_processor::parse_json_str(
            r#"{"id": 123456789012345678901234567890, "name": "发票", "rate": 0.10}"#,
        )
        .unwrap();

        let pipeline = TranslationPipeline::new(Identity, &config(30));
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(
            crate::json_processor::to_pretty_string(&outcome.document).unwrap(),
            "{\n    \"id\": 123456789012345678901234567890,\n    \"name\": \"发票\",\n    \"rate\": 0.10\n}"
        );
    }

    #[tokio::test]
    async fn test_no_cjk_passes_through_without_calls() {
        let broken = Broken {
            calls: AtomicUsize::new(0),
        };
        let pipeline = TranslationPipeline::new(&broken, &config(30));

        let input = json!({"a": "hello", "b": [1, 2.5, true, null, {}], "c": ""});
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, input);
        assert_eq!(broken.calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.report, TranslationReport::default());
    }

    #[tokio::test]
    async fn test_mismatch_keeps_originals() {
        let pipeline = TranslationPipeline::new(Chatty, &config(2));

        let input = json!(["一", "二", "三"]);
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, input);
        assert_eq!(outcome.report.failures.len(), 2);
        assert_eq!(outcome.report.failures[1].batch_index, 1);
        assert_eq!(outcome.report.batches_translated, 0);
        assert_eq!(outcome.report.entries_untranslated(), 3);
        assert_eq!(
            outcome.report.failures[0].reason,
            "Segment count mismatch: expected 2, got 3"
        );
    }

    #[tokio::test]
    async fn test_only_failed_batch_falls_back() {
        struct FailSecond(AtomicUsize);

        impl Translate for FailSecond {
            async fn translate(&self, text: &str) -> Result<String> {
                if self.0.fetch_add(1, Ordering::SeqCst) == 1 {
                    Ok("wrong".to_string() + DELIM + "count" + DELIM + "here")
                } else {
                    Ok(text.replace("中", "zh"))
                }
            }
        }

        let pipeline =
            TranslationPipeline::new(FailSecond(AtomicUsize::new(0)), &config(1));
        let input = json!({"a": "中一", "b": "中二", "c": "中三"});
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, json!({"a": "zh一", "b": "中二", "c": "zh三"}));
        assert_eq!(outcome.report.failures.len(), 1);
        assert_eq!(outcome.report.failures[0].batch_index, 1);
    }

    #[tokio::test]
    async fn test_network_failure_degrades_after_retries() {
        let broken = Broken {
            calls: AtomicUsize::new(0),
        };
        let pipeline = TranslationPipeline::new(&broken, &config(2))
            .with_retry(RetryPolicy::no_delay(3));

        let input = json!({"a": "甲", "b": "乙", "c": "丙"});
        let outcome = pipeline.translate_document(&input, None).await.unwrap();

        assert_eq!(outcome.document, input);
        assert_eq!(broken.calls.load(Ordering::SeqCst), 6);
        assert_eq!(outcome.report.failures.len(), 2);
        assert!(outcome.report.failures[0].reason.contains("503"));
    }

    #[tokio::test]
    async fn test_tracker_sees_progress() {
        let app = AppState::default();
        let tracker = SessionTracker::new(app.sessions.clone(), "s1");
        let pipeline = TranslationPipeline::new(Identity, &config(2));

        let entries: Vec<String> = ["一", "二", "三", "四", "五"].iter().map(|s| s.to_string()).collect();
        let (translated, report) = pipeline.translate_entries(&entries, Some(&tracker)).await;

        assert_eq!(translated, entries);
        assert_eq!(report.batches_total, 3);

        let state = app.session("s1").await.unwrap();
        assert_eq!(state.entries_processed, 5);
        assert_eq!(state.batches_completed, 3);
        assert_eq!(state.status, SessionStatus::Running);
    }

    #[tokio::test]
    async fn test_translate_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, r#"{"a": "你好", "b": ["world", "再见"]}"#).unwrap();

        let dictionary = Dictionary(HashMap::from([("你好", "Hello"), ("再见", "Bye")]));
        let pipeline = TranslationPipeline::new(dictionary, &config(30));
        let report = translate_file(
            &pipeline,
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            None,
        )
        .await
        .unwrap();

        assert!(report.is_complete());
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            written,
            "{\n    \"a\": \"Hello\",\n    \"b\": [\n        \"world\",\n        \"Bye\"\n    ]\n}"
        );
    }

    #[tokio::test]
    async fn test_session_rejects_missing_file() {
        let app = AppState::default();
        let result =
            start_translation_session("/no/input.json", "/tmp/out.json", &config(30), app.sessions)
                .await;
        assert!(matches!(result, Err(JsonTranslatorError::FileNotFound(_))));
    }
}
