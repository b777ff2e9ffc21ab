//! Batch pipeline orchestration
//!
//! Drives one session through the four pipeline stages: parse files,
//! detect documents, extract chunk by chunk under the rate limiter, and
//! close out the session. File-scoped failures (parse errors, failed
//! chunks) never fail the batch; only unexpected errors escaping the
//! pipeline move the session to Failed.

use crate::error::EngineError;
use crate::rate_limit::RateLimitManager;
use docflow_domain::{
    ChunkInfo, ChunkResult, ChunkTier, DetectedDocument, DocumentParser, EventType,
    ExtractionProvider, ExtractionRequest, FileOutcome, Page, ResultRow, Session, SessionEvent,
    SessionId, SessionStatus,
};
use docflow_extractor::{
    ChunkingStrategy, DocumentDetector, ExtractorConfig, ResultMerger, TokenEstimator,
};
use docflow_session::{SessionEventEmitter, SessionStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Separator matching the chunker's page join
const PAGE_JOIN: &str = "\n\n";

struct PreparedFile {
    name: String,
    chunks: Vec<ChunkInfo>,
    tier: ChunkTier,
}

struct PipelineTotals {
    files_processed: usize,
    total_rows: usize,
}

/// Orchestrates one session end to end
pub struct BatchProcessor {
    store: Arc<SessionStore>,
    emitter: Arc<SessionEventEmitter>,
    rate_limiter: Arc<RateLimitManager>,
    estimator: Arc<TokenEstimator>,
    detector: DocumentDetector,
    chunker: ChunkingStrategy,
    parser: Arc<dyn DocumentParser>,
    provider: Arc<dyn ExtractionProvider>,
}

impl BatchProcessor {
    /// Wire a processor from shared collaborators and extractor config
    pub fn new(
        store: Arc<SessionStore>,
        emitter: Arc<SessionEventEmitter>,
        rate_limiter: Arc<RateLimitManager>,
        parser: Arc<dyn DocumentParser>,
        provider: Arc<dyn ExtractionProvider>,
        config: &ExtractorConfig,
    ) -> Result<Self, EngineError> {
        let estimator = Arc::new(TokenEstimator::new(
            provider.clone(),
            config.token_cache_ttl(),
        ));
        let detector = DocumentDetector::new(config.split_threshold)?;
        let chunker = ChunkingStrategy::new(estimator.clone(), config);

        Ok(Self {
            store,
            emitter,
            rate_limiter,
            estimator,
            detector,
            chunker,
            parser,
            provider,
        })
    }

    /// Run a pending session to a terminal state
    ///
    /// On success the session ends Completed even when individual files
    /// or chunks failed; those failures live in the per-file outcomes.
    /// An error escaping the pipeline moves the session to Failed and is
    /// returned to the caller.
    pub async fn process(&self, id: SessionId) -> Result<(), EngineError> {
        let started = Instant::now();

        match self.run_pipeline(id).await {
            Ok(totals) => {
                self.store.mark_completed(id)?;
                self.emit(
                    id,
                    EventType::SessionCompleted,
                    json!({
                        "files_processed": totals.files_processed,
                        "total_rows": totals.total_rows,
                        "elapsed_ms": started.elapsed().as_millis() as u64,
                    }),
                );
                tracing::info!(
                    "Session {} completed: {} file(s), {} row(s)",
                    id,
                    totals.files_processed,
                    totals.total_rows
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Session {} failed: {}", id, e);
                // A NotFound here means the session was deleted mid-run;
                // nothing left to record against
                let _ = self.store.set_error(id, &e.to_string());
                self.emit(
                    id,
                    EventType::SessionFailed,
                    json!({ "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, id: SessionId) -> Result<PipelineTotals, EngineError> {
        let session = self
            .store
            .get_session(id)
            .ok_or(docflow_session::SessionError::NotFound(id))?;

        self.store
            .update_progress(id, 0, SessionStatus::Processing)?;
        self.emit(
            id,
            EventType::SessionStarted,
            json!({ "files": session.files.len() }),
        );

        let prepared = self.prepare_files(id, &session).await?;
        let total_chunks: usize = prepared.iter().map(|f| f.chunks.len()).sum();

        let mut totals = PipelineTotals {
            files_processed: 0,
            total_rows: 0,
        };
        let mut completed_chunks = 0usize;

        for file in prepared {
            let (rows, results) = self
                .extract_file(id, &session, &file, total_chunks, &mut completed_chunks)
                .await?;

            let merged = ResultMerger::merge(results, file.tier);
            totals.files_processed += 1;
            totals.total_rows += rows.len();

            self.store.add_file_outcome(
                id,
                FileOutcome {
                    file_name: file.name,
                    success: merged.success,
                    error: None,
                    rows,
                    metadata: Some(merged.metadata),
                },
            )?;
        }

        Ok(totals)
    }

    /// Stages 1-2 plus tier selection: parse, detect, chunk every file
    ///
    /// Files that fail to parse, estimate, or chunk are recorded and
    /// skipped; the batch continues with the rest.
    async fn prepare_files(
        &self,
        id: SessionId,
        session: &Session,
    ) -> Result<Vec<PreparedFile>, EngineError> {
        let mut prepared = Vec::with_capacity(session.files.len());

        for (index, file) in session.files.iter().enumerate() {
            self.emit(id, EventType::FileParsing, json!({ "file": file.name }));

            let pages = match self.parser.parse(&file.name, &file.bytes).await {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::warn!("File {} failed to parse: {}", file.name, e);
                    self.emit(
                        id,
                        EventType::FileParsingFailed,
                        json!({ "file": file.name, "error": e.to_string() }),
                    );
                    self.store.add_file_outcome(
                        id,
                        FileOutcome {
                            file_name: file.name.clone(),
                            success: false,
                            error: Some(e.to_string()),
                            rows: Vec::new(),
                            metadata: None,
                        },
                    )?;
                    continue;
                }
            };

            self.emit(
                id,
                EventType::FileParsed,
                json!({ "file": file.name, "pages": pages.len() }),
            );

            let documents = self.detect_documents(&file.name, &pages);
            self.emit(
                id,
                EventType::DocumentDetected,
                json!({ "file": file.name, "documents": documents.len() }),
            );

            let content = join_pages(&pages);
            let total_tokens = match self.estimator.estimate(&content).await {
                Ok(estimate) => estimate.tokens,
                Err(e) => {
                    self.fail_file(id, &file.name, &e.to_string())?;
                    continue;
                }
            };
            let stem = format!("{}-f{}", file_stem(&file.name), index);
            let chunks = match self
                .chunker
                .chunk_file(&stem, &pages, total_tokens, &documents)
                .await
            {
                Ok(chunks) => chunks,
                Err(e) => {
                    self.fail_file(id, &file.name, &e.to_string())?;
                    continue;
                }
            };
            let tier = chunks[0].tier;

            prepared.push(PreparedFile {
                name: file.name.clone(),
                chunks,
                tier,
            });
        }

        Ok(prepared)
    }

    /// Record a file that failed between parsing and extraction, keeping
    /// the batch going
    fn fail_file(&self, id: SessionId, file_name: &str, error: &str) -> Result<(), EngineError> {
        tracing::warn!("File {} failed before extraction: {}", file_name, error);
        self.emit(
            id,
            EventType::ExtractionFailed,
            json!({ "file": file_name, "error": error }),
        );
        self.store.add_file_outcome(
            id,
            FileOutcome {
                file_name: file_name.to_string(),
                success: false,
                error: Some(error.to_string()),
                rows: Vec::new(),
                metadata: None,
            },
        )?;
        Ok(())
    }

    /// Detection is never fatal: any detector error degrades to a single
    /// document spanning the whole file
    fn detect_documents(&self, file_name: &str, pages: &[Page]) -> Vec<DetectedDocument> {
        match self.detector.detect(pages) {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(
                    "Document detection failed for {}, treating as one document: {}",
                    file_name,
                    e
                );
                let first = pages.first().map(|p| p.page_number).unwrap_or(1);
                let last = pages.last().map(|p| p.page_number).unwrap_or(first);
                vec![DetectedDocument::new(first, last, 1.0)]
            }
        }
    }

    /// Stage 3 for one file: rate-limited extraction of every chunk
    async fn extract_file(
        &self,
        id: SessionId,
        session: &Session,
        file: &PreparedFile,
        total_chunks: usize,
        completed_chunks: &mut usize,
    ) -> Result<(Vec<ResultRow>, Vec<ChunkResult>), EngineError> {
        let mut file_rows = Vec::new();
        let mut results = Vec::with_capacity(file.chunks.len());

        for chunk in &file.chunks {
            let estimate = match self.estimator.estimate(&chunk.content).await {
                Ok(estimate) => estimate,
                Err(e) => {
                    tracing::warn!("Chunk {} failed: {}", chunk.chunk_id, e);
                    self.emit(
                        id,
                        EventType::ExtractionFailed,
                        json!({ "chunk_id": chunk.chunk_id, "error": e.to_string() }),
                    );
                    results.push(chunk_result(
                        chunk,
                        serde_json::Value::Null,
                        false,
                        Some(e.to_string()),
                        0,
                        false,
                        None,
                    ));
                    continue;
                }
            };

            let waited = self.rate_limiter.can_proceed(estimate.tokens).await;
            if waited >= Duration::from_millis(1) {
                self.emit(
                    id,
                    EventType::RateLimitWait,
                    json!({ "chunk_id": chunk.chunk_id, "waited_ms": waited.as_millis() as u64 }),
                );
            }

            self.emit(
                id,
                EventType::ExtractionStarted,
                json!({
                    "chunk_id": chunk.chunk_id,
                    "chunk_index": chunk.chunk_index,
                    "total_chunks": chunk.total_chunks,
                }),
            );

            let request = ExtractionRequest {
                content: chunk.content.clone(),
                fields: session.template.fields.clone(),
                prompt: session.template.prompt.clone(),
            };

            let outcome = match self.extract_with_backoff(&request).await {
                Err(EngineError::RateLimitExceeded) => {
                    // Exhausted backoff fails this chunk only; the next
                    // chunk starts a fresh backoff sequence
                    self.rate_limiter.reset_backoff().await;
                    Err(EngineError::RateLimitExceeded.to_string())
                }
                Err(e) => return Err(e),
                Ok(Err(e)) => Err(e.to_string()),
                Ok(Ok(response)) => Ok(response),
            };

            match outcome {
                Ok(response) => {
                    let mut rows = response.rows;
                    for row in &mut rows {
                        for column in &session.custom_columns {
                            row.insert(
                                column.name.clone(),
                                serde_json::Value::String(column.value.clone()),
                            );
                        }
                    }

                    self.store.add_results(id, rows.clone())?;
                    self.rate_limiter.track_usage(response.tokens_used).await;
                    self.rate_limiter.reset_backoff().await;

                    *completed_chunks += 1;
                    let progress = (*completed_chunks * 100 / total_chunks.max(1)) as u8;
                    self.store
                        .update_progress(id, progress, SessionStatus::Processing)?;

                    self.emit(
                        id,
                        EventType::ExtractionProgress,
                        json!({
                            "progress": progress,
                            "completed_chunks": *completed_chunks,
                            "total_chunks": total_chunks,
                        }),
                    );
                    self.emit(
                        id,
                        EventType::ExtractionCompleted,
                        json!({ "chunk_id": chunk.chunk_id, "tokens_used": response.tokens_used }),
                    );

                    results.push(chunk_result(
                        chunk,
                        serde_json::to_value(&rows).map_err(docflow_extractor::ExtractorError::from)?,
                        true,
                        None,
                        response.tokens_used,
                        estimate.cache_hit,
                        response.confidence,
                    ));
                    file_rows.extend(rows);
                }
                Err(e) => {
                    tracing::warn!("Chunk {} failed: {}", chunk.chunk_id, e);
                    self.emit(
                        id,
                        EventType::ExtractionFailed,
                        json!({ "chunk_id": chunk.chunk_id, "error": e.to_string() }),
                    );
                    results.push(chunk_result(
                        chunk,
                        serde_json::Value::Null,
                        false,
                        Some(e.to_string()),
                        0,
                        estimate.cache_hit,
                        None,
                    ));
                }
            }
        }

        Ok((file_rows, results))
    }

    /// Call the provider, retrying the same chunk through the limiter's
    /// backoff on rate-limit errors
    ///
    /// The outer error signals exhausted backoff, which the caller folds
    /// into a chunk failure; the inner error is the chunk-scoped
    /// non-retryable provider failure.
    async fn extract_with_backoff(
        &self,
        request: &ExtractionRequest,
    ) -> Result<
        Result<docflow_domain::ExtractionResponse, docflow_domain::ProviderError>,
        EngineError,
    > {
        loop {
            match self.provider.extract(request).await {
                Ok(response) => return Ok(Ok(response)),
                Err(e) if e.is_rate_limit() => {
                    self.rate_limiter.handle_rate_limit_error().await?;
                }
                Err(e) => return Ok(Err(e)),
            }
        }
    }

    fn emit(&self, id: SessionId, event: EventType, data: serde_json::Value) {
        self.emitter.emit(id, SessionEvent::now(event, data));
    }
}

#[allow(clippy::too_many_arguments)]
fn chunk_result(
    chunk: &ChunkInfo,
    payload: serde_json::Value,
    success: bool,
    error: Option<String>,
    tokens_used: usize,
    cache_hit: bool,
    confidence: Option<f64>,
) -> ChunkResult {
    ChunkResult {
        chunk_id: chunk.chunk_id.clone(),
        chunk_index: chunk.chunk_index,
        start_page: chunk.start_page,
        end_page: chunk.end_page,
        document_index: chunk.document_index,
        payload,
        success,
        error,
        tokens_used,
        cache_hit,
        confidence,
    }
}

fn join_pages(pages: &[Page]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_JOIN)
}

fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("invoices.txt"), "invoices");
        assert_eq!(file_stem("archive.2024.txt"), "archive.2024");
        assert_eq!(file_stem("noext"), "noext");
    }
}
