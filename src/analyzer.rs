//! Camera directory analysis
//!
//! Discovers camera files, runs one pool job per file (parse, then ingest) and
//! reports the frame summary once every job has finished.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::camera::{discover_camera_files, parse_camera_file};
use crate::config::FrameVoteConfig;
use crate::parallel::{Job, PoolError, WorkerPool};
use crate::tally::{FrameSummary, FrameTally};

/// What to do with a camera file that cannot be parsed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InvalidFilePolicy {
    /// Fail the whole run; no summary is produced.
    #[default]
    Abort,
    /// Leave the file out of the tally and list it in the report.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or unreadable camera file
    InvalidInput,
    /// The tally refused a parsed vector; never skipped
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: FrameSummary,
    pub files_discovered: usize,
    pub files_ingested: usize,
    pub failures: Vec<FileFailure>,
    pub workers: usize,
    pub elapsed_ms: u64,
}

/// State shared by every file job of one run
struct RunContext {
    tally: FrameTally,
    failures: Mutex<Vec<FileFailure>>,
    aborted: AtomicBool,
    policy: InvalidFilePolicy,
}

impl RunContext {
    fn new(max_frames: usize, policy: InvalidFilePolicy) -> Self {
        Self {
            tally: FrameTally::new(max_frames),
            failures: Mutex::new(Vec::new()),
            aborted: AtomicBool::new(false),
            policy,
        }
    }

    fn record_failure(&self, path: &Path, kind: FailureKind, error: String) {
        if kind == FailureKind::Internal || self.policy == InvalidFilePolicy::Abort {
            self.aborted.store(true, Ordering::Release);
        }
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FileFailure {
                path: path.to_path_buf(),
                kind,
                error,
            });
    }

    fn process_file(&self, path: &Path) {
        if self.aborted.load(Ordering::Acquire) {
            tracing::debug!("Skipping {} after an earlier failure", path.display());
            return;
        }

        let votes = match parse_camera_file(path, self.tally.capacity()) {
            Ok(votes) => votes,
            Err(e) => {
                match self.policy {
                    InvalidFilePolicy::Abort => {
                        tracing::error!("Invalid camera file {}: {}", path.display(), e)
                    }
                    InvalidFilePolicy::Skip => {
                        tracing::warn!("Skipping camera file {}: {}", path.display(), e)
                    }
                }
                self.record_failure(path, FailureKind::InvalidInput, e.to_string());
                return;
            }
        };

        match self.tally.ingest(&votes) {
            Ok(()) => tracing::debug!(
                "Ingested {} ({} frames with votes)",
                path.display(),
                votes.present()
            ),
            Err(e) => {
                tracing::error!("Tally rejected {}: {}", path.display(), e);
                self.record_failure(path, FailureKind::Internal, e.to_string());
            }
        }
    }
}

/// Queue one job per file, in the given order.
fn submit_files(
    pool: &WorkerPool,
    ctx: &Arc<RunContext>,
    files: Vec<PathBuf>,
) -> Result<(), PoolError> {
    for path in files {
        let ctx = Arc::clone(ctx);
        let label = path.display().to_string();
        pool.submit(Job::new(label, move || ctx.process_file(&path)))?;
    }
    Ok(())
}

/// Runs the whole discover → parse → tally → report flow.
pub struct FrameAnalyzer {
    config: FrameVoteConfig,
}

impl FrameAnalyzer {
    pub fn new(config: FrameVoteConfig) -> Self {
        Self { config }
    }

    /// Analyze every camera file directly inside `dir`.
    pub fn analyze(&self, dir: &Path) -> Result<AnalysisReport> {
        let files = discover_camera_files(dir, &self.config.input.pattern)?;
        self.analyze_files(files)
    }

    /// Analyze an explicit list of camera files.
    pub fn analyze_files(&self, files: Vec<PathBuf>) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let files_discovered = files.len();

        let pool = self.build_pool()?;
        let workers = pool.worker_count();
        tracing::info!(
            "Analyzing {} camera files with {} workers",
            files_discovered,
            workers
        );

        let ctx = Arc::new(RunContext::new(
            self.config.frames.max_frames,
            self.config.errors.on_invalid_file,
        ));
        submit_files(&pool, &ctx, files)?;

        pool.wait_idle();
        let panicked = pool.panicked_jobs();
        pool.shutdown();

        if panicked > 0 {
            anyhow::bail!("{panicked} camera file jobs panicked; no summary produced");
        }

        let mut failures = std::mem::take(
            &mut *ctx.failures.lock().unwrap_or_else(PoisonError::into_inner),
        );
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let fatal = failures.iter().find(|failure| {
            failure.kind == FailureKind::Internal
                || self.config.errors.on_invalid_file == InvalidFilePolicy::Abort
        });
        if let Some(failure) = fatal {
            anyhow::bail!(
                "Failed to process {}: {} ({} of {} files failed)",
                failure.path.display(),
                failure.error,
                failures.len(),
                files_discovered
            );
        }

        let report = AnalysisReport {
            summary: ctx.tally.report(),
            files_discovered,
            files_ingested: ctx.tally.files_ingested(),
            failures,
            workers,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Analysis finished in {}ms: {} ingested, {} skipped",
            report.elapsed_ms,
            report.files_ingested,
            report.failures.len()
        );
        Ok(report)
    }

    fn build_pool(&self) -> Result<WorkerPool> {
        let pool_config = &self.config.pool;
        let pool = if pool_config.workers == 0 {
            WorkerPool::with_optimal_workers(0, pool_config.thread_percentage)?
        } else {
            WorkerPool::new(pool_config.workers, pool_config.oversubscribe)?
        };
        Ok(pool)
    }
}
