//! The extract → chunk → synthesize → merge pipeline.

use crate::audio::{MergedArtifact, Merger};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::document;
use crate::error::PipelineError;
use crate::text::{self, TextChunk};
use crate::tts::{AudioArtifact, Synthesizer};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation, checked between chunks and between merge groups.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct PipelineReport {
    pub chunk_count: usize,
    pub artifacts: Vec<AudioArtifact>,
    pub merged: Vec<MergedArtifact>,
    /// Chunks left out under the skip failure policy
    pub skipped: Vec<usize>,
}

pub struct Pipeline {
    config: PipelineConfig,
    synthesizer: Synthesizer,
    merger: Arc<Merger>,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        synthesizer: Synthesizer,
        merger: Merger,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            synthesizer,
            merger: Arc::new(merger),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Convert one document. Each stage finishes before the next starts.
    pub async fn run(&mut self, document_path: &Path) -> Result<PipelineReport, PipelineError> {
        if !document_path.exists() {
            return Err(PipelineError::DocumentNotFound(document_path.to_path_buf()));
        }
        if !document_path.is_file() {
            return Err(PipelineError::NotAFile(document_path.to_path_buf()));
        }

        let output_dir = self.config.output_dir.clone();
        std::fs::create_dir_all(&output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        eprintln!("Extracting text from {}...", document_path.display());
        let raw_text = document::extract_text(document_path).await?;
        if raw_text.trim().is_empty() {
            return Err(PipelineError::EmptyText(document_path.to_path_buf()));
        }
        log::info!("Extracted ~{} words", document::word_count(&raw_text));

        eprintln!("Splitting text into chunks...");
        let chunks = text::split(&raw_text, self.config.chunk_limit()?);
        drop(raw_text);
        eprintln!("Total chunks: {}", chunks.len());

        let (artifacts, skipped) = self.synthesize_all(&chunks, &output_dir).await?;

        let merged = if artifacts.is_empty() {
            log::warn!("No audio files to merge");
            eprintln!("No audio files to merge.");
            Vec::new()
        } else {
            eprintln!(
                "Merging {} audio files into ~{} final files...",
                artifacts.len(),
                self.config.merge_count
            );
            let merged = self.merge_in_background(artifacts.clone(), &output_dir).await?;
            eprintln!("Total merged files: {}", merged.len());
            merged
        };

        Ok(PipelineReport {
            chunk_count: chunks.len(),
            artifacts,
            merged,
            skipped,
        })
    }

    /// Run the merge on the blocking pool; each group is an ffmpeg encode.
    async fn merge_in_background(
        &self,
        artifacts: Vec<AudioArtifact>,
        output_dir: &Path,
    ) -> Result<Vec<MergedArtifact>, PipelineError> {
        let merger = Arc::clone(&self.merger);
        let cancel = self.cancel.clone();
        let target = self.config.merge_count;
        let output_dir = output_dir.to_path_buf();

        tokio::task::spawn_blocking(move || {
            merger.merge(&artifacts, target, &output_dir, &cancel, |m| {
                log::debug!("Group {} holds chunks {:?}", m.group_index, m.chunk_indices);
                eprintln!("Merged file created: {}", m.path.display());
            })
        })
        .await
        .map_err(PipelineError::MergeTask)?
    }

    /// Synthesize every chunk in order, one call at a time.
    async fn synthesize_all(
        &mut self,
        chunks: &[TextChunk],
        output_dir: &Path,
    ) -> Result<(Vec<AudioArtifact>, Vec<usize>), PipelineError> {
        eprintln!(
            "Converting chunks to {} audio ({}, voice {})...",
            self.synthesizer.format().extension(),
            self.synthesizer.provider_name(),
            self.synthesizer.voice()
        );

        let pb = ProgressBar::new(chunks.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut artifacts = Vec::with_capacity(chunks.len());
        let mut skipped = Vec::new();

        for chunk in chunks {
            if self.cancel.is_cancelled() {
                pb.abandon_with_message("cancelled");
                return Err(PipelineError::Cancelled);
            }

            match self.synthesizer.synthesize_chunk(chunk, output_dir).await {
                Ok(artifact) => {
                    let line = format!("Saved: {}", artifact.path.display());
                    status_line(&pb, &mut std::io::stderr(), &line);
                    artifacts.push(artifact);
                }
                Err(PipelineError::Synthesis { index, source })
                    if self.config.on_failure == FailurePolicy::Skip =>
                {
                    log::warn!("Skipping chunk {}: {}", index, source);
                    let line = format!("Skipped chunk {}: {}", index, source);
                    status_line(&pb, &mut std::io::stderr(), &line);
                    skipped.push(index);
                }
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok((artifacts, skipped))
    }
}

/// Print a line above the progress bar. Hidden bars (stderr not a
/// terminal) still get the line.
fn status_line(pb: &ProgressBar, out: &mut impl Write, line: &str) {
    pb.suspend(|| {
        let _ = writeln!(out, "{}", line);
    });
}
