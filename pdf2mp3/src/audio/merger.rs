//! Grouping per-chunk audio files and merging each group into one file.

use super::{AudioJoiner, MergeError};
use crate::error::PipelineError;
use crate::pipeline::CancelFlag;
use crate::tts::AudioArtifact;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tts_client::AudioFormat;

/// One merged output file covering a contiguous run of chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedArtifact {
    /// 1-based position among the merged files
    pub group_index: usize,
    pub path: PathBuf,
    /// Indices of the chunks whose audio it contains, in order
    pub chunk_indices: Vec<usize>,
}

/// File name for a merged group: final_part_NNN.<ext>
pub fn final_file_name(group_index: usize, format: AudioFormat) -> String {
    format!("final_part_{:03}.{}", group_index, format.extension())
}

/// Split `count` items into contiguous groups aiming at `target` groups.
///
/// Every group holds `max(1, count / target)` items except the last, which
/// holds whatever remains. The number of groups is therefore
/// `ceil(count / group_size)`, which exceeds `target` whenever `count` is
/// not a multiple of it: 20 items aimed at 7 groups gives 10 groups of 2.
pub fn plan_groups(count: usize, target: usize) -> Vec<Range<usize>> {
    let group_size = (count / target.max(1)).max(1);

    (0..count)
        .step_by(group_size)
        .map(|start| start..(start + group_size).min(count))
        .collect()
}

/// Concatenates per-chunk artifacts into grouped output files.
pub struct Merger {
    joiner: Box<dyn AudioJoiner>,
    format: AudioFormat,
}

impl Merger {
    pub fn new(joiner: Box<dyn AudioJoiner>, format: AudioFormat) -> Self {
        Self { joiner, format }
    }

    pub fn ensure_available(&self) -> Result<(), MergeError> {
        self.joiner.ensure_available()
    }

    /// Merge `artifacts` (in chunk order) into about `target` files.
    ///
    /// `on_merged` is called after each file is written. The cancel flag is
    /// checked before each group. An empty artifact list yields no files.
    pub fn merge(
        &self,
        artifacts: &[AudioArtifact],
        target: usize,
        output_dir: &Path,
        cancel: &CancelFlag,
        mut on_merged: impl FnMut(&MergedArtifact),
    ) -> Result<Vec<MergedArtifact>, PipelineError> {
        let mut merged = Vec::new();

        for (i, range) in plan_groups(artifacts.len(), target).into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let group = &artifacts[range];
            let inputs: Vec<&Path> = group.iter().map(|a| a.path.as_path()).collect();
            let group_index = i + 1;
            let path = output_dir.join(final_file_name(group_index, self.format));

            self.joiner.join(&inputs, &path)?;

            let artifact = MergedArtifact {
                group_index,
                path,
                chunk_indices: group.iter().map(|a| a.index).collect(),
            };
            on_merged(&artifact);
            merged.push(artifact);
        }

        Ok(merged)
    }
}
