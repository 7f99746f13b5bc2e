use super::chapters::read_source;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target chunk size, in characters, when none is given.
pub const DEFAULT_TARGET_LENGTH: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PretrainChunk {
    pub text: String,
}

/// Pack non-empty trimmed lines into chunks close to `target` characters.
///
/// Single greedy pass: a line joins the open chunk when that brings the chunk closer to
/// `target`, otherwise the chunk is closed and the line starts the next one. Lines are
/// concatenated without separators. Short trailing chunks are not merged.
pub fn pack_to_target_length(text: &str, target: usize) -> Vec<PretrainChunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line_len = line.chars().count();
        let joined = current_len + line_len;
        if joined.abs_diff(target) < current_len.abs_diff(target) {
            current.push_str(line);
            current_len = joined;
        } else {
            if !current.is_empty() {
                chunks.push(PretrainChunk {
                    text: std::mem::take(&mut current),
                });
            }
            current.push_str(line);
            current_len = line_len;
        }
    }
    if !current.is_empty() {
        chunks.push(PretrainChunk { text: current });
    }
    chunks
}

pub fn read_pretrain_chunks(path: impl AsRef<Path>, target: usize) -> Result<Vec<PretrainChunk>> {
    let text = read_source(path)?;
    Ok(pack_to_target_length(&text, target))
}
