use crate::dataset::OutputTarget;
use crate::source::read_pretrain_chunks;
use crate::Result;
use std::path::Path;
use tracing::info;

/// Pack the novel into `[{text}]` chunks and write them. Returns `None` when skipped.
pub fn pretrain_and_save(
    novel: &Path,
    target_length: usize,
    output: &OutputTarget,
) -> Result<Option<usize>> {
    if output.should_skip() {
        info!(path = %output.path.display(), "output exists, skipping");
        return Ok(None);
    }
    let chunks = read_pretrain_chunks(novel, target_length)?;
    output.write_json(&chunks)?;
    info!(chunks = chunks.len(), target_length, "pretrain dataset written");
    Ok(Some(chunks.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_chunks_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let novel = dir.path().join("novel.txt");
        std::fs::write(&novel, "abcde\nfghij\nk\n").unwrap();
        let out = OutputTarget::new(dir.path().join("datasets/pretrain.json"), false);

        assert_eq!(pretrain_and_save(&novel, 10, &out).unwrap(), Some(2));
        let written: serde_json::Value = crate::dataset::read_json(&out.path).unwrap();
        assert_eq!(written[0]["text"], "abcdefghij");
        assert_eq!(pretrain_and_save(&novel, 10, &out).unwrap(), None);
    }
}
