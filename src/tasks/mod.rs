//! Dataset generation jobs.
//!
//! Each job reads chapters, fans requests out through the batch executor and reshapes the
//! results. The `*_and_save` functions add skip-if-exists and JSON output on top.

mod dialogue;
mod pretrain;
mod profile;
mod qa;

pub use dialogue::{generate_dialogue, ConversationGroupsValidator, DialogueDataset, DialoguePrompt};
pub use pretrain::pretrain_and_save;
pub use profile::{default_qa_angles, NovelProfile};
pub use qa::{chapter_qa, generate_qa, ChapterQa, QaDataset, QaPairsValidator, QaPrompts, SummaryRecord};

use crate::batch::BatchExecutor;
use crate::client::CompletionClient;
use crate::config::ClientConfig;
use crate::dataset::{clean_records, EmptyTurnPolicy, OutputTarget};
use crate::source::{read_chapters, LeadingFragment};
use crate::Result;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Shared inputs for the generation jobs.
#[derive(Clone)]
pub struct TaskContext {
    pub client: Arc<CompletionClient>,
    pub executor: BatchExecutor,
    pub profile: Arc<NovelProfile>,
    /// Temperature for QA requests; dialogue extraction always uses 0
    pub temperature: f64,
    pub seed: Option<u64>,
}

impl TaskContext {
    pub fn new(client: Arc<CompletionClient>, profile: NovelProfile, config: &ClientConfig) -> Self {
        Self {
            client,
            executor: BatchExecutor::with_concurrency(config.concurrency),
            profile: Arc::new(profile),
            temperature: config.temperature,
            seed: config.seed,
        }
    }
}

/// How chapters are located in the source file.
#[derive(Debug, Clone, Default)]
pub struct ChapterSource {
    pub title_pattern: Option<Regex>,
    pub leading: LeadingFragment,
}

impl ChapterSource {
    pub fn read(&self, novel: &Path) -> Result<Vec<String>> {
        read_chapters(novel, self.title_pattern.as_ref(), self.leading)
    }
}

/// Dialogue dataset, optionally cleaned. Returns `None` when skipped.
pub async fn dialogue_and_save(
    ctx: &TaskContext,
    source: &ChapterSource,
    novel: &Path,
    output: &OutputTarget,
    cleanup: Option<EmptyTurnPolicy>,
) -> Result<Option<DialogueDataset>> {
    if output.should_skip() {
        info!(path = %output.path.display(), "output exists, skipping");
        return Ok(None);
    }
    let chapters = source.read(novel)?;
    let mut dataset = generate_dialogue(ctx, chapters).await?;
    if let Some(mut policy) = cleanup {
        dataset.records = clean_records(dataset.records, &mut policy);
    }
    output.write_json(&dataset.records)?;
    Ok(Some(dataset))
}

/// QA conversations and chapter summaries. Skipped only when both files exist.
pub async fn qa_and_save(
    ctx: &TaskContext,
    source: &ChapterSource,
    novel: &Path,
    conversations: &OutputTarget,
    summaries: &OutputTarget,
) -> Result<Option<QaDataset>> {
    if conversations.should_skip() && summaries.should_skip() {
        info!(
            conversations = %conversations.path.display(),
            summaries = %summaries.path.display(),
            "outputs exist, skipping"
        );
        return Ok(None);
    }
    let chapters = source.read(novel)?;
    let dataset = generate_qa(ctx, chapters).await?;
    conversations.write_json(&dataset.conversations)?;
    summaries.write_json(&dataset.summaries)?;
    Ok(Some(dataset))
}
