//! novel-datagen: build training datasets from a plain-text novel.
//!
//! Usage:
//!   novel-datagen pretrain        Pack the novel into `[{text}]` chunks
//!   novel-datagen dialogue        Protagonist dialogues in sharegpt format
//!   novel-datagen qa              Chapter summaries and QA pairs
//!   novel-datagen alpaca          Convert a sharegpt file to alpaca records
//!   novel-datagen extract-inputs  Join the `input` field of an alpaca file
//!
//! Client settings come from the environment (a `.env` file is loaded first) and can be
//! overridden by the global flags.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use novel_datagen::config::ClientConfig;
use novel_datagen::dataset::{
    extract_inputs, read_json, records_to_alpaca, ConversationRecord, EmptyTurnPolicy,
    FallbackPolicy, FallbackSelection, OutputTarget,
};
use novel_datagen::source::{LeadingFragment, DEFAULT_TARGET_LENGTH};
use novel_datagen::tasks::{
    dialogue_and_save, pretrain_and_save, qa_and_save, ChapterSource, NovelProfile, TaskContext,
};
use novel_datagen::CompletionClientBuilder;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "novel-datagen", version)]
#[command(about = "Turn a plain-text novel into pretraining, dialogue and QA datasets")]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    /// YAML novel profile (title, protagonist, synopsis, QA angles)
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Attempts per request
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Fixed pause between attempts, in milliseconds
    #[arg(long, global = true)]
    retry_delay_ms: Option<u64>,

    /// Per-call timeout, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Requests in flight at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[arg(long, global = true)]
    temperature: Option<f64>,

    /// Sampling seed; 0 means unset
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl ClientArgs {
    fn apply(&self, cfg: &mut ClientConfig) {
        if let Some(v) = &self.model {
            cfg.model = v.clone();
        }
        if let Some(v) = &self.base_url {
            cfg.base_url = v.clone();
        }
        if let Some(v) = self.max_retries {
            cfg.max_retries = v;
        }
        if let Some(v) = self.retry_delay_ms {
            cfg.retry_delay_ms = v;
        }
        if let Some(v) = self.timeout_secs {
            cfg.timeout_secs = v;
        }
        if let Some(v) = self.concurrency {
            cfg.concurrency = v;
        }
        if let Some(v) = self.temperature {
            cfg.temperature = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = (v != 0).then_some(v);
        }
    }
}

#[derive(Args, Debug)]
struct ChapterArgs {
    #[arg(long, default_value = "novel.txt")]
    novel: PathBuf,

    /// Regex matching a chapter title line, newline included
    #[arg(long)]
    title_pattern: Option<String>,

    /// Fail when text precedes the first chapter title
    #[arg(long)]
    strict: bool,
}

impl ChapterArgs {
    fn source(&self) -> anyhow::Result<ChapterSource> {
        let title_pattern = self
            .title_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("invalid --title-pattern")?;
        Ok(ChapterSource {
            title_pattern,
            leading: if self.strict {
                LeadingFragment::Reject
            } else {
                LeadingFragment::Keep
            },
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack the novel into pretraining chunks
    Pretrain {
        #[arg(long, default_value = "novel.txt")]
        novel: PathBuf,
        #[arg(long, default_value = "datasets/pretrain.json")]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TARGET_LENGTH)]
        target_length: usize,
        #[arg(long)]
        force: bool,
    },
    /// Extract protagonist dialogues per chapter (sharegpt)
    Dialogue {
        #[command(flatten)]
        chapters: ChapterArgs,
        #[arg(long, default_value = "datasets/sharegpt.json")]
        output: PathBuf,
        #[arg(long)]
        force: bool,
        /// Merge same-speaker turns, fill or drop empty turns and enforce human..gpt shape
        #[arg(long)]
        clean: bool,
        /// Substitutes for empty human turns (repeatable)
        #[arg(long = "human-fallback")]
        human_fallback: Vec<String>,
        /// Substitutes for empty gpt turns (repeatable)
        #[arg(long = "gpt-fallback")]
        gpt_fallback: Vec<String>,
        /// Pick substitutes at random with this seed instead of round robin
        #[arg(long)]
        fallback_seed: Option<u64>,
    },
    /// Summarize chapters and generate QA pairs from several angles
    Qa {
        #[command(flatten)]
        chapters: ChapterArgs,
        #[arg(long, default_value = "datasets/qa-conversations.json")]
        conversations: PathBuf,
        #[arg(long, default_value = "datasets/qa-summaries.json")]
        summaries: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Convert a sharegpt dataset into alpaca records
    Alpaca {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "datasets/alpaca.json")]
        output: PathBuf,
        /// Defaults to the profile's instruction
        #[arg(long)]
        instruction: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Join the `input` field of an alpaca dataset with newlines
    ExtractInputs {
        #[arg(long)]
        input: PathBuf,
        /// Named split when the file is an object of splits
        #[arg(long)]
        split: Option<String>,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let profile = match &cli.profile {
        Some(path) => NovelProfile::load(path)?,
        None => NovelProfile::default(),
    };

    match cli.command {
        Command::Pretrain {
            novel,
            output,
            target_length,
            force,
        } => {
            if target_length == 0 {
                bail!("--target-length must be positive");
            }
            pretrain_and_save(&novel, target_length, &OutputTarget::new(output, force))?;
        }
        Command::Dialogue {
            chapters,
            output,
            force,
            clean,
            human_fallback,
            gpt_fallback,
            fallback_seed,
        } => {
            let ctx = task_context(&cli.client, profile)?;
            let selection = fallback_seed
                .map(FallbackSelection::Seeded)
                .unwrap_or(FallbackSelection::RoundRobin);
            let cleanup = if clean {
                let mut policy = EmptyTurnPolicy::drop_all();
                if !human_fallback.is_empty() {
                    policy = policy.with_human(FallbackPolicy::new(human_fallback, selection)?);
                }
                if !gpt_fallback.is_empty() {
                    policy = policy.with_gpt(FallbackPolicy::new(gpt_fallback, selection)?);
                }
                Some(policy)
            } else {
                None
            };
            let target = OutputTarget::new(output, force);
            if let Some(dataset) =
                dialogue_and_save(&ctx, &chapters.source()?, &chapters.novel, &target, cleanup).await?
            {
                info!(
                    records = dataset.records.len(),
                    failed_chapters = ?dataset.failed_chapters,
                    "dialogue dataset written"
                );
            }
        }
        Command::Qa {
            chapters,
            conversations,
            summaries,
            force,
        } => {
            let ctx = task_context(&cli.client, profile)?;
            if let Some(dataset) = qa_and_save(
                &ctx,
                &chapters.source()?,
                &chapters.novel,
                &OutputTarget::new(conversations, force),
                &OutputTarget::new(summaries, force),
            )
            .await?
            {
                info!(
                    pairs = dataset.conversations.len(),
                    summaries = dataset.summaries.len(),
                    failed_chapters = ?dataset.failed_chapters,
                    "qa datasets written"
                );
            }
        }
        Command::Alpaca {
            input,
            output,
            instruction,
            force,
        } => {
            let target = OutputTarget::new(output, force);
            if target.should_skip() {
                info!(path = %target.path.display(), "output exists, skipping");
                return Ok(());
            }
            let records: Vec<ConversationRecord> = read_json(&input)
                .with_context(|| format!("reading sharegpt dataset {}", input.display()))?;
            let instruction = instruction.unwrap_or_else(|| profile.alpaca_instruction());
            let alpaca = records_to_alpaca(&records, &instruction);
            target.write_json(&alpaca)?;
            info!(records = alpaca.len(), "alpaca dataset written");
        }
        Command::ExtractInputs {
            input,
            split,
            output,
            force,
        } => {
            let target = OutputTarget::new(output, force);
            if target.should_skip() {
                info!(path = %target.path.display(), "output exists, skipping");
                return Ok(());
            }
            let dataset: serde_json::Value = read_json(&input)
                .with_context(|| format!("reading alpaca dataset {}", input.display()))?;
            let text = extract_inputs(&dataset, split.as_deref())?;
            target.write_text(&text)?;
        }
    }
    Ok(())
}

/// Environment first, then flags; validated only once both are in.
fn client_config(args: &ClientArgs) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("loading client configuration")?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn task_context(args: &ClientArgs, profile: NovelProfile) -> anyhow::Result<TaskContext> {
    let config = client_config(args)?;
    info!(?config, "client configuration");

    let client = CompletionClientBuilder::from_config(&config).build()?;
    Ok(TaskContext::new(Arc::new(client), profile, &config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_invalid_environment_before_validation() {
        std::env::set_var("NOVEL_DATAGEN_CONCURRENCY", "0");

        let cli = Cli::try_parse_from(["novel-datagen", "--concurrency", "4", "pretrain"]).unwrap();
        let config = client_config(&cli.client).unwrap();
        assert_eq!(config.concurrency, 4);

        let cli = Cli::try_parse_from(["novel-datagen", "pretrain"]).unwrap();
        let err = client_config(&cli.client).unwrap_err();
        assert!(err.to_string().contains("concurrency"));

        std::env::remove_var("NOVEL_DATAGEN_CONCURRENCY");
    }
}
