//! Chapter summaries and multi-angle question/answer pairs.

use super::dialogue::turn_schema;
use super::profile::NovelProfile;
use super::TaskContext;
use crate::batch::{units_from, Unit, UnitOutcome};
use crate::client::CompletionClient;
use crate::dataset::{strip_phrases, ConversationRecord, Turn};
use crate::protocol::ChatRequest;
use crate::structured::validator::index;
use crate::structured::{validator_fn, FnValidator, SchemaValidator, ValidationOutcome, Validator};
use crate::types::Message;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct QaResponse {
    conversations: Vec<Vec<Turn>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub summary: String,
    pub chapter: usize,
}

/// Everything produced for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterQa {
    pub chapter: usize,
    pub summary: String,
    /// `[human, gpt]` pairs from every angle, in angle order
    pub pairs: Vec<Vec<Turn>>,
}

#[derive(Debug, Clone, Default)]
pub struct QaDataset {
    pub conversations: Vec<ConversationRecord>,
    pub summaries: Vec<SummaryRecord>,
    /// Chapters left out because one of their requests was exhausted
    pub failed_chapters: Vec<usize>,
}

impl QaDataset {
    fn push(&mut self, qa: ChapterQa) {
        self.summaries.push(SummaryRecord {
            summary: qa.summary,
            chapter: qa.chapter,
        });
        self.conversations
            .extend(qa.pairs.into_iter().map(|conversations| ConversationRecord {
                conversations,
                chapter: qa.chapter,
            }));
    }
}

/// `{"conversations": [[{"from": "human", ...}, {"from": "gpt", ...}], ...]}`
pub struct QaPairsValidator {
    shape: SchemaValidator,
    order: FnValidator<fn(&Value) -> ValidationOutcome>,
}

impl QaPairsValidator {
    pub fn new() -> Self {
        let schema = json!({
            "type": "object",
            "required": ["conversations"],
            "properties": {
                "conversations": {
                    "type": "array",
                    "items": {
                        "type": "array",
                        "minItems": 2,
                        "maxItems": 2,
                        "items": turn_schema()
                    }
                }
            }
        });
        Self {
            shape: SchemaValidator::lenient("qa_pairs", schema),
            order: validator_fn("qa_pair_order", human_then_gpt as fn(&Value) -> ValidationOutcome),
        }
    }
}

impl Default for QaPairsValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs after the shape check, so every pair is two well-formed turns.
fn human_then_gpt(value: &Value) -> ValidationOutcome {
    let pairs = value["conversations"].as_array().map(Vec::as_slice).unwrap_or_default();
    for (i, pair) in pairs.iter().enumerate() {
        if pair[0]["from"] != "human" || pair[1]["from"] != "gpt" {
            return ValidationOutcome::reject("pair must be ordered human -> gpt", index("conversations", i));
        }
    }
    ValidationOutcome::Accepted
}

impl Validator for QaPairsValidator {
    fn name(&self) -> &str {
        self.shape.name()
    }

    fn validate(&self, value: &Value) -> ValidationOutcome {
        match self.shape.validate(value) {
            ValidationOutcome::Accepted => self.order.validate(value),
            rejected => rejected,
        }
    }
}

/// Prompts for the summary request and the per-angle question requests.
pub struct QaPrompts {
    summary_system: String,
    question_system: String,
    temperature: f64,
    seed: Option<u64>,
}

impl QaPrompts {
    pub fn new(profile: &NovelProfile, temperature: f64, seed: Option<u64>) -> Self {
        let title = profile.display_title();
        let protagonist = &profile.protagonist;
        let background = if profile.synopsis.trim().is_empty() {
            String::new()
        } else {
            format!("About the novel:\n{}\n\n", profile.synopsis.trim())
        };

        let summary_system = format!(
            "You analyse chapters of {title}.\n{background}\
             Summarize the chapter you are given:\n\
             1. Plain text; separate aspects with line breaks\n\
             2. Cover the main plot, relationships between characters and how {protagonist} changes inside\n\
             3. Imitate the chapter's narrative style\n"
        );
        let question_system = format!(
            "You analyse chapters of {title}.\n{background}\
             For the question angle you are given, ask and answer as many independent questions \
             about the chapter as you can.\n\n\
             Questions:\n\
             - carry the context of the event naturally\n\
             - one main question per pair\n\n\
             Answers:\n\
             - bring in the background a reader needs\n\
             - imitate the chapter's narrative style\n\
             - refer to concrete names and events, never to \"the chapter\" or \"the novel\"\n\
             - answer directly without repeating the question\n\n\
             Return exactly this JSON shape:\n\
             {{\"conversations\": [[{{\"from\": \"human\", \"value\": \"question\"}}, {{\"from\": \"gpt\", \"value\": \"answer\"}}]]}}\n\n\
             Chapter:\n"
        );
        Self {
            summary_system,
            question_system,
            temperature,
            seed,
        }
    }

    pub fn summary(&self, unit: &Unit) -> ChatRequest {
        ChatRequest::new(vec![
            Message::system(self.summary_system.clone()),
            Message::user(format!("Chapter:\n{}", unit.text)),
        ])
        .temperature(self.temperature)
        .maybe_seed(self.seed)
        .tag(format!("qa/chapter-{}/summary", unit.position))
    }

    pub fn angle(&self, unit: &Unit, angle_index: usize, angle: &str) -> ChatRequest {
        ChatRequest::new(vec![
            Message::system(format!("{}{}", self.question_system, unit.text)),
            Message::user(format!("Question angle: {}", angle)),
        ])
        .temperature(self.temperature)
        .maybe_seed(self.seed)
        .tag(format!("qa/chapter-{}/angle-{}", unit.position, angle_index))
    }
}

/// Summary plus every angle for one chapter, sequentially. Any exhausted request fails the chapter.
pub async fn chapter_qa(
    client: &CompletionClient,
    prompts: &QaPrompts,
    angles: &[String],
    phrases: &[String],
    unit: &Unit,
) -> Result<ChapterQa> {
    info!(chapter = unit.position, chars = unit.text.chars().count(), "processing chapter");
    let summary = client.send(&prompts.summary(unit)).await?;

    let validator = QaPairsValidator::new();
    let mut pairs = Vec::new();
    for (i, angle) in angles.iter().enumerate() {
        let value = client
            .send_structured(&prompts.angle(unit, i, angle), &validator)
            .await?;
        let response: QaResponse = serde_json::from_value(value)?;
        pairs.extend(response.conversations);
    }

    for turn in pairs.iter_mut().flatten() {
        turn.value = strip_phrases(&turn.value, phrases);
    }

    Ok(ChapterQa {
        chapter: unit.position,
        summary,
        pairs,
    })
}

pub async fn generate_qa(ctx: &TaskContext, chapters: Vec<String>) -> Result<QaDataset> {
    let prompts = Arc::new(QaPrompts::new(&ctx.profile, ctx.temperature, ctx.seed));
    let angles: Arc<Vec<String>> = Arc::new(
        ctx.profile
            .qa_angles
            .iter()
            .filter(|a| !a.trim().is_empty())
            .cloned()
            .collect(),
    );
    let phrases = Arc::new(ctx.profile.effective_strip_phrases());
    let client = ctx.client.clone();

    let outcome = ctx
        .executor
        .run_batch(units_from(chapters), move |unit| {
            let client = client.clone();
            let prompts = prompts.clone();
            let angles = angles.clone();
            let phrases = phrases.clone();
            async move { chapter_qa(&client, &prompts, &angles, &phrases, &unit).await }
        })
        .await?;

    let mut dataset = QaDataset::default();
    for (chapter, result) in outcome {
        match result {
            UnitOutcome::Completed(qa) => dataset.push(qa),
            UnitOutcome::Failed(failure) => {
                warn!(chapter, error = failure.message.as_str(), "chapter left out of QA dataset");
                dataset.failed_chapters.push(chapter);
            }
        }
    }
    info!(
        pairs = dataset.conversations.len(),
        summaries = dataset.summaries.len(),
        failed = dataset.failed_chapters.len(),
        "qa generation finished"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordered_pairs() {
        let v = json!({"conversations": [[
            {"from": "human", "value": "q"},
            {"from": "gpt", "value": "a"}
        ]]});
        assert!(QaPairsValidator::new().validate(&v).is_accepted());
    }

    #[test]
    fn rejects_wrong_length_and_order() {
        let validator = QaPairsValidator::new();
        let short = json!({"conversations": [[{"from": "human", "value": "q"}]]});
        assert_eq!(
            validator.validate(&short).rejection().unwrap().path.as_deref(),
            Some("conversations[0]")
        );
        let reversed = json!({"conversations": [[
            {"from": "gpt", "value": "a"},
            {"from": "human", "value": "q"}
        ]]});
        let outcome = validator.validate(&reversed);
        let err = outcome.rejection().unwrap();
        assert_eq!(err.path.as_deref(), Some("conversations[0]"));
        assert!(err.message.contains("human -> gpt"));
    }

    #[test]
    fn angle_requests_embed_chapter_and_angle() {
        let prompts = QaPrompts::new(&NovelProfile::default(), 0.7, None);
        let unit = Unit::new(2, "正文内容");
        let req = prompts.angle(&unit, 1, "Plot");
        assert!(req.messages()[0].content.ends_with("正文内容"));
        assert_eq!(req.messages()[1].content, "Question angle: Plot");
        assert_eq!(req.get_tag(), Some("qa/chapter-2/angle-1"));
        assert_eq!(prompts.summary(&unit).get_temperature(), 0.7);
    }
}
