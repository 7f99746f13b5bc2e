//! Per-chapter dialogue extraction (sharegpt format).

use super::profile::NovelProfile;
use super::TaskContext;
use crate::batch::{units_from, PromptBuilder, Unit, UnitOutcome};
use crate::dataset::{flatten_groups, ConversationRecord, Turn};
use crate::protocol::ChatRequest;
use crate::structured::{SchemaValidator, ValidationOutcome, Validator};
use crate::types::Message;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct DialogueResponse {
    conversations: Vec<TalkGroup>,
}

#[derive(Debug, Deserialize)]
struct TalkGroup {
    talk: Vec<Turn>,
}

/// Chapter text in, protagonist dialogue groups out. Sampled at temperature 0.
pub struct DialoguePrompt {
    system: String,
    seed: Option<u64>,
}

impl DialoguePrompt {
    pub fn new(profile: &NovelProfile, seed: Option<u64>) -> Self {
        Self {
            system: system_prompt(profile),
            seed,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }
}

impl PromptBuilder for DialoguePrompt {
    fn build(&self, unit: &Unit) -> ChatRequest {
        ChatRequest::new(vec![
            Message::system(self.system.clone()),
            Message::user(unit.text.clone()),
        ])
        .temperature(0.0)
        .maybe_seed(self.seed)
        .tag(format!("dialogue/chapter-{}", unit.position))
    }
}

fn system_prompt(profile: &NovelProfile) -> String {
    let title = profile.display_title();
    let protagonist = &profile.protagonist;
    let mut prompt = format!(
        "You summarize chapters of {title} as dialogues of its protagonist, {protagonist}.\n\n\
         Response format:\n\
         1. A JSON object with a `conversations` field\n\
         2. `conversations` is an array of dialogue objects\n\
         3. Each dialogue object has a `talk` array\n\
         4. Each `talk` item has `from` and `value` fields\n\
         5. `from` is either \"gpt\" or \"human\"\n\
         6. If {protagonist} does not speak in the chapter, return an empty `conversations` array\n\n\
         Every dialogue must contain both human and gpt turns.\n\n\
         Content rules:\n\
         - gpt is what {protagonist} says\n\
         - human is what other characters say, or a situation described as speech\n\
         - stay faithful to the text, its relationships and emotions\n\
         - focus on key plot points and interactions\n\
         - keep each character's voice natural\n"
    );
    if !profile.aliases.is_empty() {
        prompt.push_str(&format!(
            "\n{protagonist} may also be called: {}\n",
            profile.aliases.join(", ")
        ));
    }
    if !profile.synopsis.trim().is_empty() {
        prompt.push_str(&format!("\nAbout the novel:\n{}\n", profile.synopsis.trim()));
    }
    if !profile.character_notes.trim().is_empty() {
        prompt.push_str(&format!("\nCharacters:\n{}\n", profile.character_notes.trim()));
    }
    prompt.push_str(
        "\nReturn exactly this JSON shape:\n\
         {\"conversations\": [{\"talk\": [{\"from\": \"human\", \"value\": \"...\"}, {\"from\": \"gpt\", \"value\": \"...\"}]}]}",
    );
    prompt
}

/// Schema of one `{"from": "human"|"gpt", "value": string}` item.
pub(crate) fn turn_schema() -> Value {
    json!({
        "type": "object",
        "required": ["from", "value"],
        "properties": {
            "from": {"type": "string", "enum": ["human", "gpt"]},
            "value": {"type": "string"}
        }
    })
}

/// `{"conversations": [{"talk": [{"from": "human"|"gpt", "value": string}]}]}`
pub struct ConversationGroupsValidator {
    schema: SchemaValidator,
}

impl ConversationGroupsValidator {
    pub fn new() -> Self {
        let schema = json!({
            "type": "object",
            "required": ["conversations"],
            "properties": {
                "conversations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["talk"],
                        "properties": {
                            "talk": {"type": "array", "items": turn_schema()}
                        }
                    }
                }
            }
        });
        Self {
            schema: SchemaValidator::lenient("conversation_groups", schema),
        }
    }
}

impl Default for ConversationGroupsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for ConversationGroupsValidator {
    fn name(&self) -> &str {
        self.schema.name()
    }

    fn validate(&self, value: &Value) -> ValidationOutcome {
        self.schema.validate(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DialogueDataset {
    pub records: Vec<ConversationRecord>,
    /// Chapters whose request was exhausted; they contribute no records
    pub failed_chapters: Vec<usize>,
}

pub async fn generate_dialogue(ctx: &TaskContext, chapters: Vec<String>) -> Result<DialogueDataset> {
    let prompts = Arc::new(DialoguePrompt::new(&ctx.profile, ctx.seed));
    let outcome = ctx
        .executor
        .run_structured(
            ctx.client.clone(),
            units_from(chapters),
            prompts,
            Arc::new(ConversationGroupsValidator::new()),
        )
        .await?;

    let mut dataset = DialogueDataset::default();
    for (chapter, result) in outcome {
        match result {
            UnitOutcome::Completed(value) => match serde_json::from_value::<DialogueResponse>(value) {
                Ok(response) => dataset.records.extend(flatten_groups(
                    chapter,
                    response.conversations.into_iter().map(|g| g.talk),
                )),
                Err(e) => {
                    warn!(chapter, error = %e, "validated dialogue did not decode");
                    dataset.failed_chapters.push(chapter);
                }
            },
            UnitOutcome::Failed(failure) => {
                warn!(chapter, error = failure.message.as_str(), "chapter produced no dialogue");
                dataset.failed_chapters.push(chapter);
            }
        }
    }
    info!(
        records = dataset.records.len(),
        failed = dataset.failed_chapters.len(),
        "dialogue generation finished"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_groups() {
        let v = json!({"conversations": [{"talk": [
            {"from": "human", "value": "你是谁"},
            {"from": "gpt", "value": "我是李火旺"}
        ]}]});
        let validator = ConversationGroupsValidator::new();
        assert!(validator.validate(&v).is_accepted());
        assert!(validator.validate(&json!({"conversations": []})).is_accepted());
    }

    #[test]
    fn rejection_names_the_field() {
        let v = json!({"conversations": [{"talk": [{"from": "narrator", "value": "..."}]}]});
        let validator = ConversationGroupsValidator::new();
        let outcome = validator.validate(&v);
        let err = outcome.rejection().unwrap();
        assert_eq!(err.path.as_deref(), Some("conversations[0].talk[0].from"));
        assert!(err.message.contains("not in allowed enum"));

        let missing = validator.validate(&json!({"conversations": [{}]}));
        assert_eq!(
            missing.rejection().unwrap().path.as_deref(),
            Some("conversations[0].talk")
        );
    }

    #[test]
    fn prompt_is_deterministic_and_cold() {
        let prompt = DialoguePrompt::new(&NovelProfile::default(), Some(7));
        let unit = Unit::new(1, "正文");
        let a = prompt.build(&unit);
        assert_eq!(a, prompt.build(&unit));
        assert_eq!(a.get_temperature(), 0.0);
        assert_eq!(a.get_seed(), Some(7));
        assert_eq!(a.messages()[1].content, "正文");
    }
}
