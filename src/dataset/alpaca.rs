//! Instruction/response (alpaca) records.

use super::conversation::{ConversationRecord, Speaker, Turn};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlpacaRecord {
    pub instruction: String,
    #[serde(default)]
    pub input: String,
    pub output: String,
}

/// Build a record from the first two turns: `input` is the first, `output` the second.
///
/// Returns `None` for conversations shorter than two turns or not opening `human`, `gpt`.
pub fn conversation_to_alpaca(turns: &[Turn], instruction: &str) -> Option<AlpacaRecord> {
    match turns {
        [first, second, ..] if first.from == Speaker::Human && second.from == Speaker::Gpt => {
            Some(AlpacaRecord {
                instruction: instruction.to_string(),
                input: first.value.clone(),
                output: second.value.clone(),
            })
        }
        _ => None,
    }
}

pub fn alpaca_to_conversation(record: &AlpacaRecord, chapter: usize) -> ConversationRecord {
    ConversationRecord {
        conversations: vec![Turn::human(record.input.clone()), Turn::gpt(record.output.clone())],
        chapter,
    }
}

pub fn records_to_alpaca(records: &[ConversationRecord], instruction: &str) -> Vec<AlpacaRecord> {
    records
        .iter()
        .filter_map(|r| conversation_to_alpaca(&r.conversations, instruction))
        .collect()
}

/// Join the `input` field of every record with `\n`.
///
/// `dataset` is either an array of records or an object of named splits, in which case
/// `split` selects one.
pub fn extract_inputs(dataset: &Value, split: Option<&str>) -> Result<String> {
    let records = match (dataset, split) {
        (Value::Array(items), None) => items,
        (Value::Object(splits), Some(key)) => splits
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::configuration_with_context(
                    format!("dataset split '{}' not found", key),
                    ErrorContext::new().with_field_path(key),
                )
            })?,
        (Value::Array(_), Some(key)) => {
            return Err(Error::configuration(format!(
                "dataset has no splits, cannot select '{}'",
                key
            )))
        }
        _ => {
            return Err(Error::configuration(
                "dataset must be an array of records or an object of splits",
            ))
        }
    };

    let inputs = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            r.get("input").and_then(Value::as_str).ok_or_else(|| {
                Error::configuration_with_context(
                    "record has no string 'input' field",
                    ErrorContext::new().with_field_path(format!("[{}].input", i)),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(inputs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_two_turns_become_record() {
        let turns = vec![Turn::human("q"), Turn::gpt("a"), Turn::human("more")];
        let record = conversation_to_alpaca(&turns, "扮演主角").unwrap();
        assert_eq!(record.input, "q");
        assert_eq!(record.output, "a");
        assert_eq!(record.instruction, "扮演主角");
        assert!(conversation_to_alpaca(&turns[..1], "x").is_none());
    }

    #[test]
    fn converts_back_to_conversation() {
        let record = AlpacaRecord {
            instruction: "i".into(),
            input: "q".into(),
            output: "a".into(),
        };
        let conv = alpaca_to_conversation(&record, 2);
        assert_eq!(conv.conversations, vec![Turn::human("q"), Turn::gpt("a")]);
    }

    #[test]
    fn extracts_inputs_from_named_split() {
        let data = json!({"train": [{"input": "一"}, {"input": "二"}]});
        assert_eq!(extract_inputs(&data, Some("train")).unwrap(), "一\n二");
        assert!(extract_inputs(&data, Some("test")).is_err());
        assert!(extract_inputs(&data, None).is_err());
    }
}
