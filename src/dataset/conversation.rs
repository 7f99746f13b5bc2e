//! Sharegpt-style conversation records and the transforms that clean them.

use super::fallback::EmptyTurnPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Human,
    Gpt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub from: Speaker,
    pub value: String,
}

impl Turn {
    pub fn human(value: impl Into<String>) -> Self {
        Self {
            from: Speaker::Human,
            value: value.into(),
        }
    }

    pub fn gpt(value: impl Into<String>) -> Self {
        Self {
            from: Speaker::Gpt,
            value: value.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// One conversation tied to the chapter it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub conversations: Vec<Turn>,
    pub chapter: usize,
}

/// One record per non-empty group, all tagged with `chapter`.
pub fn flatten_groups<I>(chapter: usize, groups: I) -> Vec<ConversationRecord>
where
    I: IntoIterator<Item = Vec<Turn>>,
{
    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|conversations| ConversationRecord {
            conversations,
            chapter,
        })
        .collect()
}

/// Join runs of turns by the same speaker into one turn, values separated by `\n`.
pub fn merge_consecutive(turns: Vec<Turn>) -> Vec<Turn> {
    let mut merged: Vec<Turn> = Vec::with_capacity(turns.len());
    for turn in turns {
        match merged.last_mut() {
            Some(last) if last.from == turn.from => {
                last.value.push('\n');
                last.value.push_str(&turn.value);
            }
            _ => merged.push(turn),
        }
    }
    merged
}

/// Trim to a `human ... gpt` conversation of at least two turns.
///
/// Leading `gpt` turns and trailing `human` turns are dropped. Returns `None` when what is
/// left is shorter than two turns. Expects turns already merged, so speakers alternate.
pub fn enforce_shape(turns: Vec<Turn>) -> Option<Vec<Turn>> {
    let start = turns.iter().position(|t| t.from == Speaker::Human)?;
    let end = turns.iter().rposition(|t| t.from == Speaker::Gpt)?;
    if end <= start {
        return None;
    }
    let shaped: Vec<Turn> = turns.into_iter().skip(start).take(end - start + 1).collect();
    (shaped.len() >= 2).then_some(shaped)
}

/// Remove every occurrence of each phrase, in the order given.
pub fn strip_phrases(value: &str, phrases: &[String]) -> String {
    phrases
        .iter()
        .filter(|p| !p.is_empty())
        .fold(value.to_string(), |acc, p| acc.replace(p.as_str(), ""))
}

/// Empty-turn handling, merge and shape enforcement for one record.
pub fn clean_conversation(
    record: ConversationRecord,
    empty_turns: &mut EmptyTurnPolicy,
) -> Option<ConversationRecord> {
    let filled = empty_turns.apply(record.conversations);
    let shaped = enforce_shape(merge_consecutive(filled))?;
    Some(ConversationRecord {
        conversations: shaped,
        chapter: record.chapter,
    })
}

/// [`clean_conversation`] over a dataset, dropping records that cannot be shaped.
pub fn clean_records(
    records: Vec<ConversationRecord>,
    empty_turns: &mut EmptyTurnPolicy,
) -> Vec<ConversationRecord> {
    records
        .into_iter()
        .filter_map(|r| clean_conversation(r, empty_turns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_same_speaker_runs() {
        let merged = merge_consecutive(vec![
            Turn::human("a"),
            Turn::human("b"),
            Turn::gpt("c"),
            Turn::gpt("d"),
            Turn::human("e"),
        ]);
        assert_eq!(
            merged,
            vec![Turn::human("a\nb"), Turn::gpt("c\nd"), Turn::human("e")]
        );
    }

    #[test]
    fn shape_trims_edges() {
        let shaped = enforce_shape(vec![
            Turn::gpt("intro"),
            Turn::human("q"),
            Turn::gpt("a"),
            Turn::human("dangling"),
        ])
        .unwrap();
        assert_eq!(shaped, vec![Turn::human("q"), Turn::gpt("a")]);
    }

    #[test]
    fn shape_rejects_one_sided_conversations() {
        assert!(enforce_shape(vec![Turn::gpt("x"), Turn::gpt("y")]).is_none());
        assert!(enforce_shape(vec![Turn::human("x")]).is_none());
        assert!(enforce_shape(vec![Turn::gpt("a"), Turn::human("q")]).is_none());
        assert!(enforce_shape(Vec::new()).is_none());
    }

    #[test]
    fn strips_longer_phrases_first_when_listed_first() {
        let phrases = vec!["在章节中".to_string(), "章节中".to_string()];
        assert_eq!(strip_phrases("在章节中他来了，章节中", &phrases), "他来了，");
    }

    #[test]
    fn flatten_skips_empty_groups() {
        let records = flatten_groups(3, vec![vec![], vec![Turn::human("a"), Turn::gpt("b")]]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chapter, 3);
    }

    #[test]
    fn clean_drops_empty_turns_then_merges() {
        let record = ConversationRecord {
            conversations: vec![
                Turn::human("q1"),
                Turn::gpt(" "),
                Turn::human("q2"),
                Turn::gpt("a"),
            ],
            chapter: 0,
        };
        let cleaned = clean_conversation(record, &mut EmptyTurnPolicy::drop_all()).unwrap();
        assert_eq!(
            cleaned.conversations,
            vec![Turn::human("q1\nq2"), Turn::gpt("a")]
        );
    }
}
