use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the prompts need to know about the novel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NovelProfile {
    pub title: String,
    /// Character whose lines become the `gpt` side of dialogues
    pub protagonist: String,
    /// Other names the protagonist goes by in the text
    pub aliases: Vec<String>,
    pub synopsis: String,
    /// Free-form relationship notes passed to the dialogue prompt
    pub character_notes: String,
    /// Removed from every QA question and answer, in order.
    /// Empty means the built-in list for the title.
    pub strip_phrases: Vec<String>,
    pub qa_angles: Vec<String>,
    /// Instruction used when converting dialogues to alpaca records
    pub alpaca_instruction: Option<String>,
}

impl Default for NovelProfile {
    fn default() -> Self {
        Self {
            title: String::new(),
            protagonist: "the protagonist".to_string(),
            aliases: Vec::new(),
            synopsis: String::new(),
            character_notes: String::new(),
            strip_phrases: Vec::new(),
            qa_angles: default_qa_angles(),
            alpaca_instruction: None,
        }
    }
}

pub fn default_qa_angles() -> Vec<String> {
    [
        "Terms: names, objects and concepts the chapter explains or that a reader must notice; what they look like, what they do and why they exist",
        "Plot: in a concrete scene, who did what",
        "Dialogue: in a concrete scene, who said what, when and where, and what the speaker meant by it",
        "In-depth questions and answers that help a reader understand this chapter",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl NovelProfile {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let profile: Self = serde_yaml::from_str(raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid novel profile: {}", e),
                ErrorContext::new().with_source("profile"),
            )
        })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read novel profile: {}", e),
                ErrorContext::new().with_source(path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.qa_angles.iter().all(|a| a.trim().is_empty()) {
            return Err(Error::configuration_with_context(
                "at least one QA angle is required",
                ErrorContext::new().with_field_path("qa_angles"),
            ));
        }
        Ok(())
    }

    /// `《title》` when a title is set, otherwise "the novel".
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            "the novel".to_string()
        } else {
            format!("《{}》", self.title.trim())
        }
    }

    pub fn effective_strip_phrases(&self) -> Vec<String> {
        if !self.strip_phrases.is_empty() {
            return self.strip_phrases.clone();
        }
        let mut phrases = vec!["在章节中".to_string(), "章节中".to_string()];
        let title = self.title.trim();
        if !title.is_empty() {
            for suffix in ["中", "的"] {
                phrases.push(format!("在《{}》{}", title, suffix));
            }
            for suffix in ["中", "的"] {
                phrases.push(format!("《{}》{}", title, suffix));
            }
        }
        phrases
    }

    pub fn alpaca_instruction(&self) -> String {
        self.alpaca_instruction.clone().unwrap_or_else(|| {
            format!(
                "You are {} from {}. Reply in character.",
                self.protagonist,
                self.display_title()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_keep_defaults() {
        let profile = NovelProfile::from_yaml_str("title: 道诡异仙\nprotagonist: 李火旺\n").unwrap();
        assert_eq!(profile.protagonist, "李火旺");
        assert_eq!(profile.qa_angles.len(), 4);
        assert_eq!(profile.display_title(), "《道诡异仙》");
    }

    #[test]
    fn title_phrases_are_stripped_by_default() {
        let profile = NovelProfile {
            title: "道诡异仙".into(),
            ..NovelProfile::default()
        };
        let phrases = profile.effective_strip_phrases();
        assert_eq!(phrases[0], "在章节中");
        assert!(phrases.contains(&"在《道诡异仙》中".to_string()));
        assert!(phrases.contains(&"《道诡异仙》的".to_string()));
    }

    #[test]
    fn empty_angles_rejected() {
        assert!(NovelProfile::from_yaml_str("qa_angles: []\n").is_err());
    }
}
