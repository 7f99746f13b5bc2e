//! Substitutes for empty turns.

use super::conversation::{Speaker, Turn};
use crate::{Error, ErrorContext, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackSelection {
    /// Always the first candidate
    First,
    /// Candidates in order, wrapping around
    RoundRobin,
    /// Random choice, reproducible for a fixed seed
    Seeded(u64),
}

/// Ordered candidate strings and the rule for picking one.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    candidates: Vec<String>,
    selection: FallbackSelection,
    cursor: usize,
    rng: Option<SmallRng>,
}

impl FallbackPolicy {
    pub fn new(candidates: Vec<String>, selection: FallbackSelection) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::configuration_with_context(
                "fallback policy needs at least one candidate",
                ErrorContext::new().with_field_path("candidates"),
            ));
        }
        let rng = match selection {
            FallbackSelection::Seeded(seed) => Some(SmallRng::seed_from_u64(seed)),
            _ => None,
        };
        Ok(Self {
            candidates,
            selection,
            cursor: 0,
            rng,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selection(&self) -> FallbackSelection {
        self.selection
    }

    pub fn pick(&mut self) -> &str {
        let len = self.candidates.len();
        let i = match self.selection {
            FallbackSelection::First => 0,
            FallbackSelection::RoundRobin => {
                let i = self.cursor % len;
                self.cursor = self.cursor.wrapping_add(1);
                i
            }
            FallbackSelection::Seeded(_) => match self.rng.as_mut() {
                Some(rng) => rng.gen_range(0..len),
                None => 0,
            },
        };
        &self.candidates[i]
    }
}

/// Per-speaker handling of blank turns: substitute from the speaker's pool, or drop the
/// turn when the speaker has none.
#[derive(Debug, Clone, Default)]
pub struct EmptyTurnPolicy {
    pub human: Option<FallbackPolicy>,
    pub gpt: Option<FallbackPolicy>,
}

impl EmptyTurnPolicy {
    /// Drop every blank turn.
    pub fn drop_all() -> Self {
        Self::default()
    }

    pub fn with_human(mut self, policy: FallbackPolicy) -> Self {
        self.human = Some(policy);
        self
    }

    pub fn with_gpt(mut self, policy: FallbackPolicy) -> Self {
        self.gpt = Some(policy);
        self
    }

    pub fn apply(&mut self, turns: Vec<Turn>) -> Vec<Turn> {
        turns
            .into_iter()
            .filter_map(|mut turn| {
                if !turn.is_blank() {
                    return Some(turn);
                }
                let pool = match turn.from {
                    Speaker::Human => self.human.as_mut(),
                    Speaker::Gpt => self.gpt.as_mut(),
                }?;
                turn.value = pool.pick().to_string();
                Some(turn)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(selection: FallbackSelection) -> FallbackPolicy {
        FallbackPolicy::new(vec!["a".into(), "b".into(), "c".into()], selection).unwrap()
    }

    #[test]
    fn empty_candidates_rejected() {
        assert!(FallbackPolicy::new(Vec::new(), FallbackSelection::First).is_err());
    }

    #[test]
    fn round_robin_wraps() {
        let mut p = pool(FallbackSelection::RoundRobin);
        let picked: Vec<String> = (0..4).map(|_| p.pick().to_string()).collect();
        assert_eq!(picked, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let mut x = pool(FallbackSelection::Seeded(42));
        let mut y = pool(FallbackSelection::Seeded(42));
        let xs: Vec<String> = (0..8).map(|_| x.pick().to_string()).collect();
        let ys: Vec<String> = (0..8).map(|_| y.pick().to_string()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn substitutes_only_for_configured_speaker() {
        let mut policy = EmptyTurnPolicy::drop_all().with_gpt(pool(FallbackSelection::First));
        let out = policy.apply(vec![Turn::human(""), Turn::gpt(""), Turn::human("q")]);
        assert_eq!(out, vec![Turn::gpt("a"), Turn::human("q")]);
    }
}
