use crate::protocol::ChatRequest;

/// One piece of work: an opaque text payload and its position in the input sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub position: usize,
    pub text: String,
}

impl Unit {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Number an ordered sequence of payloads from zero.
pub fn units_from<I, S>(texts: I) -> Vec<Unit>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(position, text)| Unit::new(position, text))
        .collect()
}

/// Builds the request for a unit. Must be pure: same unit, same request.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, unit: &Unit) -> ChatRequest;
}

impl<F> PromptBuilder for F
where
    F: Fn(&Unit) -> ChatRequest + Send + Sync,
{
    fn build(&self, unit: &Unit) -> ChatRequest {
        self(unit)
    }
}
