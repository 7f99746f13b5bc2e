use crate::Error;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why a unit produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub position: usize,
    pub message: String,
    /// Attempts spent, when the failure was retry exhaustion
    pub attempts: Option<u32>,
}

impl UnitFailure {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            attempts: None,
        }
    }

    pub fn from_error(position: usize, err: &Error) -> Self {
        let attempts = match err {
            Error::RequestExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        };
        Self {
            position,
            message: err.to_string(),
            attempts,
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {} failed: {}", self.position, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome<T> {
    Completed(T),
    Failed(UnitFailure),
}

impl<T> UnitOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, UnitOutcome::Completed(_))
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            UnitOutcome::Completed(v) => Some(v),
            UnitOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&UnitFailure> {
        match self {
            UnitOutcome::Completed(_) => None,
            UnitOutcome::Failed(f) => Some(f),
        }
    }

    pub fn into_completed(self) -> Option<T> {
        match self {
            UnitOutcome::Completed(v) => Some(v),
            UnitOutcome::Failed(_) => None,
        }
    }
}

/// Result of a batch, addressable by the original unit position.
///
/// Every submitted position has exactly one entry; failed units appear as
/// [`UnitOutcome::Failed`] rather than being dropped.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    outcomes: BTreeMap<usize, UnitOutcome<T>>,
    pub execution_time: Duration,
}

impl<T> BatchOutcome<T> {
    pub(crate) fn new(outcomes: BTreeMap<usize, UnitOutcome<T>>, execution_time: Duration) -> Self {
        Self {
            outcomes,
            execution_time,
        }
    }

    pub fn get(&self, position: usize) -> Option<&UnitOutcome<T>> {
        self.outcomes.get(&position)
    }

    /// Entries in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &UnitOutcome<T>)> {
        self.outcomes.iter().map(|(p, o)| (*p, o))
    }

    pub fn completed(&self) -> impl Iterator<Item = (usize, &T)> {
        self.iter().filter_map(|(p, o)| o.completed().map(|v| (p, v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitFailure> {
        self.outcomes.values().filter_map(|o| o.failure())
    }

    pub fn failed_positions(&self) -> Vec<usize> {
        self.failures().map(|f| f.position).collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_completed()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.success_count() as f64 / self.len() as f64
        }
    }

    pub fn map<U, F>(self, mut f: F) -> BatchOutcome<U>
    where
        F: FnMut(usize, T) -> UnitOutcome<U>,
    {
        let outcomes = self
            .outcomes
            .into_iter()
            .map(|(p, o)| {
                let mapped = match o {
                    UnitOutcome::Completed(v) => f(p, v),
                    UnitOutcome::Failed(fail) => UnitOutcome::Failed(fail),
                };
                (p, mapped)
            })
            .collect();
        BatchOutcome {
            outcomes,
            execution_time: self.execution_time,
        }
    }
}

impl<T> IntoIterator for BatchOutcome<T> {
    type Item = (usize, UnitOutcome<T>);
    type IntoIter = std::collections::btree_map::IntoIter<usize, UnitOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BatchOutcome<&'static str> {
        let mut map = BTreeMap::new();
        map.insert(2, UnitOutcome::Completed("c"));
        map.insert(0, UnitOutcome::Completed("a"));
        map.insert(1, UnitOutcome::Failed(UnitFailure::new(1, "boom")));
        BatchOutcome::new(map, Duration::ZERO)
    }

    #[test]
    fn iterates_in_position_order() {
        let positions: Vec<_> = sample().iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn counts_and_rate() {
        let outcome = sample();
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.failed_positions(), vec![1]);
        assert!(!outcome.all_succeeded());
        assert!((outcome.success_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn exhaustion_records_attempts() {
        let err = Error::RequestExhausted {
            attempts: 5,
            last: Box::new(Error::configuration("x")),
        };
        assert_eq!(UnitFailure::from_error(4, &err).attempts, Some(5));
    }
}
