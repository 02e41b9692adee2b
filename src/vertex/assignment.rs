use serde::{Deserialize, Serialize};

/// One source attribute bound to one destination attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub source: String,
    pub destination: String,
}

/// A material's source → destination attribute bindings.
///
/// An empty assignment keeps source names as destinations. A source listed
/// more than once fans out to several destinations sharing the same data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeAssignment {
    entries: Vec<AssignmentEntry>,
}

impl AttributeAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(source, destination)| AssignmentEntry {
                    source: source.into(),
                    destination: destination.into(),
                })
                .collect(),
        }
    }

    pub fn bind(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.entries.push(AssignmentEntry {
            source: source.into(),
            destination: destination.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AssignmentEntry] {
        &self.entries
    }

    /// Destination names bound to `source`, in assignment order.
    pub fn destinations_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.source == source)
            .map(|entry| entry.destination.as_str())
    }
}
