//! Actions on both sides of the adapter.
//!
//! The engine speaks integer action ids. The training loop speaks numeric
//! vectors, one value per declared Action variable. The `ActionCatalogue`
//! is the declared list of possible action vectors and translates between
//! the two:
//!
//! - catalogue entry `i` is engine action `i`
//! - in multi-agent mode a reserved no-op entry is appended
//! - any vector not in the catalogue is unrecognised
//!
//! ```
//! use turn_env::core::{ActionCatalogue, Decoded, NOOP_ACTION};
//!
//! let catalogue = ActionCatalogue::discrete(3).with_noop();
//! assert_eq!(catalogue.decode(&[2.0]), Decoded::Action(2));
//! assert_eq!(catalogue.decode(&[NOOP_ACTION]), Decoded::NoOp);
//! assert_eq!(catalogue.decode(&[7.0]), Decoded::Unrecognised);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::AgentId;

/// Engine-side action identifier.
pub type ActionId = i64;

/// Training-loop-side action: one value per Action variable.
///
/// Inline for up to two dimensions, which covers every catalogue we ship.
pub type ActionVector = SmallVec<[f64; 2]>;

/// Value of the reserved no-op action submitted by agents whose turn it is not.
///
/// Sequential games exposed through a per-step "everyone acts" API need a way
/// for idle agents to say nothing; this sentinel is that patch.
pub const NOOP_ACTION: f64 = -1.0;

/// Result of decoding an action vector against the catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A catalogue entry, as an engine action id.
    Action(ActionId),
    /// The reserved no-op entry.
    NoOp,
    /// Not a catalogue entry.
    Unrecognised,
}

/// Declared list of possible discrete actions, each a vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionCatalogue {
    entries: Vec<ActionVector>,
    noop: Option<ActionVector>,
    dimensions: usize,
}

impl ActionCatalogue {
    /// One-dimensional catalogue `[[0], [1], ..., [count - 1]]`.
    pub fn discrete(count: usize) -> Self {
        let entries = (0..count)
            .map(|i| SmallVec::from_slice(&[i as f64]))
            .collect();
        Self {
            entries,
            noop: None,
            dimensions: 1,
        }
    }

    /// Catalogue from explicit vectors (multi-dimensional discrete actions).
    ///
    /// # Panics
    /// If the vectors are empty, have differing lengths, or contain duplicates.
    pub fn from_vectors(vectors: Vec<Vec<f64>>) -> Self {
        assert!(!vectors.is_empty(), "Catalogue must declare at least 1 action");
        let dimensions = vectors[0].len();
        assert!(dimensions > 0, "Action vectors must have at least 1 dimension");
        assert!(
            vectors.iter().all(|v| v.len() == dimensions),
            "All action vectors must have the same length"
        );

        let entries: Vec<ActionVector> = vectors.into_iter().map(SmallVec::from_vec).collect();
        for (i, entry) in entries.iter().enumerate() {
            assert!(
                !entries[..i].contains(entry),
                "Duplicate action vector {:?}",
                entry.as_slice()
            );
        }

        Self {
            entries,
            noop: None,
            dimensions,
        }
    }

    /// Whether a declared entry equals the no-op vector.
    #[must_use]
    pub fn collides_with_noop(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.iter().all(|&v| v == NOOP_ACTION))
    }

    /// Append the reserved no-op entry (`NOOP_ACTION` in every dimension).
    ///
    /// # Panics
    /// If an existing entry already equals the no-op vector.
    #[must_use]
    pub fn with_noop(mut self) -> Self {
        assert!(
            !self.collides_with_noop(),
            "No-op vector collides with a declared action"
        );
        let noop: ActionVector = SmallVec::from_elem(NOOP_ACTION, self.dimensions);
        self.noop = Some(noop);
        self
    }

    /// Number of declared engine actions (excluding the no-op).
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of values per action vector.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Whether the reserved no-op entry is present.
    #[must_use]
    pub fn has_noop(&self) -> bool {
        self.noop.is_some()
    }

    /// The vector for an engine action id.
    #[must_use]
    pub fn vector(&self, action: ActionId) -> Option<&ActionVector> {
        usize::try_from(action).ok().and_then(|i| self.entries.get(i))
    }

    /// The no-op vector, if present.
    #[must_use]
    pub fn noop(&self) -> Option<&ActionVector> {
        self.noop.as_ref()
    }

    /// All possible actions as declared to the training loop, no-op last.
    #[must_use]
    pub fn possible_actions(&self) -> Vec<Vec<f64>> {
        self.entries
            .iter()
            .chain(self.noop.iter())
            .map(|v| v.to_vec())
            .collect()
    }

    /// Decode a submitted vector.
    #[must_use]
    pub fn decode(&self, values: &[f64]) -> Decoded {
        if self.noop.as_deref() == Some(values) {
            return Decoded::NoOp;
        }
        match self.entries.iter().position(|e| e.as_slice() == values) {
            Some(i) => Decoded::Action(i as ActionId),
            None => Decoded::Unrecognised,
        }
    }
}

/// Actions supplied by the training loop for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionRequest {
    /// Single-agent mode: one vector for whoever is to act.
    Single(ActionVector),
    /// Multi-agent mode: one vector per agent, indexed by agent id.
    PerAgent(Vec<ActionVector>),
}

impl ActionRequest {
    /// Single-agent request from a slice.
    pub fn single(values: &[f64]) -> Self {
        ActionRequest::Single(SmallVec::from_slice(values))
    }

    /// Multi-agent request from one slice per agent.
    pub fn per_agent<V: AsRef<[f64]>>(values: &[V]) -> Self {
        ActionRequest::PerAgent(
            values
                .iter()
                .map(|v| SmallVec::from_slice(v.as_ref()))
                .collect(),
        )
    }

    /// The vector submitted by an agent. In single-agent mode the one vector
    /// belongs to whoever is acting.
    #[must_use]
    pub fn for_agent(&self, agent: AgentId) -> Option<&ActionVector> {
        match self {
            ActionRequest::Single(v) => Some(v),
            ActionRequest::PerAgent(vs) => vs.get(agent.index()),
        }
    }

    /// Number of agent slots in the request.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        match self {
            ActionRequest::Single(_) => 1,
            ActionRequest::PerAgent(vs) => vs.len(),
        }
    }
}
