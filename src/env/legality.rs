//! Legality guard.
//!
//! Decides whether a step's action request may reach the engine.
//!
//! ## Single-agent
//!
//! The decoded action must be in the engine's legal set.
//!
//! ## Multi-agent
//!
//! Sequential games are exposed through a per-step API where every agent
//! submits something. Only the active agent may submit a real action; every
//! other agent must submit the reserved no-op. Rejected when:
//! - an idle agent submits anything but the no-op (`OutOfTurn`)
//! - the active agent submits the no-op (`NoOpOnTurn`)
//! - the active agent submits an action outside the legal set (`NotLegal`)
//! - any agent submits a vector not in the catalogue (`Unrecognised`)

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::core::{ActionCatalogue, ActionId, ActionVector, AgentId, Decoded};

/// Why an agent's submission was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// A catalogue action that is not legal right now.
    NotLegal(ActionId),
    /// A vector that is not in the catalogue.
    Unrecognised,
    /// A real action from an agent whose turn it is not.
    OutOfTurn(ActionId),
    /// The no-op from the agent whose turn it is.
    NoOpOnTurn,
}

/// Outcome of a legality check.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// Forward `action` to the engine on behalf of `agent`.
    Accept { agent: AgentId, action: ActionId },
    /// Do not touch the engine; every listed agent offended.
    Reject(SmallVec<[(AgentId, RejectReason); 2]>),
}

impl Verdict {
    /// Whether the request was accepted.
    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }
}

/// Validates action requests against the catalogue, the legal set and turn order.
#[derive(Clone, Debug)]
pub struct LegalityGuard {
    catalogue: ActionCatalogue,
}

impl LegalityGuard {
    /// Create a guard over a catalogue.
    pub fn new(catalogue: ActionCatalogue) -> Self {
        Self { catalogue }
    }

    /// The catalogue used for decoding.
    pub fn catalogue(&self) -> &ActionCatalogue {
        &self.catalogue
    }

    /// Check a single-agent submission made on behalf of `active`.
    pub fn check_single(&self, active: AgentId, legal: &[ActionId], values: &[f64]) -> Verdict {
        let reason = match self.catalogue.decode(values) {
            Decoded::Action(action) if legal.contains(&action) => {
                return Verdict::Accept {
                    agent: active,
                    action,
                }
            }
            Decoded::Action(action) => RejectReason::NotLegal(action),
            // A catalogue without a no-op never decodes one; treat it as noise.
            Decoded::NoOp | Decoded::Unrecognised => RejectReason::Unrecognised,
        };

        let mut offenders = SmallVec::new();
        offenders.push((active, reason));
        Verdict::Reject(offenders)
    }

    /// Check one submission per agent, indexed by agent id.
    pub fn check_multi(
        &self,
        active: AgentId,
        legal: &[ActionId],
        submissions: &[ActionVector],
    ) -> Verdict {
        let legal: FxHashSet<ActionId> = legal.iter().copied().collect();
        let mut offenders = SmallVec::new();
        let mut accepted = None;

        for (index, values) in submissions.iter().enumerate() {
            let agent = AgentId::new(index as u8);
            let decoded = self.catalogue.decode(values);

            let reason = if agent == active {
                match decoded {
                    Decoded::Action(action) if legal.contains(&action) => {
                        accepted = Some(action);
                        None
                    }
                    Decoded::Action(action) => Some(RejectReason::NotLegal(action)),
                    Decoded::NoOp => Some(RejectReason::NoOpOnTurn),
                    Decoded::Unrecognised => Some(RejectReason::Unrecognised),
                }
            } else {
                match decoded {
                    Decoded::NoOp => None,
                    Decoded::Action(action) => Some(RejectReason::OutOfTurn(action)),
                    Decoded::Unrecognised => Some(RejectReason::Unrecognised),
                }
            };

            if let Some(reason) = reason {
                offenders.push((agent, reason));
            }
        }

        match accepted {
            Some(action) if offenders.is_empty() => Verdict::Accept {
                agent: active,
                action,
            },
            _ => Verdict::Reject(offenders),
        }
    }
}
