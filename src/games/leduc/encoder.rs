//! Information-string encoder for Leduc hold'em.

use rustc_hash::FxHashMap;

use crate::core::AgentId;
use crate::engine::{GameEngine, NativeObservation};
use crate::env::{Observation, StateEncoder, UNKNOWN_FEATURE};
use crate::error::EnvError;

use super::game::LeducPoker;

/// Parses the bracketed information string into fixed slots:
///
/// | slot | field |
/// |------|-------|
/// | 0 | observing agent |
/// | 1 | pot |
/// | 2, 3 | money of agent 0, agent 1 |
/// | 4 | public card |
/// | 5 | private card |
/// | 6, 7 | first two round-1 moves |
/// | 8, 9 | first two round-2 moves |
///
/// Fields not yet available (public card before the flop, moves not made)
/// are `UNKNOWN_FEATURE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeducEncoder;

impl LeducEncoder {
    pub const SIZE: usize = 10;

    pub fn new() -> Self {
        Self
    }

    /// Encode one information string.
    pub fn parse(text: &str) -> Result<Observation, EnvError> {
        let fail = |reason: String| EnvError::inconsistency(reason, text);

        let body = text
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| fail("not a bracketed information string".to_string()))?;

        let fields: FxHashMap<&str, &str> = body
            .split("][")
            .map(|segment| match segment.split_once(": ") {
                Some((label, value)) => (label, value),
                None => match segment.strip_suffix(':') {
                    Some(label) => (label, ""),
                    None => (segment, ""),
                },
            })
            .collect();

        let field = |label: &str| {
            fields
                .get(label)
                .copied()
                .ok_or_else(|| fail(format!("missing field {:?}", label)))
        };
        let number = |label: &str, value: &str| {
            value
                .trim()
                .parse::<i64>()
                .map(|v| v as f32)
                .map_err(|_| fail(format!("bad {} value {:?}", label, value)))
        };
        let optional = |label: &str| match fields.get(label).map(|v| v.trim()) {
            None | Some("") => Ok(UNKNOWN_FEATURE),
            Some(value) => number(label, value),
        };
        let moves = |label: &str| -> Result<[f32; 2], EnvError> {
            let mut out = [UNKNOWN_FEATURE; 2];
            for (slot, token) in field(label)?.split_whitespace().take(2).enumerate() {
                out[slot] = number(label, token)?;
            }
            Ok(out)
        };

        let money: Vec<&str> = field("Money")?.split_whitespace().collect();
        let [money0, money1] = money.as_slice() else {
            return Err(fail(format!("expected two money values, got {}", money.len())));
        };

        let round1 = moves("Round1")?;
        let round2 = moves("Round2")?;

        Ok(Observation::new(vec![
            number("Observer", field("Observer")?)?,
            number("Pot", field("Pot")?)?,
            number("Money", *money0)?,
            number("Money", *money1)?,
            optional("Public")?,
            optional("Private")?,
            round1[0],
            round1[1],
            round2[0],
            round2[1],
        ]))
    }
}

impl StateEncoder<LeducPoker> for LeducEncoder {
    fn encode(&self, engine: &LeducPoker, agent: AgentId) -> Result<Observation, EnvError> {
        match engine.observation(agent) {
            NativeObservation::Text(text) => Self::parse(&text),
            NativeObservation::Tensor(values) => Err(EnvError::inconsistency(
                "expected an information string, got a tensor",
                format!("{:?}", values),
            )),
        }
    }

    fn observation_size(&self) -> usize {
        Self::SIZE
    }
}
