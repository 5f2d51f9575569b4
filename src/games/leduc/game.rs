//! Leduc hold'em engine.
//!
//! ## Rules
//!
//! - Six cards: two suits of three ranks. Card `c` has rank `c / 2`.
//! - Each agent antes, then receives one private card (chance).
//! - Two betting rounds with fixed raise sizes (2, then 4) and at most two
//!   raises per round. A raise the stack cannot cover is not offered, so
//!   money never goes negative. A public card is dealt (chance) between rounds.
//! - Fold is only legal when facing a bet. A call closes the round unless it
//!   is the round's first action.
//! - Showdown: pairing the public card wins, otherwise the higher rank wins,
//!   equal ranks split the pot.
//!
//! ## Observations
//!
//! `ObservationFormat::InformationString` produces
//! `[Observer: p][Private: c][Round r][Player: a][Pot: n][Money: m0 m1]`
//! followed by `[Public: c]` once dealt and `[Round1: ..][Round2: ..]` with
//! space-separated action ids. `ObservationFormat::Tensor` produces a
//! `TENSOR_SIZE` vector (observer one-hot, private card one-hot, public card
//! one-hot, contributions).

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{ActionId, AgentId};
use crate::engine::{ActivePlayer, GameEngine, GameFactory, NativeObservation};

/// Cards in the deck.
pub const DECK_SIZE: usize = 6;
/// Distinct betting actions.
pub const NUM_ACTIONS: usize = 3;
/// Length of the tensor observation.
pub const TENSOR_SIZE: usize = 2 + DECK_SIZE + DECK_SIZE + 2;

pub const FOLD: ActionId = 0;
pub const CALL: ActionId = 1;
pub const RAISE: ActionId = 2;

const MAX_RAISES: u8 = 2;
const PLAYERS: usize = 2;

/// Native observation format of a Leduc game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationFormat {
    #[default]
    InformationString,
    Tensor,
}

/// Game parameters. Also serves as the factory for fresh games.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeducConfig {
    pub starting_money: i64,
    pub ante: i64,
    pub raise_sizes: [i64; 2],
    pub observation_format: ObservationFormat,
}

impl Default for LeducConfig {
    fn default() -> Self {
        Self {
            starting_money: 100,
            ante: 1,
            raise_sizes: [2, 4],
            observation_format: ObservationFormat::InformationString,
        }
    }
}

impl LeducConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_observation_format(mut self, format: ObservationFormat) -> Self {
        self.observation_format = format;
        self
    }

    #[must_use]
    pub fn with_starting_money(mut self, money: i64) -> Self {
        assert!(money > 0, "Starting money must be positive");
        assert!(money >= self.ante, "Starting money must cover the ante");
        self.starting_money = money;
        self
    }

    #[must_use]
    pub fn with_ante(mut self, ante: i64) -> Self {
        assert!(ante >= 0, "Ante must not be negative");
        assert!(ante <= self.starting_money, "Ante must not exceed starting money");
        self.ante = ante;
        self
    }

    /// Build a fresh game, at the first deal.
    pub fn build(&self) -> LeducPoker {
        LeducPoker::new(self.clone())
    }
}

impl GameFactory for LeducConfig {
    type Engine = LeducPoker;

    fn new_game(&self) -> LeducPoker {
        self.build()
    }

    fn num_players(&self) -> usize {
        PLAYERS
    }

    fn num_distinct_actions(&self) -> usize {
        NUM_ACTIONS
    }
}

/// A hand of Leduc hold'em in progress.
#[derive(Clone, Debug)]
pub struct LeducPoker {
    config: LeducConfig,
    private: [Option<u8>; PLAYERS],
    public: Option<u8>,
    contribution: [i64; PLAYERS],
    stakes: i64,
    round: usize,
    raises: u8,
    round_actions: usize,
    to_act: usize,
    folded: Option<usize>,
    finished: bool,
    moves: [Vector<ActionId>; 2],
}

impl LeducPoker {
    /// Fresh hand: antes posted, no cards dealt.
    pub fn new(config: LeducConfig) -> Self {
        let ante = config.ante;
        Self {
            config,
            private: [None; PLAYERS],
            public: None,
            contribution: [ante; PLAYERS],
            stakes: ante,
            round: 1,
            raises: 0,
            round_actions: 0,
            to_act: 0,
            folded: None,
            finished: false,
            moves: [Vector::new(), Vector::new()],
        }
    }

    /// Hand with the default parameters.
    pub fn default_game() -> Self {
        LeducConfig::new().build()
    }

    /// Private cards dealt so far, by agent.
    #[must_use]
    pub fn private_cards(&self) -> [Option<u8>; PLAYERS] {
        self.private
    }

    /// Public card, once dealt.
    #[must_use]
    pub fn public_card(&self) -> Option<u8> {
        self.public
    }

    /// Current betting round (1 or 2).
    #[must_use]
    pub fn round(&self) -> usize {
        self.round
    }

    /// Chips in the pot.
    #[must_use]
    pub fn pot(&self) -> i64 {
        self.contribution.iter().sum()
    }

    /// Chips an agent has left behind.
    #[must_use]
    pub fn money(&self, agent: AgentId) -> i64 {
        self.config.starting_money - self.contribution[agent.index()]
    }

    fn rank(card: u8) -> u8 {
        card / 2
    }

    fn dealt(&self) -> impl Iterator<Item = u8> + '_ {
        self.private.iter().flatten().chain(self.public.iter()).copied()
    }

    fn apply_deal(&mut self, card: u8) {
        assert!(
            (card as usize) < DECK_SIZE && !self.dealt().any(|c| c == card),
            "Card {} is not in the deck",
            card
        );
        match self.private.iter().position(Option::is_none) {
            Some(slot) => self.private[slot] = Some(card),
            None => self.public = Some(card),
        }
    }

    fn apply_bet(&mut self, action: ActionId) {
        assert!(
            self.legal_bets().contains(&action),
            "Illegal Leduc action {}",
            action
        );

        let player = self.to_act;
        self.moves[self.round - 1].push_back(action);
        self.round_actions += 1;

        match action {
            FOLD => {
                self.folded = Some(player);
                self.finished = true;
                return;
            }
            CALL => {
                self.contribution[player] = self.stakes;
                if self.round_actions > 1 {
                    self.close_round();
                    return;
                }
            }
            _ => {
                self.stakes += self.config.raise_sizes[self.round - 1];
                self.contribution[player] = self.stakes;
                self.raises += 1;
            }
        }

        self.to_act = 1 - player;
    }

    fn close_round(&mut self) {
        if self.round == 2 {
            self.finished = true;
            return;
        }
        self.round = 2;
        self.raises = 0;
        self.round_actions = 0;
        self.to_act = 0;
    }

    fn legal_bets(&self) -> Vec<ActionId> {
        let mut bets = Vec::with_capacity(NUM_ACTIONS);
        if self.stakes > self.contribution[self.to_act] {
            bets.push(FOLD);
        }
        bets.push(CALL);
        let raised = self.stakes + self.config.raise_sizes[self.round - 1];
        if self.raises < MAX_RAISES && raised <= self.config.starting_money {
            bets.push(RAISE);
        }
        bets
    }

    /// Final chip deltas, valid once the hand is over.
    fn payoffs(&self) -> [f64; PLAYERS] {
        let c = self.contribution;
        if let Some(loser) = self.folded {
            let winner = 1 - loser;
            let mut out = [0.0; PLAYERS];
            out[winner] = c[loser] as f64;
            out[loser] = -(c[loser] as f64);
            return out;
        }

        let strength = |p: usize| -> (bool, u8) {
            let card = self.private[p].map_or(0, Self::rank);
            let pair = self.public.map_or(false, |public| Self::rank(public) == card);
            (pair, card)
        };

        match strength(0).cmp(&strength(1)) {
            std::cmp::Ordering::Greater => [c[1] as f64, -(c[1] as f64)],
            std::cmp::Ordering::Less => [-(c[0] as f64), c[0] as f64],
            std::cmp::Ordering::Equal => [0.0, 0.0],
        }
    }

    fn information_string(&self, agent: AgentId) -> String {
        let private = self.private[agent.index()]
            .map(|c| c.to_string())
            .unwrap_or_default();
        let moves = |round: usize| {
            self.moves[round]
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut out = format!(
            "[Observer: {}][Private: {}][Round {}][Player: {}][Pot: {}][Money: {} {}]",
            agent.index(),
            private,
            self.round,
            self.current_player().to_raw(),
            self.pot(),
            self.money(AgentId::new(0)),
            self.money(AgentId::new(1)),
        );
        if let Some(public) = self.public {
            out.push_str(&format!("[Public: {}]", public));
        }
        out.push_str(&format!("[Round1: {}][Round2: {}]", moves(0), moves(1)));
        out
    }

    fn tensor(&self, agent: AgentId) -> Vec<f32> {
        let mut t = vec![0.0; TENSOR_SIZE];
        t[agent.index()] = 1.0;
        if let Some(card) = self.private[agent.index()] {
            t[2 + card as usize] = 1.0;
        }
        if let Some(card) = self.public {
            t[2 + DECK_SIZE + card as usize] = 1.0;
        }
        t[2 + 2 * DECK_SIZE] = self.contribution[0] as f32;
        t[3 + 2 * DECK_SIZE] = self.contribution[1] as f32;
        t
    }
}

impl GameEngine for LeducPoker {
    fn num_players(&self) -> usize {
        PLAYERS
    }

    fn is_chance_node(&self) -> bool {
        if self.finished {
            return false;
        }
        self.private.iter().any(Option::is_none) || (self.round == 2 && self.public.is_none())
    }

    fn legal_actions(&self) -> Vec<ActionId> {
        if self.finished {
            Vec::new()
        } else if self.is_chance_node() {
            (0..DECK_SIZE as u8)
                .filter(|&c| !self.dealt().any(|d| d == c))
                .map(ActionId::from)
                .collect()
        } else {
            self.legal_bets()
        }
    }

    fn current_player(&self) -> ActivePlayer {
        if self.finished {
            ActivePlayer::Terminal
        } else if self.is_chance_node() {
            ActivePlayer::Chance
        } else {
            ActivePlayer::Agent(AgentId::new(self.to_act as u8))
        }
    }

    fn apply_action(&mut self, action: ActionId) {
        assert!(!self.finished, "Hand is already over");
        if self.is_chance_node() {
            let card = u8::try_from(action).unwrap_or(u8::MAX);
            self.apply_deal(card);
        } else {
            self.apply_bet(action);
        }
    }

    fn is_terminal(&self) -> bool {
        self.finished
    }

    fn observation(&self, agent: AgentId) -> NativeObservation {
        match self.config.observation_format {
            ObservationFormat::InformationString => {
                NativeObservation::Text(self.information_string(agent))
            }
            ObservationFormat::Tensor => NativeObservation::Tensor(self.tensor(agent)),
        }
    }

    fn rewards(&self) -> Vec<f64> {
        if !self.finished {
            return vec![0.0; PLAYERS];
        }
        self.payoffs().to_vec()
    }
}
