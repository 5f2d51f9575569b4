//! Single-agent environment tests.
//!
//! These tests drive `GameEnv` end to end:
//! - Step budget and truncation
//! - Illegal actions, penalties and the sticky failed flag
//! - Terminal rewards and terminal policies
//! - Chance resolution and reproducibility
//! - Engine inconsistencies

use turn_env::core::{
    ActionCatalogue, ActionRequest, AgentId, EnvConfig, EpisodeSeed, SingleAgentReward, NOOP_ACTION,
};
use turn_env::engine::{ActivePlayer, GameEngine, GameFactory, NativeObservation};
use turn_env::env::{
    ConstantReward, GameEnv, RewardSignal, TensorEncoder, TerminationKind, UNKNOWN_FEATURE,
};
use turn_env::error::EnvError;
use turn_env::games::leduc::{
    LeducConfig, LeducEncoder, ObservationFormat, CALL, FOLD, RAISE, TENSOR_SIZE,
};
use turn_env::games::tic_tac_toe::{HistoryEncoder, TicTacToeFactory};

fn play(action: i64) -> ActionRequest {
    ActionRequest::single(&[action as f64])
}

fn scalar(reward: &RewardSignal) -> f64 {
    match reward {
        RewardSignal::Scalar(r) => *r,
        RewardSignal::PerAgent(_) => panic!("expected a scalar reward"),
    }
}

/// One-agent game that never ends.
#[derive(Clone, Debug, Default)]
struct Endless {
    steps: usize,
}

impl GameEngine for Endless {
    fn num_players(&self) -> usize {
        1
    }
    fn is_chance_node(&self) -> bool {
        false
    }
    fn legal_actions(&self) -> Vec<i64> {
        vec![0, 1]
    }
    fn current_player(&self) -> ActivePlayer {
        ActivePlayer::Agent(AgentId::new(0))
    }
    fn apply_action(&mut self, _action: i64) {
        self.steps += 1;
    }
    fn is_terminal(&self) -> bool {
        false
    }
    fn observation(&self, _agent: AgentId) -> NativeObservation {
        NativeObservation::Tensor(vec![self.steps as f32, 1.0])
    }
    fn rewards(&self) -> Vec<f64> {
        vec![0.0]
    }
}

struct EndlessFactory;

impl GameFactory for EndlessFactory {
    type Engine = Endless;

    fn new_game(&self) -> Endless {
        Endless::default()
    }
    fn num_players(&self) -> usize {
        1
    }
    fn num_distinct_actions(&self) -> usize {
        2
    }
}

/// Game whose active player becomes undefined after the first move.
#[derive(Clone, Debug, Default)]
struct Broken {
    moved: bool,
}

impl GameEngine for Broken {
    fn num_players(&self) -> usize {
        2
    }
    fn is_chance_node(&self) -> bool {
        false
    }
    fn legal_actions(&self) -> Vec<i64> {
        vec![0]
    }
    fn current_player(&self) -> ActivePlayer {
        if self.moved {
            ActivePlayer::from_raw(7, 2)
        } else {
            ActivePlayer::Agent(AgentId::new(0))
        }
    }
    fn apply_action(&mut self, _action: i64) {
        self.moved = true;
    }
    fn is_terminal(&self) -> bool {
        false
    }
    fn observation(&self, _agent: AgentId) -> NativeObservation {
        NativeObservation::Tensor(vec![self.moved as u8 as f32])
    }
    fn rewards(&self) -> Vec<f64> {
        vec![0.0, 0.0]
    }
}

struct BrokenFactory;

impl GameFactory for BrokenFactory {
    type Engine = Broken;

    fn new_game(&self) -> Broken {
        Broken::default()
    }
    fn num_players(&self) -> usize {
        2
    }
    fn num_distinct_actions(&self) -> usize {
        1
    }
}

/// Two-player game that names a nonexistent agent as the mover.
#[derive(Clone, Debug, Default)]
struct Rogue {
    moved: bool,
    from_start: bool,
}

impl GameEngine for Rogue {
    fn num_players(&self) -> usize {
        2
    }
    fn is_chance_node(&self) -> bool {
        false
    }
    fn legal_actions(&self) -> Vec<i64> {
        vec![0]
    }
    fn current_player(&self) -> ActivePlayer {
        if self.moved || self.from_start {
            ActivePlayer::Agent(AgentId::new(5))
        } else {
            ActivePlayer::Agent(AgentId::new(0))
        }
    }
    fn apply_action(&mut self, _action: i64) {
        self.moved = true;
    }
    fn is_terminal(&self) -> bool {
        false
    }
    fn observation(&self, _agent: AgentId) -> NativeObservation {
        NativeObservation::Tensor(vec![self.moved as u8 as f32])
    }
    fn rewards(&self) -> Vec<f64> {
        vec![0.0, 0.0]
    }
}

struct RogueFactory {
    from_start: bool,
}

impl GameFactory for RogueFactory {
    type Engine = Rogue;

    fn new_game(&self) -> Rogue {
        Rogue {
            moved: false,
            from_start: self.from_start,
        }
    }
    fn num_players(&self) -> usize {
        2
    }
    fn num_distinct_actions(&self) -> usize {
        1
    }
}

fn rogue(from_start: bool, config: EnvConfig) -> GameEnv<RogueFactory> {
    GameEnv::new(RogueFactory { from_start }, TensorEncoder::new(1), config).unwrap()
}

fn tic_tac_toe(config: EnvConfig) -> GameEnv<TicTacToeFactory> {
    GameEnv::new(TicTacToeFactory, HistoryEncoder::new(), config).unwrap()
}

fn leduc(config: EnvConfig) -> GameEnv<LeducConfig> {
    GameEnv::new(LeducConfig::new(), LeducEncoder::new(), config).unwrap()
}

/// A never-terminal game with the default budget truncates after exactly 500 steps.
#[test]
fn test_budget_truncates_after_exactly_500_steps() {
    let mut env = GameEnv::new(EndlessFactory, TensorEncoder::new(2), EnvConfig::new()).unwrap();
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    for step in 1..500 {
        let result = env.step(&play(1)).unwrap();
        assert_eq!(result.termination, TerminationKind::Ongoing);
        assert_eq!(env.step_count(), step);
    }

    let last = env.step(&play(0)).unwrap();
    assert_eq!(last.termination, TerminationKind::Truncated);
    assert_eq!(env.step_count(), 500);
    assert_eq!(scalar(&last.reward), 0.0);

    let err = env.step(&play(0)).unwrap_err();
    assert_eq!(err, EnvError::EpisodeOver(TerminationKind::Truncated));
}

/// A game ending on the budget step reports Terminal, not Truncated.
#[test]
fn test_terminal_wins_over_truncated_on_budget_step() {
    let mut env = tic_tac_toe(EnvConfig::new().with_max_steps(5));
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let mut last = None;
    for action in [0, 3, 1, 4, 2] {
        last = Some(env.step(&play(action)).unwrap());
    }
    assert_eq!(last.unwrap().termination, TerminationKind::Terminal);
}

/// The winning move pays the engine's terminal reward to the mover.
#[test]
fn test_terminal_reward_matches_engine() {
    let mut env = tic_tac_toe(EnvConfig::new());
    env.reset(EpisodeSeed::new(3, 1)).unwrap();

    for action in [0, 3, 1, 4] {
        let result = env.step(&play(action)).unwrap();
        assert_eq!(scalar(&result.reward), 0.0);
    }
    let result = env.step(&play(2)).unwrap();

    assert_eq!(result.termination, TerminationKind::Terminal);
    assert_eq!(scalar(&result.reward), 1.0);
}

/// A folding mover gets its own loss under `Mover`, the winner's gain under `Maximum`.
#[test]
fn test_mover_and_maximum_policies() {
    let fold_reward = |policy| {
        let mut env = leduc(EnvConfig::new().with_terminal_reward(policy));
        env.reset(EpisodeSeed::new(0, 0)).unwrap();
        env.step(&play(RAISE)).unwrap();
        scalar(&env.step(&play(FOLD)).unwrap().reward)
    };

    assert_eq!(fold_reward(SingleAgentReward::Mover), -1.0);
    assert_eq!(fold_reward(SingleAgentReward::Maximum), 1.0);
}

/// An illegal action pays the penalty, ends the episode and sets `failed`.
#[test]
fn test_illegal_action_penalty() {
    let mut env = tic_tac_toe(EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();
    env.step(&play(4)).unwrap();
    assert!(!env.is_failed(AgentId::new(1)));

    let result = env.step(&play(4)).unwrap();
    assert_eq!(result.termination, TerminationKind::Terminal);
    assert_eq!(scalar(&result.reward), -100.0);
    assert!(env.is_failed(AgentId::new(1)));
    assert!(!env.is_failed(AgentId::new(0)));

    // Engine was not touched by the rejected step.
    let handle = env.episode().unwrap().handle();
    assert_eq!(handle.engine().move_count(), 1);
}

/// A vector outside the catalogue is rejected like an illegal action.
#[test]
fn test_unrecognised_vector_rejected() {
    let mut env = tic_tac_toe(EnvConfig::new().with_illegal_action_penalty(-5.0));
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let result = env.step(&ActionRequest::single(&[0.5])).unwrap();
    assert_eq!(result.termination, TerminationKind::Terminal);
    assert_eq!(scalar(&result.reward), -5.0);
}

/// Reset clears the failed flag.
#[test]
fn test_reset_clears_failed() {
    let mut env = tic_tac_toe(EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();
    env.step(&play(99)).unwrap();
    assert!(env.is_failed(AgentId::new(0)));

    env.reset(EpisodeSeed::new(1, 0)).unwrap();
    assert!(!env.is_failed(AgentId::new(0)));
    assert_eq!(env.step_count(), 0);
    assert_eq!(env.termination(), Some(TerminationKind::Ongoing));
}

/// Leduc deals before the first observation and encodes the information string.
#[test]
fn test_leduc_reset_observation() {
    let mut env = leduc(EnvConfig::new());
    let obs = env.reset(EpisodeSeed::new(5, 2)).unwrap();

    assert_eq!(obs.len(), 1);
    let obs = &obs[0];
    assert_eq!(obs.len(), 10);
    assert_eq!(&obs.as_slice()[..5], &[0.0, 2.0, 99.0, 99.0, UNKNOWN_FEATURE]);
    assert!((0.0..6.0).contains(&obs.as_slice()[5]));
    assert!(obs.as_slice()[6..].iter().all(|&v| v == UNKNOWN_FEATURE));
    assert_eq!(env.active_agent(), Some(AgentId::new(0)));
}

/// The chance resolver never leaves the engine at a chance node.
#[test]
fn test_leduc_public_card_dealt_between_rounds() {
    let mut env = leduc(EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    env.step(&play(RAISE)).unwrap();
    let result = env.step(&play(CALL)).unwrap();

    let engine = env.episode().unwrap().handle().engine();
    assert!(!engine.is_chance_node());
    assert!(engine.public_card().is_some());
    assert_eq!(result.termination, TerminationKind::Ongoing);
    // Public card slot is filled once round 2 starts.
    assert_ne!(result.observations[0].get(4), Some(UNKNOWN_FEATURE));
}

/// Folding ends the hand with the engine's payoff.
#[test]
fn test_leduc_fold() {
    let mut env = leduc(EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    env.step(&play(RAISE)).unwrap();
    let result = env.step(&play(FOLD)).unwrap();

    assert_eq!(result.termination, TerminationKind::Terminal);
    // Agent 1 folded and loses its ante.
    assert_eq!(scalar(&result.reward), -1.0);
}

/// Folding when not facing a bet is illegal.
#[test]
fn test_leduc_fold_without_bet_is_illegal() {
    let mut env = leduc(EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let result = env.step(&play(FOLD)).unwrap();
    assert_eq!(scalar(&result.reward), -100.0);
    assert!(env.is_failed(AgentId::new(0)));
}

/// A short stack caps raising, so the money slots never hit the unknown sentinel.
#[test]
fn test_leduc_short_stack_money_stays_known() {
    let factory = LeducConfig::new().with_starting_money(12);
    let mut env = GameEnv::new(factory, LeducEncoder::new(), EnvConfig::new()).unwrap();
    let mut observations = env.reset(EpisodeSeed::new(0, 0)).unwrap();

    for action in [RAISE, RAISE, CALL, RAISE] {
        let result = env.step(&play(action)).unwrap();
        assert_eq!(result.termination, TerminationKind::Ongoing);
        observations.extend(result.observations);
    }
    assert_eq!(env.legal_actions(), Some(vec![FOLD, CALL]));

    for obs in &observations {
        assert!(obs.get(2).unwrap() >= 0.0);
        assert!(obs.get(3).unwrap() >= 0.0);
        assert_ne!(obs.get(3), Some(UNKNOWN_FEATURE));
    }

    // Raising past the stack is an illegal action.
    let result = env.step(&play(RAISE)).unwrap();
    assert_eq!(scalar(&result.reward), -100.0);
    assert_eq!(result.termination, TerminationKind::Terminal);
}

/// Identical seed and actions give identical observations and rewards.
#[test]
fn test_reproducible_episodes() {
    let run = |sample: u64| {
        let mut env = leduc(EnvConfig::new());
        let mut trace = vec![env.reset(EpisodeSeed::new(sample, 3)).unwrap()];
        let mut rewards = Vec::new();
        for _ in 0..4 {
            let result = env.step(&play(CALL)).unwrap();
            trace.push(result.observations);
            rewards.push(scalar(&result.reward));
            if result.termination != TerminationKind::Ongoing {
                break;
            }
        }
        (trace, rewards)
    };

    assert_eq!(run(17), run(17));

    let deals: Vec<f32> = (0..20).map(|s| run(s).0[0][0].as_slice()[5]).collect();
    assert!(deals.iter().any(|&d| d != deals[0]));
}

/// The chance stream position is captured per episode and advances with each deal.
#[test]
fn test_episode_rng_state() {
    let mut a = leduc(EnvConfig::new());
    let mut b = leduc(EnvConfig::new());
    a.reset(EpisodeSeed::new(5, 1)).unwrap();
    b.reset(EpisodeSeed::new(5, 1)).unwrap();

    let dealt = a.episode().unwrap().rng_state();
    assert_eq!(dealt, b.episode().unwrap().rng_state());
    assert_eq!(dealt.seed, EpisodeSeed::new(5, 1).value());

    a.step(&play(CALL)).unwrap();
    a.step(&play(CALL)).unwrap();
    let after = a.episode().unwrap().rng_state();
    assert_eq!(after.seed, dealt.seed);
    assert!(after.word_pos > dealt.word_pos);
}

/// In-progress steps pay the configured strategy's reward.
#[test]
fn test_constant_in_progress_reward() {
    let mut env = leduc(EnvConfig::new()).with_in_progress_reward(ConstantReward(1.0));
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let result = env.step(&play(CALL)).unwrap();
    assert_eq!(scalar(&result.reward), 1.0);
}

/// Tensor observations pass through at the declared length.
#[test]
fn test_leduc_tensor_observations() {
    let factory = LeducConfig::new().with_observation_format(ObservationFormat::Tensor);
    let mut env = GameEnv::new(factory, TensorEncoder::new(TENSOR_SIZE), EnvConfig::new()).unwrap();

    let obs = env.reset(EpisodeSeed::new(0, 0)).unwrap();
    assert_eq!(obs[0].len(), TENSOR_SIZE);
    let result = env.step(&play(CALL)).unwrap();
    assert_eq!(result.observations[0].len(), TENSOR_SIZE);
}

/// An undefined active player is an engine inconsistency that discards the episode.
#[test]
fn test_engine_inconsistency_discards_episode() {
    let mut env = GameEnv::new(BrokenFactory, TensorEncoder::new(1), EnvConfig::new()).unwrap();
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let err = env.step(&play(0)).unwrap_err();
    assert!(matches!(err, EnvError::EngineInconsistency { .. }));
    assert!(err.to_string().contains("[1.0]"));

    assert!(env.episode().is_none());
    assert_eq!(env.step(&play(0)).unwrap_err(), EnvError::NoEpisode);
}

/// A mover id beyond the agent count is an inconsistency, not a rejection.
#[test]
fn test_out_of_range_mover_single_agent() {
    let mut env = rogue(false, EnvConfig::new());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();

    let err = env.step(&play(0)).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("out of range"));
    assert!(err.to_string().contains("[1.0]"));
    assert!(env.episode().is_none());
}

/// In multi-agent mode all-idle no-ops must not end the episode silently.
#[test]
fn test_out_of_range_mover_multi_agent() {
    let mut env = rogue(false, EnvConfig::multi_agent());
    env.reset(EpisodeSeed::new(0, 0)).unwrap();
    let err = env
        .step(&ActionRequest::per_agent(&[[0.0], [NOOP_ACTION]]))
        .unwrap_err();
    // Multi-agent errors carry the raw observation too.
    assert!(err.to_string().contains("[1.0]"));
    assert!(env.episode().is_none());

    let mut env = rogue(true, EnvConfig::multi_agent());
    let err = env.reset(EpisodeSeed::new(0, 0)).unwrap_err();
    assert!(matches!(err, EnvError::EngineInconsistency { .. }));
    assert!(err.to_string().contains("[0.0]"));
    assert!(env.step(&ActionRequest::per_agent(&[[NOOP_ACTION], [NOOP_ACTION]])).is_err());
    assert!(!env.is_failed(AgentId::new(0)));
    assert!(!env.is_failed(AgentId::new(1)));
}

/// An engine that starts with an out-of-range mover fails at reset.
#[test]
fn test_out_of_range_mover_at_reset() {
    let mut env = rogue(true, EnvConfig::new());
    let err = env.reset(EpisodeSeed::new(0, 0)).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(env.step(&play(0)).unwrap_err(), EnvError::NoEpisode);
}

/// A declared observation size the engine cannot meet fails at reset.
#[test]
fn test_observation_size_mismatch() {
    let mut env = GameEnv::new(EndlessFactory, TensorEncoder::new(5), EnvConfig::new()).unwrap();
    let err = env.reset(EpisodeSeed::new(0, 0)).unwrap_err();
    assert!(err.is_fatal());
}

/// Tic-tac-toe cells addressed as `[row, column]`.
fn grid_catalogue() -> ActionCatalogue {
    let cells = (0..3)
        .flat_map(|row| (0..3).map(move |col| vec![row as f64, col as f64]))
        .collect();
    ActionCatalogue::from_vectors(cells)
}

/// Two-dimensional action vectors decode to engine actions in single-agent mode.
#[test]
fn test_multi_dimensional_catalogue_single_agent() {
    let mut env = GameEnv::with_catalogue(
        TicTacToeFactory,
        HistoryEncoder::new(),
        EnvConfig::new(),
        grid_catalogue(),
    )
    .unwrap();

    let names: Vec<&str> = env.variables()[10..].iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Move 0", "Move 1"]);

    env.reset(EpisodeSeed::new(0, 0)).unwrap();
    let result = env.step(&ActionRequest::single(&[1.0, 1.0])).unwrap();
    assert_eq!(result.termination, TerminationKind::Ongoing);
    assert_eq!(result.observations[0].get(1), Some(4.0));

    let engine = env.episode().unwrap().handle().engine();
    assert_eq!(engine.cell(4), Some(AgentId::new(0)));

    // The 1-D form is a shape error, an unknown 2-D vector is illegal.
    let err = env.step(&play(2)).unwrap_err();
    assert!(matches!(err, EnvError::RequestShape { .. }));
    let result = env.step(&ActionRequest::single(&[3.0, 0.0])).unwrap();
    assert_eq!(scalar(&result.reward), -100.0);
    assert_eq!(result.termination, TerminationKind::Terminal);
}

/// Multi-agent mode appends a two-dimensional no-op.
#[test]
fn test_multi_dimensional_catalogue_multi_agent() {
    let mut env = GameEnv::with_catalogue(
        TicTacToeFactory,
        HistoryEncoder::new(),
        EnvConfig::multi_agent(),
        grid_catalogue(),
    )
    .unwrap();
    assert_eq!(
        env.catalogue().possible_actions().last(),
        Some(&vec![NOOP_ACTION, NOOP_ACTION])
    );

    env.reset(EpisodeSeed::new(0, 0)).unwrap();
    let noop = [NOOP_ACTION, NOOP_ACTION];
    env.step(&ActionRequest::per_agent(&[[0.0, 2.0], noop])).unwrap();
    let result = env
        .step(&ActionRequest::per_agent(&[noop, [2.0, 0.0]]))
        .unwrap();

    assert_eq!(result.termination, TerminationKind::Ongoing);
    let engine = env.episode().unwrap().handle().engine();
    assert_eq!(engine.cell(2), Some(AgentId::new(0)));
    assert_eq!(engine.cell(6), Some(AgentId::new(1)));
}

/// A declared entry equal to the no-op is a configuration error in multi-agent mode.
#[test]
fn test_catalogue_noop_collision_is_config_error() {
    let mut cells: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, 0.0]).collect();
    cells.push(vec![NOOP_ACTION, NOOP_ACTION]);

    let result = GameEnv::with_catalogue(
        TicTacToeFactory,
        HistoryEncoder::new(),
        EnvConfig::multi_agent(),
        ActionCatalogue::from_vectors(cells.clone()),
    );
    assert!(matches!(result, Err(EnvError::Config(_))));

    // Single-agent mode has no no-op to collide with.
    let env = GameEnv::with_catalogue(
        TicTacToeFactory,
        HistoryEncoder::new(),
        EnvConfig::new(),
        ActionCatalogue::from_vectors(cells),
    );
    assert!(env.is_ok());
}

/// Setup metadata serializes for the training loop.
#[test]
fn test_variables_serialize() {
    let env = leduc(EnvConfig::new().with_action_bounds(0.0, 2.0));

    let json = serde_json::to_string(env.variables()).unwrap();
    assert!(json.contains("State Variable 9"));
    assert!(json.contains("\"Move\""));
    assert_eq!(
        env.catalogue().possible_actions(),
        vec![vec![0.0], vec![1.0], vec![2.0]]
    );
}
