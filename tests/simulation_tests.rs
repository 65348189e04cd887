// Integration tests for headless matches

use snake_engine::config::Config;
use snake_engine::match_logger::MatchLogger;
use snake_engine::pathfinding::PathStrategy;
use snake_engine::simulation::{run_batch, EndReason, Match, Policy};
use snake_engine::types::Coord;

fn config(width: i32, height: i32, max_ticks: u32) -> Config {
    let mut config = Config::default_hardcoded();
    config.grid.width = width;
    config.grid.height = height;
    config.simulation.max_ticks = max_ticks;
    config
}

#[test]
fn test_path_follower_eats_on_open_board() {
    let config = config(10, 10, 200);
    let policy = Policy::Path { strategy: PathStrategy::UniformCost };
    let mut game = Match::new(&config, &[policy], 0, 17, MatchLogger::disabled()).unwrap();

    let summary = game.run().unwrap();
    assert!(summary.ticks <= 200);
    assert!(summary.contenders[0].score >= 1, "never reached a goal");
    assert_eq!(summary.contenders[0].length, 1 + summary.contenders[0].score as usize);
    assert_eq!(summary.winner, None);
}

#[test]
fn test_same_seed_replays_identically() {
    let config = config(12, 12, 150);
    let policies = [Policy::HillClimbing, Policy::SimulatedAnnealing];

    let first = Match::new(&config, &policies, 0, 42, MatchLogger::disabled())
        .unwrap()
        .run()
        .unwrap();
    let second = Match::new(&config, &policies, 0, 42, MatchLogger::disabled())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_head_to_head_kills_both() {
    // 9x1 corridor: contenders start at x = 2 and x = 6 and meet on the goal
    let config = config(9, 1, 100);
    let policies = [Policy::HillClimbing, Policy::HillClimbing];
    let mut game = Match::new(&config, &policies, 0, 1, MatchLogger::disabled()).unwrap();
    game.set_goal(Coord::new(4, 0)).unwrap();

    assert_eq!(game.step().unwrap(), None);
    assert_eq!(game.contenders()[0].body, vec![Coord::new(3, 0)]);
    assert_eq!(game.contenders()[1].body, vec![Coord::new(5, 0)]);

    assert_eq!(game.step().unwrap(), Some(EndReason::AllDead));
    assert!(game.contenders().iter().all(|c| !c.alive));

    let summary = game.run().unwrap();
    assert_eq!(summary.end_reason, EndReason::AllDead);
    assert_eq!(summary.winner, None);
    assert_eq!(summary.ticks, 2);
}

#[test]
fn test_filling_the_board_ends_the_match() {
    // Three cells: the agent eats twice and fills the board whichever side the goal spawns
    let config = config(3, 1, 100);
    let mut game = Match::new(&config, &[Policy::HillClimbing], 0, 9, MatchLogger::disabled()).unwrap();

    let summary = game.run().unwrap();
    assert_eq!(summary.end_reason, EndReason::BoardFull);
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.contenders[0].score, 2);
    assert_eq!(summary.contenders[0].length, 3);
    assert!(summary.contenders[0].alive);
}

#[test]
fn test_tick_limit_stops_the_match() {
    let config = config(10, 10, 5);
    let policies = [
        Policy::Path { strategy: PathStrategy::AStar },
        Policy::Minimax { depth: 2 },
    ];
    let mut game = Match::new(&config, &policies, 0, 3, MatchLogger::disabled()).unwrap();

    let summary = game.run().unwrap();
    assert!(summary.ticks <= 5);
    if summary.ticks == 5 {
        assert_eq!(summary.end_reason, EndReason::TickLimit);
    }
}

#[test]
fn test_invalid_lineups_are_rejected() {
    let config = config(10, 10, 10);
    let logger = MatchLogger::disabled();

    assert!(Match::new(&config, &[], 0, 0, logger.clone()).is_err());
    assert!(Match::new(&config, &[Policy::Minimax { depth: 2 }], 0, 0, logger.clone()).is_err());
    assert!(Match::new(
        &config,
        &[Policy::HillClimbing, Policy::Minimax { depth: 0 }],
        0,
        0,
        logger.clone()
    )
    .is_err());
    assert!(Match::new(
        &config,
        &[Policy::HillClimbing, Policy::HillClimbing, Policy::HillClimbing],
        0,
        0,
        logger
    )
    .is_err());
}

#[test]
fn test_batch_runs_every_game_with_its_own_seed() {
    let config = config(10, 10, 50);
    let policies = [Policy::HillClimbing, Policy::Path { strategy: PathStrategy::DepthFirst }];

    let summaries = run_batch(&config, &policies, 4, 100, &MatchLogger::disabled()).unwrap();

    assert_eq!(summaries.len(), 4);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.game, i as u32);
        assert_eq!(summary.seed, 100 + i as u64);
        assert_eq!(summary.contenders.len(), 2);
    }

    // Parallel execution does not change individual results
    let single = Match::new(&config, &policies, 2, 102, MatchLogger::disabled())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summaries[2], single);
}
