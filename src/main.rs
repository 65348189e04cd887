// Headless match runner
//
// Usage:
//   cargo run --bin snake-arena -- <policy> [<policy>] [options]
//
// Policies: dfs, ucs, astar, hill, anneal, minimax, minimax:<depth>

use log::info;
use std::env;
use std::process;

use snake_engine::config::Config;
use snake_engine::match_logger::MatchLogger;
use snake_engine::simulation::{run_batch, EndReason, MatchSummary, Policy};

fn print_usage() {
    eprintln!("Snake Arena");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  snake-arena <POLICY> [POLICY] [OPTIONS]");
    eprintln!();
    eprintln!("POLICIES:");
    eprintln!("  dfs, ucs, astar         Re-plan a path to the goal every tick");
    eprintln!("  hill                    Greedy hill climbing");
    eprintln!("  anneal                  Simulated annealing");
    eprintln!("  minimax[:DEPTH]         Alpha-beta minimax (needs a second contender)");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --games <N>             Number of matches (default: from config)");
    eprintln!("  --seed <S>              Base seed; match i uses S + i");
    eprintln!("  --ticks <N>             Tick limit per match");
    eprintln!("  --config <path>         Path to Engine.toml (default: Engine.toml)");
    eprintln!("  --log                   Write the JSONL match log from [debug]");
    eprintln!("  --help                  Show this help message");
}

fn parse_arg<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let Some(value) = args.get(i + 1) else {
        eprintln!("Error: {} requires an argument", flag);
        process::exit(1);
    };
    value.parse::<T>().unwrap_or_else(|e| {
        eprintln!("Error: invalid value '{}' for {}: {}", value, flag, e);
        process::exit(1);
    })
}

fn print_summaries(summaries: &[MatchSummary]) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("                    MATCH RESULTS");
    println!("═══════════════════════════════════════════════════════════");

    for summary in summaries {
        let scores: Vec<String> = summary
            .contenders
            .iter()
            .map(|c| {
                format!(
                    "{} {} (len {}{})",
                    c.policy,
                    c.score,
                    c.length,
                    if c.alive { "" } else { ", dead" }
                )
            })
            .collect();
        println!(
            "Game {:>3} seed {:>6}: {:>5} ticks, {:?}, {}",
            summary.game,
            summary.seed,
            summary.ticks,
            summary.end_reason,
            scores.join(" | ")
        );
    }

    let contenders = summaries.first().map(|s| s.contenders.len()).unwrap_or(0);
    println!("═══════════════════════════════════════════════════════════");
    for idx in 0..contenders {
        let total: u32 = summaries.iter().map(|s| s.contenders[idx].score).sum();
        let wins = summaries.iter().filter(|s| s.winner == Some(idx)).count();
        println!(
            "#{} {:<10} avg score {:.2}, wins {}",
            idx,
            summaries[0].contenders[idx].policy,
            total as f64 / summaries.len() as f64,
            wins
        );
    }
    let timeouts = summaries
        .iter()
        .filter(|s| s.end_reason == EndReason::TickLimit)
        .count();
    println!("Matches hitting the tick limit: {}", timeouts);
    println!();
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) { 0 } else { 1 });
    }

    let mut config_path: Option<String> = None;
    let mut games: Option<u32> = None;
    let mut seed: Option<u64> = None;
    let mut ticks: Option<u32> = None;
    let mut log_enabled = false;
    let mut policy_names = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                games = Some(parse_arg(&args, i, "--games"));
                i += 1;
            }
            "--seed" => {
                seed = Some(parse_arg(&args, i, "--seed"));
                i += 1;
            }
            "--ticks" => {
                ticks = Some(parse_arg(&args, i, "--ticks"));
                i += 1;
            }
            "--config" => {
                config_path = Some(parse_arg(&args, i, "--config"));
                i += 1;
            }
            "--log" => {
                log_enabled = true;
            }
            flag if flag.starts_with("--") => {
                eprintln!("Error: Unknown option '{}'", flag);
                print_usage();
                process::exit(1);
            }
            name => policy_names.push(name.to_string()),
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };
    if let Some(ticks) = ticks {
        config.simulation.max_ticks = ticks;
    }

    let policies: Vec<Policy> = policy_names
        .iter()
        .map(|name| Policy::parse(name, config.minimax.depth))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });

    let games = games.unwrap_or(config.simulation.games).max(1);
    let base_seed = seed.or(config.simulation.seed).unwrap_or_else(rand::random::<u64>);
    let logger = MatchLogger::new(
        log_enabled || config.debug.enabled,
        &config.debug.log_file_path,
    );

    info!(
        "Running {} match(es), base seed {}, {}x{} grid",
        games, base_seed, config.grid.width, config.grid.height
    );

    match run_batch(&config, &policies, games, base_seed, &logger) {
        Ok(summaries) => {
            logger.flush();
            print_summaries(&summaries);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
