//! Match runner: pit two policies against each other over a batch of
//! games and report the score line.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use fg_core::{
    greedy_policy, load_value_function, random_policy, require_roster, simulate_match, Action,
    MacroMctsPolicy, MatchState, MctsConfig, MctsPolicy, PolicyNetwork, SeededDice, TeamRoster,
    ValueFunction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    Random,
    Greedy,
    Mcts,
    MacroMcts,
}

#[derive(Parser, Debug)]
#[command(name = "fg", about = "Fantasy gridiron match runner", version)]
struct Args {
    /// Home policy.
    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    home: PolicyKind,

    /// Away policy.
    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    away: PolicyKind,

    /// Number of games to play.
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Search time budget per decision, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    time: u64,

    /// JSON weights file (value function, optionally policy weights).
    #[arg(long)]
    weights: Option<String>,

    /// Exploration constant for the searchers.
    #[arg(long, default_value_t = 1.41)]
    exploration: f64,

    /// Base seed; game i plays with seed + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Home roster name.
    #[arg(long, default_value = "human")]
    home_roster: String,

    /// Away roster name.
    #[arg(long, default_value = "human")]
    away_roster: String,

    /// Per-game score lines on stdout.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

enum BuiltPolicy<'a> {
    Random(SeededDice),
    Greedy(SeededDice),
    Mcts(Box<MctsPolicy<'a>>),
    MacroMcts(Box<MacroMctsPolicy<'a>>),
}

impl<'a> BuiltPolicy<'a> {
    fn build(
        kind: PolicyKind,
        value_fn: Option<&'a (dyn ValueFunction + Sync)>,
        policy_net: Option<&'a PolicyNetwork>,
        config: &MctsConfig,
        seed: u64,
    ) -> Self {
        match kind {
            PolicyKind::Random => BuiltPolicy::Random(SeededDice::new(seed)),
            PolicyKind::Greedy => BuiltPolicy::Greedy(SeededDice::new(seed)),
            PolicyKind::Mcts => {
                let mut policy = MctsPolicy::new(value_fn, config.clone(), seed);
                if let Some(net) = policy_net {
                    *policy.search_mut() = fg_core::MctsSearch::new(value_fn, config.clone(), seed)
                        .with_policy(net);
                }
                BuiltPolicy::Mcts(Box::new(policy))
            }
            PolicyKind::MacroMcts => {
                let mut policy = MacroMctsPolicy::new(value_fn, config.clone(), seed);
                if let Some(net) = policy_net {
                    *policy.search_mut() =
                        fg_core::MacroMctsSearch::new(value_fn, config.clone(), seed)
                            .with_policy(net);
                }
                BuiltPolicy::MacroMcts(Box::new(policy))
            }
        }
    }

    fn select(&mut self, state: &MatchState) -> Action {
        match self {
            BuiltPolicy::Random(dice) => random_policy(state, dice),
            BuiltPolicy::Greedy(dice) => greedy_policy(state, dice),
            BuiltPolicy::Mcts(policy) => policy.select(state),
            BuiltPolicy::MacroMcts(policy) => policy.select(state),
        }
    }
}

fn lookup_roster(name: &str) -> Result<&'static TeamRoster> {
    require_roster(name).map_err(|e| anyhow!(e))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let args = Args::parse();

    let home_roster = lookup_roster(&args.home_roster)?;
    let away_roster = lookup_roster(&args.away_roster)?;

    let value_fn = match &args.weights {
        Some(path) => Some(
            load_value_function(path).with_context(|| format!("loading weights from {}", path))?,
        ),
        None => None,
    };
    let value_ref: Option<&(dyn ValueFunction + Sync)> = value_fn
        .as_deref()
        .map(|v| v as &(dyn ValueFunction + Sync));

    // A combined weights file may also carry a policy head.
    let policy_net = match &args.weights {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            fg_core::search::load_policy_network_from_str(&content).ok()
        }
        None => None,
    };

    let config = MctsConfig {
        time_budget_ms: args.time,
        exploration_c: args.exploration,
        ..MctsConfig::default()
    };

    let mut home_wins = 0u32;
    let mut away_wins = 0u32;
    let mut draws = 0u32;
    let mut home_total = 0i32;
    let mut away_total = 0i32;

    for game in 0..args.games {
        let game_seed = args.seed + game as u64;

        let mut home = BuiltPolicy::build(
            args.home,
            value_ref,
            policy_net.as_ref(),
            &config,
            game_seed * 2 + 1,
        );
        let mut away = BuiltPolicy::build(
            args.away,
            value_ref,
            policy_net.as_ref(),
            &config,
            game_seed * 2 + 2,
        );

        let mut home_select = |state: &MatchState| home.select(state);
        let mut away_select = |state: &MatchState| away.select(state);

        let mut dice = SeededDice::new(game_seed);
        let result = simulate_match(
            home_roster,
            away_roster,
            &mut home_select,
            &mut away_select,
            &mut dice,
            true,
        );

        home_total += result.home_score;
        away_total += result.away_score;
        match result.home_score.cmp(&result.away_score) {
            std::cmp::Ordering::Greater => home_wins += 1,
            std::cmp::Ordering::Less => away_wins += 1,
            std::cmp::Ordering::Equal => draws += 1,
        }

        if args.verbose {
            println!(
                "game {}: {} {} - {} {} ({} actions)",
                game + 1,
                home_roster.name,
                result.home_score,
                result.away_score,
                away_roster.name,
                result.total_actions
            );
        }
        info!(game, home = result.home_score, away = result.away_score, "game complete");
    }

    println!(
        "{:?} ({}) vs {:?} ({}): {} games, {}-{}-{} (W-D-L for home), touchdowns {}:{}",
        args.home,
        home_roster.name,
        args.away,
        away_roster.name,
        args.games,
        home_wins,
        draws,
        away_wins,
        home_total,
        away_total
    );

    Ok(())
}
