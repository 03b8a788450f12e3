//! equilibrium CLI - Command-line interface for the equilibrium solvers
//!
//! This binary provides a CLI harness for the engine and the security model:
//! solving preset, file-based or random games, analyzing a security system
//! description, and quick throughput checks.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use equilibrium_engine::presets::{preset, PRESET_KEYS};
use equilibrium_engine::trace::StepKind;
use equilibrium_engine::{
    ApproxConfig, ApproxReport, ApproximateSolver, CancelToken, ExactReport, ExactSolver, Game,
    Observer, SearchStep,
};
use equilibrium_security::{
    find_pure_equilibria, Analysis, NashOutcome, PayoffMatrix, SystemConfig, VulnerabilityDetail,
    MAX_VULNERABILITIES,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "equilibrium", version, about = "Nash equilibrium solvers")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find equilibria of a normal-form game
    Solve {
        /// Preset game: prisoners, coordination, chicken, rps
        #[arg(long, conflicts_with_all = ["game", "random"])]
        preset: Option<String>,
        /// JSON game description
        #[arg(long, conflicts_with = "random")]
        game: Option<PathBuf>,
        /// Random game with integer payoffs in [-5, 4]
        #[arg(long)]
        random: bool,
        #[arg(long, default_value_t = 2)]
        players: usize,
        #[arg(long, default_value_t = 2)]
        actions: usize,
        #[arg(long, value_enum, default_value_t = Algorithm::Both)]
        algorithm: Algorithm,
        #[arg(long, default_value_t = 0.01)]
        epsilon: f64,
        #[arg(long, default_value_t = 200)]
        max_iterations: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Analyze a security system description
    Security {
        #[arg(long)]
        config: PathBuf,
        /// Override the replicator dynamics iteration count
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Measure solver throughput
    Bench {
        #[arg(value_enum, default_value_t = BenchTarget::Security)]
        target: BenchTarget,
        /// Vulnerability count (security) or action count (approximate)
        size: Option<usize>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    Exact,
    Approximate,
    Both,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BenchTarget {
    Security,
    Approximate,
}

/// Forwards the exact solver's trace to the logger.
struct LogObserver;

impl Observer for LogObserver {
    fn step(&mut self, step: &SearchStep) {
        match step.kind {
            StepKind::Warning => log::warn!("{}", step.message),
            StepKind::Error => log::error!("{}", step.message),
            StepKind::Testing => log::trace!("{}", step.message),
            _ => log::debug!("{}", step.message),
        }
    }
}

#[derive(Serialize)]
struct SolveOutput<'a> {
    game: &'a Game,
    #[serde(skip_serializing_if = "Option::is_none")]
    exact: Option<ExactReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approximate: Option<ApproxReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Solve {
            preset,
            game,
            random,
            players,
            actions,
            algorithm,
            epsilon,
            max_iterations,
            seed,
            json,
        } => {
            let game = load_game(preset, game, random, players, actions, seed)?;
            let config = ApproxConfig {
                epsilon,
                max_iterations,
                seed,
            };
            solve(&game, algorithm, config, json)
        }
        Command::Security {
            config,
            iterations,
            json,
        } => security(config, iterations, json),
        Command::Bench { target, size } => {
            bench(target, size);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .context("initialize logger")
}

fn load_game(
    key: Option<String>,
    path: Option<PathBuf>,
    random: bool,
    players: usize,
    actions: usize,
    seed: Option<u64>,
) -> Result<Game> {
    if let Some(key) = key {
        return preset(&key)
            .ok_or_else(|| anyhow!("unknown preset {:?}, expected one of {:?}", key, PRESET_KEYS));
    }
    if let Some(path) = path {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read game file {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("parse game file {}", path.display()));
    }
    if random {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        return Game::random(players, actions, &mut rng).context("generate random game");
    }
    bail!("choose a game with --preset, --game or --random")
}

fn solve(game: &Game, algorithm: Algorithm, config: ApproxConfig, json: bool) -> Result<()> {
    let cancel = CancelToken::new();
    let mut solver = ApproximateSolver::new(game, config).context("configure approximate solver")?;
    let run_exact = || ExactSolver::new(game).solve(&cancel, &mut LogObserver);
    let (exact, approximate) = match algorithm {
        Algorithm::Exact => (Some(run_exact()), None),
        Algorithm::Approximate => (None, Some(solver.solve(&cancel, &mut ()))),
        Algorithm::Both => {
            let (e, a) = rayon::join(run_exact, || solver.solve(&cancel, &mut ()));
            (Some(e), Some(a))
        }
    };

    if json {
        let output = SolveOutput {
            game,
            exact,
            approximate,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} ({} players, {} actions)", game.name(), game.players(), game.actions());
    if let Some(report) = exact {
        println!();
        println!("Exact solver: {} solution(s) in {} ms", report.solutions.len(), report.time.as_millis());
        for solution in &report.solutions {
            match (solution.action_profile(), solution.indifference()) {
                (Some(profile), _) => println!("  pure   {}", game.format_profile(profile)),
                (_, Some(ix)) => println!("  mixed  p = {:.4}, q = {:.4}", ix.p, ix.q),
                _ => {}
            }
            println!("         payoffs {}", format_values(&solution.payoffs));
        }
    }
    if let Some(report) = approximate {
        println!();
        println!(
            "Approximate solver: {} after {} round(s) in {} ms",
            if report.converged { "converged" } else { "not converged" },
            report.iterations,
            report.time.as_millis()
        );
        for strategy in &report.solution.strategies {
            println!("  P{}  {}", strategy.player + 1, format_values(&strategy.distribution));
        }
        println!("  payoffs {}", format_values(&report.solution.payoffs));
    }
    Ok(())
}

fn security(path: PathBuf, iterations: Option<usize>, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read system file {}", path.display()))?;
    let mut config: SystemConfig = serde_json::from_str(&text)
        .with_context(|| format!("parse system file {}", path.display()))?;
    if let Some(iterations) = iterations {
        config.replicator.iterations = iterations;
    }
    let analysis = config.analyze().context("analyze system")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    println!("Risk scores");
    for (s, risk) in analysis.risk_scores.iter().enumerate() {
        println!("  Subsystem {:<3} {:.2}", s + 1, risk);
    }

    println!();
    println!("Vulnerabilities");
    println!("  {:<12} {:>9} {:>8} {:>8} {:>8} {:>8} {:>10}", "id", "subsystem", "iA", "cD", "cA", "prA", "severity");
    for v in &analysis.vulnerability_details {
        println!(
            "  {:<12} {:>9} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>10.2}",
            v.id,
            v.subsystem_index + 1,
            v.i_a,
            v.c_d,
            v.c_a,
            v.pr_a,
            v.vul_severity
        );
    }

    println!();
    println!("Patch priority");
    for p in &analysis.patch_priority {
        println!("  {}. {} (ratio {:.2})", p.rank, p.detail.id, p.ratio);
    }

    if let Some(profits) = &analysis.profit_distribution {
        println!();
        println!(
            "Profit distribution (attackers {:.2}, defenders {:.2})",
            profits.total_attacker_profit, profits.total_defender_profit
        );
        for share in &profits.shares {
            println!("  {:<20} {:.2}", share.name, share.profit);
        }
    }

    println!();
    match (&analysis.nash, &analysis.interpretation) {
        (NashOutcome::Unavailable(reason), _) => println!("{}", reason),
        (NashOutcome::Solved(eq), Some(reading)) => {
            println!("Pure equilibria: {}", eq.pure.len());
            for pure in &reading.pure_strategies {
                println!(
                    "  defender [{}] attacker [{}] payoffs [{:.2}, {:.2}]",
                    pure.defender_actions.join(", "),
                    pure.attacker_actions.join(", "),
                    pure.defender_payoff,
                    pure.attacker_payoff
                );
            }
            let mixed = &reading.mixed_strategy;
            println!(
                "Mixed equilibrium payoffs [{:.2}, {:.2}]",
                mixed.defender_payoff, mixed.attacker_payoff
            );
            for w in mixed.defender.iter().chain(&mixed.attacker) {
                println!("  {:>6.2}%  {}", w.probability * 100.0, w.strategy);
            }
        }
        (NashOutcome::Solved(_), None) => {}
    }
}

fn bench(target: BenchTarget, size: Option<usize>) {
    match target {
        BenchTarget::Security => {
            let k = size.unwrap_or(10);
            if k > MAX_VULNERABILITIES {
                log::error!("at most {} vulnerabilities are supported", MAX_VULNERABILITIES);
                return;
            }
            println!("Running security game benchmark...");
            println!("Vulnerabilities: {} ({} strategies per side)", k, 1usize << k);
            let details = bench_details(k);
            let start = Instant::now();
            let Some(matrix) = PayoffMatrix::build(&details) else {
                log::error!("at most {} vulnerabilities are supported", MAX_VULNERABILITIES);
                return;
            };
            let built = start.elapsed();
            let pure = find_pure_equilibria(&matrix);
            let searched = start.elapsed() - built;
            let cells = (matrix.size() * matrix.size()) as f64;
            println!("Results:");
            println!("  Matrix build: {} ms", built.as_millis());
            println!("  Pure search: {} ms ({} equilibria)", searched.as_millis(), pure.len());
            println!("  Throughput: {:.2}M cells/sec", cells / built.as_secs_f64().max(1e-9) / 1_000_000.0);
        }
        BenchTarget::Approximate => {
            let actions = size.unwrap_or(20);
            println!("Running approximate solver benchmark...");
            println!("Random 2-player game with {} actions", actions);
            let mut rng = SmallRng::seed_from_u64(0);
            let game = match Game::random(2, actions, &mut rng) {
                Ok(game) => game,
                Err(e) => {
                    log::error!("{}", e);
                    return;
                }
            };
            let config = ApproxConfig {
                epsilon: 0.0,
                max_iterations: 200,
                seed: Some(0),
            };
            let report = match ApproximateSolver::new(&game, config) {
                Ok(mut solver) => solver.solve(&CancelToken::new(), &mut ()),
                Err(e) => {
                    log::error!("{}", e);
                    return;
                }
            };
            println!("Results:");
            println!("  Duration: {} ms", report.time.as_millis());
            println!(
                "  Throughput: {:.2} rounds/sec",
                report.iterations as f64 / report.time.as_secs_f64().max(1e-9)
            );
        }
    }
}

fn bench_details(k: usize) -> Vec<VulnerabilityDetail> {
    (0..k)
        .map(|i| VulnerabilityDetail {
            id: format!("VUL-{}", i + 1),
            subsystem_index: i,
            i_a: 2.0 + (i % 7) as f64,
            c_d: 1.0 + (i % 3) as f64,
            c_a: 1.0 + (i % 4) as f64,
            pr_a: (i % 5) as f64 - 1.0,
            vul_severity: 0.0,
        })
        .collect()
}

fn format_values(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{:.4}", v)).collect();
    format!("[{}]", parts.join(", "))
}
