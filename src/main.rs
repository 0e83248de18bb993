// =============================================================================
// Street Fighter III: 3rd Strike episode-control environment
// =============================================================================
// Run:
//   cargo run --release -- baseline --games 5
//   cargo run --release -- check-scripts --scripts scripts/sfiii3n.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sf3_env::{
    EnvConfig, Environment, ScriptBook, SimConfig, SimulatedArcade, TransitionScripts, Wins,
    run_random_baseline,
};

// =============================================================================
// Random Baseline
// =============================================================================

fn load_config(args: &EnvArgs) -> Result<EnvConfig> {
    let mut config = match &args.config {
        Some(path) => EnvConfig::from_json_path(path)?,
        None => EnvConfig::default(),
    };
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(frame_ratio) = args.frame_ratio {
        config.frame_ratio = frame_ratio;
    }
    if let Some(frames_per_step) = args.frames_per_step {
        config.frames_per_step = frames_per_step;
    }
    config.throttle |= args.throttle;
    config.debug |= args.debug;
    config.validate()?;
    Ok(config)
}

fn load_scripts(path: Option<&PathBuf>) -> Result<ScriptBook> {
    let book = match path {
        Some(path) => ScriptBook::from_json_path(path)
            .with_context(|| format!("Failed to load scripts: {}", path.display()))?,
        None => ScriptBook::builtin()?,
    };
    Ok(book)
}

fn baseline(args: &BaselineArgs) -> Result<()> {
    let config = load_config(&args.env)?;
    let book = load_scripts(args.env.scripts.as_ref())?;

    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("  BASELINE — random agent vs simulated arcade");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!(
        "difficulty={} frame_ratio={} frames_per_step={} games={}",
        config.difficulty, config.frame_ratio, config.frames_per_step, args.games
    );

    let arcade = SimulatedArcade::new(
        config.adapter_options(),
        SimConfig::for_book(&book, config.difficulty),
        args.seed,
    );
    let mut env = Environment::new(arcade, book, config)?;
    let stats = run_random_baseline(&mut env, args.games, args.seed)?;
    let ticks = env.adapter().ticks();
    env.close()?;

    eprintln!(
        "\nBaseline: games={} rounds={} p1_wins={} steps={} ticks={ticks}",
        stats.games, stats.rounds, stats.p1_games_won, stats.steps
    );
    eprintln!(
        "          mean_reward={:.1} final_stage={}",
        stats.avg_reward, stats.final_stage
    );
    Ok(())
}

// =============================================================================
// Script Check
// =============================================================================

fn check_scripts(args: &CheckScriptsArgs) -> Result<()> {
    let config = load_config(&args.env)?;
    let book = load_scripts(args.env.scripts.as_ref())?;
    let fr = config.frame_ratio;

    let report = |name: &str, script: &sf3_env::Script| {
        let ticks: u32 = script.iter().map(|s| s.wait + 1).sum();
        println!("{name:<22} steps={:>3} ticks={ticks:>5}", script.len());
    };
    report("set-difficulty", &book.set_difficulty(fr, config.difficulty));
    report("start-game", &book.start_game(fr));
    for stage in [1, 2] {
        let won = Wins { p1: 2, p2: 0 };
        report(&format!("reset (won, stage {stage})"), &book.reset_game(fr, won, stage));
    }
    report("reset (lost)", &book.reset_game(fr, Wins { p1: 0, p2: 2 }, 1));
    Ok(())
}

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(name = "sf3-env", about = "Street Fighter III episode-control environment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a random agent against the simulated arcade
    Baseline(BaselineArgs),
    /// Load a script book and print the tick cost of each sequence
    CheckScripts(CheckScriptsArgs),
}

#[derive(Parser)]
struct EnvArgs {
    /// JSON file with an EnvConfig
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON script book (defaults to the built-in sfiii3n book)
    #[arg(long)]
    scripts: Option<PathBuf>,
    #[arg(long)]
    difficulty: Option<u8>,
    #[arg(long)]
    frame_ratio: Option<u32>,
    #[arg(long)]
    frames_per_step: Option<usize>,
    #[arg(long, default_value_t = false)]
    throttle: bool,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Parser)]
struct BaselineArgs {
    #[command(flatten)]
    env: EnvArgs,
    #[arg(long, default_value = "3")]
    games: usize,
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(Parser)]
struct CheckScriptsArgs {
    #[command(flatten)]
    env: EnvArgs,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Baseline(args) => baseline(args),
        Commands::CheckScripts(args) => check_scripts(args),
    }
}
