//! Gridfront - Headless Match Runner
//!
//! Plays a full match with the decision engine driving both sides and
//! prints the final record.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use gridfront::battle::ai::{load_personality, load_personality_file, AiPersonality};
use gridfront::battle::{
    GameEngine, GameEvent, JsonLinesRecorder, MatchRecord, MatchRecorder, Phase,
};
use gridfront::core::config::{load_config, GameConfig, MatchSettings};
use gridfront::core::error::Result;
use gridfront::core::types::{Difficulty, Side};

/// Headless Match Runner - decision engine vs decision engine
#[derive(Parser, Debug)]
#[command(name = "gridfront")]
#[command(about = "Play a headless match and print the final record")]
struct Args {
    /// Side length of the square map (10, 20 or 30)
    #[arg(long, default_value_t = 10)]
    size: u32,

    /// Difficulty: baby, normal, hard or nightmare
    #[arg(long, default_value = "normal")]
    difficulty: Difficulty,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Sandbox mode (inflated base HP, no monopoly victory)
    #[arg(long)]
    sandbox: bool,

    /// Maximum full turns before the match is called unfinished
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// AI personality name (loaded from data/personalities/)
    #[arg(long)]
    personality: Option<String>,

    /// AI personality TOML file (overrides --personality)
    #[arg(long)]
    personality_file: Option<PathBuf>,

    /// Rule overrides as a TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Append the finished record to this JSON-lines file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Print every event as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    finished: bool,
    turns: u32,
    record: Option<MatchRecord>,
    player_base_hp: i32,
    ai_base_hp: i32,
    seed: u64,
    difficulty: Difficulty,
    personality: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridfront=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    let settings = MatchSettings {
        difficulty: args.difficulty,
        sandbox: args.sandbox,
        map_size: args.size,
        seed: args.seed,
    };

    let personality = resolve_personality(&args)?;
    let mut engine = GameEngine::new(config, settings)?;
    engine.set_personality(Side::Ai, personality.clone());

    tracing::info!(
        size = args.size,
        difficulty = ?args.difficulty,
        seed = args.seed,
        personality = %personality.name,
        "starting headless match"
    );

    while !engine.is_game_over() && engine.turn() <= args.max_turns {
        let side = match engine.phase() {
            Phase::PlayerPhase => Side::Player,
            Phase::AiPhase => Side::Ai,
            Phase::GameOver => break,
        };
        let events = engine.run_turn_for(side);
        if args.verbose {
            print_events(&events);
        }
    }

    let record = engine.outcome().cloned();
    if let (Some(record), Some(path)) = (&record, &args.record) {
        JsonLinesRecorder::new(path).record(record)?;
    }

    let result = RunResult {
        finished: record.is_some(),
        turns: engine.turn(),
        record,
        player_base_hp: engine.base_hp(Side::Player),
        ai_base_hp: engine.base_hp(Side::Ai),
        seed: args.seed,
        difficulty: args.difficulty,
        personality: personality.name,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(&result),
    }
    Ok(())
}

fn resolve_personality(args: &Args) -> Result<AiPersonality> {
    if let Some(path) = &args.personality_file {
        return load_personality_file(path);
    }
    match &args.personality {
        Some(name) => load_personality(name),
        None => Ok(AiPersonality::for_difficulty(args.difficulty)),
    }
}

fn print_events(events: &[GameEvent]) {
    for event in events {
        println!("[turn {:>3}] {}", event.turn, event.description);
    }
}

fn print_text(result: &RunResult) {
    println!("=== GRIDFRONT MATCH ===");
    println!("Seed:        {}", result.seed);
    println!("Difficulty:  {:?}", result.difficulty);
    println!("Personality: {}", result.personality);
    match &result.record {
        Some(record) => {
            println!("Winner:      {:?} by {:?}", record.winner, record.victory);
            println!("Turns:       {}", record.turns_played);
            println!("Tiles held:  {}", record.resource_tiles_held);
        }
        None => println!("Unfinished after {} turns", result.turns),
    }
    println!(
        "Base HP:     player {} / ai {}",
        result.player_base_hp, result.ai_base_hp
    );
}
