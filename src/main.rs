//! MTG Sim - command-line front end
//!
//! Batch bot-vs-bot simulation, single verbose games, and a couple of
//! inspection helpers for the card registry and mana notation.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mtg_sim::{
    cards::all_definitions,
    core::ManaCost,
    decks::{load_deck, sample_deck_names},
    game::{GameConfig, OutputMode, VerbosityLevel},
    simulation::{run_batch, run_game, SimulationConfig},
};

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "mtg-sim")]
#[command(about = "Two-player card game rules engine and bot simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run many heuristic-vs-heuristic games and report statistics
    Simulate {
        /// Number of games
        #[arg(long, short = 'n', default_value_t = 100)]
        games: usize,

        /// Batch seed; each game's seed is derived from it
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Turns before a game is called a draw
        #[arg(long, default_value_t = 60)]
        max_turns: u32,

        /// Sample deck name or .dck file for player 1
        #[arg(long, default_value = "red")]
        deck1: String,

        /// Sample deck name or .dck file for player 2
        #[arg(long, default_value = "green")]
        deck2: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Run games one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Play one game and print its log
    Play {
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = 60)]
        max_turns: u32,

        #[arg(long, default_value = "red")]
        deck1: String,

        #[arg(long, default_value = "green")]
        deck2: String,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,
    },

    /// List the card registry and sample decks
    Cards,

    /// Parse a mana cost like "{2}{R}{R}" and print it back
    Cost { text: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            games,
            seed,
            max_turns,
            deck1,
            deck2,
            json,
            sequential,
        } => {
            let deck1 = load_deck(&deck1).with_context(|| format!("loading deck {deck1}"))?;
            let deck2 = load_deck(&deck2).with_context(|| format!("loading deck {deck2}"))?;
            let mut config = SimulationConfig::new(deck1, deck2);
            config.games = games;
            config.seed = seed;
            config.parallel = !sequential;
            config.game = GameConfig::default()
                .with_max_turns(max_turns)
                .with_verbosity(VerbosityLevel::Silent);

            let summary = run_batch(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }

        Commands::Play {
            seed,
            max_turns,
            deck1,
            deck2,
            verbosity,
        } => {
            let deck1 = load_deck(&deck1).with_context(|| format!("loading deck {deck1}"))?;
            let deck2 = load_deck(&deck2).with_context(|| format!("loading deck {deck2}"))?;
            let seed = seed.unwrap_or_else(rand::random);
            println!("Seed: {seed}");
            let config = GameConfig::default()
                .with_seed(seed)
                .with_max_turns(max_turns)
                .with_verbosity(verbosity.0)
                .with_output_mode(OutputMode::Stdout);
            let report = run_game(&config, &deck1, &deck2)?;
            match report.winner {
                Some(name) => println!("\n{name} wins after {} turns ({:?})", report.turns, report.end_reason),
                None => println!("\nDraw after {} turns", report.turns),
            }
        }

        Commands::Cards => {
            for def in all_definitions() {
                let types: Vec<String> = def.types.iter().map(|t| format!("{t:?}")).collect();
                let stats = match (def.power, def.toughness) {
                    (Some(p), Some(t)) => format!(" {p}/{t}"),
                    _ => String::new(),
                };
                println!("{:<28} {:<14} {}{}", def.name, def.cost.to_string(), types.join(" "), stats);
            }
            println!("\nSample decks: {}", sample_deck_names().collect::<Vec<_>>().join(", "));
        }

        Commands::Cost { text } => {
            let cost = ManaCost::parse(&text)?;
            if cost.to_string() != text.trim() {
                println!("normalized: {cost}");
            }
            println!("{cost} (mana value {})", cost.cmc());
            if cost.has_phyrexian() {
                println!("{} Phyrexian symbol(s), each payable with 2 life", cost.phyrexian_total());
            }
        }
    }

    Ok(())
}
