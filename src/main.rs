//! PatternForge CLI - Generate MIDI patterns from genre templates
//!
//! # Commands
//!
//! - `patternforge generate` - Generate an arrangement and write a .mid file
//! - `patternforge genres` - List genres with their BPM ranges
//! - `patternforge scenarios` - List scenarios and their sections
//!
//! # Usage
//!
//! ```bash
//! patternforge generate --genre house --variations 2 --output house.mid
//! RUST_LOG=debug patternforge generate --genre techno --seed 7 --layout sequential -o techno.mid
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use patternforge::{GenerationRequest, GeneratorConfig, GenreCatalog, PatternEngine, SectionLayout};

/// PatternForge - Template-driven MIDI pattern generator
#[derive(Parser)]
#[command(name = "patternforge")]
#[command(about = "Generate multi-track MIDI patterns for electronic genres")]
#[command(version)]
struct Cli {
    /// Generator config (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Genre/scenario catalog (JSON); the built-in catalog when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an arrangement and write it as a Standard MIDI File
    Generate(GenerateArgs),

    /// List genres with their BPM ranges
    Genres,

    /// List scenarios and their sections
    Scenarios,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(short, long)]
    genre: String,

    /// Scenario key (config default when omitted)
    #[arg(short, long)]
    scenario: Option<String>,

    #[arg(long, default_value_t = 1)]
    variations: u32,

    #[arg(long, default_value_t = 1)]
    complexity: u32,

    /// Tempo in BPM (lower end of the genre range when omitted)
    #[arg(short, long)]
    tempo: Option<u32>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// How sections are placed in time (config value when omitted)
    #[arg(long, value_enum)]
    layout: Option<SectionLayout>,

    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => GenreCatalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => GenreCatalog::builtin(),
    };

    match cli.command {
        Commands::Generate(args) => generate(config, catalog, args),
        Commands::Genres => {
            for summary in catalog.summaries() {
                let (min, max) = summary.bpm_range;
                println!("{:<10} {}-{} BPM, {} bars", summary.name, min, max, summary.bars);
            }
            Ok(())
        }
        Commands::Scenarios => {
            for name in catalog.list_scenarios() {
                let scenario = catalog.scenario(&name)?;
                println!("{:<18} {}", name, scenario.sections.join(" -> "));
            }
            Ok(())
        }
    }
}

fn generate(mut config: GeneratorConfig, catalog: GenreCatalog, args: GenerateArgs) -> Result<()> {
    if let Some(layout) = args.layout {
        config.section_layout = layout;
    }

    let tempo = match args.tempo {
        Some(tempo) => tempo,
        None => catalog.bpm_range(&args.genre)?.0,
    };

    let engine = PatternEngine::new(config, Arc::new(catalog))?;
    let request = GenerationRequest {
        genre: args.genre,
        scenario: args.scenario,
        variation_count: args.variations,
        complexity: args.complexity,
        tempo_bpm: tempo,
    };

    let arrangement = match args.seed {
        Some(seed) => engine.generate_seeded(&request, seed)?,
        None => engine.generate(&request)?,
    };
    engine
        .export_to_path(&arrangement, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{} notes in {} tracks ({:.1}s) -> {}",
        arrangement.note_count(),
        arrangement.tracks().len(),
        arrangement.duration_seconds(),
        args.output.display()
    );
    Ok(())
}
