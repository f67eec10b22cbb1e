//! Spellcast - gesture learning and recognition
//!
//! Learns named gestures from drawn paths, recognizes new drawings, and
//! replays recorded tracking traces through the live engine.

use anyhow::Context;
use spell_engine::app::cli::{Cli, Commands, ConfigAction};
use spell_engine::app::config::Config;
use spell_engine::geometry::Point;
use spell_engine::recognition::{
    CaptureOutcome, GestureLearner, GestureMatcher, MatchStrategy, TemplateLibrary,
    REQUIRED_SAMPLES,
};
use spell_engine::workflow::{GestureEngine, TrackingTrace};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };
    let library_path = cli.library.clone().unwrap_or_else(|| config.library_path());

    // Execute command
    match cli.command {
        Commands::Learn { name, samples } => {
            run_learn(&name, &samples, &config, &library_path)?;
        }
        Commands::Recognize {
            path,
            all,
            strategy,
        } => {
            run_recognize(&path, all, strategy, &config, &library_path)?;
        }
        Commands::List => {
            run_list(&library_path)?;
        }
        Commands::Delete { name, force } => {
            run_delete(&name, force, &library_path)?;
        }
        Commands::Import { file } => {
            run_import(&file, &library_path)?;
        }
        Commands::Replay {
            trace,
            render_every_ms,
        } => {
            run_replay(&trace, render_every_ms, &config, &library_path)?;
        }
        Commands::Init { force } => {
            run_init(force, &config, &config_path, &library_path)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, &config_path)?;
        }
    }

    Ok(())
}

/// Read a JSON array of `[x, y]` pairs
fn read_path_file(path: &Path) -> anyhow::Result<Vec<Point>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read path file {}", path.display()))?;
    let points: Vec<Point> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of [x, y] pairs", path.display()))?;
    Ok(points)
}

fn run_learn(
    name: &str,
    samples: &[PathBuf],
    config: &Config,
    library_path: &Path,
) -> anyhow::Result<()> {
    let mut library = TemplateLibrary::load_or_default(library_path)?;
    let mut learner = GestureLearner::new()
        .with_consistency_threshold(config.learning.consistency_threshold)
        .with_min_points(config.recognition.min_points);

    learner.start(name)?;
    let replacing = library.contains(name.trim());

    for sample in samples {
        let path = read_path_file(sample)?;
        match learner.capture_pattern(&path, &mut library)? {
            CaptureOutcome::Captured { captured, .. } => {
                println!(
                    "Captured drawing {}/{} ({} points)",
                    captured,
                    REQUIRED_SAMPLES,
                    path.len()
                );
            }
            CaptureOutcome::Committed {
                name,
                mean_similarity,
            } => {
                library.save(library_path)?;
                info!(name = %name, path = %library_path.display(), "Saved template library");
                let verb = if replacing { "Re-learned" } else { "Learned" };
                println!(
                    "{} '{}' (consistency {:.3}) -> {}",
                    verb,
                    name,
                    mean_similarity,
                    library_path.display()
                );
            }
            CaptureOutcome::Rejected {
                mean_similarity,
                reason,
            } => {
                anyhow::bail!(
                    "{} (consistency {:.3}, need more than {:.3})",
                    reason,
                    mean_similarity,
                    config.learning.consistency_threshold
                );
            }
        }
    }

    Ok(())
}

fn run_recognize(
    path: &Path,
    all: bool,
    strategy: Option<MatchStrategy>,
    config: &Config,
    library_path: &Path,
) -> anyhow::Result<()> {
    let library = TemplateLibrary::load_or_default(library_path)?;
    if library.is_empty() {
        anyhow::bail!(
            "No gestures learned yet in {}. Teach one with: spellcast learn",
            library_path.display()
        );
    }

    let matcher = GestureMatcher::new()
        .with_threshold(config.recognition.threshold)
        .with_strategy(strategy.unwrap_or(config.recognition.strategy))
        .with_min_points(config.recognition.min_points);
    let raw = read_path_file(path)?;

    if all {
        println!("Scores ({}):", matcher.strategy());
        let ranked = matcher.rank(&raw, &library);
        if ranked.is_empty() {
            println!("  (path too short or degenerate)");
        }
        for m in ranked {
            println!("  {:<24} {:.3}", m.name, m.score);
        }
    }

    // Without an explicit strategy the authoritative matcher decides
    let hit = if strategy.is_some() {
        matcher.match_path(&raw, &library)
    } else {
        matcher.recognize(&raw, &library)
    };
    match hit {
        Some(m) => println!("Recognized: {} (score {:.3})", m.name, m.score),
        None => println!(
            "No gesture scored above {:.2}",
            config.recognition.threshold
        ),
    }

    Ok(())
}

fn run_list(library_path: &Path) -> anyhow::Result<()> {
    let library = TemplateLibrary::load_or_default(library_path)?;

    println!("Gestures in {}:", library_path.display());
    for template in library.iter() {
        let outline = if template.has_outline() { "" } else { "  (no outline)" };
        println!("  {}{}", template.name, outline);
    }

    if library.is_empty() {
        println!("  (none)");
        println!("Teach one with: spellcast learn --name <NAME> <PATH> <PATH> <PATH>");
    }

    Ok(())
}

fn run_delete(name: &str, force: bool, library_path: &Path) -> anyhow::Result<()> {
    let mut library = TemplateLibrary::load_or_default(library_path)?;

    if !library.contains(name) {
        anyhow::bail!("Gesture '{}' not found in {}", name, library_path.display());
    }

    if !force {
        println!("Will delete gesture '{}' from {}", name, library_path.display());
        println!("Re-run with --force to delete it");
        return Ok(());
    }

    library.remove(name);
    library.save(library_path)?;
    println!("Deleted: {}", name);

    Ok(())
}

fn run_import(file: &Path, library_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read preset file {}", file.display()))?;
    let presets: BTreeMap<String, Vec<Point>> = serde_json::from_str(&content).with_context(|| {
        format!(
            "{} is not a JSON object of name -> [[x, y], ...]",
            file.display()
        )
    })?;

    let mut library = TemplateLibrary::load_or_default(library_path)?;
    let summary = library.import(presets);
    library.save(library_path)?;

    println!(
        "Imported {} gesture(s) into {}",
        summary.imported.len(),
        library_path.display()
    );
    for name in &summary.skipped {
        println!("  skipped '{}' (no usable shape)", name);
    }

    Ok(())
}

fn run_replay(
    trace_path: &Path,
    render_every_ms: u64,
    config: &Config,
    library_path: &Path,
) -> anyhow::Result<()> {
    let library = TemplateLibrary::load_or_default(library_path)?;
    let trace = TrackingTrace::load(trace_path)?;
    let mut engine = GestureEngine::from_config(config).with_library(library);

    println!(
        "Replaying '{}' ({} frames, {:.1}s)",
        trace.metadata.name,
        trace.len(),
        trace.duration_ms() as f64 / 1000.0
    );

    let events = trace.replay(&mut engine, render_every_ms);
    for event in &events {
        println!(
            "  {:>8} ms  {:<24} {:.3}",
            event.t_ms, event.name, event.score
        );
    }
    if events.is_empty() {
        println!("  (no gestures recognized)");
    }

    Ok(())
}

fn run_init(
    force: bool,
    config: &Config,
    config_path: &Path,
    library_path: &Path,
) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save(config_path)?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    if !library_path.exists() {
        TemplateLibrary::new().save(library_path)?;
        println!("Created empty template library at {:?}", library_path);
    }

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", toml_str);
        }
        ConfigAction::Get { key } => match find_config_value(config, &key)? {
            Some(v) => println!("{} = {}", key, v),
            None => {
                anyhow::bail!("Configuration key '{}' not found", key);
            }
        },
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'spellcast init' first.");
            }

            let updated = set_config_value(config, &key, &value)?;
            updated.save(config_path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

/// Look up a dotted `section.key` in the config
fn find_config_value(config: &Config, key: &str) -> anyhow::Result<Option<toml::Value>> {
    let table: toml::Table = toml::from_str(&config.to_toml()?)?;
    let Some((section, leaf)) = key.split_once('.') else {
        return Ok(table.get(key).cloned());
    };
    Ok(table
        .get(section)
        .and_then(|s| s.as_table())
        .and_then(|s| s.get(leaf))
        .cloned())
}

/// Apply `section.key = value` to a copy of the config and validate it
fn set_config_value(config: &Config, key: &str, raw: &str) -> anyhow::Result<Config> {
    let mut table: toml::Table = toml::from_str(&config.to_toml()?)?;
    let (section, leaf) = key
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("Key must look like section.name, got '{}'", key))?;

    let defaults: toml::Table = toml::from_str(&Config::default().to_toml()?)?;
    let known = defaults
        .get(section)
        .and_then(|s| s.as_table())
        .is_some_and(|s| s.contains_key(leaf))
        || (section == "library" && leaf == "path");
    if !known {
        anyhow::bail!("Unknown configuration key '{}'", key);
    }

    let section_table = table
        .entry(section.to_string())
        .or_insert(toml::Value::Table(toml::Table::new()));
    let section_table = section_table
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("Configuration section '{}' is not a table", section))?;
    section_table.insert(leaf.to_string(), parse_toml_value(raw));

    let updated: Config = toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("Invalid value for '{}': {}", key, raw))?;
    updated.validate()?;
    Ok(updated)
}

/// Parse a TOML literal; anything that is not one is taken as a bare string
fn parse_toml_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
