#![deny(warnings)]

//! Headless CLI: content validation gate, autopilot play, progress status
//! and certificate issuance.

use anyhow::{bail, Context, Result};
use content::{load_config, LevelLoader};
use persistence::{
    clear_save, read_latest_run, read_save, read_save_for, JsonFileStorage, StoredProgress,
};
use sandbox_core::{ChoiceKey, SandboxConfig};
use sandbox_runtime::{
    certificate_access, completion_date_today, completion_stats_for, issue_certificate,
    CertificateRequest, GateDecision, LevelRun, PlainTextFormatter, RunSummary,
};
use scoring::PriorTable;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "assets/config/sandbox.yaml";

#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    config: Option<PathBuf>,
    content: Option<PathBuf>,
    level: Option<u32>,
    index: Option<usize>,
    choice: Option<ChoiceKey>,
    name: Option<String>,
    out: Option<PathBuf>,
    test_mode: bool,
}

fn flag_value<T>(flag: &str, raw: Option<String>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.with_context(|| format!("{flag} requires a value"))?;
    raw.parse::<T>().with_context(|| format!("{flag} {raw}"))
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--content" => args.content = it.next().map(PathBuf::from),
            "--level" => args.level = Some(flag_value("--level", it.next())?),
            "--index" => args.index = Some(flag_value("--index", it.next())?),
            "--choice" => args.choice = Some(flag_value("--choice", it.next())?),
            "--name" => args.name = it.next(),
            "--out" => args.out = it.next().map(PathBuf::from),
            "--test" => args.test_mode = true,
            other if args.command.is_none() && !other.starts_with("--") => {
                args.command = Some(other.to_string())
            }
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn usage() {
    println!("usage: sandbox <command> [--config FILE] [--content DIR]");
    println!("  validate                          check every level file");
    println!("  play --level N [--choice A|B|C]   autopilot through a level");
    println!("  save --level N --index I          store a resume position");
    println!("  status                            completion and latest run");
    println!("  certificate --name NAME [--test] [--out DIR]");
}

fn cmd_validate(cfg: &SandboxConfig) -> Result<()> {
    let loader = LevelLoader::from_config(cfg)?;
    let mut failed = 0;
    for (level, res) in loader.validate_all(cfg.total_levels) {
        match res {
            Ok(pack) => println!(
                "level {level} OK | {} | scenarios: {}",
                pack.title,
                pack.scenarios.len()
            ),
            Err(e) => {
                failed += 1;
                eprintln!("level {level} FAILED");
                if e.violations().is_empty() {
                    eprintln!("  {e}");
                }
                for v in e.violations() {
                    eprintln!("  {v}");
                }
            }
        }
    }
    if failed > 0 {
        bail!("{failed} level file(s) failed validation");
    }
    println!("all {} level files valid", cfg.total_levels);
    Ok(())
}

fn cmd_play(cfg: &SandboxConfig, storage: &mut JsonFileStorage, args: &Args) -> Result<()> {
    let level = args.level.context("play requires --level N")?;
    let choice = args.choice.unwrap_or(ChoiceKey::A);
    let pack = LevelLoader::from_config(cfg)?.load_level(level)?;
    let saved = read_save_for(&*storage, level);
    let mut run = LevelRun::start(pack, saved.as_ref(), cfg)?;
    let priors = PriorTable::from_config(cfg);
    info!(level, %choice, start = run.index(), "autopilot");

    loop {
        let session = run.session_mut();
        session.select_choice(choice)?;
        for i in 0..session.scenario().toolkit_flow.prompts.len() {
            session.set_answer(i, "reviewed with the toolkit")?;
        }
        for i in 0..session.applicable_actions().len() {
            session.set_action(i, true)?;
        }
        if cfg.min_reflection_chars > 0 {
            session.set_reflection("r".repeat(cfg.min_reflection_chars))?;
        }
        let Some(sub) = run.submit_current(&priors, storage) else {
            bail!("scenario {} could not be submitted", run.current().scenario_id);
        };
        let outcome = sub.step.outcome.as_ref().map(|o| o.summary.as_str()).unwrap_or("");
        println!(
            "{} | choice {} | score {} | {}",
            sub.step.scenario_id, sub.step.choice, sub.step.score.total, outcome
        );
        if sub.level_finished {
            if sub.completion_recorded {
                println!("level {level} recorded as complete");
            }
            break;
        }
        run.next();
    }

    let RunSummary {
        count,
        total,
        average,
    } = run.summary();
    println!("results | scenarios: {count} | total: {total} | average: {average}");
    clear_save(storage);
    Ok(())
}

fn cmd_save(cfg: &SandboxConfig, storage: &mut JsonFileStorage, args: &Args) -> Result<()> {
    let level = args.level.context("save requires --level N")?;
    let index = args.index.unwrap_or(0);
    let pack = LevelLoader::from_config(cfg)?.load_level(level)?;
    let mut run = LevelRun::start(pack, None, cfg)?;
    while run.index() < index && run.next() {}
    let save = run.save(storage);
    println!("saved level {} at scenario {}", save.level, save.idx);
    Ok(())
}

fn cmd_status(cfg: &SandboxConfig, storage: &mut JsonFileStorage) -> Result<()> {
    if let Some(save) = read_save(&*storage) {
        println!("save slot | level {} | scenario {}", save.level, save.idx);
    }
    if let Some(run) = read_latest_run(&*storage) {
        let s = RunSummary::from_steps(&run.steps);
        println!(
            "latest run | level {} | scenarios: {} | average: {}",
            run.level, s.count, s.average
        );
    }
    let progress = StoredProgress::new(storage);
    let stats = completion_stats_for(&progress, cfg.total_levels);
    println!(
        "completion | {:?} of {} | {}%",
        stats.completed_levels, stats.total_levels, stats.percentage
    );
    Ok(())
}

fn cmd_certificate(cfg: &SandboxConfig, storage: &mut JsonFileStorage, args: &Args) -> Result<()> {
    let progress = StoredProgress::new(storage);
    let gate = certificate_access(&progress, args.test_mode, cfg);
    if let GateDecision::Denied {
        stats,
        redirect_after,
    } = &gate
    {
        println!(
            "certificate locked ({}% complete); returning to levels in {}s",
            stats.percentage,
            redirect_after.as_secs()
        );
        return Ok(());
    }
    let name = args.name.clone().unwrap_or_default();
    let request = CertificateRequest::new(&name, completion_date_today(), gate.stats().clone())?;
    match issue_certificate(&gate, &PlainTextFormatter, &request) {
        Ok(cert) => {
            let dir = args.out.clone().unwrap_or_else(|| PathBuf::from("."));
            let path = dir.join(&cert.file_name);
            std::fs::write(&path, &cert.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("certificate written to {}", path.display());
            Ok(())
        }
        Err(e) if e.is_retryable() => {
            eprintln!("{e}");
            bail!("certificate generation failed; run the command again to retry")
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut cfg = load_config(&config_path)?;
    if let Some(dir) = &args.content {
        cfg.content_dir = dir.clone();
    }
    info!(command = ?args.command, config = %config_path.display(), "starting CLI");

    let Some(command) = args.command.as_deref() else {
        usage();
        return Ok(());
    };
    if command == "validate" {
        return cmd_validate(&cfg);
    }

    let mut storage = JsonFileStorage::open(&cfg.state_file)?;
    match command {
        "play" => cmd_play(&cfg, &mut storage, &args)?,
        "save" => cmd_save(&cfg, &mut storage, &args)?,
        "status" => cmd_status(&cfg, &mut storage)?,
        "certificate" => cmd_certificate(&cfg, &mut storage, &args)?,
        other => {
            usage();
            bail!("unknown command: {other}");
        }
    }
    storage.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_save_flags() {
        let args = parse_args(argv("save --level 2 --index 1 --choice C")).unwrap();
        assert_eq!(args.command.as_deref(), Some("save"));
        assert_eq!(args.level, Some(2));
        assert_eq!(args.index, Some(1));
        assert_eq!(args.choice, Some(ChoiceKey::C));
    }

    #[test]
    fn bad_numeric_flags_are_errors() {
        let err = parse_args(argv("save --level 2 --index x")).unwrap_err();
        assert!(err.to_string().contains("--index x"), "{err:#}");
        let err = parse_args(argv("play --level abc")).unwrap_err();
        assert!(err.to_string().contains("--level abc"), "{err:#}");
    }

    #[test]
    fn missing_flag_value_is_an_error() {
        let err = parse_args(argv("play --level")).unwrap_err();
        assert!(err.to_string().contains("--level requires a value"));
    }
}
