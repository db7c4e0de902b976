use super::args::*;
use pedrad_core::config::PedradConfig;
use pedrad_core::errors::{is_input_error, ConfigError};
use pedrad_core::prompt::{self, PromptTemplate};
use std::path::{Path, PathBuf};

pub mod analyze;
pub mod batch;
pub mod compare;
pub mod evaluate;
pub mod experiment;
pub mod explain;
pub mod gt;
pub mod init;
pub mod prompts;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const TEST_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let g = cli.global;
    let result = match cli.cmd {
        Command::Init(args) => init::run(&g, args),
        Command::Batch(args) => batch::run(&g, args).await,
        Command::Evaluate(args) => evaluate::run(&g, args),
        Command::Analyze(args) => analyze::run(&g, args),
        Command::Experiment(args) => experiment::run(&g, args).await,
        Command::Compare(args) => compare::run(&g, args),
        Command::Gt(args) => gt::run(&g, args),
        Command::Prompts(args) => prompts::run(args),
        Command::Explain(args) => explain::run(&g, args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    };

    match result {
        Err(e) if is_input_error(&e) => {
            eprintln!("config error: {e:#}");
            Ok(exit_codes::CONFIG_ERROR)
        }
        other => other,
    }
}

/// Loads the project config. Without a config file the built-in defaults
/// apply, relative to the working directory.
pub(crate) fn load_config(g: &GlobalArgs) -> anyhow::Result<PedradConfig> {
    if !g.config.exists() {
        tracing::info!(
            event = "pedrad.config.missing",
            path = %g.config.display(),
            "no config file, using defaults"
        );
        return Ok(PedradConfig::default());
    }
    Ok(pedrad_core::config::load_config(&g.config, g.strict)?)
}

pub(crate) fn apply_overrides(cfg: &mut PedradConfig, o: &ModelOverrides) -> Result<(), ConfigError> {
    if let Some(p) = &o.provider {
        cfg.model.provider = p.clone();
    }
    if let Some(m) = &o.model {
        cfg.model.name = m.clone();
    }
    if let Some(u) = &o.base_url {
        cfg.model.base_url = u.clone();
    }
    if let Some(t) = o.timeout {
        if t == 0 {
            return Err(ConfigError("--timeout must be > 0".into()));
        }
        cfg.model.timeout_seconds = t;
    }
    if let Some(t) = o.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ConfigError(format!(
                "--temperature must be within 0.0..=2.0 (got {})",
                t
            )));
        }
        cfg.model.temperature = t;
    }
    Ok(())
}

/// `--prompt-file` beats `--prompt`, which beats the config.
pub(crate) fn resolve_prompt(
    cfg: &PedradConfig,
    version: Option<&str>,
    file: Option<&Path>,
) -> Result<PromptTemplate, ConfigError> {
    match (file, version) {
        (Some(path), _) => PromptTemplate::from_file(path, None),
        (None, Some(v)) => prompt::builtin(v),
        (None, None) => prompt::from_settings(&cfg.prompt),
    }
}

pub(crate) fn results_dir(cfg: &PedradConfig) -> PathBuf {
    PathBuf::from(&cfg.paths.results)
}

pub(crate) fn reports_dir(cfg: &PedradConfig, flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.reports))
}

pub(crate) fn ground_truth_path(cfg: &PedradConfig, flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.ground_truth))
}

pub(crate) fn write_text(path: &Path, content: &str) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, content)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
