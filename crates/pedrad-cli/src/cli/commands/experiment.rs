use crate::cli::args::{ExperimentArgs, GlobalArgs};
use pedrad_core::compare::compare;
use pedrad_core::engine::experiment::run_experiment;
use pedrad_core::engine::runner::BatchRunner;
use pedrad_core::errors::ConfigError;
use pedrad_core::prompt::{self, PromptTemplate};
use pedrad_core::providers::llm;
use pedrad_core::storage::reports::ReportStore;

use super::exit_codes;

pub async fn run(g: &GlobalArgs, args: ExperimentArgs) -> anyhow::Result<i32> {
    let mut cfg = super::load_config(g)?;
    super::apply_overrides(&mut cfg, &args.model)?;
    let templates = templates(&args)?;
    let client = llm::from_settings(&cfg.model)?;

    let store = ReportStore::new(super::reports_dir(&cfg, args.reports.as_ref()));
    let loaded = store.load_all(Some(args.limit))?;
    if loaded.reports.is_empty() {
        eprintln!("config error: no usable reports in {}", store.dir().display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    eprintln!(
        "experiment: {} prompt versions x {} reports on {}",
        templates.len(),
        loaded.reports.len(),
        client.model_name()
    );
    let runner = BatchRunner::new(client, cfg.model.timeout_seconds);
    let results = (!args.no_save).then(|| super::results_dir(&cfg));
    let experiment = run_experiment(
        &runner,
        &loaded.reports,
        &templates,
        results.as_deref(),
        cfg.model.temperature,
    )
    .await?;

    let truth = super::evaluate::load_ground_truth(&cfg, args.ground_truth.as_ref())?;
    let mut labelled = Vec::with_capacity(experiment.arms.len());
    for arm in &experiment.arms {
        if let Some(p) = &arm.batch_path {
            eprintln!("{}: {}", arm.prompt_version, p.display());
        }
        let (_, stats) = super::evaluate::score(&cfg, &arm.outputs, &truth);
        labelled.push((arm.prompt_version.clone(), stats));
    }

    let comparison = compare(&super::compare::unique_labels(labelled));
    if args.no_save {
        pedrad_core::report::console::print_comparison(&comparison);
    } else {
        super::compare::write_comparison(&cfg, &comparison, None, None)?;
    }
    Ok(exit_codes::OK)
}

/// Built-in versions from `--prompts` (all of them when empty), then any
/// `--prompt-file` templates.
fn templates(args: &ExperimentArgs) -> Result<Vec<PromptTemplate>, ConfigError> {
    let mut out = Vec::new();
    if args.prompts.is_empty() && args.prompt_file.is_empty() {
        for v in prompt::builtin_versions() {
            out.push(prompt::builtin(v)?);
        }
    }
    for v in &args.prompts {
        out.push(prompt::builtin(v.trim())?);
    }
    for path in &args.prompt_file {
        out.push(PromptTemplate::from_file(path, None)?);
    }
    let mut versions: Vec<&str> = out.iter().map(|t| t.version.as_str()).collect();
    versions.sort_unstable();
    if versions.windows(2).any(|w| w[0] == w[1]) {
        return Err(ConfigError("each prompt version may appear only once".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::ModelOverrides;

    fn args(prompts: &[&str]) -> ExperimentArgs {
        ExperimentArgs {
            model: ModelOverrides::default(),
            limit: 5,
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
            prompt_file: vec![],
            reports: None,
            ground_truth: None,
            no_save: true,
        }
    }

    #[test]
    fn defaults_to_every_builtin_version() {
        let t = templates(&args(&[])).unwrap();
        assert_eq!(t.len(), prompt::builtin_versions().len());
    }

    #[test]
    fn rejects_unknown_and_repeated_versions() {
        assert!(templates(&args(&["v1_current", "nope"])).is_err());
        assert!(templates(&args(&["v1_current", "v1_current"])).is_err());
        assert_eq!(templates(&args(&["v2_age_emphasis"])).unwrap().len(), 1);
    }
}
