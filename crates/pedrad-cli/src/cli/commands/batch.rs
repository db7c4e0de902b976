use crate::cli::args::{BatchArgs, GlobalArgs};
use pedrad_core::engine::runner::BatchRunner;
use pedrad_core::providers::llm;
use pedrad_core::storage::batch::{default_batch_path, BatchHeader, BatchWriter};
use pedrad_core::storage::reports::ReportStore;

use super::exit_codes;

pub async fn run(g: &GlobalArgs, args: BatchArgs) -> anyhow::Result<i32> {
    let mut cfg = super::load_config(g)?;
    super::apply_overrides(&mut cfg, &args.model)?;
    let template = super::resolve_prompt(&cfg, args.prompt.as_deref(), args.prompt_file.as_deref())?;
    let client = llm::from_settings(&cfg.model)?;

    let store = ReportStore::new(super::reports_dir(&cfg, args.reports.as_ref()));
    let loaded = store.load_all(args.limit)?;
    for s in &loaded.skipped {
        eprintln!("skipped {}: {}", s.id, s.reason);
    }
    if loaded.reports.is_empty() {
        eprintln!("config error: no usable reports in {}", store.dir().display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let header = BatchHeader::new(
        client.model_name(),
        client.provider_name(),
        &template,
        cfg.model.temperature,
    );
    let mut writer = match &args.out {
        Some(path) => BatchWriter::create(path, &header)?,
        None => {
            let path = default_batch_path(&super::results_dir(&cfg), client.model_name(), &header);
            BatchWriter::create_new(&path, &header)?
        }
    };

    eprintln!(
        "running {} reports through {} ({}) with prompt {}",
        loaded.reports.len(),
        client.model_name(),
        client.provider_name(),
        template.version
    );
    let runner = BatchRunner::new(client, cfg.model.timeout_seconds);
    let outputs = runner.run_batch(&loaded.reports, &template, &mut writer).await?;
    let path = writer.finish()?;

    let failed = outputs.iter().filter(|o| !o.is_success()).count();
    eprintln!(
        "wrote {} outputs ({} failed) to {}",
        outputs.len(),
        failed,
        path.display()
    );

    if failed == outputs.len() {
        return Ok(exit_codes::TEST_FAILED);
    }
    Ok(exit_codes::OK)
}
