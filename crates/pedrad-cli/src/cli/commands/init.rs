use crate::cli::args::{GlobalArgs, InitArgs};
use crate::templates;
use std::path::Path;

use super::exit_codes;

/// Scaffolds a project next to the config file. Existing files are kept.
pub fn run(g: &GlobalArgs, args: InitArgs) -> anyhow::Result<i32> {
    write_sample_config_if_missing(&g.config)?;

    let cfg = pedrad_core::config::load_config(&g.config, g.strict)?;
    let reports = Path::new(&cfg.paths.reports);
    write_file_if_missing(
        &reports.join(format!("{}.txt", templates::SAMPLE_REPORT_ID)),
        templates::SAMPLE_REPORT,
    )?;
    write_file_if_missing(
        Path::new(&cfg.paths.ground_truth),
        templates::SAMPLE_GROUND_TRUTH,
    )?;

    if args.gitignore {
        let root = g.config.parent().unwrap_or(Path::new(""));
        write_file_if_missing(&root.join(".gitignore"), templates::GITIGNORE)?;
    }

    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    super::ensure_parent_dir(path)?;
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn write_sample_config_if_missing(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        super::ensure_parent_dir(path)?;
        pedrad_core::config::write_sample_config(path)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists", path.display());
    }
    Ok(())
}
