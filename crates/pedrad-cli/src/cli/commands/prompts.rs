use crate::cli::args::PromptsArgs;
use pedrad_core::prompt;

use super::exit_codes;

pub fn run(args: PromptsArgs) -> anyhow::Result<i32> {
    let templates = prompt::builtin_versions()
        .iter()
        .map(|v| prompt::builtin(v))
        .collect::<Result<Vec<_>, _>>()?;

    for t in &templates {
        println!("{}\t{}", t.version, &t.fingerprint()[..12]);
    }
    if let Some(path) = &args.export {
        super::write_text(path, &prompt::catalog_markdown(&templates))?;
    }
    Ok(exit_codes::OK)
}
