use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pedrad",
    version,
    about = "Draft and evaluate pediatric radiology impressions with a local LLM"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// project config; relative paths inside it resolve against its directory
    #[arg(long, global = true, env = "PEDRAD_CONFIG", default_value = "pedrad.yaml")]
    pub config: PathBuf,

    /// reject unknown config keys instead of warning
    #[arg(long, global = true)]
    pub strict: bool,

    /// tracing filter, e.g. `info` or `pedrad_core=debug`
    #[arg(long, global = true, env = "PEDRAD_LOG", default_value = "warn")]
    pub log_level: String,

    /// emit log events as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample config, report and ground-truth file
    Init(InitArgs),
    /// Run every report through the model and write a batch file
    Batch(BatchArgs),
    /// Score a batch against annotated ground truth
    Evaluate(EvaluateArgs),
    /// Timing, length and mention statistics for batches (no ground truth needed)
    Analyze(AnalyzeArgs),
    /// Run several prompt versions over the same reports
    Experiment(ExperimentArgs),
    /// Evaluate several batches side by side
    Compare(CompareArgs),
    /// Ground-truth annotation helpers
    Gt(GtArgs),
    /// List or export the built-in prompt versions
    Prompts(PromptsArgs),
    /// Per-metric breakdown for one report of a batch
    Explain(ExplainArgs),
    Version,
}

/// Overrides for the `model:` block of the config.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ModelOverrides {
    /// ollama | fake
    #[arg(long, env = "PEDRAD_PROVIDER")]
    pub provider: Option<String>,

    #[arg(long, env = "PEDRAD_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "PEDRAD_BASE_URL")]
    pub base_url: Option<String>,

    /// per-report timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub temperature: Option<f32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    /// also write a .gitignore for results/
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub model: ModelOverrides,

    /// process only the first N reports (sorted by id)
    #[arg(long)]
    pub limit: Option<usize>,

    /// built-in prompt version; overrides the config
    #[arg(long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// custom prompt template file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// report folder; overrides `paths.reports`
    #[arg(long)]
    pub reports: Option<PathBuf>,

    /// batch file to write (default: results/batch_results_<model>_<run_id>.jsonl, never overwritten)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub batch: PathBuf,

    /// overrides `paths.ground_truth`
    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// evaluation JSON (default: results/evaluation_<timestamp>.json)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// also write Markdown tables
    #[arg(long)]
    pub markdown: Option<PathBuf>,

    /// also write per-case CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// batch files; defaults to every batch file in the results folder
    #[arg(long)]
    pub batch: Vec<PathBuf>,

    /// where to write analysis JSON, Markdown and CSV (default: results folder)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExperimentArgs {
    #[command(flatten)]
    pub model: ModelOverrides,

    #[arg(long, default_value_t = 5)]
    pub limit: usize,

    /// comma-separated prompt versions (default: all built-in versions)
    #[arg(long, value_delimiter = ',')]
    pub prompts: Vec<String>,

    /// extra prompt template files, versioned by file stem
    #[arg(long)]
    pub prompt_file: Vec<PathBuf>,

    #[arg(long)]
    pub reports: Option<PathBuf>,

    /// overrides `paths.ground_truth`
    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// keep outputs in memory only
    #[arg(long)]
    pub no_save: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    /// two or more batch files
    #[arg(long, required = true, num_args = 1..)]
    pub batch: Vec<PathBuf>,

    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// comparison JSON (default: results/comparison_<timestamp>.json)
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub markdown: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GtArgs {
    #[command(subcommand)]
    pub cmd: GtSub,

    /// overrides `paths.ground_truth`
    #[arg(long, global = true)]
    pub ground_truth: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GtSub {
    /// Pre-fill records for unannotated reports from a batch
    Suggest {
        #[arg(long)]
        batch: PathBuf,

        #[arg(long, default_value = "ground_truth_suggestions.json")]
        out: PathBuf,

        /// add to an existing suggestions file; records already marked
        /// `annotated: true` there are kept
        #[arg(long)]
        force: bool,

        #[arg(long)]
        reports: Option<PathBuf>,
    },
    /// Import the records marked `annotated: true` from a reviewed file
    Merge {
        #[arg(long)]
        from: PathBuf,
    },
    /// Annotation progress
    Stats {
        #[arg(long)]
        reports: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct PromptsArgs {
    /// write every built-in version as Markdown to this file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExplainArgs {
    #[arg(long)]
    pub batch: PathBuf,

    /// report id (file name with or without `.txt`)
    #[arg(long)]
    pub report: String,

    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}
