//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use edugen_core::pipeline::{Pipeline, PipelineResult, ProgressReporter};
use edugen_shared::{
    AppConfig, ContentRequest, EdugenError, PipelineStage, init_config, load_config,
    resolve_secrets,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// edugen: grade-appropriate educational content from a topic.
#[derive(Parser)]
#[command(
    name = "edugen",
    version,
    about = "Generate, enrich and simplify educational content, then score its readability.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Runs the built-in example requests when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate content for a single request.
    Generate {
        /// Target grade level, e.g. "5th Grade".
        #[arg(long)]
        grade: String,

        /// Subject area, e.g. "Science".
        #[arg(long)]
        subject: String,

        /// Topic to cover.
        #[arg(long)]
        topic: String,

        /// Extra guidance for the draft.
        #[arg(long)]
        details: Option<String>,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Score every JSON content file in a directory.
    Analyze {
        /// Directory to scan (defaults to `defaults.output_dir`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "edugen=info",
        1 => "edugen=debug",
        _ => "edugen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => cmd_examples().await,
        Some(Command::Generate {
            grade,
            subject,
            topic,
            details,
            out,
        }) => {
            let mut request = ContentRequest::new(grade, subject, topic);
            if let Some(details) = details {
                request = request.with_details(details);
            }
            cmd_generate(request, out).await
        }
        Some(Command::Analyze { dir }) => cmd_analyze(dir).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// The two requests run when no subcommand is given.
fn example_requests() -> Vec<ContentRequest> {
    vec![
        ContentRequest::new("3rd Grade", "Science", "The Water Cycle").with_details(
            "Explain the stages of the water cycle: evaporation, condensation, precipitation, \
             and collection. Use simple terms and examples that a 3rd grader can understand. \
             Mention the importance of the water cycle for life on Earth.",
        ),
        ContentRequest::new("7th Grade", "History", "Ancient Egypt").with_details(
            "Focus on the pyramids of Giza, the pharaohs (like Tutankhamun), and the importance \
             of the Nile River to ancient Egyptian civilization. Keep it engaging for 7th graders \
             and mention some interesting facts or stories.",
        ),
    ]
}

/// Load config and secrets, then build the production pipeline.
fn build_pipeline(out: Option<PathBuf>) -> Result<Pipeline> {
    let mut config = load_config()?;
    if let Some(out) = out {
        config.defaults.output_dir = out.to_string_lossy().into_owned();
    }
    let secrets = resolve_secrets(&config)?;
    Ok(Pipeline::from_app_config(&config, &secrets)?)
}

async fn cmd_examples() -> Result<()> {
    let pipeline = build_pipeline(None)?;
    let requests = example_requests();

    info!(count = requests.len(), "running example requests");

    for request in &requests {
        run_one(&pipeline, request).await;
        println!("\n{}\n", "=".repeat(50));
    }
    Ok(())
}

async fn cmd_generate(request: ContentRequest, out: Option<PathBuf>) -> Result<()> {
    let pipeline = build_pipeline(out)?;
    run_one(&pipeline, &request).await;
    Ok(())
}

/// Run one request. Failures are logged and do not abort the process.
async fn run_one(pipeline: &Pipeline, request: &ContentRequest) {
    info!(
        grade = %request.grade_level,
        subject = %request.subject,
        topic = %request.topic,
        "generating content"
    );

    let reporter = CliProgress::new();
    match pipeline.run(request, &reporter).await {
        Ok(result) => print_result(&result),
        Err(e) => error!(
            stage = e.stage().map(|s| s.as_str()).unwrap_or("unknown"),
            error = %e,
            "content generation failed"
        ),
    }
}

fn print_result(result: &PipelineResult) {
    let content = &result.content;
    let meta = &content.metadata;

    println!();
    println!("  {}", content.title);
    println!("  Grade:    {}", content.grade_level);
    println!("  Subject:  {}", content.subject);
    if let Some(assessment) = &content.grade_level_assessment {
        println!("  Fit:      {assessment}");
    }
    println!("  Sections: {}", content.sections.len());
    println!(
        "  Search:   {:?} ({} results) for \"{}\"",
        meta.search_status, meta.search_result_count, meta.search_query
    );
    println!();
    println!("  Readability");
    for (metric, value) in meta.readability.scores() {
        println!("    {:<28} {value:.2}", metric.label());
    }
    println!();
    println!("  Saved to: {}", result.path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

async fn cmd_analyze(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => PathBuf::from(load_config()?.defaults.output_dir),
    };

    info!(dir = %dir.display(), "analyzing content files");

    let report = edugen_core::analyze_directory(&dir)
        .map_err(|e| eyre!("cannot analyze '{}': {e}", dir.display()))?;
    print!("{}", report.render());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, stage: PipelineStage, detail: &str) {
        let label = match stage {
            PipelineStage::Requested => "Validating request",
            PipelineStage::Generated => "Generating draft",
            PipelineStage::SearchEnriched => "Searching the web",
            PipelineStage::Simplified => "Simplifying content",
            PipelineStage::Analyzed => "Scoring readability",
            PipelineStage::Persisted => "Saving",
        };
        self.spinner.set_message(format!("{label}: {detail}"));
    }

    fn done(&self, _result: &PipelineResult) {
        self.spinner.finish_and_clear();
    }

    fn failed(&self, _error: &EdugenError) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_runs_examples() {
        let cli = Cli::try_parse_from(["edugen"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn generate_parses_request_fields() {
        let cli = Cli::try_parse_from([
            "edugen",
            "-vv",
            "generate",
            "--grade",
            "5th grade",
            "--subject",
            "Science",
            "--topic",
            "Photosynthesis",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Generate { grade, details, .. }) => {
                assert_eq!(grade, "5th grade");
                assert!(details.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_requires_topic() {
        assert!(
            Cli::try_parse_from(["edugen", "generate", "--grade", "5", "--subject", "Math"])
                .is_err()
        );
    }

    #[test]
    fn json_log_format_is_global() {
        let cli = Cli::try_parse_from(["edugen", "analyze", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn example_requests_are_valid() {
        let requests = example_requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert!(request.validate().is_ok());
            assert!(request.topic_details.is_some());
        }
    }
}
