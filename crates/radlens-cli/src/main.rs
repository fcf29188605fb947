//! `radlens` command-line front end.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use radlens_core::{
    AnalysisInput, ContentValidator, InputError, ReportQualityAssessor, StudyType,
    ValidationError,
};
use radlens_runtime::{
    AnalysisOrchestrator, AnalysisRequest, GeneratorRegistry, ImageUpload, RuntimeConfig,
    RuntimeError,
};

/// Exit code when the report is rejected by validation.
const EXIT_REJECTED: u8 = 2;

/// Heuristic analysis of radiology reports
#[derive(Parser, Debug)]
#[command(name = "radlens", author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Runtime configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a report, optionally against image findings
    Analyze(AnalyzeArgs),

    /// Check whether a report passes validation and grade its quality
    Validate {
        /// Report text file, or `-` for stdin
        #[arg(long)]
        report: PathBuf,
    },

    /// List text generation providers compiled into this build
    Providers,
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Report text file, or `-` for stdin
    #[arg(long, conflicts_with = "request", required_unless_present = "request")]
    report: Option<PathBuf>,

    /// Request document (YAML or JSON)
    #[arg(long)]
    request: Option<PathBuf>,

    /// Study type, required with --report
    #[arg(long, value_parser = parse_study_type)]
    study_type: Option<StudyType>,

    #[arg(long)]
    patient_id: Option<String>,

    /// Image file to classify (repeatable)
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Known image finding (repeatable)
    #[arg(long = "image-finding")]
    image_findings: Vec<String>,

    /// Text generation provider, e.g. `anthropic`
    #[arg(long)]
    provider: Option<String>,

    /// Provider configuration (JSON)
    #[arg(long, requires = "provider")]
    provider_config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

fn parse_study_type(value: &str) -> Result<StudyType, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Analyze(args) => analyze(args, cli.config.as_deref()).await,
        Command::Validate { report } => validate(&report),
        Command::Providers => {
            let registry = GeneratorRegistry::with_defaults();
            for provider_type in registry.available_types() {
                println!("{provider_type}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn analyze(args: AnalyzeArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = match config_path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let mut request = match build_request(&args)? {
        Ok(request) => request,
        Err(e) => return Ok(rejected(&e)),
    };

    for path in &args.images {
        let image = ImageUpload::from_path(path)
            .with_context(|| format!("reading image {}", path.display()))?;
        request.images.push(image);
    }

    let mut builder = AnalysisOrchestrator::builder().config(config);
    if let Some(provider_type) = &args.provider {
        let registry = GeneratorRegistry::with_defaults();
        let provider_config = match &args.provider_config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading provider config {}", path.display()))?;
                serde_json::from_str(&raw).context("parsing provider config")?
            }
            None => registry.default_config(provider_type).unwrap_or_default(),
        };
        let generator = registry
            .create(provider_type, &provider_config)
            .with_context(|| format!("creating provider '{provider_type}'"))?;
        builder = builder.generator(generator);
    }
    let orchestrator = builder.build().context("invalid runtime config")?;

    let report = match orchestrator.analyze(request).await {
        Ok(report) => report,
        Err(RuntimeError::Validation(e)) => return Ok(rejected(&e)),
        Err(e) => return Err(e).context("analysis request refused"),
    };

    print(&report, args.format)?;
    Ok(ExitCode::SUCCESS)
}

/// Outer error is an I/O or parse failure; inner error is a rejected report.
fn build_request(args: &AnalyzeArgs) -> Result<Result<AnalysisRequest, ValidationError>> {
    let mut request = if let Some(path) = &args.request {
        match AnalysisInput::from_file(path) {
            Ok(input) => AnalysisRequest::from(input),
            Err(InputError::Invalid(e)) => return Ok(Err(e)),
            Err(e) => {
                return Err(e).with_context(|| format!("loading request {}", path.display()))
            }
        }
    } else {
        let Some(study_type) = args.study_type else {
            bail!("--study-type is required with --report");
        };
        let path = args
            .report
            .as_deref()
            .context("either --report or --request is required")?;
        AnalysisRequest::new(read_report(path)?, study_type)
    };

    if let Some(study_type) = args.study_type {
        request.study_type = study_type;
    }
    if let Some(patient_id) = &args.patient_id {
        request.patient_id = Some(patient_id.clone());
    }
    request
        .image_findings
        .extend(args.image_findings.iter().cloned());

    Ok(Ok(request))
}

fn validate(path: &Path) -> Result<ExitCode> {
    let text = read_report(path)?;

    #[derive(Serialize)]
    struct Verdict<'a> {
        valid: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        quality: &'a radlens_core::ReportQuality,
    }

    let quality = ReportQualityAssessor::new().assess(&text);
    let check = ContentValidator::new().check(&text);
    let verdict = Verdict {
        valid: check.is_ok(),
        reason: check.as_ref().err().map(ToString::to_string),
        quality: &quality,
    };
    print(&verdict, Format::Json)?;

    Ok(if check.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    })
}

fn read_report(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading report from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading report {}", path.display()))
    }
}

fn rejected(error: &ValidationError) -> ExitCode {
    tracing::info!(error = %error, "Report rejected");
    eprintln!("rejected: {error}");
    ExitCode::from(EXIT_REJECTED)
}

fn print<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{rendered}");
    Ok(())
}
