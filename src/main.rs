// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use polytrans::app_config::{self, Config, TranslatorType};
use polytrans::app_controller::Controller;
use polytrans::record_io::TagPair;

/// CLI Wrapper for TranslatorType to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslatorType {
    Primary,
    Secondary,
    Hybrid,
}

impl From<CliTranslatorType> for TranslatorType {
    fn from(cli_type: CliTranslatorType) -> Self {
        match cli_type {
            CliTranslatorType::Primary => TranslatorType::Primary,
            CliTranslatorType::Secondary => TranslatorType::Secondary,
            CliTranslatorType::Hybrid => TranslatorType::Hybrid,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the records of a file (resumes an interrupted run)
    Translate(TranslateArgs),

    /// Check that the configured backends are reachable
    Check(CheckArgs),

    /// Generate shell completions for polytrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input file: JSON array, JSON lines, or tagged text blocks
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, written in the input's format
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Which backends to use
    #[arg(short = 'y', long, value_enum)]
    translator_type: Option<CliTranslatorType>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Maximum characters per backend request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Seconds to pause after each backend call
    #[arg(short, long)]
    delay: Option<f64>,

    /// Record field to translate (repeatable)
    #[arg(short, long = "field", value_name = "FIELD")]
    fields: Vec<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Start tag of a text block; switches to tagged-block input
    #[arg(long, requires = "tag_end")]
    tag_start: Option<String>,

    /// End tag of a text block
    #[arg(long, requires = "tag_start")]
    tag_end: Option<String>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Which backends to check
    #[arg(short = 'y', long, value_enum)]
    translator_type: Option<CliTranslatorType>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// polytrans - resumable multilingual record translation
///
/// Translates the text fields of record collections with LLM backends,
/// falling back through several strategies and checkpointing after every record.
#[derive(Parser, Debug)]
#[command(name = "polytrans")]
#[command(version)]
#[command(about = "Resumable multilingual record translation")]
#[command(long_about = "polytrans translates text fields of JSON records (or tagged text blocks) into a target language.

EXAMPLES:
    polytrans translate data.json out.json                        # Translate 'response' fields
    polytrans translate -f prompt -f response data.jsonl out.jsonl  # Translate two fields
    polytrans translate -y primary -d 0.5 data.json out.json      # Local backend only, short pause
    polytrans translate --tag-start '###START###' --tag-end '###END###' in.txt out.txt
    polytrans check                                               # Test backend connectivity
    polytrans completions bash > polytrans.bash                   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

RESUMING:
    Progress is saved next to the output file (<output>.progress, <output>.temp).
    Re-running the same command continues after the last completed record.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or the command line says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "polytrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Check(args) => run_check(args).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(&options.config_path, options.log_level.clone())?;

    if let Some(translator_type) = &options.translator_type {
        config.translation.translator_type = translator_type.clone().into();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(chunk_size) = options.chunk_size {
        config.batch.chunk_size = chunk_size;
    }
    if let Some(delay) = options.delay {
        config.translation.common.delay_secs = delay;
    }
    if !options.fields.is_empty() {
        config.batch.fields_to_translate = options.fields.clone();
    }

    let tags = match (options.tag_start, options.tag_end) {
        (Some(start), Some(end)) => Some(TagPair::new(start, end)),
        (None, None) => None,
        _ => return Err(anyhow!("--tag-start and --tag-end must be given together")),
    };

    if !options.input.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", options.input));
    }

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&options.input, &options.output, tags).await?;

    info!(
        "Done: {} records, {} fields translated, {} kept after errors",
        summary.total_records, summary.translated_fields, summary.failed_records
    );
    Ok(())
}

async fn run_check(options: CheckArgs) -> Result<()> {
    let mut config = load_config(&options.config_path, options.log_level.clone())?;
    if let Some(translator_type) = &options.translator_type {
        config.translation.translator_type = translator_type.clone().into();
    }

    let controller = Controller::with_config(config)?;
    controller.check_connection().await?;
    Ok(())
}

/// Load the config file, creating it with defaults when missing, and apply
/// the log level from the command line or the file
fn load_config(config_path: &str, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(level) = cli_log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}
