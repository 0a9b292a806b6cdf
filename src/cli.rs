use crate::config::{CliOverrides, Config, EngineKind};
use crate::error::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "word2json")]
#[command(version = env!("CARGO_PKG_VERSION"), disable_version_flag = true)]
#[command(about = "Extract the text of Word documents into JSON files")]
#[command(
    long_about = "word2json opens every .doc/.docx file of a folder (or a single file) through \
                  an automation engine and writes one {\"items\":[...]} JSON file per document, \
                  one item per non-empty paragraph."
)]
#[command(after_help = "EXAMPLES:\n  \
    word2json\n  \
    word2json -s report.docx\n  \
    word2json -s ./letters -d ./json -v\n  \
    word2json -s ./archive --engine office")]
pub struct Cli {
    /// The source file or directory (defaults to the current directory)
    #[arg(short, long, visible_short_alias = 'S', value_name = "PATH", num_args = 0..=1, default_missing_value = "", action = ArgAction::Append)]
    pub source: Vec<String>,

    /// The destination directory (defaults to the source's folder)
    #[arg(short, long, visible_short_alias = 'D', value_name = "PATH", num_args = 0..=1, default_missing_value = "", action = ArgAction::Append)]
    pub dest: Vec<String>,

    /// Output format of the converted files
    #[arg(short, long, visible_short_alias = 'F', value_name = "NAME", num_args = 0..=1, default_missing_value = "", action = ArgAction::Append)]
    pub format: Vec<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Automation engine used to open the documents
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Style of the console messages
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, visible_short_alias = 'V', action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors and the final count)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list what would be converted without opening anything)
    #[arg(long, help = "Show what would be converted without actually doing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON lines
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    /// Parses the process arguments, dropping unknown flags instead of failing.
    pub fn parse_lenient() -> Self {
        match Self::try_parse_lenient(std::env::args_os()) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        }
    }

    pub fn try_parse_lenient<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<String> = args
            .into_iter()
            .map(|a| a.into().to_string_lossy().into_owned())
            .collect();

        loop {
            let err = match Self::try_parse_from(&args) {
                Ok(cli) => return Ok(cli),
                Err(err) => err,
            };

            if err.kind() != ErrorKind::UnknownArgument {
                return Err(err);
            }

            let Some(ContextValue::String(unknown)) = err.get(ContextKind::InvalidArg) else {
                return Err(err);
            };

            let with_value = format!("{}=", unknown);
            let position = args
                .iter()
                .skip(1)
                .position(|a| a == unknown || a.starts_with(&with_value));

            match position {
                Some(index) => {
                    args.remove(index + 1);
                }
                None => return Err(err),
            }
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_format(first_value(&self.format).map(str::to_string))
            .with_output_dir(first_value(&self.dest).map(PathBuf::from))
            .with_engine(self.engine)
    }

    /// The `-s` value, `None` when absent or given without a value.
    pub fn source_arg(&self) -> Option<&str> {
        first_value(&self.source)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

// The first occurrence of a repeated flag wins; an empty value means "use the default".
fn first_value(values: &[String]) -> Option<&str> {
    values
        .first()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
