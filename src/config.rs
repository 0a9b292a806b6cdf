use crate::error::{ConvertError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const OWNER_FILE_PATTERN: &str = r"^~\$";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub office_binary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in Office Open XML reader (.docx only)
    Ooxml,
    /// Headless LibreOffice (.doc and .docx)
    Office,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Ooxml => write!(f, "ooxml"),
            EngineKind::Office => write!(f, "office"),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["doc".to_string(), "docx".to_string()],
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            directory: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Ooxml,
            office_binary: "soffice".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConvertError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConvertError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["word2json.toml", ".word2json.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref format) = cli_args.format {
            self.output.format = format.clone();
        }

        if let Some(ref directory) = cli_args.output_dir {
            self.output.directory = Some(directory.clone());
        }

        if let Some(kind) = cli_args.engine {
            self.engine.kind = kind;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConvertError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ConvertError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    /// The output format is deliberately not checked here: an unsupported
    /// format is reported per file by the writer.
    pub fn validate(&self) -> Result<()> {
        if self.input.extensions.is_empty() {
            return Err(ConvertError::Config {
                message: "At least one input extension must be specified".to_string(),
            });
        }

        for pattern in &self.input.exclude_patterns {
            Regex::new(pattern).map_err(|e| ConvertError::Config {
                message: format!("Invalid exclude pattern {:?}: {}", pattern, e),
            })?;
        }

        if self.engine.office_binary.trim().is_empty() {
            return Err(ConvertError::Config {
                message: "office_binary must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        // Word owner files, e.g. "~$report.docx"
        sample_config
            .input
            .exclude_patterns
            .push(OWNER_FILE_PATTERN.to_string());
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub engine: Option<EngineKind>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_engine(mut self, engine: Option<EngineKind>) -> Self {
        self.engine = engine;
        self
    }
}
