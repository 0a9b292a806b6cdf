use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid source: {path}")]
    InvalidSource { path: String },

    #[error("Cannot open document {path}: {message}")]
    DocumentOpen { path: String, message: String },

    #[error("Invalid format: {format}")]
    InvalidFormat { format: String },

    #[error("Failed to release {handle}: {message}")]
    ResourceRelease { handle: String, message: String },

    #[error("Failed to start the automation engine: {message}")]
    ApplicationStart { message: String },

    #[error("Failed to read document content: {message}")]
    ContentRead { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ConvertError {
    fn user_message(&self) -> String {
        match self {
            ConvertError::InvalidSource { path } => {
                format!("Invalid Source File. File: {}", path)
            }
            ConvertError::DocumentOpen { path, message } => {
                format!("Could not open \"{}\": {}", path, message)
            }
            ConvertError::InvalidFormat { format } => {
                format!("Invalid format. Format: {}", format)
            }
            ConvertError::ResourceRelease { handle, message } => {
                format!("Release {} error. Error: {}", handle, message)
            }
            ConvertError::ApplicationStart { message } => {
                format!("Could not start the document application: {}", message)
            }
            ConvertError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ConvertError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ConvertError::InvalidSource { .. } => Some(
                "Pass an existing file or directory with -s, or run from the folder holding the documents.".to_string()
            ),
            ConvertError::DocumentOpen { .. } => Some(
                "Check that the file is a Word document, is not corrupt and is not locked by another program. Legacy .doc files need --engine office.".to_string()
            ),
            ConvertError::InvalidFormat { .. } => Some(
                "The only supported output format is json (-f json).".to_string()
            ),
            ConvertError::ApplicationStart { .. } => Some(
                "Make sure LibreOffice is installed and `office_binary` in the configuration points at soffice.".to_string()
            ),
            ConvertError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(error: toml::de::Error) -> Self {
        ConvertError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
