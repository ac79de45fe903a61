use thiserror::Error;

/// Generic client-side failure message shown when nothing more specific is known.
pub const ANALYSIS_FAILED: &str = "נכשל בניתוח התמונה. אנא נסה שוב.";

/// Coarse failure categories, used to decide how an error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the user or the caller; never reaches the network.
    Validation,
    /// Could not reach the bridge, or the bridge could not reach the model API.
    Transport,
    /// The model API (or the bridge on its behalf) answered with a failure.
    Upstream,
    /// Deployment is missing something, e.g. the API key.
    Configuration,
}

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("אנא בחר קובץ תמונה")]
    NotAnImage { mime_type: String },

    #[error("גודל התמונה צריך להיות פחות מ-4MB")]
    TooLarge { size: u64 },

    #[error("לא ניתן לקרוא את קובץ התמונה")]
    Read(#[from] std::io::Error),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("No image provided")]
    MissingImage,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("OpenAI API key not configured")]
    NotConfigured,

    #[error("Failed to connect to OpenAI API")]
    Connection,

    #[error("OpenAI API request timed out")]
    Timeout,

    #[error("Failed to reach the analysis service: {0}")]
    BridgeUnreachable(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Failed to parse OpenAI response")]
    MalformedResponse,

    #[error("No recipe generated")]
    NoCompletion,

    /// The bridge answered with a failure; carries its `error` text.
    #[error("{0}")]
    Rejected(String),
}

impl RecipeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecipeError::NotAnImage { .. }
            | RecipeError::TooLarge { .. }
            | RecipeError::Read(_)
            | RecipeError::MethodNotAllowed
            | RecipeError::MissingImage
            | RecipeError::InvalidBody(_) => ErrorKind::Validation,
            RecipeError::Connection | RecipeError::Timeout | RecipeError::BridgeUnreachable(_) => {
                ErrorKind::Transport
            }
            RecipeError::Upstream(_)
            | RecipeError::MalformedResponse
            | RecipeError::NoCompletion
            | RecipeError::Rejected(_) => ErrorKind::Upstream,
            RecipeError::NotConfigured => ErrorKind::Configuration,
        }
    }

    /// HTTP status the bridge answers with for this error.
    ///
    /// Only the method check and the missing image are caller errors; every
    /// other failure, including a body that is not JSON, is reported as 500.
    pub fn status_code(&self) -> u16 {
        match self {
            RecipeError::MethodNotAllowed => 405,
            RecipeError::MissingImage => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecipeError>;
