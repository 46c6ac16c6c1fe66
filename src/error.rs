use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ParseError { file: PathBuf, message: String },
    InvalidArgument(String),
    SerializationError(String),
    /// The serialized shape of a type could not be determined
    FieldProcessing {
        type_name: String,
        path: String,
        message: String,
    },
    /// Strict mode found fields without any description
    UndocumentedFields(Vec<String>),
    /// A handler function could not be found in the parsed sources
    HandlerNotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "Parse error in {}: {}", file.display(), message)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::FieldProcessing {
                type_name,
                path,
                message,
            } => {
                let location = if path.is_empty() { "<root>" } else { path.as_str() };
                write!(
                    f,
                    "Cannot document type {} at path {}: {}",
                    type_name, location, message
                )
            }
            Error::UndocumentedFields(paths) => {
                write!(f, "Undocumented fields: {}", paths.join(", "))
            }
            Error::HandlerNotFound(name) => write!(f, "Handler function not found: {}", name),
        }
    }
}

impl Error {
    /// Shape resolution failure for `type_name`, without a path yet
    pub fn field_processing(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FieldProcessing {
            type_name: type_name.into(),
            path: String::new(),
            message: message.into(),
        }
    }

    /// Attach the field path to a `FieldProcessing` error that has none
    pub fn at_path(self, at: &str) -> Self {
        match self {
            Error::FieldProcessing {
                type_name,
                path,
                message,
            } if path.is_empty() => Error::FieldProcessing {
                type_name,
                path: at.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseError {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
