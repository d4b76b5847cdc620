use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Point #{index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("Points are not ordered by x: point #{index} precedes its predecessor")]
    Unsorted { index: usize },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
