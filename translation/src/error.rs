use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranslationError>;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no language file for '{0}'")]
    LanguageNotFound(String),

    #[error("translation key must not be empty")]
    EmptyKey,
}
