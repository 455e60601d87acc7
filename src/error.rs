use std::path::PathBuf;

use thiserror::Error;

use crate::entries::Prompt;

/// A diary entry that breaks one of the model's rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mood must be between 1 and 5, got {0}")]
    MoodOutOfRange(u8),

    #[error("no mood was chosen")]
    MoodUnset,

    #[error("at most {} topics may be selected, got {0}", crate::entries::MAX_TOPICS)]
    TooManyTopics(usize),

    #[error("missing answer for \"{0}\"")]
    MissingAnswer(Prompt),

    #[error("\"{0}\" is not asked in this reflection")]
    UnexpectedAnswer(Prompt),

    #[error("mindfulness minutes must be a finite, non-negative number")]
    InvalidMindfulness,
}

/// Errors produced while reading or writing a journal directory.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed journal data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No journal found at {}", .0.display())]
    NotAJournal(PathBuf),

    #[error("A journal already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
