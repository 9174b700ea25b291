//! Error types for Sift

use thiserror::Error;

use crate::models::ProcessStage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Document contained no extractable text")]
    EmptyDocument,

    #[error("Document text exceeds {limit} character limit ({actual} characters)")]
    DocumentTooLarge { actual: usize, limit: usize },

    #[error("Duplicate document: statement {existing_id} has the same content")]
    DuplicateDocument { existing_id: i64 },

    #[error("Statement is in stage '{actual}', expected '{expected}'")]
    StageConflict {
        expected: ProcessStage,
        actual: ProcessStage,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
