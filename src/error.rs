use thiserror::Error;

use crate::request::RequestError;

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Category record {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Duplicate category GUID: {0}")]
    DuplicateCategory(String),

    #[error("Category {guid} references unknown parent {parent}")]
    DanglingParent { guid: String, parent: String },

    #[error("Category {guid} is nested under subcategory {parent}")]
    NestedSubcategory { guid: String, parent: String },

    #[error("Taxonomy has no Uncategorized category ({0})")]
    MissingSentinel(&'static str),

    #[error("Category {0} must be the root category named Uncategorized")]
    InvalidSentinel(String),

    #[error("Taxonomy has no root category usable for purchases")]
    NoPurchaseCategories,

    #[error("Invalid year: {0}")]
    InvalidYear(i32),

    #[error("{0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
