//! Catalog records read and written by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tool in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Draft,
    Scheduled,
    Published,
}

impl ToolStatus {
    /// Value stored in the catalog's status column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ToolStatus::Draft => "Draft",
            ToolStatus::Scheduled => "Scheduled",
            ToolStatus::Published => "Published",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "Draft" => Some(ToolStatus::Draft),
            "Scheduled" => Some(ToolStatus::Scheduled),
            "Published" => Some(ToolStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A tool listed in the directory, selected for stack analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub repository_url: String,
    pub status: ToolStatus,
}

/// A recognized technology in the curated catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,
    pub slug: String,
}

impl Stack {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
        }
    }
}
