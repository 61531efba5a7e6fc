use std::collections::HashSet;

use serde::Serialize;

use crate::error::EngineError;

/// Pagination metadata included in list results.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), EngineError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(EngineError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

/// Validate an optional position field (must be >= 0 when present).
pub fn validate_optional_position(pos: Option<i32>) -> Result<(), EngineError> {
    if let Some(pos) = pos
        && pos < 0
    {
        return Err(EngineError::Validation("Position must be >= 0".into()));
    }
    Ok(())
}

/// Validate an ordered ID list for reorder operations (non-empty, no duplicates).
pub fn validate_reorder_ids(ids: &[i32], name: &str) -> Result<(), EngineError> {
    if ids.is_empty() {
        return Err(EngineError::Validation(format!("{name}s must not be empty")));
    }
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(EngineError::Validation(format!(
                "Duplicate {name} {id} in reorder list"
            )));
        }
    }
    Ok(())
}
