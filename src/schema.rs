//! Source header normalisation.
//!
//! Maps spreadsheet headers onto the semantic column names used by the
//! core, classifies each column by role, and drops the blank index
//! columns that spreadsheet exports leave behind.

use crate::constants::{UNNAMED_COLUMN_PREFIX, WEATHER_HEADER_ALIASES, columns};
use crate::models::EtoMethod;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// What a source column holds once renamed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// The raw day column fed to the calendar
    Day,
    /// An explicit month column
    Month,
    Observation,
    Estimate(EtoMethod),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
    pub role: ColumnRole,
}

/// Header alias table for one source layout
#[derive(Clone, Debug)]
pub struct SchemaMapper {
    aliases: HashMap<String, String>,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn alias_key(header: &str) -> String {
    header.trim().to_lowercase()
}

impl SchemaMapper {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();
        for (header, target) in WEATHER_HEADER_ALIASES {
            aliases.insert(alias_key(header), target.to_string());
        }
        for method in EtoMethod::ALL {
            aliases.insert(alias_key(method.display_name()), method.column_name().to_string());
            aliases.insert(alias_key(method.column_name()), method.column_name().to_string());
        }
        for semantic in columns::OBSERVATIONS
            .iter()
            .chain([columns::DATE, columns::MONTH].iter())
        {
            aliases.insert(alias_key(semantic), semantic.to_string());
        }
        Self { aliases }
    }

    /// Add or override one header alias
    pub fn with_alias(mut self, header: &str, target: &str) -> Self {
        self.aliases.insert(alias_key(header), target.to_string());
        self
    }

    fn role_of(target: &str) -> ColumnRole {
        if target == columns::DATE {
            ColumnRole::Day
        } else if target == columns::MONTH {
            ColumnRole::Month
        } else if let Some(method) = EtoMethod::from_column_name(target) {
            ColumnRole::Estimate(method)
        } else if columns::OBSERVATIONS.contains(&target) {
            ColumnRole::Observation
        } else {
            ColumnRole::Other
        }
    }

    /// Map one header. `None` for index columns and blank headers.
    pub fn map_header(&self, header: &str) -> Option<ColumnMapping> {
        let trimmed = header.trim();
        if trimmed.is_empty() || trimmed.starts_with(UNNAMED_COLUMN_PREFIX) {
            return None;
        }
        let target = self
            .aliases
            .get(&alias_key(trimmed))
            .cloned()
            .unwrap_or_else(|| trimmed.to_string());
        Some(ColumnMapping {
            source: header.to_string(),
            role: Self::role_of(&target),
            target,
        })
    }

    /// Map a whole header row. When two headers land on the same target
    /// the first one wins.
    pub fn map_headers<S: AsRef<str>>(&self, headers: &[S]) -> Vec<ColumnMapping> {
        let mut seen = HashSet::new();
        let mut mappings = Vec::with_capacity(headers.len());
        for header in headers {
            let header = header.as_ref();
            let Some(mapping) = self.map_header(header) else {
                debug!("Dropping column '{}'", header);
                continue;
            };
            if !seen.insert(mapping.target.clone()) {
                warn!(
                    "Column '{}' maps onto '{}' which is already present, ignoring it",
                    header, mapping.target
                );
                continue;
            }
            mappings.push(mapping);
        }
        mappings
    }
}
