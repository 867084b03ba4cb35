//! Service configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! the router and builders. Environment variables are read only in `main`;
//! everything here works on already-extracted values, which keeps request
//! handling deterministic and test harnesses hermetic.

use crate::criteria::{CombineMode, DateColumn};
use crate::error::{CoreError, CoreResult};

/// Immutable configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    base_uri: String,
    adapter: String,
    default_search_mode: CombineMode,
    date_column: DateColumn,
}

impl ServiceConfig {
    /// Create a new `ServiceConfig`.
    ///
    /// `base_uri` is the URI prefix stripped from incoming requests before
    /// segment decomposition; it must start with `/`. `adapter` names the
    /// storage adapter to resolve from the registry at startup.
    pub fn new(
        base_uri: impl Into<String>,
        adapter: impl Into<String>,
        default_search_mode: CombineMode,
        date_column: DateColumn,
    ) -> CoreResult<Self> {
        let base_uri = base_uri.into();
        if !base_uri.starts_with('/') {
            return Err(CoreError::Configuration(format!(
                "base URI must start with '/': '{base_uri}'"
            )));
        }

        let adapter = adapter.into();
        if adapter.trim().is_empty() {
            return Err(CoreError::Configuration(
                "adapter identifier cannot be empty".into(),
            ));
        }

        Ok(Self {
            base_uri,
            adapter,
            default_search_mode,
            date_column,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Cross-dimension combination mode used by advanced search when the
    /// request does not override it.
    pub fn default_search_mode(&self) -> CombineMode {
        self.default_search_mode
    }

    /// Date column compared by date criteria.
    pub fn date_column(&self) -> DateColumn {
        self.date_column
    }
}

/// Parse the cross-dimension search mode from an optional env value.
///
/// `None` or empty/whitespace falls back to OR, the documented default of
/// the advanced search surface.
pub fn combine_mode_from_env_value(value: Option<String>) -> CoreResult<CombineMode> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<CombineMode>()
                .map_err(|_| CoreError::Configuration(format!("invalid search mode '{v}'")))
        })
        .transpose()?;

    Ok(parsed.unwrap_or(CombineMode::Or))
}

/// Parse the date column from an optional env value; defaults to `created`.
pub fn date_column_from_env_value(value: Option<String>) -> CoreResult<DateColumn> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<DateColumn>()).transpose()?;

    Ok(parsed.unwrap_or(DateColumn::Created))
}
