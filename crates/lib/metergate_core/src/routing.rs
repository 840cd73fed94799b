//! Data source routing.
//!
//! Maps the `package` tag carried by a lookup request to one of the
//! configured backing databases.

use std::fmt;

/// A backing database. Closed set; all sources share the same schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataSource {
    /// `DB_URL1`. Holds the users table and serves `PKG1`.
    #[default]
    Primary,
    /// `DB_URL3`. Serves `PKG3`.
    Secondary,
}

impl DataSource {
    pub const ALL: [DataSource; 2] = [DataSource::Primary, DataSource::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Primary => "primary",
            DataSource::Secondary => "secondary",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package tag → source. Adding a source means adding a row here.
const PACKAGE_ROUTES: &[(&str, DataSource)] = &[
    ("PKG1", DataSource::Primary),
    ("PKG3", DataSource::Secondary),
];

/// Resolves package tags to configured data sources.
///
/// Unknown or absent tags, and tags whose source is not configured, resolve to
/// the default source instead of failing the request. A deployment with a
/// single database is the one-source case of the same table.
#[derive(Debug, Clone)]
pub struct SourceRouter {
    configured: Vec<DataSource>,
}

impl SourceRouter {
    pub fn new(configured: &[DataSource]) -> Self {
        Self {
            configured: configured.to_vec(),
        }
    }

    /// Resolve a package tag to a data source.
    pub fn resolve(&self, tag: Option<&str>) -> DataSource {
        tag.and_then(|tag| {
            PACKAGE_ROUTES
                .iter()
                .find(|(pkg, _)| *pkg == tag)
                .map(|(_, source)| *source)
        })
        .filter(|source| self.configured.contains(source))
        .unwrap_or_default()
    }

    pub fn configured(&self) -> &[DataSource] {
        &self.configured
    }
}

impl Default for SourceRouter {
    fn default() -> Self {
        Self::new(&DataSource::ALL)
    }
}
