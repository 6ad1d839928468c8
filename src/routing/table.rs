//! URL tables.
//!
//! A URL table is an independent set of named routes. The router only needs
//! one capability from it: turn a route name plus arguments into a path.
//! [`RouteTable`] is the configuration-backed implementation used by the
//! server; embedding applications may register their own [`UrlTable`]s.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::TableConfig;
use crate::routing::matcher::{PathTemplate, TemplateError};

/// Identifier of a URL table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Arguments for a named route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteArgs {
    pub positional: Vec<String>,
    pub keyword: BTreeMap<String, String>,
}

impl RouteArgs {
    pub fn is_mixed(&self) -> bool {
        !self.positional.is_empty() && !self.keyword.is_empty()
    }
}

/// Reverse capability of a URL table.
pub trait UrlTable: Send + Sync + fmt::Debug {
    /// Returns the path of `route` with `args` applied, or `None` if the
    /// route is unknown or the arguments don't fit its pattern.
    fn resolve_path(&self, route: &str, args: &RouteArgs) -> Option<String>;
}

/// Named routes backed by [`PathTemplate`]s.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, PathTemplate>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named route. Replaces an existing route of the same name.
    pub fn route(mut self, name: impl Into<String>, template: &str) -> Result<Self, TemplateError> {
        self.routes.insert(name.into(), PathTemplate::parse(template)?);
        Ok(self)
    }

    /// Add an already parsed route.
    pub fn insert(&mut self, name: impl Into<String>, template: PathTemplate) {
        self.routes.insert(name.into(), template);
    }

    pub fn from_config(config: &TableConfig) -> Result<Self, TemplateError> {
        config
            .routes
            .iter()
            .try_fold(Self::new(), |table, (name, template)| table.route(name.as_str(), template))
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &PathTemplate)> {
        self.routes.iter().map(|(name, template)| (name.as_str(), template))
    }

    /// Returns true if any route of this table serves `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.values().any(|template| template.matches(path))
    }
}

impl UrlTable for RouteTable {
    fn resolve_path(&self, route: &str, args: &RouteArgs) -> Option<String> {
        self.routes.get(route)?.expand(args)
    }
}

/// All URL tables known to the application.
#[derive(Debug, Clone, Default)]
pub struct UrlTables {
    tables: HashMap<TableId, Arc<dyn UrlTable>>,
}

impl UrlTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<TableId>, table: Arc<dyn UrlTable>) {
        self.tables.insert(id.into(), table);
    }

    pub fn get(&self, id: &TableId) -> Option<&dyn UrlTable> {
        self.tables.get(id).map(|table| table.as_ref())
    }

    pub fn contains(&self, id: &TableId) -> bool {
        self.tables.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
