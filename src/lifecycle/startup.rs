//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the subdomain registry and URL tables from configuration
//! - Wire the resolver and reverser to the compiled state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Everything built here is immutable and shared via Arc

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::SiteConfig;
use crate::routing::{
    RegistryError, RouteTable, RoutingResolver, SubdomainRegistry, TableId, TemplateError,
    UrlTables,
};
use crate::urls::UrlReverser;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("URL table `{table}`: {source}")]
    Template {
        table: String,
        #[source]
        source: TemplateError,
    },
}

/// Compiled routing state of one site.
#[derive(Debug, Clone)]
pub struct Site {
    pub registry: Arc<SubdomainRegistry>,
    pub resolver: Arc<RoutingResolver>,
    pub reverser: Arc<UrlReverser>,
    pub tables: BTreeMap<TableId, Arc<RouteTable>>,
    pub root_table: TableId,
}

impl Site {
    /// Build the site from a validated configuration.
    pub fn from_config(config: &SiteConfig) -> Result<Self, StartupError> {
        let registry = Arc::new(SubdomainRegistry::from_config(&config.subdomains)?);

        let mut tables = BTreeMap::new();
        let mut url_tables = UrlTables::new();
        for (id, table_config) in &config.tables {
            let table = RouteTable::from_config(table_config).map_err(|source| {
                StartupError::Template {
                    table: id.clone(),
                    source,
                }
            })?;
            let table = Arc::new(table);
            url_tables.insert(id.as_str(), table.clone());
            tables.insert(TableId::new(id.as_str()), table);
        }

        let resolver = Arc::new(RoutingResolver::new(&config.site, registry.clone()));
        let reverser = Arc::new(UrlReverser::new(
            &config.site,
            registry.clone(),
            Arc::new(url_tables),
        ));

        tracing::info!(
            domain = %config.site.domain,
            subdomains = registry.len(),
            tables = tables.len(),
            root_table = %config.site.root_table,
            "Routing compiled"
        );

        Ok(Self {
            registry,
            resolver,
            reverser,
            tables,
            root_table: TableId::new(config.site.root_table.as_str()),
        })
    }
}
