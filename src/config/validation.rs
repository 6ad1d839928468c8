//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (subdomain entries and the root table
//!   reference defined tables)
//! - Detect duplicate subdomain registrations
//! - Check the base domain and scheme can form URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::SiteConfig;
use crate::http::dispatch::RESERVED_PREFIX;
use crate::routing::matcher::{PathTemplate, TemplateError};
use crate::routing::registry::SubdomainKey;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("site.domain must not be empty")]
    EmptyDomain,

    #[error("site.domain `{domain}` is not a valid host name ({reason})")]
    InvalidDomain { domain: String, reason: String },

    #[error("site.default_url_scheme `{0}` is not supported (expected `http` or `https`)")]
    UnsupportedScheme(String),

    #[error("site.root_table `{0}` is not defined under [tables]")]
    UnknownRootTable(String),

    #[error("subdomain entry {0} is registered more than once")]
    DuplicateSubdomain(SubdomainKey),

    #[error("subdomain entry {key} references undefined table `{table}`")]
    UnknownTable { key: SubdomainKey, table: String },

    #[error("table `{table}`, route `{route}`: {source}")]
    InvalidTemplate {
        table: String,
        route: String,
        source: TemplateError,
    },

    #[error("table `{table}`: routes `{first}` and `{second}` share the template `{template}`")]
    DuplicateTemplate {
        table: String,
        first: String,
        second: String,
        template: String,
    },

    #[error("table `{table}`, route `{route}`: paths under `/_reverse/` are reserved")]
    ReservedPath { table: String, route: String },

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_site(config, &mut errors);
    validate_subdomains(config, &mut errors);
    validate_tables(config, &mut errors);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_site(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let site = &config.site;
    let scheme = site.default_url_scheme.as_str();
    if !matches!(scheme, "http" | "https") {
        errors.push(ValidationError::UnsupportedScheme(scheme.to_string()));
    }

    let domain = site.domain.trim();
    if domain.is_empty() {
        errors.push(ValidationError::EmptyDomain);
    } else {
        // The domain must survive URL parsing unchanged: no port, path or
        // characters that would be re-encoded.
        match Url::parse(&format!("http://{}/", domain)) {
            Ok(url) if url.host_str() == Some(domain.to_ascii_lowercase().as_str()) => {}
            Ok(url) => errors.push(ValidationError::InvalidDomain {
                domain: domain.to_string(),
                reason: format!("parses as `{}`", url.host_str().unwrap_or_default()),
            }),
            Err(e) => errors.push(ValidationError::InvalidDomain {
                domain: domain.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if !config.tables.contains_key(&site.root_table) {
        errors.push(ValidationError::UnknownRootTable(site.root_table.clone()));
    }
}

fn validate_subdomains(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for entry in &config.subdomains {
        let key = SubdomainKey::from_config(entry.subdomain.as_deref());
        if !config.tables.contains_key(&entry.table) {
            errors.push(ValidationError::UnknownTable {
                key: key.clone(),
                table: entry.table.clone(),
            });
        }
        if !seen.insert(key.clone()) {
            errors.push(ValidationError::DuplicateSubdomain(key));
        }
    }
}

fn validate_tables(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    for (table, table_config) in &config.tables {
        let mut templates: HashMap<String, &str> = HashMap::new();
        for (route, raw) in &table_config.routes {
            let template = match PathTemplate::parse(raw) {
                Ok(template) => template,
                Err(source) => {
                    errors.push(ValidationError::InvalidTemplate {
                        table: table.clone(),
                        route: route.clone(),
                        source,
                    });
                    continue;
                }
            };

            if template.as_str().starts_with(RESERVED_PREFIX) {
                errors.push(ValidationError::ReservedPath {
                    table: table.clone(),
                    route: route.clone(),
                });
            }

            // Parameter names don't matter to the router: `/{a}` and `/{b}` collide.
            if let Some(first) = templates.insert(template.shape(), route) {
                errors.push(ValidationError::DuplicateTemplate {
                    table: table.clone(),
                    first: first.to_string(),
                    second: route.clone(),
                    template: raw.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{SubdomainConfig, TableConfig};

    fn valid_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        let mut root = TableConfig::default();
        root.routes.insert("home".into(), "/".into());
        root.routes.insert("view".into(), "/view/{id}/".into());
        config.tables.insert("root".into(), root);
        config.subdomains.push(SubdomainConfig {
            subdomain: Some("api".into()),
            table: "root".into(),
        });
        config
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.site.domain = String::new();
        config.site.default_url_scheme = "ftp".into();
        config.site.root_table = "missing".into();
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyDomain));
        assert!(errors.contains(&ValidationError::UnsupportedScheme("ftp".into())));
        assert!(errors.contains(&ValidationError::UnknownRootTable("missing".into())));
    }

    #[test]
    fn test_invalid_domain() {
        let mut config = valid_config();
        config.site.domain = "example.com:8080".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors.as_slice(), [ValidationError::InvalidDomain { .. }]));

        config.site.domain = "Example.COM".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_duplicate_and_unknown_subdomains() {
        let mut config = valid_config();
        config.subdomains.push(SubdomainConfig {
            subdomain: Some("API".into()),
            table: "nope".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownTable {
                    key: SubdomainKey::Label("api".into()),
                    table: "nope".into(),
                },
                ValidationError::DuplicateSubdomain(SubdomainKey::Label("api".into())),
            ]
        );
    }

    #[test]
    fn test_table_templates() {
        let mut config = valid_config();
        let root = config.tables.get_mut("root").unwrap();
        root.routes.insert("item".into(), "/view/{pk}/".into());
        root.routes.insert("relative".into(), "relative/".into());
        root.routes.insert("internal".into(), "/_reverse/x".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateTemplate { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidTemplate { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ReservedPath { .. })));
    }

    #[test]
    fn test_templates_axum_cannot_route() {
        let mut config = valid_config();
        let root = config.tables.get_mut("root").unwrap();
        root.routes.insert("legacy".into(), "/legacy/:id/".into());
        root.routes.insert("files".into(), "/files/*rest".into());
        root.routes.insert("gap".into(), "/a//b".into());

        let errors = validate_config(&config).unwrap_err();
        let sources: Vec<&TemplateError> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::InvalidTemplate { source, .. } => Some(source),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 3);
        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources
                .iter()
                .filter(|s| matches!(s, TemplateError::ReservedSegment { .. }))
                .count(),
            2
        );
        assert!(sources.contains(&&TemplateError::EmptySegment("/a//b".into())));
    }
}
