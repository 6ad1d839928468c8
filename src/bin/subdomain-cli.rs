use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use subdomain_router::config::load_config;
use subdomain_router::lifecycle::Site;
use subdomain_router::routing::try_parse_subdomain;
use subdomain_router::ReverseRequest;

#[derive(Parser)]
#[command(name = "subdomain-cli")]
#[command(about = "Inspect a subdomain router configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and list subdomain entries
    Check,
    /// Show the subdomain and table selected for a host
    Parse { host: String },
    /// Build the absolute URL of a named route
    Reverse {
        route: String,
        /// Subdomain to build the URL for (empty for the bare domain)
        #[arg(long, conflicts_with = "bare")]
        subdomain: Option<String>,
        /// Build the URL for the bare domain
        #[arg(long)]
        bare: bool,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        scheme: Option<String>,
        /// Positional argument (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
        /// Keyword argument as NAME=VALUE (repeatable)
        #[arg(long = "kwarg", value_parser = parse_kwarg)]
        kwargs: Vec<(String, String)>,
        /// Reverse as if handling a request for this host
        #[arg(long)]
        from_host: Option<String>,
    },
}

fn parse_kwarg(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", raw))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let site = Site::from_config(&config)?;

    let output: Value = match cli.command {
        Commands::Check => {
            let entries: Vec<Value> = site
                .registry
                .entries()
                .into_iter()
                .map(|(key, table)| json!({ "subdomain": key.to_string(), "table": table }))
                .collect();
            json!({
                "domain": config.site.domain,
                "root_table": site.root_table,
                "tables": site.tables.keys().collect::<Vec<_>>(),
                "subdomains": entries,
            })
        }
        Commands::Parse { host } => {
            match try_parse_subdomain(
                &host,
                &config.site.domain,
                config.site.remove_www_from_domain,
            ) {
                Ok(subdomain) => {
                    let context = site.resolver.context_for(subdomain);
                    json!({
                        "host": host,
                        "subdomain": context.subdomain,
                        "table": context.table.unwrap_or_else(|| site.root_table.clone()),
                    })
                }
                Err(err) => json!({ "host": host, "error": err.to_string() }),
            }
        }
        Commands::Reverse {
            route,
            subdomain,
            bare,
            table,
            scheme,
            args,
            kwargs,
            from_host,
        } => {
            let mut request = ReverseRequest::new(route);
            if bare {
                request = request.bare_domain();
            }
            if let Some(subdomain) = subdomain {
                request = request.subdomain(subdomain);
            }
            if let Some(table) = table {
                request = request.table(table);
            }
            if let Some(scheme) = scheme {
                request = request.scheme(scheme);
            }
            for arg in args {
                request = request.arg(arg);
            }
            for (name, value) in kwargs {
                request = request.kwarg(name, value);
            }

            let context = from_host.map(|host| site.resolver.resolve(&host));
            match site.reverser.reverse(&request, context.as_ref()) {
                Ok(url) => json!({ "url": url }),
                Err(err) => json!({ "error": { "code": err.kind(), "message": err.to_string() } }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
