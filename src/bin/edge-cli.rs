use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use edge_router::analytics::{generate_session_id, Admission, AdmissionFilter};
use edge_router::config::{load_config, AllowList, EdgeConfig};
use edge_router::routing::Router;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Offline helper for the edge router configuration", long_about = None)]
struct Cli {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which rule and cache policy a path gets
    Route { path: String },
    /// Evaluate analytics admission for the given request fields
    Admit {
        #[arg(long)]
        referer: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
        /// Raw query string, e.g. "ga=UA-1&dt=Home"
        #[arg(long)]
        query: Option<String>,
        /// Allow-list patterns, overriding the configuration
        #[arg(long = "allow")]
        allow: Vec<String>,
    },
    /// Print a fresh session identifier
    SessionId,
    /// Load, validate and print the effective configuration
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };

    let output: Value = match cli.command {
        Commands::Route { path } => {
            let route = Router::from_config(&config).classify(&path);
            json!({
                "path": path,
                "route": route,
                "cache_policy": route.cache_policy().map(|p| json!({
                    "browser": p.browser_header(),
                    "edge": p.edge_header(),
                    "cache_everything": p.cache_everything,
                })),
            })
        }
        Commands::Admit {
            referer,
            user_agent,
            query,
            allow,
        } => {
            let allow_list = if allow.is_empty() {
                config.analytics.allow_list.clone()
            } else {
                Some(AllowList::Many(allow))
            };
            let filter = AdmissionFilter::new(allow_list.as_ref())?;
            match filter.check(referer.as_deref(), user_agent.as_deref(), query.as_deref()) {
                Admission::Allow(admitted) => json!({
                    "decision": "allow",
                    "tracking_id": admitted.tracking_id,
                    "referrer_host": admitted.referrer.host_str(),
                }),
                Admission::Block(reason) => json!({
                    "decision": "block",
                    "reason": reason.as_str(),
                }),
            }
        }
        Commands::SessionId => Value::String(generate_session_id()),
        Commands::CheckConfig => serde_json::to_value(&config)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
