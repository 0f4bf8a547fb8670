use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use note_relay::client::{
    ApiClient, ApiError, Connection, IngestRequest, SearchFilters, SearchOptions, SearchRequest, UploadCoordinator, UploadFile,
};
use note_relay::config::load_or_default;
use note_relay::observability::init_with_filter;
use note_relay::target::{is_local, FileTargetStore, TargetResolver};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for a note-indexing backend", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay server URL, overriding the configured one.
    #[arg(long)]
    relay: Option<String>,

    /// Backend for this invocation only.
    #[arg(short, long)]
    target: Option<String>,

    /// Forward in-process instead of through a relay server.
    #[arg(long)]
    direct: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search indexed notes
    Search(SearchArgs),
    /// Ingest notes from the backend's roots
    Ingest(IngestArgs),
    /// Rebuild the index and clear the cache
    Reindex,
    /// Show index and cache statistics
    Stats,
    /// Upload note files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show or change the stored backend
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },
}

#[derive(Args)]
struct SearchArgs {
    query: String,
    #[arg(short, long)]
    limit: Option<u32>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    path_prefix: Option<String>,
    #[arg(long)]
    fuzzy: bool,
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct IngestArgs {
    #[arg(long = "root")]
    roots: Vec<String>,
    #[arg(long = "ext")]
    extensions: Vec<String>,
    /// incremental or full
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum TargetAction {
    Get,
    Set { url: String },
}

impl SearchArgs {
    fn into_request(self) -> SearchRequest {
        let filters = (!self.tags.is_empty() || self.path_prefix.is_some()).then(|| SearchFilters {
            tags_any: (!self.tags.is_empty()).then_some(self.tags),
            path_prefix: self.path_prefix,
        });
        SearchRequest {
            q: self.query,
            limit: self.limit,
            filters,
            options: self.fuzzy.then_some(SearchOptions { fuzzy: Some(true) }),
            cache: self.no_cache.then_some(false),
        }
    }
}

impl IngestArgs {
    fn into_request(self) -> IngestRequest {
        IngestRequest {
            roots: (!self.roots.is_empty()).then_some(self.roots),
            extensions: (!self.extensions.is_empty()).then_some(self.extensions),
            mode: self.mode,
            dry_run: self.dry_run.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_with_filter(config.observability.log_format, "note_relay=warn")?;

    let store = Arc::new(FileTargetStore::new(&config.client.state_path));
    let resolver = TargetResolver::new(store);

    let connection = if cli.direct {
        Connection::Direct
    } else {
        Connection::Remote {
            relay_url: cli.relay.as_deref().unwrap_or(&config.client.relay_url),
        }
    };
    let client = ApiClient::from_config(&config, connection, resolver.clone())?;
    let target = cli.target.as_deref();

    match cli.command {
        Commands::Search(args) => print_result(client.search(&args.into_request(), target).await)?,
        Commands::Ingest(args) => print_result(client.ingest(&args.into_request(), target).await)?,
        Commands::Reindex => print_result(client.reindex(target).await)?,
        Commands::Stats => print_result(client.stats(target).await)?,
        Commands::Upload { files } => {
            let mut selected = Vec::with_capacity(files.len());
            for path in &files {
                selected.push(UploadFile::read(path).await?);
            }
            let report = UploadCoordinator::new(client)
                .with_allowed_extensions(&config.client.allowed_extensions)
                .upload_all(selected, target)
                .await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.endpoint_unsupported() {
                eprintln!("Upload endpoint is not available on this server.");
            }
            if report.failed() > 0 {
                std::process::exit(1);
            }
        }
        Commands::Target { action } => match action {
            TargetAction::Get => {
                let current = resolver.resolve(target);
                println!("{}", current);
                if !is_local(&current) {
                    eprintln!("Note: {} is not a local address.", current);
                }
            }
            TargetAction::Set { url } => {
                resolver.store(&url);
                println!("{}", resolver.resolve(None));
            }
        },
    }

    Ok(())
}

fn print_result<T: Serialize>(result: Result<T, ApiError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            if let Some(status) = err.status() {
                eprintln!("Status: {} ({})", status, err.code());
            }
            if let Some(details) = err.details() {
                eprintln!("Details: {}", serde_json::to_string_pretty(details)?);
            }
            std::process::exit(1);
        }
    }
}
