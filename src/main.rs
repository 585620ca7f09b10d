use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use estate_client::{
    Settings,
    export,
    listing_api::HttpListingApi,
    models::SelectedFile,
    search::{SearchController, SearchStatus},
    showcase,
    storage::HttpObjectStorage,
    upload::UploadOrchestrator,
};

const USAGE: &str = "usage:
  estate_client search [QUERY] [--more N] [--csv PATH]
  estate_client showcase
  estate_client upload FILE...";

// Parsed command line
enum Command {
    Search {
        query: String,
        more: usize,
        csv: Option<PathBuf>,
    },
    Showcase,
    Upload {
        files: Vec<PathBuf>,
    },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    match args.next().as_deref() {
        Some("search") => {
            let mut query = String::new();
            let mut more = 0;
            let mut csv = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--more" => {
                        let value = args.next().ok_or_else(|| anyhow!("--more needs a number"))?;
                        more = value.parse().context("--more must be a number")?;
                    }
                    "--csv" => {
                        let path = args.next().ok_or_else(|| anyhow!("--csv needs a path"))?;
                        csv = Some(PathBuf::from(path));
                    }
                    _ => query = arg,
                }
            }
            Ok(Command::Search { query, more, csv })
        }
        Some("showcase") => Ok(Command::Showcase),
        Some("upload") => {
            let files: Vec<PathBuf> = args.map(PathBuf::from).collect();
            if files.is_empty() {
                bail!("upload needs at least one file\n{}", USAGE);
            }
            Ok(Command::Upload { files })
        }
        _ => bail!("{}", USAGE),
    }
}

async fn run_search(
    api: HttpListingApi,
    settings: &Settings,
    query: String,
    more: usize,
    csv: Option<PathBuf>,
) -> Result<()> {
    let mut controller = SearchController::new(api, settings.page_size);
    controller.on_location_change(&query).await;
    tracing::info!(location = %controller.location_query(), "Search location");

    for _ in 0..more {
        if controller.load_more().await.is_none() {
            break;
        }
    }

    for notice in controller.take_notices() {
        println!("[{:?}] {}", notice.level, notice.message);
    }
    if controller.status() == SearchStatus::Failed && controller.listings().is_empty() {
        bail!("Search failed");
    }

    for listing in controller.listings() {
        println!("{}\t{}\t{}", listing.id, listing.name, listing.regular_price);
    }
    println!(
        "{} listings loaded{}",
        controller.listings().len(),
        if controller.has_more() { " (more available)" } else { "" }
    );

    if let Some(path) = csv {
        export::save_listings(&path, controller.listings())?;
    }
    Ok(())
}

async fn run_upload(
    storage: HttpObjectStorage,
    settings: &Settings,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Not a file: {}", path.display()))?;
        files.push(SelectedFile::new(name, data));
    }

    let orchestrator = UploadOrchestrator::new(storage, settings.max_images);
    let urls = orchestrator
        .upload(files, 0)
        .await
        .map_err(|e| anyhow!(e.notice()).context(e.to_string()))?;
    for url in urls {
        println!("{}", url);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "estate_client=info".into()))
        .with(fmt::layer())
        .init();

    let command = parse_args(std::env::args().skip(1))?;

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // One shared client for the listing API and the storage backend
    let http_client = Arc::new(
        Client::builder()
            .user_agent(settings.user_agent.as_str())
            .cookie_store(true)
            .build()
            .context("Failed to build shared reqwest client")?,
    );

    match command {
        Command::Search { query, more, csv } => {
            let api = HttpListingApi::new(Arc::clone(&http_client), &settings);
            run_search(api, &settings, query, more, csv).await
        }
        Command::Showcase => {
            let api = HttpListingApi::new(Arc::clone(&http_client), &settings);
            let showcase = showcase::fetch_showcase(&api, settings.showcase_limit)
                .await
                .context("Failed to fetch showcase listings")?;
            let sections = [
                ("offer", &showcase.offer),
                ("rent", &showcase.rent),
                ("sale", &showcase.sale),
            ];
            for (section, listings) in sections {
                println!("{}:", section);
                for listing in listings {
                    println!("  {}\t{}", listing.id, listing.name);
                }
            }
            Ok(())
        }
        Command::Upload { files } => {
            let storage = HttpObjectStorage::new(Arc::clone(&http_client), &settings);
            run_upload(storage, &settings, files).await
        }
    }
}
