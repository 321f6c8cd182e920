use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use catfeed_core::{AppConfig, FieldMapping};
use catfeed_feed::{FeedConfig, FeedKind, FeedPipeline, FeedRequest, FieldSelection, Format};
use catfeed_source::{CatalogSource, HttpCatalogSource, MemorySource};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "catfeed")]
#[command(about = "Export a store catalog as a paginated product feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk every page of a feed and write one complete document.
    Export(FeedArgs),
    /// Render a single page, exactly as the server would serve it.
    Page {
        #[command(flatten)]
        feed: FeedArgs,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Load configuration and the field mapping, then print them.
    CheckConfig,
}

#[derive(Debug, Args)]
struct FeedArgs {
    #[arg(long, default_value = "products")]
    feed: FeedKind,
    #[arg(long, default_value = "xml")]
    format: Format,
    /// Page size; defaults to `CATFEED_PAGE_SIZE`.
    #[arg(long)]
    limit: Option<u32>,
    /// Comma-separated field names to keep.
    #[arg(long)]
    fields: Option<String>,
    #[arg(long)]
    lang: Option<String>,
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,
    /// Read the catalog from a JSON snapshot instead of the upstream API.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Output file; stdout when omitted.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

impl FeedArgs {
    fn request(&self, offset: u64) -> FeedRequest {
        FeedRequest {
            kind: self.feed,
            format: self.format,
            offset,
            limit: self.limit,
            fields: self
                .fields
                .as_deref()
                .map_or_else(FieldSelection::all, FieldSelection::parse),
            lang: self.lang.clone().filter(|l| !l.trim().is_empty()),
            ids: self.ids.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the feed.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level_from_env()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Export(args) => run_feed(&args, None).await,
        Commands::Page { feed, offset } => run_feed(&feed, Some(offset)).await,
        Commands::CheckConfig => check_config(),
    }
}

fn log_level_from_env() -> String {
    std::env::var("CATFEED_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Loads configuration; with a snapshot the upstream URL becomes optional.
fn load_config(snapshot: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = catfeed_core::build_app_config(|key| match std::env::var(key) {
        Err(_) if key == "CATFEED_SOURCE_URL" => snapshot
            .map(|path| format!("file://{}", path.display()))
            .ok_or(std::env::VarError::NotPresent),
        other => other,
    })?;
    Ok(config)
}

fn load_mapping(config: &AppConfig) -> anyhow::Result<FieldMapping> {
    match &config.mapping_path {
        Some(path) => Ok(catfeed_core::load_field_mapping(path)?),
        None => Ok(FieldMapping::default()),
    }
}

async fn run_feed(args: &FeedArgs, single_page: Option<u64>) -> anyhow::Result<()> {
    let config = load_config(args.snapshot.as_deref())?;
    let feed_config = Arc::new(FeedConfig::from_app_config(&config, load_mapping(&config)?));

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let pages = if let Some(path) = &args.snapshot {
        let source = MemorySource::from_path(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        let pipeline = FeedPipeline::new(Arc::new(source), feed_config);
        write_feed(&pipeline, args, single_page, &mut out).await?
    } else {
        let source = HttpCatalogSource::from_app_config(&config)
            .context("failed to build catalog source client")?;
        let pipeline = FeedPipeline::new(Arc::new(source), feed_config);
        write_feed(&pipeline, args, single_page, &mut out).await?
    };

    out.flush()?;
    tracing::info!(feed = %args.feed, format = %args.format, pages, "feed written");
    Ok(())
}

/// Writes one page, or walks offsets until the last page.
///
/// XML pages are concatenated as served. JSON pages are merged into a
/// single array. Returns the number of pages fetched.
async fn write_feed<S, W>(
    pipeline: &FeedPipeline<S>,
    args: &FeedArgs,
    single_page: Option<u64>,
    out: &mut W,
) -> anyhow::Result<usize>
where
    S: CatalogSource,
    W: Write + ?Sized,
{
    let mut request = args.request(single_page.unwrap_or(0));
    let mut pages = 0;
    let mut json_rows: Vec<serde_json::Value> = Vec::new();

    loop {
        let document = pipeline
            .run(&request)
            .await
            .with_context(|| format!("failed to build page at offset {}", request.offset))?;
        pages += 1;

        match request.format {
            Format::Json if single_page.is_none() => {
                let rows: Vec<serde_json::Value> = serde_json::from_str(&document.body)?;
                json_rows.extend(rows);
            }
            Format::Json | Format::Xml => out.write_all(document.body.as_bytes())?,
        }

        if single_page.is_some() || document.is_last {
            if request.format == Format::Xml && document.body.is_empty() && pages > 1 {
                tracing::warn!(
                    offset = request.offset,
                    "last page rendered no rows; the XML document is left unclosed"
                );
            }
            break;
        }
        request.offset = request.offset.saturating_add(u64::from(document.limit));
    }

    if request.format == Format::Json && single_page.is_none() {
        serde_json::to_writer(&mut *out, &json_rows)?;
        writeln!(out)?;
    }

    Ok(pages)
}

fn check_config() -> anyhow::Result<()> {
    let config = catfeed_core::load_app_config()?;
    let mapping = load_mapping(&config)?;
    println!("{config:#?}");
    println!("mapped fields: {}", mapping.targets().join(", "));
    Ok(())
}
