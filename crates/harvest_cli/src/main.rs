//! Command-line front end for the harvest pipeline.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use harvest_core::{parse_url_list, ChunkSettings, RoutingTable};
use harvest_engine::{
    ensure_output_dir, Harvester, HarvestSettings, JsonlFileSink, LoaderSettings,
    NormalizeSettings, RenderSettings,
};
use harvest_logging::{harvest_info, harvest_warn, LogDestination};

#[derive(Debug, Parser)]
#[command(
    name = "harvest",
    about = "Harvest web content into normalized, size-bounded text chunks",
    version
)]
struct Cli {
    /// Newline-delimited URL list; blank lines and # comments are ignored.
    url_file: PathBuf,

    /// Domains to skip entirely, one per line.
    #[arg(long, value_name = "FILE")]
    skip_list: PathBuf,

    /// Domains always loaded through the rendering service, one per line.
    #[arg(long, value_name = "FILE")]
    render_list: PathBuf,

    /// Recursive crawl entries, one `<url> <depth>` per line.
    #[arg(long, value_name = "FILE")]
    recursive_list: PathBuf,

    /// Directory for chunks.jsonl, links.log, and failed_urls.log.
    #[arg(long, default_value = "harvest_out")]
    output_dir: PathBuf,

    /// Target chunk size, in characters.
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Character overlap between consecutive chunks.
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,

    /// Fixed delay between outbound requests, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    request_delay_ms: u64,

    /// Rendering service endpoint; the target URL is appended as a path.
    #[arg(long, default_value = "https://r.jina.ai")]
    render_endpoint: String,

    /// Bearer token for the rendering service.
    #[arg(long, env = "HARVEST_RENDER_API_KEY")]
    render_api_key: Option<String>,

    /// Skip the second pass over pass-1 failures.
    #[arg(long)]
    no_retry: bool,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    log: LogTarget,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    harvest_logging::initialize(cli.log.into());

    let raw_urls = fs::read_to_string(&cli.url_file)
        .with_context(|| format!("reading url list {}", cli.url_file.display()))?;
    let urls = parse_url_list(&raw_urls);
    if urls.is_empty() {
        bail!("no urls in {}", cli.url_file.display());
    }

    // A missing config file is the one fatal condition in routing setup.
    let skip = fs::read_to_string(&cli.skip_list)
        .with_context(|| format!("reading skip list {}", cli.skip_list.display()))?;
    let render = fs::read_to_string(&cli.render_list)
        .with_context(|| format!("reading render list {}", cli.render_list.display()))?;
    let recursive = fs::read_to_string(&cli.recursive_list)
        .with_context(|| format!("reading recursive list {}", cli.recursive_list.display()))?;
    let (routing, warnings) = RoutingTable::from_sources(&skip, &render, &recursive);
    for warning in &warnings {
        harvest_warn!(
            "{} list: skipping {:?}: {}",
            warning.list,
            warning.line,
            warning.message
        );
    }

    ensure_output_dir(&cli.output_dir).context("preparing output directory")?;
    let chunk_path = cli.output_dir.join("chunks.jsonl");
    let mut sink = JsonlFileSink::create(&chunk_path).context("opening chunk sink")?;

    let settings = HarvestSettings {
        loader: LoaderSettings {
            request_delay: Duration::from_millis(cli.request_delay_ms),
            render: RenderSettings {
                endpoint: cli.render_endpoint.clone(),
                api_key: cli.render_api_key.clone(),
                ..RenderSettings::default()
            },
            ..LoaderSettings::default()
        },
        normalize: NormalizeSettings {
            chunk: ChunkSettings {
                target_size: cli.chunk_size,
                overlap: cli.chunk_overlap,
            },
            ..NormalizeSettings::default()
        },
        retry_failed: !cli.no_retry,
        links_file: Some(cli.output_dir.join("links.log")),
        failed_urls_file: Some(cli.output_dir.join("failed_urls.log")),
    };

    let mut harvester = Harvester::new(routing, settings);
    let cancel = harvester.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            harvest_warn!("interrupt received; finishing the current url, then flushing");
            cancel.cancel();
        }
    });

    harvest_info!("harvesting {} urls into {}", urls.len(), cli.output_dir.display());
    let outcome = harvester.run(&urls, &mut sink).await?;

    println!(
        "attempted {}, succeeded {}, failed {}, chunks {}, links {}",
        outcome.stats.attempted,
        outcome.stats.succeeded,
        outcome.stats.failed,
        outcome.stats.chunks_written,
        outcome.stats.links_found
    );
    println!("chunks:  {}", chunk_path.display());
    println!("links:   {}", cli.output_dir.join("links.log").display());
    println!(
        "failed:  {}",
        cli.output_dir.join("failed_urls.log").display()
    );

    if outcome.cancelled {
        bail!("run interrupted; partial output flushed");
    }
    Ok(())
}
