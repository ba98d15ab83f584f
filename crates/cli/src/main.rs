use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use sift_core::{ContentType, Delta, DiscoveryState, EngineConfig, Filters, Placeholder, PoolSnapshot, SortStrategy, Tab};
use sift_search::{clamp_page, compute_window, discover, Discovery, PageWindow};
use sift_store::spawn_ingest;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "siftctl", version, about = "Sift discovery CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one discovery over a pool file and print a page
    Search {
        /// Pool file (JSON or YAML): an array of items or `{ items: [...] }`
        pool: PathBuf,
        /// Free-text query, matched case-insensitively as a substring
        query: Option<String>,
        /// Content type: all, post, user, topic, group
        #[arg(long = "type")]
        content_type: Option<ContentType>,
        /// Post author username (substring)
        #[arg(long)]
        author: Option<String>,
        /// Require a matching tag; repeatable
        #[arg(long = "tag", action = ArgAction::Append)]
        tags: Vec<String>,
        /// Only verified authors and users
        #[arg(long, action = ArgAction::SetTrue)]
        verified: bool,
        /// relevance, date, popularity, alphabetical or pool
        #[arg(long = "sort")]
        sort: Option<SortStrategy>,
        /// Interest tag used for relevance boosts; repeatable
        #[arg(long = "interest", action = ArgAction::Append)]
        interests: Vec<String>,
        /// Page to show (clamped into range)
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "page-size")]
        page_size: Option<usize>,
        /// Maximum numbered page links
        #[arg(long = "max-pages")]
        max_pages: Option<usize>,
        /// Active tab: all, posts, users, topics, groups
        #[arg(long)]
        tab: Option<Tab>,
        /// Relevance placeholder: fixed, fixed:<v>, random or seeded:<n>
        #[arg(long)]
        placeholder: Option<Placeholder>,
        /// Deltas (JSON or YAML array) replayed over the pool before searching
        #[arg(long)]
        deltas: Option<PathBuf>,
        /// Explain matcher stages and counts
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Print the page window for a position
    Pages {
        current: u32,
        total: u32,
        #[arg(long = "max-visible")]
        max_visible: Option<usize>,
    },
}

fn init_tracing() {
    let env = std::env::var("SIFT_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&raw).with_context(|| format!("decoding YAML {}", path.display())),
        _ => serde_json::from_str(&raw).with_context(|| format!("decoding JSON {}", path.display())),
    }
}

fn load_pool(path: &Path) -> Result<PoolSnapshot> {
    let doc: serde_json::Value = read_document(path)?;
    let snap = PoolSnapshot::from_document(doc, 1).with_context(|| format!("loading pool {}", path.display()))?;
    Ok(snap)
}

/// Replay the pool and `deltas` through the ingest loop and return its final snapshot.
async fn replay(pool: PoolSnapshot, deltas: Vec<Delta>) -> Result<PoolSnapshot> {
    let cap = std::env::var("SIFT_QUEUE_CAP").ok().and_then(|s| s.parse::<usize>().ok()).unwrap_or(2048);
    let wanted = pool.items.len() + deltas.len();
    if wanted > cap {
        warn!(cap, wanted, "SIFT_QUEUE_CAP below replay size; oldest pending deltas may be dropped");
    }
    let (tx, backend) = spawn_ingest(cap);
    let mut epochs = backend.subscribe_epoch();
    for d in pool.items.into_iter().map(Delta::Upsert).chain(deltas) {
        tx.send(d).await.context("ingest loop stopped early")?;
    }
    // dropping the last sender flushes the loop; the watch closes once it exits
    drop(tx);
    let wait = async { while epochs.changed().await.is_ok() {} };
    if tokio::time::timeout(Duration::from_secs(5), wait).await.is_err() {
        warn!("ingest did not finish in time; using latest snapshot");
    }
    Ok((*backend.current()).clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            pool,
            query,
            content_type,
            author,
            tags,
            verified,
            sort,
            interests,
            page,
            page_size,
            max_pages,
            tab,
            placeholder,
            deltas,
            explain,
        } => {
            let mut cfg = EngineConfig::from_env();
            if let Some(n) = page_size { cfg.page_size = n; }
            if let Some(n) = max_pages { cfg.max_visible_pages = n; }
            if let Some(p) = placeholder { cfg.placeholder = p; }

            let mut snap = load_pool(&pool)?;
            if let Some(path) = deltas {
                let batch: Vec<Delta> = read_document(&path)?;
                info!(deltas = batch.len(), "replaying deltas over pool");
                snap = replay(snap, batch).await?;
            }
            info!(pool = %pool.display(), items = snap.items.len(), epoch = snap.epoch, "search invoked");

            let filters = Filters {
                content_type: content_type.unwrap_or_default(),
                author,
                tags,
                verified,
                sort_by: sort.unwrap_or_default(),
            };
            let state = DiscoveryState::new(&cfg)
                .with_query(query.unwrap_or_default())
                .with_filters(filters)
                .with_interests(interests)
                .with_tab(tab.unwrap_or_default())
                .with_page(page);
            let d = discover(&snap.items, &state, &cfg);

            match cli.output {
                Output::Human => print_discovery(&d, chrono::Utc::now().timestamp()),
                Output::Json => {
                    let mut v = serde_json::to_value(&d)?;
                    if !explain {
                        if let Some(obj) = v.as_object_mut() { obj.remove("debug"); }
                    }
                    println!("{}", serde_json::to_string_pretty(&v)?);
                }
            }
            if explain && matches!(cli.output, Output::Human) {
                let m = &d.debug.matcher;
                eprintln!(
                    "debug: total={} after_type={} after_text={} after_author={} after_tags={} after_verified={} strategy={:?} eval_us={}",
                    m.total, m.after_type, m.after_text, m.after_author, m.after_tags, m.after_verified, d.debug.strategy, d.debug.eval_us
                );
            }
        }
        Commands::Pages { current, total, max_visible } => {
            let max_visible = max_visible.unwrap_or_else(|| EngineConfig::from_env().max_visible_pages);
            let (current, total, w) = page_window(current, total, max_visible);
            match cli.output {
                Output::Human => println!("{}", render_window(&w, current, total)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&w)?),
            }
        }
    }

    Ok(())
}

fn print_discovery(d: &Discovery<'_>, now: i64) {
    let tabs: Vec<String> = d
        .tabs
        .iter()
        .map(|t| if t.tab == d.tab { format!("[{}({})]", t.tab.label(), t.count) } else { format!("{}({})", t.tab.label(), t.count) })
        .collect();
    println!("{}", tabs.join(" "));
    println!("KIND   ID           TITLE                                    SCORE  AGE");
    for r in &d.items {
        let score = r.score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<12} {:<40} {:<6} {}",
            r.item.kind().as_str(),
            truncate(r.item.id(), 12),
            truncate(r.item.title(), 40),
            score,
            render_age(r.item.timestamp(), now)
        );
    }
    println!("page {}/{}  {}", d.page, d.total_pages, render_window(&d.window, d.page, d.total_pages));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Window for user-supplied positions: at least one page, current clamped into range.
fn page_window(current: u32, total: u32, max_visible: usize) -> (u32, u32, PageWindow) {
    let total = total.max(1);
    let current = clamp_page(current, total);
    (current, total, compute_window(current, total, max_visible))
}

/// `1 … 4 5 [6] 7 8 … 20`; empty when there is nothing to page through.
fn render_window(w: &PageWindow, current: u32, total: u32) -> String {
    if w.is_empty() { return String::new(); }
    let mut parts: Vec<String> = Vec::with_capacity(w.pages.len() + 4);
    if w.has_first { parts.push("1".into()); }
    if w.show_leading_ellipsis { parts.push("…".into()); }
    for &p in &w.pages {
        parts.push(if p == current { format!("[{p}]") } else { p.to_string() });
    }
    if w.show_trailing_ellipsis { parts.push("…".into()); }
    if w.has_last { parts.push(total.to_string()); }
    parts.join(" ")
}

fn render_age(ts: i64, now: i64) -> String {
    if ts <= 0 { return "-".to_string(); }
    let mut secs = (now - ts).max(0) as u64;
    let days = secs / 86_400; secs %= 86_400;
    let hours = secs / 3600; secs %= 3600;
    let mins = secs / 60; secs %= 60;
    if days > 0 { format!("{}d{}h", days, hours) }
    else if hours > 0 { format!("{}h{}m", hours, mins) }
    else if mins > 0 { format!("{}m", mins) }
    else { format!("{}s", secs) }
}
