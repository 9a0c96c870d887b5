use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cinedb_core::config::{resolve_with_base, Config, Settings};
use cinedb_core::data_processor::DataProcessor;
use cinedb_core::filter::FilterBuilder;
use cinedb_core::schema::{RATING_FIELD, TITLE_FIELD, YEAR_FIELD};
use cinedb_core::traits::DocumentStore;
use cinedb_core::types::ScoredResult;
use cinedb_embed::build_embedder;
use cinedb_hybrid::{CancelToken, IngestionPipeline, QueryEngine};
use cinedb_vector::{LanceStore, MemoryStore};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: cinedb <ingest|query> [args...]
  ingest [csv]
  query <text> [--k N] [--years LO-HI] [--min-rating R] [--title] [--show-filter] [--json]";

#[derive(Debug, Default, PartialEq)]
struct QueryArgs {
    text: String,
    k: Option<i64>,
    years: Option<(i32, i32)>,
    min_rating: Option<f64>,
    title: bool,
    show_filter: bool,
    json: bool,
}

fn parse_years(s: &str) -> anyhow::Result<(i32, i32)> {
    let (lo, hi) = s.split_once('-').ok_or_else(|| anyhow::anyhow!("--years expects LO-HI, got '{s}'"))?;
    Ok((lo.trim().parse()?, hi.trim().parse()?))
}

fn parse_query_args(args: &[String]) -> anyhow::Result<QueryArgs> {
    let mut out = QueryArgs::default();
    let mut it = args.iter();
    let mut text = Vec::new();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().cloned().ok_or_else(|| anyhow::anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--k" => out.k = Some(value("--k")?.parse()?),
            "--years" => out.years = Some(parse_years(&value("--years")?)?),
            "--min-rating" => out.min_rating = Some(value("--min-rating")?.parse()?),
            "--title" => out.title = true,
            "--show-filter" => out.show_filter = true,
            "--json" => out.json = true,
            other if other.starts_with("--") => anyhow::bail!("unknown option {other}"),
            other => text.push(other.to_string()),
        }
    }
    out.text = text.join(" ");
    if out.text.trim().is_empty() {
        anyhow::bail!("query text is required");
    }
    Ok(out)
}

/// Relative dataset and store locations are taken from the working directory.
fn dataset_path(settings: &Settings, args: &[String], base: &Path) -> PathBuf {
    resolve_with_base(base, args.first().unwrap_or(&settings.ingest.dataset))
}

fn store_uri(settings: &Settings, base: &Path) -> PathBuf { resolve_with_base(base, &settings.store.uri) }

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let schema = settings.collection_schema();
    match settings.store.backend.as_str() {
        "lancedb" => {
            let uri = store_uri(settings, &env::current_dir()?);
            Ok(Arc::new(LanceStore::open(&uri.to_string_lossy(), &settings.store.table, schema).await?))
        }
        "memory" => {
            tracing::warn!("memory store is process-local; documents are not persisted");
            Ok(Arc::new(MemoryStore::new(schema)))
        }
        other => anyhow::bail!("unknown store.backend '{other}'"),
    }
}

fn field_text(r: &ScoredResult, name: &str) -> String {
    match r.document.get(name) {
        Some(v) => v.as_str().map(str::to_string).or_else(|| v.as_f64().map(|n| n.to_string())).unwrap_or_default(),
        None => String::new(),
    }
}

fn print_results(results: &[ScoredResult]) {
    if results.is_empty() {
        println!("No matches.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        println!(
            "{:>2}. {} ({}) rating {} {} score={:.3}",
            i + 1,
            field_text(r, TITLE_FIELD),
            field_text(r, YEAR_FIELD),
            field_text(r, RATING_FIELD),
            field_text(r, "Runtime"),
            r.score
        );
    }
}

async fn ingest(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let path = dataset_path(settings, args, &env::current_dir()?);
    let processor = DataProcessor::new(settings.collection_schema());
    let rows = processor.read_csv(&path)?;
    println!("Ingesting {} rows from {}", rows.len(), path.display());

    let embedder = build_embedder(&settings.embedding, env::var(&settings.embedding.api_key_env).ok())?;
    let store = open_store(settings).await?;
    let pipeline = IngestionPipeline::new(embedder, store, processor)
        .with_concurrency(settings.ingest.concurrency)
        .with_progress(settings.ingest.show_progress);

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; finishing rows in flight");
            on_signal.cancel();
        }
    });

    let report = pipeline.run_cancellable(&rows, &cancel).await?;
    for e in &report.errors {
        eprintln!("row {}: {}", e.row, e.cause);
    }
    println!(
        "Ingest {}: {} succeeded, {} failed",
        if report.cancelled { "cancelled" } else { "complete" },
        report.succeeded,
        report.failed
    );
    Ok(())
}

async fn query(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let q = parse_query_args(args)?;
    let mut builder = FilterBuilder::new();
    if let Some((lo, hi)) = q.years {
        builder = builder.year_range(lo, hi);
    }
    if let Some(r) = q.min_rating {
        builder = builder.min_rating(r);
    }
    if q.title {
        builder = builder.title_phrase(q.text.clone());
    }
    let predicate = builder.build();
    if q.show_filter {
        println!("{}", serde_json::to_string_pretty(&predicate.to_search_request())?);
    }

    let embedder = build_embedder(&settings.embedding, env::var(&settings.embedding.api_key_env).ok())?;
    let store = open_store(settings).await?;
    let mut engine = QueryEngine::new(embedder, store);
    if settings.search.timeout_secs > 0 {
        engine = engine.with_timeout(Duration::from_secs(settings.search.timeout_secs));
    }
    let k = q.k.unwrap_or(settings.search.default_k as i64);
    let results = engine.search(&q.text, k, &predicate).await?;
    if q.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    match cmd.as_str() {
        "ingest" => ingest(&settings, &args).await,
        "query" => query(&settings, &args).await,
        _ => {
            eprintln!("Unknown command: {}\n{USAGE}", cmd);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> { s.iter().map(|a| a.to_string()).collect() }

    #[test]
    fn parses_full_query() {
        let q = parse_query_args(&args(&["space", "adventure", "--k", "5", "--years", "1990-2024", "--min-rating", "7.5"])).unwrap();
        assert_eq!(q.text, "space adventure");
        assert_eq!(q.k, Some(5));
        assert_eq!(q.years, Some((1990, 2024)));
        assert_eq!(q.min_rating, Some(7.5));
        assert!(!q.title);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let settings = Settings::default();
        let base = Path::new("/srv/cinedb");
        assert_eq!(store_uri(&settings, base), base.join(&settings.store.uri));
        assert_eq!(dataset_path(&settings, &[], base), base.join(&settings.ingest.dataset));
        assert_eq!(dataset_path(&settings, &args(&["/data/imdb.csv"]), base), PathBuf::from("/data/imdb.csv"));
        assert_eq!(dataset_path(&settings, &args(&["top.csv"]), base), PathBuf::from("/srv/cinedb/top.csv"));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_query_args(&args(&["--k", "3"])).is_err());
        assert!(parse_query_args(&args(&["heat", "--years", "1990"])).is_err());
        assert!(parse_query_args(&args(&["heat", "--k"])).is_err());
        assert!(parse_query_args(&args(&["heat", "--nope"])).is_err());
    }
}
