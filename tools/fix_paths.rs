use std::env;
use std::path::PathBuf;

use catalog::{Catalog, PathResolver, Repair};
use common::MediaRecord;
use tracing_subscriber::EnvFilter;

struct Args {
    apply: bool,
    limit: usize,
    media_root: Option<PathBuf>,
    index_path: PathBuf,
}

#[derive(Default)]
struct Summary {
    total: usize,
    unchanged: usize,
    fixed: usize,
    not_found: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args(env::args().skip(1))?;
    let catalog = Catalog::open(&args.index_path)?;
    let resolver = PathResolver::new(args.media_root.clone());
    if let Some(root) = resolver.media_root() {
        println!("Media root: {}", root.display());
    }

    let mut records = catalog.list_all()?;
    if args.limit > 0 {
        records.truncate(args.limit);
    }

    let mut summary = Summary::default();
    for record in &records {
        summary.total += 1;
        match resolver.repair(&record.file_path) {
            Repair::Unchanged => {
                summary.unchanged += 1;
                println!("{}: OK (exists): {}", label(record), record.file_path);
            }
            Repair::Fixed(path) => {
                let fixed = path.to_string_lossy().to_string();
                println!("{}: will fix -> {}", label(record), fixed);
                if args.apply && catalog.update_path(&record.id, &fixed)? {
                    summary.fixed += 1;
                }
            }
            Repair::NotFound => {
                summary.not_found += 1;
                println!("{}: NOT FOUND: {:?}", label(record), record.file_path);
            }
        }
    }

    println!();
    println!("Summary:");
    println!("  Total scanned: {}", summary.total);
    println!("  Unchanged (exists): {}", summary.unchanged);
    println!("  Fixed (applied): {}", summary.fixed);
    println!("  Not found / empty: {}", summary.not_found);
    if !args.apply {
        println!();
        println!("Run with --apply to persist fixes (or --limit N to restrict).");
    }
    Ok(())
}

fn label(record: &MediaRecord) -> String {
    let short: String = record.id.chars().take(12).collect();
    format!("#{} [{}]", short, record.display_name())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        apply: false,
        limit: 0,
        media_root: env::var("MEDIA_ROOT").ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from),
        index_path: PathBuf::from(
            env::var("INDEX_PATH").unwrap_or_else(|_| "data/catalog.redb".to_string()),
        ),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--apply" => parsed.apply = true,
            "--limit" => {
                let value = args.next().ok_or("--limit needs a value")?;
                parsed.limit = value
                    .parse()
                    .map_err(|_| format!("invalid --limit value: {}", value))?;
            }
            "--media-root" => {
                let value = args.next().ok_or("--media-root needs a value")?;
                parsed.media_root = Some(PathBuf::from(value));
            }
            "--index" => {
                let value = args.next().ok_or("--index needs a value")?;
                parsed.index_path = PathBuf::from(value);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}
