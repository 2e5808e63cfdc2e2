use std::env;
use std::path::PathBuf;

use catalog::{import_folder, Catalog, ImportOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let music_folder = args
        .next()
        .or_else(|| env::var("MUSIC_FOLDER").ok())
        .ok_or("MUSIC_FOLDER not set and no path argument")?;
    let index_path = args
        .next()
        .or_else(|| env::var("INDEX_PATH").ok())
        .unwrap_or_else(|| "data/catalog.redb".to_string());

    let catalog = Catalog::open(&PathBuf::from(&index_path))?;
    let options = ImportOptions {
        recursive: true,
        read_tags: true,
        ..ImportOptions::default()
    };
    info!("Importing {} into {}", music_folder, index_path);
    let report = import_folder(&catalog, &PathBuf::from(&music_folder), &options)?;

    println!(
        "Imported: {} new, {} skipped, {} failed ({} total in catalog)",
        report.imported,
        report.skipped,
        report.failed,
        catalog.count()?
    );

    Ok(())
}
