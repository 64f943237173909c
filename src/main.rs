use std::path::PathBuf;

use anyhow::Context;
use wl_ingest::PipelineConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let dir: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| {
            eprintln!("usage: wl-ingest <export-directory>");
            std::process::exit(2);
        })
        .into();

    let config = PipelineConfig::from_env().context("reading WL_INGEST_* configuration")?;
    let output = wl_ingest::run_dir(&dir, &config)
        .with_context(|| format!("reading exports from {}", dir.display()))?;

    // Downstream reporting consumes this JSON; keep the shape stable.
    let summary = serde_json::json!({
        "messages": output.messages,
        "rejections": output.rejections,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
