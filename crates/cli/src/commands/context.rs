//! `vecta context`: Assemble the context block for a query.

use std::path::Path;

use super::{load_config, load_engine};
use crate::RequestArgs;

pub async fn run(
    config_path: &Path,
    args: &RequestArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let engine = load_engine(&config).await?;

    let block = engine.assemble(&args.to_request()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&block)?);
        return Ok(());
    }

    let meta = &block.metadata;
    eprintln!(
        "🧭 Condition: {} ({}) · {} example(s) · ~{} tokens{}",
        block.condition,
        meta.analysis_type,
        meta.example_ids.len(),
        meta.estimated_tokens,
        if meta.guideline_truncated { " · guidelines truncated" } else { "" }
    );
    if block.is_empty() {
        eprintln!("   (no examples or guidelines apply; the block is empty)");
    } else {
        println!("{}", block.text);
    }

    Ok(())
}
