//! `vecta retrieve`: Rank guideline snippets by similarity to a query.

use std::path::Path;
use vecta_core::ConditionTag;

use super::{load_config, load_engine};

pub async fn run(
    config_path: &Path,
    query: &str,
    k: Option<usize>,
    condition: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    // Retrieval is opt-in for assembly, but this command always wants it.
    config.retrieval.enabled = true;

    let condition = condition.map(str::parse::<ConditionTag>).transpose()?;
    let engine = load_engine(&config).await?;

    println!("🔍 Retrieving guidelines for: \"{query}\"");
    if let Some(stats) = engine.retrieval_stats() {
        println!(
            "   index: {} · {} chunk(s) · {}",
            stats.status,
            stats.chunks,
            stats.model_id.as_deref().unwrap_or("no embedder")
        );
    }
    println!();

    let results = engine.retrieve(query, k, condition).await?;
    if results.is_empty() {
        println!("   No snippets scored above the threshold.");
    }
    for (i, r) in results.iter().enumerate() {
        println!(
            "  {:>2}. [score: {:.3}] {} / {} ({})",
            i + 1,
            r.score,
            r.snippet.condition,
            r.snippet.topic,
            r.snippet.source
        );
        let preview: String = r.snippet.content.chars().take(100).collect();
        println!("      {}", preview.replace('\n', " "));
    }

    Ok(())
}
