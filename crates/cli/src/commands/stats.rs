//! `vecta stats`: Summarize the loaded examples and guidelines.

use std::path::Path;
use vecta_core::ConditionTag;

use super::{load_config, load_engine};

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let engine = load_engine(&config).await?;

    let examples = engine.examples().statistics();
    let guidelines = engine.guidelines().statistics();

    println!("📊 Vecta Data");
    println!("=============");
    println!("  Examples:    {}", config.data.examples_path().display());
    println!("  Guidelines:  {}", config.data.guidelines_path().display());
    println!();
    println!("  {:<24} {:>8} {:>10}", "condition", "examples", "guidelines");
    for tag in ConditionTag::KNOWN {
        println!(
            "  {:<24} {:>8} {:>10}",
            tag.as_str(),
            examples.per_condition.get(&tag).copied().unwrap_or(0),
            guidelines.per_condition.get(&tag).copied().unwrap_or(0)
        );
    }
    println!("  {:<24} {:>8} {:>10}", "total", examples.total, guidelines.total);

    let skipped =
        engine.examples().report().rejected.len() + engine.guidelines().report().rejected.len();
    if skipped > 0 {
        println!("\n  ⚠️  {skipped} entr(ies) skipped at load — run `vecta validate` for details");
    }

    let defaults = engine.defaults();
    println!();
    println!(
        "  Defaults:    {} example(s), guidelines {}, budget {} chars, retrieval {}",
        defaults.num_examples,
        if defaults.include_guidelines { "on" } else { "off" },
        defaults.guideline_char_budget,
        if defaults.use_retrieval { "on" } else { "off" },
    );

    Ok(())
}
