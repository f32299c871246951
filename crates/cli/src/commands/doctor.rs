//! `vecta doctor`: Diagnose config, data files and retrieval readiness.

use std::path::Path;
use vecta_config::AppConfig;
use vecta_context::ContextEngine;
use vecta_knowledge::IndexStatus;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Vecta Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let config = if config_path.exists() {
        match AppConfig::load_with_env(config_path) {
            Ok(config) => {
                println!("  ✅ Config file valid ({})", config_path.display());
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                println!("\n  ⚠️  Fix the config before running further checks.");
                return Ok(());
            }
        }
    } else {
        println!("  ⚠️  No config file — using defaults (run `vecta init`)");
        issues += 1;
        AppConfig::default()
    };

    // Check data files
    for (label, path) in [
        ("Examples file", config.data.examples_path()),
        ("Guidelines file", config.data.guidelines_path()),
    ] {
        if path.exists() {
            println!("  ✅ {label} found: {}", path.display());
        } else {
            println!("  ❌ {label} missing: {}", path.display());
            issues += 1;
        }
    }

    // Load everything
    match ContextEngine::from_config(&config).await {
        Ok(engine) => {
            println!(
                "  ✅ Data loaded: {} example(s), {} guideline snippet(s)",
                engine.examples().len(),
                engine.guidelines().len()
            );
            let skipped = engine.examples().report().rejected.len()
                + engine.guidelines().report().rejected.len();
            if skipped > 0 {
                println!("  ⚠️  {skipped} entr(ies) skipped — run `vecta validate`");
                issues += 1;
            }

            match engine.retrieval_stats() {
                None => println!("  ✅ Retrieval disabled — static guidelines only"),
                Some(stats) if stats.status == IndexStatus::Ready => println!(
                    "  ✅ Retrieval index ready: {} chunk(s), {}",
                    stats.chunks,
                    stats.model_id.as_deref().unwrap_or("unknown model")
                ),
                Some(stats) => {
                    println!(
                        "  ⚠️  Retrieval index {}: {}",
                        stats.status,
                        stats.unavailable_reason.as_deref().unwrap_or("not initialized")
                    );
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Data failed to load: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
