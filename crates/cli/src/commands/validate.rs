//! `vecta validate`: Check every entry of the data files.
//!
//! Both files are read leniently so that every bad entry is listed, then
//! the command fails if any entry was rejected, as a strict load would.

use std::path::Path;
use vecta_core::{LoadPolicy, LoadReport};
use vecta_knowledge::{ExampleStore, GuidelineStore};

use super::load_config;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    println!("🔎 Validating data files");
    println!("========================\n");

    let examples_path = config.data.examples_path();
    let examples = ExampleStore::load(&examples_path, LoadPolicy::SkipInvalid)?;
    print_report("Examples", &examples_path, examples.report());

    let guidelines_path = config.data.guidelines_path();
    let guidelines = GuidelineStore::load(&guidelines_path, LoadPolicy::SkipInvalid)?;
    print_report("Guidelines", &guidelines_path, guidelines.report());

    let rejected = examples.report().rejected.len() + guidelines.report().rejected.len();
    println!();
    if rejected == 0 {
        println!("  🎉 All entries valid!");
        Ok(())
    } else {
        Err(format!("{rejected} invalid entr(ies) found").into())
    }
}

fn print_report(label: &str, path: &Path, report: &LoadReport) {
    if report.is_clean() {
        println!("  ✅ {label}: {} entries ({})", report.accepted, path.display());
        return;
    }
    println!(
        "  ❌ {label}: {} accepted, {} rejected ({})",
        report.accepted,
        report.rejected.len(),
        path.display()
    );
    for entry in &report.rejected {
        println!("     - {}: {}", entry.entry, entry.reason);
    }
}
