//! `vecta init`: Write a default config file.

use std::path::Path;
use vecta_config::AppConfig;

pub async fn run(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Vecta — Setup");
    println!("================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
        return Ok(());
    }

    std::fs::write(config_path, AppConfig::default_toml())?;
    println!("✅ Wrote config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Point [data].dir at your examples and guidelines");
    println!("   2. Run: vecta doctor");
    println!("   3. Run: vecta context \"<clinical text>\"\n");

    Ok(())
}
