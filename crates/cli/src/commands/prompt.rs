//! `vecta prompt`: Render the full model prompt for a query.

use std::path::Path;

use super::{load_config, load_engine};
use crate::RequestArgs;

pub async fn run(
    config_path: &Path,
    args: &RequestArgs,
    task: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let engine = load_engine(&config).await?;

    let rendered = engine.build_prompt(&args.to_request(), task).await?;
    eprintln!(
        "🧭 Condition: {} · ~{} prompt tokens",
        rendered.context.condition,
        vecta_context::estimate_tokens(&rendered.prompt)
    );
    print!("{}", rendered.prompt);

    Ok(())
}
