//! `vecta detect`: Show which condition a text maps to.

use vecta_context::{ConditionDetector, DetectionSource};

pub async fn run(text: &str, specialty: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let detection = ConditionDetector::new().explain(text, specialty);

    println!("🧭 {}", detection.condition);
    match &detection.source {
        DetectionSource::Keyword { trigger } => println!("   matched keyword: \"{trigger}\""),
        DetectionSource::Specialty { hint } => println!("   from specialty hint: \"{hint}\""),
        DetectionSource::None => println!("   no keyword or specialty matched"),
    }

    Ok(())
}
