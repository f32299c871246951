//! Final prompt rendering in the Llama 3 chat template.
//!
//! The system turn carries the format instruction, the analysis-type
//! template (with an optional specialty activation), the reasoning
//! activation and the assembled context block. The user turn carries the
//! request and the medical data.

use vecta_core::AnalysisType;

const IDENTITY: &str = "You are a specialized clinical analysis model with comprehensive medical training. Your knowledge base includes:

• Advanced pathophysiology and disease mechanisms
• Clinical decision-making frameworks and diagnostic reasoning
• Pharmacological principles and drug interaction analysis
• Medical guidelines from major clinical organizations
• Evidence-based medicine and research methodologies

Approach this task with the clinical reasoning of an experienced physician.";

const REASONING_ACTIVATION: &str = "CLINICAL REASONING:
• Apply clinical correlation patterns to the findings
• Use diagnostic criteria and clinical guidelines
• Integrate pharmacological reasoning and drug knowledge
• Consider epidemiological patterns and risk factors

Think as an experienced clinician would approach this case.";

const DATA_INSTRUCTIONS: &str = "Apply your medical training to analyze this clinical information and follow the formatting instructions provided above.";

/// Specialty name → activation block.
pub const SPECIALTY_ACTIVATIONS: &[(&str, &str)] = &[
    (
        "neurology",
        "NEUROLOGICAL ANALYSIS:
- Anatomical localization from the neurological examination
- Seizure classification using ILAE criteria
- Cognitive assessment and neuropsychology
- Motor function and movement disorder analysis
- Neuropharmacology and medication optimization",
    ),
    (
        "cardiology",
        "CARDIAC ANALYSIS:
- Risk stratification with Framingham and ASCVD scores
- ECG interpretation and cardiac electrophysiology
- Hemodynamic assessment
- Heart failure evaluation per ACC/AHA guidelines
- Cardiac pharmacology review",
    ),
    (
        "psychiatry",
        "PSYCHIATRIC ANALYSIS:
- DSM-5 criteria application
- Suicide and violence risk assessment
- Psychopharmacology and medication management
- Therapy modality considerations
- Substance use evaluation",
    ),
    (
        "emergency",
        "EMERGENCY ANALYSIS:
- Triage algorithms and acuity assignment
- Acute care and resuscitation protocols
- Trauma assessment
- Toxicology evaluation
- Disposition planning",
    ),
    (
        "internal_medicine",
        "INTERNAL MEDICINE ANALYSIS:
- Chronic disease management
- Multi-morbidity patterns
- Preventive care and screening
- Medication reconciliation and polypharmacy
- Care coordination",
    ),
];

/// Activation block for a specialty, if one is defined.
pub fn specialty_activation(specialty: &str) -> Option<&'static str> {
    let key = specialty.trim().to_lowercase().replace([' ', '-'], "_");
    SPECIALTY_ACTIVATIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
}

fn protocol(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Classification => "You are performing medical classification analysis.

CLINICAL CLASSIFICATION PROTOCOL:
1. Identify the pathophysiological mechanism
2. Apply diagnostic criteria from clinical guidelines
3. Provide step-by-step clinical reasoning
4. Include confidence levels based on evidence strength",
        AnalysisType::Diagnosis => "You are providing diagnostic support.

DIAGNOSTIC ANALYSIS PROTOCOL:
1. Evaluate the presentation systematically
2. Build a differential diagnosis
3. Provide confidence-rated diagnostic possibilities
4. Recommend further evaluation where needed",
        AnalysisType::Extraction => "You are extracting medical information.

MEDICAL INFORMATION EXTRACTION:
1. Identify conditions, medications and findings with precise terminology
2. Interpret each item in its clinical context
3. Structure the extracted information
4. Note missing or ambiguous information",
        AnalysisType::Summary => "You are creating a clinical summary.

CLINICAL SUMMARIZATION PROTOCOL:
1. Prioritize critical information
2. Identify correlations between findings
3. Structure the summary for clinical communication
4. Include relevant clinical context",
    }
}

/// Analysis-type system template, with the specialty activation when known.
pub fn system_template(analysis_type: AnalysisType, specialty: Option<&str>) -> String {
    let activation = specialty
        .and_then(specialty_activation)
        .map(|a| format!("\n\n{a}"))
        .unwrap_or_default();
    format!("{IDENTITY}{activation}\n\n{}", protocol(analysis_type))
}

/// The mandatory closing-bullets instruction.
pub fn format_instruction(analysis_type: AnalysisType) -> String {
    format!(
        "IMPORTANT: Provide a comprehensive medical analysis, then end with exactly these 4 bullet points:

- {}: [brief clinical reasoning, max 25 words]
- Clinical_Confidence: [High/Medium/Low based on evidence, max 25 words]
- Evidence: [key evidence from the text, max 25 words]
- Medication_Analysis: [medical reasoning for recommendations, max 25 words]

You may provide detailed analysis first, but MUST end with exactly these 4 bullet points.
",
        analysis_type.finding_label()
    )
}

/// Inputs for [`build_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    pub analysis_type: AnalysisType,
    pub specialty: Option<&'a str>,
    /// Assembled context block; empty to omit.
    pub context: &'a str,
    pub user_prompt: &'a str,
    pub medical_data: &'a str,
}

/// Render the full chat-template prompt, ending at the assistant header.
pub fn build_prompt(parts: &PromptParts<'_>) -> String {
    let context_section = if parts.context.trim().is_empty() {
        String::new()
    } else {
        format!("\n\n{}\n", parts.context)
    };

    format!(
        "<|begin_of_text|><|start_header_id|>system<|end_header_id|>

{format}{system}

{REASONING_ACTIVATION}{context_section}

{DATA_INSTRUCTIONS}

<|eot_id|><|start_header_id|>user<|end_header_id|>

Please apply your clinical training to this analysis:

ANALYSIS REQUEST: {request}

MEDICAL DATA FOR ANALYSIS:
{data}

Use your medical knowledge and clinical reasoning to provide a thorough, evidence-based analysis structured for clinical utility.

<|eot_id|><|start_header_id|>assistant<|end_header_id|>

",
        format = format_instruction(parts.analysis_type),
        system = system_template(parts.analysis_type, parts.specialty),
        request = parts.user_prompt,
        data = parts.medical_data,
    )
}
