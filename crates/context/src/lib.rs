//! Prompt-context assembly for clinical analysis.
//!
//! A request flows through four stages:
//!
//! 1. **Detect** the condition from the query text and specialty hint
//! 2. **Select** worked examples for that condition
//! 3. **Look up** guideline text, statically or by retrieval, and trim it
//!    to the character budget
//! 4. **Render** the context block, optionally wrapped in a full prompt
//!
//! [`ContextEngine`] wires all of this together from an `AppConfig`.

pub mod assembler;
pub mod budget;
pub mod detector;
pub mod engine;
pub mod format;
pub mod lookup;
pub mod prompt;

pub use assembler::{
    AssemblyOptions, ContextAssembler, ContextBlock, ContextMetadata, ContextRequest,
    SectionStats, ValidatedRequest,
};
pub use budget::{ELLIPSIS, estimate_tokens, truncate_chars};
pub use detector::{ConditionDetector, Detection, DetectionSource, specialty_condition};
pub use engine::{ContextEngine, RenderedPrompt};
pub use lookup::{GuidelineLookup, GuidelineSource, GuidelineText, RetrievalLookup, StaticLookup};
pub use prompt::{PromptParts, build_prompt, specialty_activation};
