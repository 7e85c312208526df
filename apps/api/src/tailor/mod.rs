//! Tailoring pipeline: prompt construction, the LLM call, and response
//! cleanup. The output is bare LaTeX ready for preview or download.

pub mod handlers;
pub mod prompts;

use crate::errors::AppError;
use crate::llm_client::{strip_code_fences, LlmClient};

use prompts::TAILOR_PROMPT_TEMPLATE;

pub struct TailorOutcome {
    /// Model the pipeline settled on.
    pub model: String,
    /// Cleaned LaTeX, fences stripped.
    pub tailored_tex: String,
}

/// Runs the full pipeline: resolve model, build prompt, generate, clean.
pub async fn tailor_resume(
    llm: &LlmClient,
    resume_tex: &str,
    jd_text: &str,
) -> Result<TailorOutcome, AppError> {
    let model = llm.resolve_model().await;
    let prompt = TAILOR_PROMPT_TEMPLATE
        .replace("{resume}", resume_tex)
        .replace("{job_description}", jd_text);

    let raw = llm.generate(&model, &prompt).await?;
    Ok(TailorOutcome {
        model,
        tailored_tex: strip_code_fences(&raw).to_string(),
    })
}
