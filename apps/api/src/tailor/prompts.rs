// Prompt constants for the tailoring pipeline.
// Each module that needs LLM calls defines its own prompts.rs alongside it.

/// Prompt template for tailoring a LaTeX resume to a job description.
/// Placeholders: `{resume}`, `{job_description}`.
pub const TAILOR_PROMPT_TEMPLATE: &str = "\
You are an expert resume writer. Tailor the LaTeX resume below to the \
job description that follows it.

Rules:
- Keep the LaTeX preamble, document structure, and formatting commands unchanged.
- Reorder and reword bullet points to emphasize experience relevant to the job.
- Weave the job description's key terms into existing bullets where truthful.
- Do NOT invent employers, titles, dates, or accomplishments.
- Return ONLY the complete LaTeX document, with no commentary and no code fences.

RESUME:
{resume}

JOB DESCRIPTION:
{job_description}";
