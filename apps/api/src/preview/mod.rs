//! LaTeX preview rendering, delegated to an external converter.
//!
//! Rendering correctness is the converter's concern; this module only
//! invokes it and reports whether it exists. The probe runs lazily on the
//! first render, never at startup, so a missing converter costs nothing
//! until the user actually opens the preview.

pub mod handlers;

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RenderError {
    /// The converter is not installed. Carries an installation hint for
    /// the user instead of failing the whole flow.
    #[error("preview renderer unavailable: {hint}")]
    Unavailable { hint: String },

    #[error("preview renderer failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_to_html(&self, latex: &str) -> Result<String, RenderError>;
}

/// Renders by piping LaTeX through an external command that writes HTML to
/// stdout (`pandoc -f latex -t html5` by default).
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    hint: String,
    available: OnceCell<bool>,
}

impl CommandRenderer {
    pub fn new(program: &str, args: Vec<String>, hint: &str) -> Self {
        Self {
            program: program.to_string(),
            args,
            hint: hint.to_string(),
            available: OnceCell::new(),
        }
    }

    /// Parses a shell-style command line (`pandoc -f latex -t html5`).
    /// Returns `None` for an empty command.
    pub fn from_command_line(command_line: &str, hint: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        let args = parts.map(str::to_string).collect();
        Some(Self::new(program, args, hint))
    }

    /// One-time probe: can the program be spawned at all?
    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let probe = Command::new(&self.program)
                    .arg("--version")
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await;
                match probe {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("preview renderer `{}` unavailable: {e}", self.program);
                        false
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl PreviewRenderer for CommandRenderer {
    async fn render_to_html(&self, latex: &str) -> Result<String, RenderError> {
        if !self.is_available().await {
            return Err(RenderError::Unavailable {
                hint: self.hint.clone(),
            });
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::Failed(format!("failed to spawn renderer: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(latex.as_bytes())
                .await
                .map_err(|e| RenderError::Failed(format!("failed to write to renderer: {e}")))?;
            // Close stdin so the converter sees EOF.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RenderError::Failed(format!("renderer did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(stderr.trim().to_string()));
        }

        debug!("rendered {} bytes of HTML", output.stdout.len());
        String::from_utf8(output.stdout)
            .map_err(|_| RenderError::Failed("renderer produced non-UTF-8 output".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable_with_hint() {
        let renderer = CommandRenderer::new(
            "definitely-not-a-real-renderer-binary",
            vec![],
            "install pandoc",
        );
        let err = renderer.render_to_html("\\LaTeX").await.unwrap_err();
        match err {
            RenderError::Unavailable { hint } => assert_eq!(hint, "install pandoc"),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_availability_probe_is_cached() {
        let renderer =
            CommandRenderer::new("definitely-not-a-real-renderer-binary", vec![], "hint");
        assert!(!renderer.is_available().await);
        // Second call answers from the cached probe.
        assert!(!renderer.is_available().await);
    }

    #[tokio::test]
    async fn test_render_pipes_through_command() {
        // `cat` stands in for a converter: output mirrors input.
        let renderer = CommandRenderer::new("cat", vec![], "unused");
        let html = renderer.render_to_html("\\section{Hi}").await.unwrap();
        assert_eq!(html, "\\section{Hi}");
    }

    #[tokio::test]
    async fn test_failing_command_surfaces_stderr() {
        // Consumes stdin, then fails with a message on stderr.
        let renderer = CommandRenderer::new(
            "sh",
            vec!["-c".into(), "cat >/dev/null; echo boom >&2; exit 1".into()],
            "unused",
        );
        let err = renderer.render_to_html("ignored").await.unwrap_err();
        match err {
            RenderError::Failed(msg) => assert_eq!(msg, "boom"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_from_command_line_parses_args() {
        let renderer = CommandRenderer::from_command_line("pandoc -f latex -t html5", "h").unwrap();
        assert_eq!(renderer.program, "pandoc");
        assert_eq!(renderer.args, vec!["-f", "latex", "-t", "html5"]);
    }

    #[test]
    fn test_from_command_line_rejects_empty() {
        assert!(CommandRenderer::from_command_line("   ", "h").is_none());
    }
}
