//! Document rendering
//!
//! Rendered template markup is HTML. Turning it into a PDF is delegated to a
//! [`DocumentRenderer`], which keeps the conversion engine swappable: the
//! service uses [`WkHtmlToPdf`], tests use an in-process fake.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RenderError;

/// Converts HTML into a binary PDF document
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `html` into PDF bytes
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Renderer backed by the `wkhtmltopdf` command line tool
///
/// HTML is written to the child's stdin and the PDF is read from its stdout
/// (`wkhtmltopdf [args] - -`). The child is killed if it does not finish
/// within the configured timeout.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl WkHtmlToPdf {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a renderer running `program` with `--quiet`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["--quiet".to_string()],
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Replace the arguments passed before the stdin/stdout markers
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(["-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::InvalidOutput("renderer stdin unavailable".into()))?;
        let input = html.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;

        // The child may legitimately close stdin early; its exit status decides.
        match writer.await {
            Ok(Err(e)) => debug!(error = %e, "Renderer closed stdin before all input was written"),
            Err(e) => warn!(error = %e, "Renderer stdin writer task failed"),
            Ok(Ok(())) => {}
        }

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !output.stdout.starts_with(b"%PDF") {
            return Err(RenderError::InvalidOutput(format!(
                "expected PDF header, got {} bytes without one",
                output.stdout.len()
            )));
        }

        Ok(output.stdout)
    }
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

#[async_trait]
impl DocumentRenderer for WkHtmlToPdf {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        debug!(program = %self.program, html_len = html.len(), "Rendering PDF");

        tokio::time::timeout(self.timeout, self.run(html))
            .await
            .map_err(|_| RenderError::Timeout {
                timeout: self.timeout,
            })?
    }

    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }
}
