use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::Mutex;
use tracing::warn;

use crate::services::file_list::Prompt;

/// Line-oriented terminal prompt.
///
/// Owns the input line reader so that an interactive session and its
/// confirmations read from the same stream.
pub struct ConsolePrompt<R, W> {
    lines: Mutex<Lines<R>>,
    out: Mutex<W>,
    assume_yes: bool,
}

impl ConsolePrompt<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout(), assume_yes)
    }
}

impl<R, W> ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, out: W, assume_yes: bool) -> Self {
        Self { lines: Mutex::new(input.lines()), out: Mutex::new(out), assume_yes }
    }

    /// Next input line, `None` at end of input. Cancel safe.
    pub async fn next_line(&self) -> Option<String> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    pub async fn print(&self, text: &str) {
        let mut out = self.out.lock().await;
        if out.write_all(text.as_bytes()).await.is_ok() {
            let _ = out.flush().await;
        }
    }
}

#[async_trait]
impl<R, W> Prompt for ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        self.print(&format!("{} [y/N] ", message)).await;
        match self.next_line().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }

    async fn alert(&self, message: &str) {
        self.print(&format!("!! {}\n", message)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(input: &'static [u8], assume_yes: bool) -> ConsolePrompt<&'static [u8], Vec<u8>> {
        ConsolePrompt::new(input, Vec::new(), assume_yes)
    }

    #[tokio::test]
    async fn yes_answers_confirm() {
        assert!(prompt(b"y\n", false).confirm("Delete?").await);
        assert!(prompt(b" YES \n", false).confirm("Delete?").await);
    }

    #[tokio::test]
    async fn anything_else_declines() {
        assert!(!prompt(b"n\n", false).confirm("Delete?").await);
        assert!(!prompt(b"\n", false).confirm("Delete?").await);
        assert!(!prompt(b"", false).confirm("Delete?").await);
    }

    #[tokio::test]
    async fn assume_yes_skips_the_question() {
        let p = prompt(b"", true);
        assert!(p.confirm("Delete?").await);
        assert!(p.out.lock().await.is_empty());
    }

    #[tokio::test]
    async fn question_is_written_out() {
        let p = prompt(b"n\nnext\n", false);
        p.confirm("Delete?").await;
        assert_eq!(p.out.lock().await.as_slice(), b"Delete? [y/N] ");
        assert_eq!(p.next_line().await.as_deref(), Some("next"));
    }
}
