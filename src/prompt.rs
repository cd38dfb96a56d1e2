//! Asking the user for text or a yes/no answer outside the canvas.

use std::io::{self, BufRead, Write};

pub trait Prompter {
    /// `None` when the user gives up (EOF or empty answer with no default).
    fn prompt_text(&mut self, message: &str, default: Option<&str>) -> Option<String>;
    fn confirm(&mut self, message: &str) -> bool;
}

/// Line-based prompts over any reader/writer pair; stdin/stdout by default.
pub struct StdinPrompter<R, W> {
    input: R,
    output: W,
}

impl StdinPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn new() -> Self {
        Self::with_io(io::stdin().lock(), io::stdout())
    }
}

impl Default for StdinPrompter<io::StdinLock<'static>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdinPrompter<R, W> {
    pub fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{prompt}").ok()?;
        self.output.flush().ok()?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Prompter for StdinPrompter<R, W> {
    fn prompt_text(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let prompt = match default {
            Some(d) => format!("  {message} [{d}]: "),
            None => format!("  {message}: "),
        };
        let answer = self.ask(&prompt)?;
        if answer.is_empty() {
            default.map(str::to_string)
        } else {
            Some(answer)
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.ask(&format!("  {message} [y/n] "))
            .map(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompter(input: &str) -> StdinPrompter<&[u8], Vec<u8>> {
        StdinPrompter::with_io(input.as_bytes(), Vec::new())
    }

    #[test]
    fn text_answer_is_trimmed() {
        let mut p = prompter("  new idea \n");
        assert_eq!(p.prompt_text("Content", None), Some("new idea".to_string()));
        assert_eq!(String::from_utf8(p.output).unwrap(), "  Content: ");
    }

    #[test]
    fn empty_answer_uses_default() {
        let mut p = prompter("\n");
        assert_eq!(p.prompt_text("Content", Some("old")), Some("old".to_string()));
        let mut p = prompter("\n");
        assert_eq!(p.prompt_text("Content", None), None);
    }

    #[test]
    fn eof_is_a_refusal() {
        assert_eq!(prompter("").prompt_text("Content", Some("x")), None);
        assert!(!prompter("").confirm("Sure?"));
    }

    #[test]
    fn confirm_accepts_only_yes() {
        assert!(prompter("y\n").confirm("Sure?"));
        assert!(prompter("YES\n").confirm("Sure?"));
        assert!(!prompter("n\n").confirm("Sure?"));
        assert!(!prompter("whatever\n").confirm("Sure?"));
    }
}
