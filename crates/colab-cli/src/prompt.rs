use std::io::{self, BufRead, Write};

/// Line-oriented questions for the installer.
///
/// End of input answers every question with its default, so the installer can
/// run unattended once flags supply the required values.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask for a line of text. A blank answer takes `default` (or is empty).
    pub fn ask(&mut self, message: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(d) => write!(self.output, "{message} [{d}]: ")?,
            None => write!(self.output, "{message}: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            writeln!(self.output)?;
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer.to_string())
    }

    pub fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.ask(&format!("{message} [{hint}]"), None)?;
        if answer.is_empty() {
            return Ok(default);
        }
        Ok(matches!(
            answer.to_lowercase().as_str(),
            "y" | "yes" | "true" | "1"
        ))
    }

    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompter(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn blank_answer_takes_default() {
        let mut p = prompter("\n");
        assert_eq!(p.ask("Bot name", Some("BOT1")).unwrap(), "BOT1");
        assert_eq!(String::from_utf8(p.output).unwrap(), "Bot name [BOT1]: ");
    }

    #[test]
    fn answers_are_trimmed() {
        let mut p = prompter("  black  \n");
        assert_eq!(p.ask("Bot name", Some("BOT1")).unwrap(), "black");
    }

    #[test]
    fn end_of_input_takes_defaults() {
        let mut p = prompter("");
        assert_eq!(p.ask("Install location", Some("/tmp/x")).unwrap(), "/tmp/x");
        assert_eq!(p.ask("API key", None).unwrap(), "");
        assert!(!p.confirm("Add another bot?", false).unwrap());
    }

    #[test]
    fn confirm_parses_yes() {
        let mut p = prompter("yes\nn\n");
        assert!(p.confirm("Add another bot?", false).unwrap());
        assert!(!p.confirm("Add another bot?", true).unwrap());
    }
}
