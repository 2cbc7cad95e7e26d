//! Terminal styling for command output.
//!
//! Every command writes through [`StyledOutput`], which tags text with a
//! [`Role`] and lets `termcolor` decide whether escapes are emitted.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Pick the color mode for this run.
///
/// A set `NO_COLOR` wins over `--color`; anything other than `always` or
/// `never` falls back to terminal detection.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// What a piece of output means, independent of how it is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Success,
    Failure,
    Highlight,
    Secondary,
    Heading,
    Plain,
}

impl Role {
    fn spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Role::Success => spec.set_fg(Some(Color::Green)).set_bold(true),
            Role::Failure => spec.set_fg(Some(Color::Red)).set_bold(true),
            Role::Highlight => spec.set_fg(Some(Color::Cyan)),
            Role::Secondary => spec.set_fg(Some(Color::White)),
            Role::Heading => spec.set_bold(true),
            Role::Plain => &mut spec,
        };
        spec
    }
}

/// Stdout writer for command results.
///
/// Write errors are ignored: a closed pipe must not turn a finished
/// command into a failure.
pub struct StyledOutput {
    stdout: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    fn write(&mut self, role: Role, text: &str) {
        if role == Role::Plain {
            let _ = self.stdout.write_all(text.as_bytes());
            return;
        }
        let _ = self.stdout.set_color(&role.spec());
        let _ = self.stdout.write_all(text.as_bytes());
        let _ = self.stdout.reset();
    }

    /// Verdicts that went through, such as `permitted`
    pub fn success(&mut self, text: &str) {
        self.write(Role::Success, text);
    }

    /// Verdicts that did not, such as `denied`
    pub fn error(&mut self, text: &str) {
        self.write(Role::Failure, text);
    }

    pub fn info(&mut self, text: &str) {
        self.write(Role::Highlight, text);
    }

    /// Keywords and separators that frame the names around them
    pub fn dim(&mut self, text: &str) {
        self.write(Role::Secondary, text);
    }

    pub fn bold(&mut self, text: &str) {
        self.write(Role::Heading, text);
    }

    pub fn plain(&mut self, text: &str) {
        self.write(Role::Plain, text);
    }

    pub fn newline(&mut self) {
        let _ = self.stdout.write_all(b"\n");
    }

    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}
