//! Terminal styles for status output on stderr.

use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// Node ids and world ids
    pub id: Style,
    /// Why a node could not be synthesized
    pub missing: Style,
}

impl Theme {
    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            dim: pick(Style::new().white().dimmed()),
            id: pick(Style::new().bright_black()),
            missing: pick(Style::new().yellow().italic()),
        }
    }

    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(should_color(no_color, console::Term::stderr().is_term()))
    }
}

/// Colors only on an interactive stderr, and never with `NO_COLOR` set
pub fn should_color(no_color: bool, stderr_is_term: bool) -> bool {
    stderr_is_term && !no_color
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
