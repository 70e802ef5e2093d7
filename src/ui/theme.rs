use crate::reference::RefStatus;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles, one per kind of thing the CLI prints.
/// Plain when stdout is not a terminal or colors are turned off.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub done: Style,
    pub failure: Style,
    pub caution: Style,
    pub label: Style,
    pub key: Style,
    pub path: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() && console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            done: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow(),
            label: Style::new().bright_black(),
            key: Style::new().blue().bold(),
            path: Style::new().white().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            done: Style::new(),
            failure: Style::new(),
            caution: Style::new(),
            label: Style::new(),
            key: Style::new(),
            path: Style::new(),
        }
    }

    /// Style of a reference in this state
    pub fn status(&self, status: RefStatus) -> Style {
        match status {
            RefStatus::Resolved => self.done.clone(),
            RefStatus::Pending => self.caution.clone(),
            RefStatus::Invalid => self.failure.clone(),
            RefStatus::Unset => self.label.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
