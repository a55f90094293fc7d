use owo_colors::Style;
use std::sync::OnceLock;
use crate::project::Technology;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub dim: Style,
    pub solar: Style,
    pub wind: Style,
    pub hydro: Style,
}

impl Theme {
    /// Colors only on an interactive terminal, and never when `NO_COLOR` is set
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some() || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            dim: Style::new().white().dimmed(),
            solar: Style::new().bright_yellow(),
            wind: Style::new().bright_cyan(),
            hydro: Style::new().bright_blue(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            dim: Style::new(),
            solar: Style::new(),
            wind: Style::new(),
            hydro: Style::new(),
        }
    }

    pub fn technology(&self, technology: Technology) -> Style {
        match technology {
            Technology::Solar => self.solar.clone(),
            Technology::Wind => self.wind.clone(),
            Technology::Hydro => self.hydro.clone(),
            Technology::Other => self.dim.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
