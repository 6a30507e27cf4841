use console::Style;

/// Terminal styling with graceful fallback when colors are unsupported
pub struct Terminal {
    pub supports_color: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            supports_color: console::colors_enabled(),
        }
    }

    /// Style for a pass/fail outcome
    pub fn outcome_style(&self, passed: bool) -> Style {
        let style = Style::new();
        if !self.supports_color {
            return style;
        }
        if passed { style.green() } else { style.red().bold() }
    }

    pub fn heading_style(&self) -> Style {
        let style = Style::new();
        if !self.supports_color {
            return style;
        }
        style.cyan().bold()
    }

    pub fn heading(&self, title: &str) -> String {
        self.heading_style().apply_to(title).to_string()
    }

    pub fn outcome(&self, passed: bool, line: &str) -> String {
        self.outcome_style(passed).apply_to(line).to_string()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}
