use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub statusbar_bg: Color,
    pub status_ok: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub gauge_unfilled: Color,
    pub sparkline_color: Color,
    /// Low, mid and high load.
    pub heat_colors: [Color; 3],
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            header_accent_bg: Color::Green,
            header_accent_fg: Color::Black,
            border: Color::DarkGray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            statusbar_bg: Color::DarkGray,
            status_ok: Color::Green,
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            gauge_unfilled: Color::DarkGray,
            sparkline_color: Color::Rgb(251, 146, 60),
            heat_colors: [
                Color::Rgb(16, 185, 129),
                Color::Rgb(249, 115, 22),
                Color::Rgb(239, 68, 68),
            ],
        }
    }

    pub fn mono() -> Self {
        Theme {
            header_accent_bg: Color::White,
            header_accent_fg: Color::Black,
            border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            statusbar_bg: Color::Black,
            status_ok: Color::White,
            pill_key_bg: Color::White,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::Gray,
            gauge_unfilled: Color::Black,
            sparkline_color: Color::White,
            heat_colors: [Color::Gray, Color::Gray, Color::White],
        }
    }

    /// Respects the `NO_COLOR` convention.
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            Self::mono()
        } else {
            Self::dark()
        }
    }

    pub fn heat(&self, percent: f64) -> Color {
        if percent >= 80.0 {
            self.heat_colors[2]
        } else if percent >= 50.0 {
            self.heat_colors[1]
        } else {
            self.heat_colors[0]
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
