use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub warn: Color,
    pub err: Color,
    pub dim: Color,
    pub no_color: bool,
}

pub fn theme() -> Theme {
    theme_with_no_color(std::env::var_os("NO_COLOR").is_some())
}

pub fn theme_with_no_color(no_color: bool) -> Theme {
    if no_color {
        return Theme {
            accent: Color::Reset,
            warn: Color::Reset,
            err: Color::Reset,
            dim: Color::Reset,
            no_color: true,
        };
    }

    Theme {
        accent: Color::Cyan,
        warn: Color::Yellow,
        err: Color::Red,
        dim: Color::DarkGray,
        no_color: false,
    }
}
