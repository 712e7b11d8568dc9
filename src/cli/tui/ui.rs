use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cli::i18n::texts;
use crate::device_settings::{Control, SettingsLayout, StatusKind};

use super::{
    app::{App, Overlay, ToastKind},
    theme::{theme, Theme},
};

fn inactive_chip_style(theme: &Theme) -> Style {
    if theme.no_color {
        Style::default()
    } else {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    }
}

fn focused_style(theme: &Theme) -> Style {
    if theme.no_color {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    }
}

fn disabled_style(theme: &Theme) -> Style {
    if theme.no_color {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(theme.dim)
    }
}

fn truncate_to_display_width(text: &str, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    if width == 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn key_bar_line(theme: &Theme, items: &[(&str, String)]) -> Line<'static> {
    if theme.no_color {
        let mut parts = Vec::new();
        for (k, v) in items {
            parts.push(format!("{k}={v}"));
        }
        return Line::raw(parts.join("  "));
    }

    let base = inactive_chip_style(theme);
    let key = base.add_modifier(Modifier::BOLD);

    let mut spans: Vec<Span<'static>> = vec![Span::styled(" ", base)];
    for (idx, (k, v)) in items.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", base));
        }
        spans.push(Span::styled((*k).to_string(), key));
        spans.push(Span::styled(" ", base));
        spans.push(Span::styled(v.clone(), base));
    }
    spans.push(Span::styled(" ", base));
    Line::from(spans)
}

pub fn render(frame: &mut Frame<'_>, app: &App) {
    render_with_theme(frame, app, &theme());
}

pub fn render_with_theme(frame: &mut Frame<'_>, app: &App, theme: &Theme) {
    let layout = app.view.layout(app.catalog);

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, &layout, root[0], theme);
    render_status(frame, &layout, root[1], theme);
    render_controls(frame, app, &layout, root[2], theme);
    render_footer(frame, &layout, root[4], theme);
    render_key_bar(frame, app, root[5], theme);

    render_overlay(frame, app, theme);
}

fn render_header(frame: &mut Frame<'_>, layout: &SettingsLayout, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(theme.dim));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let title = Line::from(Span::styled(
        layout.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), inner);
}

fn render_status(frame: &mut Frame<'_>, layout: &SettingsLayout, area: Rect, theme: &Theme) {
    let Some(status) = &layout.status else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => theme.dim,
        StatusKind::Warning => theme.warn,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(status.text.clone(), Style::default().fg(color)))
            .alignment(Alignment::Center),
        area,
    );
}

fn render_controls(
    frame: &mut Frame<'_>,
    app: &App,
    layout: &SettingsLayout,
    area: Rect,
    theme: &Theme,
) {
    let count = layout.controls.len().max(1) as u32;
    let constraints = layout
        .controls
        .iter()
        .map(|_| Constraint::Ratio(1, count))
        .collect::<Vec<_>>();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (idx, (control, cell)) in layout.controls.iter().zip(cells.iter()).enumerate() {
        render_control(frame, app, control, *cell, idx == app.focus, theme);
    }
}

fn render_control(
    frame: &mut Frame<'_>,
    app: &App,
    control: &Control,
    area: Rect,
    focused: bool,
    theme: &Theme,
) {
    let disabled = control.is_disabled();
    let style = match (focused, disabled) {
        (true, _) => focused_style(theme),
        (false, true) => disabled_style(theme),
        (false, false) => Style::default(),
    };
    let border_type = if focused {
        BorderType::Thick
    } else {
        BorderType::Rounded
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut label_style = if disabled {
        disabled_style(theme)
    } else {
        Style::default()
    };
    if matches!(control, Control::ManageBackups { .. }) && !disabled {
        label_style = label_style.add_modifier(Modifier::BOLD);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(control.label(app.catalog), label_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_footer(frame: &mut Frame<'_>, layout: &SettingsLayout, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme.dim));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(footer) = &layout.footer {
        frame.render_widget(
            Paragraph::new(truncate_to_display_width(footer, inner.width))
                .alignment(Alignment::Center),
            inner,
        );
    }
}

fn render_key_bar(frame: &mut Frame<'_>, app: &App, area: Rect, theme: &Theme) {
    let items = [
        ("←→", texts::key_move(app.catalog)),
        ("Enter", texts::key_activate(app.catalog)),
        ("?", texts::key_help(app.catalog)),
        ("q", texts::sidebar_leave(app.catalog)),
    ];
    let mut spans = key_bar_line(theme, &items).spans;

    if let Some(toast) = &app.toast {
        let color = match toast.kind {
            ToastKind::Info => theme.accent,
            ToastKind::Warning => theme.warn,
            ToastKind::Error => theme.err,
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(toast.message.clone(), Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_overlay(frame: &mut Frame<'_>, app: &App, theme: &Theme) {
    match app.overlay {
        Overlay::None => {}
        Overlay::Help => {
            let area = centered_rect(60, 50, frame.area());
            frame.render_widget(Clear, area);

            let outer = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Plain)
                .border_style(Style::default().fg(theme.dim))
                .title(texts::help_title(app.catalog));
            let inner = outer.inner(area);
            frame.render_widget(outer, area);

            let lines = texts::help_body(app.catalog)
                .lines()
                .map(|s| Line::raw(s.to_string()))
                .collect::<Vec<_>>();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
