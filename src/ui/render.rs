use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::browser::{format_time, Action, DetailPanel, MenuState, Overlay, StatusLine, View};

const TIME_WIDTH: usize = 19;
const SIZE_WIDTH: usize = 10;

/// Main render function. `hints` pairs a bound key with its label and is
/// shown when the status line is empty.
pub fn draw(f: &mut Frame, view: &View, hints: &[(String, &str)]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Breadcrumb
            Constraint::Min(0),    // Listing
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    render_breadcrumb(f, chunks[0], view.breadcrumb);
    render_listing(f, chunks[1], view);
    render_status(f, chunks[2], view.status, hints);

    match view.overlay {
        Overlay::None => {}
        Overlay::Menu(menu) => render_menu(f, chunks[1], menu),
        Overlay::Detail(panel) => render_detail(f, chunks[1], panel),
    }
}

fn render_breadcrumb(f: &mut Frame, area: Rect, breadcrumb: &str) {
    let p = Paragraph::new(breadcrumb.to_string()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(p, area);
}

fn render_listing(f: &mut Frame, area: Rect, view: &View) {
    if view.entries.is_empty() {
        let empty = Paragraph::new("(empty)")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    // Borders plus the gaps between columns
    let name_width = (area.width as usize).saturating_sub(2 + TIME_WIDTH + SIZE_WIDTH + 2);

    let items: Vec<ListItem> = view
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let is_selected = i == view.cursor;
            let base = if is_selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            let name_style = if entry.is_leaf() {
                base
            } else {
                base.add_modifier(Modifier::BOLD)
            };
            let size = entry.size().map(format_size).unwrap_or_default();

            let line = Line::from(vec![
                Span::styled(fit(entry.display_name(view.prefix), name_width), name_style),
                Span::styled(" ", base),
                Span::styled(
                    format!("{:<w$}", format_time(entry.modified_at()), w = TIME_WIDTH),
                    base.fg(if is_selected { Color::Black } else { Color::DarkGray }),
                ),
                Span::styled(" ", base),
                Span::styled(format!("{size:>w$}", w = SIZE_WIDTH), base),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(format!(
        "({}/{})",
        view.cursor + 1,
        view.entries.len()
    )));

    let mut state = ListState::default().with_selected(Some(view.cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_status(f: &mut Frame, area: Rect, status: &StatusLine, hints: &[(String, &str)]) {
    let line = if status.is_empty() {
        let mut spans = Vec::new();
        for (key, label) in hints {
            spans.push(Span::styled(key.clone(), Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(format!(":{label}  ")));
        }
        Line::from(spans)
    } else if status.is_error() {
        Line::from(Span::styled(
            status.text().to_string(),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from(status.text().to_string())
    };

    f.render_widget(Paragraph::new(line), area);
}

/// Menu occupies the lower half of the listing.
fn render_menu(f: &mut Frame, area: Rect, menu: &MenuState) {
    let top = area.height / 2;
    let popup = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };

    let items: Vec<ListItem> = Action::ALL
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let style = if i == menu.selected() {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<10}", action.label()), style.add_modifier(Modifier::BOLD)),
                Span::styled(action.description(), style),
            ]))
        })
        .collect();

    let title = format!("Menu • {}", menu.target().file_name());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    let mut state = ListState::default().with_selected(Some(menu.selected()));
    f.render_widget(Clear, popup);
    f.render_stateful_widget(list, popup, &mut state);
}

/// Detail panel occupies the right half of the listing.
fn render_detail(f: &mut Frame, area: Rect, panel: &DetailPanel) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let popup = cols[1];

    let label_width = panel
        .rows()
        .iter()
        .map(|(k, _)| k.width())
        .max()
        .unwrap_or(0);

    let lines: Vec<Line> = panel
        .rows()
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(
                    format!("{k:<label_width$}"),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw("  "),
                Span::raw(v.clone()),
            ])
        })
        .collect();

    let p = Paragraph::new(lines)
        .scroll((panel.scroll_offset().min(u16::MAX as usize) as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Detail • {}", panel.title())),
        );

    f.render_widget(Clear, popup);
    f.render_widget(p, popup);
}

/// Truncate or pad `s` to exactly `width` terminal columns.
fn fit(s: &str, width: usize) -> String {
    if s.width() <= width {
        let pad = width - s.width();
        return format!("{s}{}", " ".repeat(pad));
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
