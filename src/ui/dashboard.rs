use crate::ui::app::App;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table},
    Frame,
};
use std::path::Path;

// Brand colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

// Styles
const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const PRESENT_COLOR: Color = BRAND_GREEN;
const MISSING_COLOR: Color = BRAND_MUTED;

pub fn draw_picker(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(6),    // Groups
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_groups(frame, chunks[1], app);

    match &app.message {
        Some(message) => draw_footer(frame, chunks[2], &format!(" {message} "), BRAND_ORANGE),
        None => draw_footer(
            frame,
            chunks[2],
            " ↑↓ Select | Enter Check | q Quit ",
            BRAND_MUTED,
        ),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let checkable = app.groups.iter().filter(|g| g.is_checkable()).count();
    let title = format!(
        " IFC Audit | {} | {} model groups | {} checkable ",
        app.directory.display(),
        app.groups.len(),
        checkable
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn file_cell(path: Option<&Path>) -> Line<'static> {
    match path.and_then(Path::file_name) {
        Some(name) => Line::from(vec![
            Span::styled("✔ ", Style::default().fg(PRESENT_COLOR)),
            Span::raw(name.to_string_lossy().to_string()),
        ]),
        None => Line::from(Span::styled("✘", Style::default().fg(MISSING_COLOR))),
    }
}

fn draw_groups(frame: &mut Frame, area: Rect, app: &App) {
    // Subtract borders and header row
    let visible_rows = (area.height as usize).saturating_sub(3);

    let scroll_offset = if app.selected >= visible_rows {
        app.selected - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec!["#", "Prefix", "STR", "ARCH", "MEP"])
        .style(HEADER_STYLE)
        .height(1);

    let rows: Vec<Row> = app
        .groups
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, group)| {
            let style = if i == app.selected {
                SELECTED_STYLE
            } else if group.is_checkable() {
                Style::default()
            } else {
                Style::default().fg(MISSING_COLOR)
            };

            Row::new(vec![
                Line::from(format!("{}", i + 1)),
                Line::from(group.prefix.clone()),
                file_cell(group.structural.as_deref()),
                file_cell(group.architectural.as_deref()),
                file_cell(group.mep.as_deref()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(24),
        Constraint::Percentage(24),
        Constraint::Percentage(24),
        Constraint::Percentage(24),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Model groups ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BRAND_ORANGE)),
    );

    frame.render_widget(table, area);

    if app.groups.len() > visible_rows && area.height > 3 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(app.groups.len()).position(app.selected);

        let scrollbar_area = Rect {
            x: area.x + area.width - 1,
            y: area.y + 2,
            width: 1,
            height: area.height - 3,
        };
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str, color: Color) {
    let footer = Paragraph::new(help.to_string())
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
