//! Rendering and input state for the log viewer screen

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::logview::rewrite::status_group;
use crate::logview::{LogRow, LogViewer, TableDisplay, TimeframePreset};
use crate::ui::form_field::FormField;

/// Which control owns key input on the logs screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogsFocus {
    Url,
    Timeframe,
    From,
    To,
    Filter,
    Table,
}

impl LogsFocus {
    fn order(custom: bool) -> &'static [LogsFocus] {
        if custom {
            &[
                LogsFocus::Url,
                LogsFocus::Timeframe,
                LogsFocus::From,
                LogsFocus::To,
                LogsFocus::Filter,
                LogsFocus::Table,
            ]
        } else {
            &[
                LogsFocus::Url,
                LogsFocus::Timeframe,
                LogsFocus::Filter,
                LogsFocus::Table,
            ]
        }
    }
}

pub struct LogsView {
    pub github_url: FormField,
    pub timeframe: FormField,
    pub from: FormField,
    pub to: FormField,
    pub filter: FormField,
    pub focus: LogsFocus,
    pub table_state: TableState,
}

impl LogsView {
    pub fn new() -> Self {
        let mut timeframe = FormField::select(
            TimeframePreset::all()
                .iter()
                .map(|p| p.label().to_string())
                .collect(),
        );
        timeframe.set_value(TimeframePreset::Last24Hours.label());
        Self {
            github_url: FormField::text("https://github.com/owner/repo"),
            timeframe,
            from: FormField::datetime(),
            to: FormField::datetime(),
            filter: FormField::text("filter results"),
            focus: LogsFocus::Url,
            table_state: TableState::default(),
        }
    }

    pub fn preset(&self) -> TimeframePreset {
        self.timeframe
            .selected()
            .and_then(|i| TimeframePreset::all().get(i).copied())
            .unwrap_or(TimeframePreset::Last24Hours)
    }

    /// Keep the from/to fields in line with the selected preset
    pub fn sync_timeframe_fields(&mut self) {
        let preset = self.preset();
        if let Some((from, to)) = preset.range(chrono::Local::now()) {
            self.from.set_value(&crate::logview::fmt_custom_datetime(from));
            self.to.set_value(&crate::logview::fmt_custom_datetime(to));
        }
        self.from.set_read_only(!preset.is_custom());
        self.to.set_read_only(!preset.is_custom());
    }

    pub fn focus_next(&mut self) {
        let order = LogsFocus::order(self.preset().is_custom());
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + 1) % order.len()];
    }

    pub fn focus_prev(&mut self) {
        let order = LogsFocus::order(self.preset().is_custom());
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + order.len() - 1) % order.len()];
    }

    pub fn select_next(&mut self, viewer: &LogViewer) {
        let len = viewer.visible_rows().len();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| (i + 1) % len);
        self.table_state.select(Some(i));
    }

    pub fn select_prev(&mut self, viewer: &LogViewer) {
        let len = viewer.visible_rows().len();
        if len == 0 {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.table_state.select(Some(i));
    }

    /// Deep link of the highlighted row, if any
    pub fn selected_link(&self, viewer: &LogViewer) -> Option<String> {
        let rows = viewer.visible_rows();
        let row = rows.get(self.table_state.selected()?)?;
        row.link.clone()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, viewer: &LogViewer) {
        let custom = self.preset().is_custom();
        let form_height = if custom { 11 } else { 10 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(form_height),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_form(frame, chunks[0], custom);
        self.filter.render(frame, chunks[1], self.focus == LogsFocus::Filter);
        self.render_table(frame, chunks[2], viewer);
        render_footer(frame, chunks[3]);
    }

    fn render_form(&mut self, frame: &mut Frame, area: Rect, custom: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Service Logs ")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![
            Constraint::Length(1), // url
            Constraint::Length(5), // timeframe picker
        ];
        if custom {
            constraints.push(Constraint::Length(1)); // from/to
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(constraints)
            .split(inner);

        self.github_url.render(frame, rows[0], self.focus == LogsFocus::Url);
        self.timeframe
            .render(frame, rows[1], self.focus == LogsFocus::Timeframe);

        if custom {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[2]);
            self.from.render(frame, halves[0], self.focus == LogsFocus::From);
            self.to.render(frame, halves[1], self.focus == LogsFocus::To);
        }
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect, viewer: &LogViewer) {
        let block = Block::default().borders(Borders::ALL).title(" Results ");

        match &viewer.display {
            TableDisplay::Loading => {
                let para = Paragraph::new("Loading...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(block);
                frame.render_widget(para, area);
            }
            TableDisplay::NoResults => {
                let para = Paragraph::new("No results")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block);
                frame.render_widget(para, area);
            }
            TableDisplay::Error { title, message } => {
                let text = vec![
                    Line::from(Span::styled(
                        title.clone(),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(message.clone()),
                ];
                let para = Paragraph::new(text).wrap(Wrap { trim: true }).block(block);
                frame.render_widget(para, area);
            }
            TableDisplay::Results => {
                let rows: Vec<Row> = viewer.visible_rows().into_iter().map(table_row).collect();
                let header = Row::new(vec!["timestamp", "type", "user", "path", "method", "status", "duration"])
                    .style(Style::default().add_modifier(Modifier::BOLD));
                let table = Table::new(
                    rows,
                    [
                        Constraint::Length(20),
                        Constraint::Length(10),
                        Constraint::Length(18),
                        Constraint::Min(20),
                        Constraint::Length(7),
                        Constraint::Length(6),
                        Constraint::Length(8),
                    ],
                )
                .header(header)
                .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .block(block);
                frame.render_stateful_widget(table, area, &mut self.table_state);
            }
        }
    }
}

impl Default for LogsView {
    fn default() -> Self {
        Self::new()
    }
}

fn table_row(row: &LogRow) -> Row<'static> {
    let status_style = match row.status.map(status_group) {
        Some(2) => Style::default().fg(Color::Green),
        Some(4) => Style::default().fg(Color::Yellow),
        Some(5) => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Gray),
    };
    Row::new(vec![
        Cell::from(row.cells[0].clone()),
        Cell::from(row.kind.clone().unwrap_or_else(|| "-".to_string())),
        Cell::from(row.cells[5].clone()),
        Cell::from(row.cells[9].clone()),
        Cell::from(row.cells[12].clone()),
        Cell::from(Span::styled(row.cells[13].clone(), status_style)),
        Cell::from(row.cells[14].clone()),
    ])
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" next field  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" fetch  "),
        Span::styled("o", Style::default().fg(Color::Yellow)),
        Span::raw(" open link  "),
        Span::styled("F1", Style::default().fg(Color::Yellow)),
        Span::raw(" register  "),
        Span::styled("F3", Style::default().fg(Color::Yellow)),
        Span::raw(" invalidation  "),
        Span::styled("^Q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset_is_last_24_hours() {
        let view = LogsView::new();
        assert_eq!(view.preset(), TimeframePreset::Last24Hours);
    }

    #[test]
    fn test_focus_order_skips_custom_fields_for_presets() {
        let mut view = LogsView::new();
        assert_eq!(view.focus, LogsFocus::Url);
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::Timeframe);
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::Filter);
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::Table);
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::Url);
    }

    #[test]
    fn test_focus_order_includes_custom_fields() {
        let mut view = LogsView::new();
        view.timeframe.set_value(TimeframePreset::Custom.label());
        view.focus = LogsFocus::Timeframe;
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::From);
        view.focus_next();
        assert_eq!(view.focus, LogsFocus::To);
    }

    #[test]
    fn test_sync_timeframe_fields_toggles_read_only() {
        let mut view = LogsView::new();
        view.sync_timeframe_fields();
        assert!(!view.from.value().is_empty());
        assert!(!view.to.value().is_empty());

        view.timeframe.set_value(TimeframePreset::Custom.label());
        view.sync_timeframe_fields();
        // Custom keeps the previous values but makes them editable
        assert!(view
            .from
            .handle_key(crossterm::event::KeyCode::Backspace));
    }
}
