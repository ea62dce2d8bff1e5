//! Rendering for the registration wizard screen

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::api::RepoInfo;
use crate::register::{RegisterWizard, StepForm, WizardStep};
use crate::ui::form_field::FormField;
use crate::ui::progress::ProgressView;

pub struct RegisterView {
    pub github_url: FormField,
}

impl RegisterView {
    pub fn new() -> Self {
        Self {
            github_url: FormField::text("https://github.com/owner/repo"),
        }
    }

    /// Clear view-held inputs; called alongside a wizard reset
    pub fn clear_inputs(&mut self) {
        self.github_url.clear();
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, wizard: &RegisterWizard, progress: &ProgressView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(8), Constraint::Length(1)])
            .split(area);

        progress.render(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        self.render_step_panel(frame, body[0], wizard);
        render_info_table(frame, body[1], wizard.repo_info());
        render_footer(frame, chunks[2], wizard.current_step());
    }

    fn render_step_panel(&mut self, frame: &mut Frame, area: Rect, wizard: &RegisterWizard) {
        let step = wizard.current_step();
        let form = wizard.form(step);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", step.title()))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(2), // description
                Constraint::Length(1), // input / stored path
                Constraint::Length(1), // spacer
                Constraint::Length(1), // busy indicator
                Constraint::Min(1),    // error
            ])
            .split(inner);

        let desc = Paragraph::new(step.description()).style(Style::default().fg(Color::Gray));
        frame.render_widget(desc, rows[0]);

        match step {
            WizardStep::Github => {
                self.github_url.render(frame, rows[1], form.enabled);
            }
            WizardStep::SignIn | WizardStep::Disconnect => {
                render_target_path(frame, rows[1], form);
            }
            WizardStep::ConnectUser | WizardStep::ConnectApp => {}
        }

        if form.busy {
            let busy = Paragraph::new(Line::from(Span::styled(
                "Working...",
                Style::default().fg(Color::Yellow),
            )));
            frame.render_widget(busy, rows[3]);
        }

        if let Some(error) = &form.error {
            let error = Paragraph::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )))
            .wrap(Wrap { trim: true });
            frame.render_widget(error, rows[4]);
        }
    }
}

impl Default for RegisterView {
    fn default() -> Self {
        Self::new()
    }
}

fn render_target_path(frame: &mut Frame, area: Rect, form: &StepForm) {
    let line = match &form.target_path {
        Some(path) => Line::from(vec![
            Span::styled("Target: ", Style::default().fg(Color::Gray)),
            Span::styled(path.clone(), Style::default().fg(Color::White)),
        ]),
        None => Line::from(Span::styled(
            "Complete the repository lookup first",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_info_table(frame: &mut Frame, area: Rect, info: Option<&RepoInfo>) {
    let block = Block::default().borders(Borders::ALL).title(" Registration ");

    let rows: Vec<Row> = match info {
        None => vec![
            Row::new(vec![Cell::from("owner"), Cell::from("-")]),
            Row::new(vec![Cell::from("repo"), Cell::from("-")]),
        ],
        Some(info) => {
            let mut rows = vec![
                Row::new(vec![Cell::from("owner"), Cell::from(info.owner.clone())]),
                Row::new(vec![Cell::from("repo"), Cell::from(info.repo.clone())]),
            ];
            if let Some(profile) = &info.auth_info {
                rows.push(Row::new(vec![
                    Cell::from("user"),
                    Cell::from(Span::styled(
                        profile.display(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                ]));
            }
            for (key, value) in &info.extra {
                rows.push(Row::new(vec![
                    Cell::from(key.clone()),
                    Cell::from(display_value(value)),
                ]));
            }
            rows
        }
    };

    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(10)])
        .block(block)
        .column_spacing(1);
    frame.render_widget(table, area);
}

/// Flatten a service-provided value for a table cell
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn render_footer(frame: &mut Frame, area: Rect, step: WizardStep) {
    let mut spans = vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" submit  "),
        Span::styled("^R", Style::default().fg(Color::Yellow)),
        Span::raw(" reset  "),
    ];
    if step == WizardStep::SignIn {
        spans.push(Span::raw("close the sign-in window to continue  "));
    }
    spans.extend([
        Span::styled("F2", Style::default().fg(Color::Yellow)),
        Span::raw(" logs  "),
        Span::styled("F3", Style::default().fg(Color::Yellow)),
        Span::raw(" invalidation  "),
        Span::styled("^Q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
