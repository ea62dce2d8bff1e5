//! Rendering and input state for the push-invalidation screen

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::invalidation::{CdnProvider, CredentialsForm};
use crate::ui::form_field::FormField;

/// Which control owns key input on the invalidation screen.
/// `Field(i)` indexes the active provider's credential fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationFocus {
    Provider,
    SiteUrl,
    Field(usize),
}

pub struct InvalidationView {
    pub provider_state: ListState,
    pub site_url: FormField,
    pub fields: Vec<FormField>,
    pub focus: InvalidationFocus,
}

impl InvalidationView {
    pub fn new(form: &CredentialsForm) -> Self {
        let mut provider_state = ListState::default();
        let index = CdnProvider::all()
            .iter()
            .position(|p| *p == form.provider())
            .unwrap_or(0);
        provider_state.select(Some(index));
        Self {
            provider_state,
            site_url: FormField::text("https://www.example.com"),
            fields: build_fields(form.provider()),
            focus: InvalidationFocus::Provider,
        }
    }

    /// Rebuild the credential inputs after a provider switch
    pub fn rebuild_fields(&mut self, provider: CdnProvider) {
        self.fields = build_fields(provider);
    }

    /// Copy view inputs into the form model before a submit
    pub fn sync_to_model(&self, form: &mut CredentialsForm) {
        form.site_url = self.site_url.value();
        for (i, field) in self.fields.iter().enumerate() {
            form.set_value(i, field.value());
        }
    }

    pub fn highlighted_provider(&self) -> CdnProvider {
        self.provider_state
            .selected()
            .and_then(|i| CdnProvider::all().get(i).copied())
            .unwrap_or(CdnProvider::Fastly)
    }

    pub fn select_next_provider(&mut self) {
        let len = CdnProvider::all().len();
        let i = self.provider_state.selected().map_or(0, |i| (i + 1) % len);
        self.provider_state.select(Some(i));
    }

    pub fn select_prev_provider(&mut self) {
        let len = CdnProvider::all().len();
        let i = self
            .provider_state
            .selected()
            .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.provider_state.select(Some(i));
    }

    pub fn focus_next(&mut self, field_count: usize) {
        self.focus = match self.focus {
            InvalidationFocus::Provider => InvalidationFocus::SiteUrl,
            InvalidationFocus::SiteUrl => {
                if field_count == 0 {
                    InvalidationFocus::Provider
                } else {
                    InvalidationFocus::Field(0)
                }
            }
            InvalidationFocus::Field(i) => {
                if i + 1 < field_count {
                    InvalidationFocus::Field(i + 1)
                } else {
                    InvalidationFocus::Provider
                }
            }
        };
    }

    /// Clear credential inputs, mirroring a form reset
    pub fn clear_fields(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, form: &CredentialsForm) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(6), Constraint::Length(1)])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(30)])
            .split(chunks[0]);

        self.render_providers(frame, body[0], form);
        self.render_credentials(frame, body[1], form);
        render_results(frame, chunks[1], form);
        render_footer(frame, chunks[2]);
    }

    fn render_providers(&mut self, frame: &mut Frame, area: Rect, form: &CredentialsForm) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" CDN ")
            .border_style(if self.focus == InvalidationFocus::Provider {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            });

        let items: Vec<ListItem> = CdnProvider::all()
            .iter()
            .map(|provider| {
                let marker = if *provider == form.provider() {
                    "(x) "
                } else {
                    "( ) "
                };
                let style = if *provider == form.provider() {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(provider.label(), style),
                ]))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .block(block);
        frame.render_stateful_widget(list, area, &mut self.provider_state);
    }

    fn render_credentials(&mut self, frame: &mut Frame, area: Rect, form: &CredentialsForm) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} credentials ", form.provider().label()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![Constraint::Length(1); 1 + self.fields.len() * 2];
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(constraints)
            .split(inner);

        // Site URL first, then label/input pairs
        self.site_url
            .render(frame, rows[0], self.focus == InvalidationFocus::SiteUrl);

        let specs = form.provider().fields();
        for (i, field) in self.fields.iter_mut().enumerate() {
            let label = Paragraph::new(Span::styled(
                specs[i].label,
                Style::default().fg(Color::Gray),
            ));
            frame.render_widget(label, rows[1 + i * 2]);
            field.render(
                frame,
                rows[2 + i * 2],
                self.focus == InvalidationFocus::Field(i),
            );
        }
    }
}

fn build_fields(provider: CdnProvider) -> Vec<FormField> {
    provider
        .fields()
        .iter()
        .map(|spec| {
            if spec.secret {
                FormField::secret(spec.label)
            } else {
                FormField::text(spec.label)
            }
        })
        .collect()
}

fn render_results(frame: &mut Frame, area: Rect, form: &CredentialsForm) {
    let block = Block::default().borders(Borders::ALL).title(" Response ");
    let text = match &form.results {
        Some(text) if !text.is_empty() => Paragraph::new(text.clone()),
        Some(_) => Paragraph::new(Span::styled("(empty response)", Style::default().fg(Color::DarkGray))),
        None if form.is_busy() => {
            Paragraph::new(Span::styled("Working...", Style::default().fg(Color::Yellow)))
        }
        None => Paragraph::new(Span::styled("-", Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(text.wrap(Wrap { trim: false }).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" next field  "),
        Span::styled("Space", Style::default().fg(Color::Yellow)),
        Span::raw(" pick CDN  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" submit  "),
        Span::styled("^R", Style::default().fg(Color::Yellow)),
        Span::raw(" reset  "),
        Span::styled("F1", Style::default().fg(Color::Yellow)),
        Span::raw(" register  "),
        Span::styled("F2", Style::default().fg(Color::Yellow)),
        Span::raw(" logs  "),
        Span::styled("^Q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AdminApi, AdminError, LogEntry, Profile, RepoInfo};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    struct NullApi;

    #[async_trait]
    impl AdminApi for NullApi {
        async fn repo_info(&self, _: &str, _: &str) -> Result<RepoInfo, AdminError> {
            unimplemented!()
        }
        async fn profile(&self, _: &str, _: &str) -> Result<Profile, AdminError> {
            unimplemented!()
        }
        async fn disconnect(&self, _: &str, _: &str) -> Result<(), AdminError> {
            unimplemented!()
        }
        async fn logs(
            &self,
            _: &str,
            _: &str,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<Vec<LogEntry>, AdminError> {
            unimplemented!()
        }
        async fn invalidate(&self, _: &[(String, String)]) -> Result<String, AdminError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_focus_cycles_through_provider_url_and_fields() {
        let form = CredentialsForm::new(Arc::new(NullApi), Some("fastly"));
        let mut view = InvalidationView::new(&form);
        let count = view.fields.len();
        assert_eq!(count, 2);

        assert_eq!(view.focus, InvalidationFocus::Provider);
        view.focus_next(count);
        assert_eq!(view.focus, InvalidationFocus::SiteUrl);
        view.focus_next(count);
        assert_eq!(view.focus, InvalidationFocus::Field(0));
        view.focus_next(count);
        assert_eq!(view.focus, InvalidationFocus::Field(1));
        view.focus_next(count);
        assert_eq!(view.focus, InvalidationFocus::Provider);
    }

    #[test]
    fn test_sync_to_model_copies_inputs() {
        let mut form = CredentialsForm::new(Arc::new(NullApi), Some("fastly"));
        let mut view = InvalidationView::new(&form);
        view.site_url.set_value("https://www.acme.dev");
        view.fields[0].set_value("SVC123");
        view.fields[1].set_value("tok-456");

        view.sync_to_model(&mut form);
        assert!(form.is_valid());
        assert_eq!(form.value(0), "SVC123");
    }

    #[test]
    fn test_rebuild_fields_matches_provider() {
        let form = CredentialsForm::new(Arc::new(NullApi), Some("fastly"));
        let mut view = InvalidationView::new(&form);
        view.rebuild_fields(CdnProvider::Akamai);
        assert_eq!(view.fields.len(), CdnProvider::Akamai.fields().len());
    }
}
