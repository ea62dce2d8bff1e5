#![allow(dead_code)]

//! Reusable form field widgets for TUI forms

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

/// A form field widget for the input types the console's forms need
pub enum FormField {
    /// Single-line text input
    TextInput {
        value: String,
        cursor_pos: usize,
        placeholder: String,
        /// Render the value as bullets (credential secrets)
        masked: bool,
    },
    /// Selection from predefined options
    EnumSelect {
        options: Vec<String>,
        selected: usize,
        list_state: ListState,
    },
    /// Datetime input (`YYYY-MM-DDTHH:MM`), optionally read-only
    DateTimeInput {
        value: String,
        cursor_pos: usize,
        read_only: bool,
    },
}

impl FormField {
    pub fn text(placeholder: impl Into<String>) -> Self {
        FormField::TextInput {
            value: String::new(),
            cursor_pos: 0,
            placeholder: placeholder.into(),
            masked: false,
        }
    }

    pub fn secret(placeholder: impl Into<String>) -> Self {
        FormField::TextInput {
            value: String::new(),
            cursor_pos: 0,
            placeholder: placeholder.into(),
            masked: true,
        }
    }

    pub fn select(options: Vec<String>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        FormField::EnumSelect {
            options,
            selected: 0,
            list_state,
        }
    }

    pub fn datetime() -> Self {
        FormField::DateTimeInput {
            value: String::new(),
            cursor_pos: 0,
            read_only: true,
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::EnumSelect {
                options, selected, ..
            } => options.get(*selected).cloned().unwrap_or_default(),
            FormField::DateTimeInput { value, .. } => value.clone(),
        }
    }

    /// Set the value from a string
    pub fn set_value(&mut self, new_value: &str) {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                *value = new_value.to_string();
                *cursor_pos = value.len();
            }
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => {
                if let Some(idx) = options.iter().position(|o| o == new_value) {
                    *selected = idx;
                    list_state.select(Some(idx));
                }
            }
            FormField::DateTimeInput {
                value, cursor_pos, ..
            } => {
                *value = new_value.to_string();
                *cursor_pos = value.len();
            }
        }
    }

    pub fn clear(&mut self) {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            }
            | FormField::DateTimeInput {
                value, cursor_pos, ..
            } => {
                value.clear();
                *cursor_pos = 0;
            }
            FormField::EnumSelect {
                selected,
                list_state,
                ..
            } => {
                *selected = 0;
                list_state.select(Some(0));
            }
        }
    }

    /// Selected option index for selects
    pub fn selected(&self) -> Option<usize> {
        match self {
            FormField::EnumSelect { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    pub fn set_read_only(&mut self, ro: bool) {
        if let FormField::DateTimeInput { read_only, .. } = self {
            *read_only = ro;
        }
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => match key {
                KeyCode::Char(c) => {
                    value.insert(*cursor_pos, c);
                    *cursor_pos += 1;
                    true
                }
                KeyCode::Backspace => {
                    if *cursor_pos > 0 {
                        *cursor_pos -= 1;
                        value.remove(*cursor_pos);
                    }
                    true
                }
                KeyCode::Delete => {
                    if *cursor_pos < value.len() {
                        value.remove(*cursor_pos);
                    }
                    true
                }
                KeyCode::Left => {
                    if *cursor_pos > 0 {
                        *cursor_pos -= 1;
                    }
                    true
                }
                KeyCode::Right => {
                    if *cursor_pos < value.len() {
                        *cursor_pos += 1;
                    }
                    true
                }
                KeyCode::Home => {
                    *cursor_pos = 0;
                    true
                }
                KeyCode::End => {
                    *cursor_pos = value.len();
                    true
                }
                _ => false,
            },
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => match key {
                KeyCode::Up | KeyCode::Char('k') => {
                    if *selected > 0 {
                        *selected -= 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if *selected < options.len().saturating_sub(1) {
                        *selected += 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                _ => false,
            },
            FormField::DateTimeInput {
                value,
                cursor_pos,
                read_only,
            } => {
                if *read_only {
                    return false;
                }
                match key {
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '-' || c == ':' || c == 'T' => {
                        if value.len() < 16 {
                            value.insert(*cursor_pos, c);
                            *cursor_pos += 1;
                        }
                        true
                    }
                    KeyCode::Backspace => {
                        if *cursor_pos > 0 {
                            *cursor_pos -= 1;
                            value.remove(*cursor_pos);
                        }
                        true
                    }
                    KeyCode::Left => {
                        if *cursor_pos > 0 {
                            *cursor_pos -= 1;
                        }
                        true
                    }
                    KeyCode::Right => {
                        if *cursor_pos < value.len() {
                            *cursor_pos += 1;
                        }
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } | FormField::DateTimeInput { .. } => 1,
            FormField::EnumSelect { options, .. } => (options.len() as u16).min(5),
        }
    }

    /// Render the field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                masked,
            } => {
                let shown = if *masked {
                    "\u{2022}".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                render_line_input(frame, area, &shown, *cursor_pos, placeholder, focused);
            }
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => {
                let items: Vec<ListItem> = options
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        let style = if i == *selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::Gray)
                        };
                        ListItem::new(Span::styled(opt.clone(), style))
                    })
                    .collect();

                let list = List::new(items)
                    .highlight_style(
                        Style::default()
                            .add_modifier(Modifier::REVERSED)
                            .fg(Color::Cyan),
                    )
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list, area, list_state);
            }
            FormField::DateTimeInput {
                value,
                cursor_pos,
                read_only,
            } => {
                let editable = focused && !*read_only;
                render_line_input(
                    frame,
                    area,
                    value,
                    *cursor_pos,
                    "YYYY-MM-DDTHH:MM",
                    editable,
                );
            }
        }
    }
}

fn render_line_input(
    frame: &mut Frame,
    area: Rect,
    value: &str,
    cursor_pos: usize,
    placeholder: &str,
    focused: bool,
) {
    let content = if value.is_empty() && !focused {
        Line::from(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut text = value.to_string();
        if focused {
            if cursor_pos < text.len() {
                text.insert(cursor_pos, '|');
            } else {
                text.push('|');
            }
        }
        Line::from(text)
    };

    let para = Paragraph::new(content).style(Style::default().fg(if focused {
        Color::White
    } else {
        Color::Gray
    }));
    frame.render_widget(para, area);
}
