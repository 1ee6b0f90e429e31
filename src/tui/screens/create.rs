//! New campaign form

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::forms::{CampaignForm, FieldLocation, FormField};
use crate::tui::{
    app::Screen,
    handlers::CommonKeyHandler,
    traits::{FormHandler, ScreenAction, ScreenHandler},
    ui::Styles,
};

/// Outcome of the last submission
#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Success(String),
    Error(String),
}

/// Create screen state
pub struct CreateScreen {
    pub form: CampaignForm,
    pub banner: Option<Banner>,
    pub submitting: bool,
    list_state: ListState,
}

impl Default for CreateScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateScreen {
    pub fn new() -> Self {
        Self {
            form: CampaignForm::new(),
            banner: None,
            submitting: false,
            list_state: ListState::default(),
        }
    }

    /// Start over with an empty form
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn submit_succeeded(&mut self, name: &str) {
        self.submitting = false;
        self.banner = Some(Banner::Success(format!(
            "Campaign '{}' created, returning to the list...",
            name
        )));
    }

    /// Entered data is kept so the user can fix it and retry
    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.banner = Some(Banner::Error(message));
    }

    fn is_done(&self) -> bool {
        matches!(self.banner, Some(Banner::Success(_)))
    }

    fn submit(&mut self) -> ScreenAction {
        match self.form.to_new_campaign() {
            Ok(body) => {
                self.banner = None;
                ScreenAction::SubmitCampaign(body)
            }
            Err(e) => ScreenAction::SetError(e.to_string()),
        }
    }

    fn field_line(&self, index: usize, field: &FormField) -> Line<'static> {
        let section = match self.form.locate(index) {
            Some(FieldLocation::Site { entry, .. }) => format!("Site {} · ", entry + 1),
            Some(FieldLocation::Period { entry, .. }) => format!("Period {} · ", entry + 1),
            _ => String::new(),
        };
        let marker = if field.required { "*" } else { " " };
        let label = format!("{}{}{}", section, field.label, marker);

        let focused = index == self.form.focus();
        let mut value = field.value.clone();
        if focused {
            let at = value
                .char_indices()
                .nth(field.cursor_position)
                .map(|(i, _)| i)
                .unwrap_or(value.len());
            value.insert(at, '|');
        }
        let value_style = if field.check().is_err() {
            Styles::error()
        } else if field.value.is_empty() {
            Styles::inactive()
        } else {
            Styles::default()
        };
        let shown = if field.value.is_empty() && !focused {
            field.kind.placeholder().to_string()
        } else {
            value
        };

        Line::from(vec![
            Span::styled(format!("{:<36}", label), Styles::title()),
            Span::styled(shown, value_style),
        ])
    }
}

impl FormHandler for CampaignForm {
    fn get_current_field(&self) -> usize {
        self.focus()
    }

    fn set_current_field(&mut self, field: usize) {
        self.set_focus(field);
    }

    fn get_field_count(&self) -> usize {
        self.field_count()
    }

    fn current_input(&mut self) -> Option<&mut FormField> {
        self.focused_mut()
    }
}

impl ScreenHandler for CreateScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let (banner, style) = match self.banner {
            Some(Banner::Success(ref msg)) => (msg.clone(), Styles::success()),
            Some(Banner::Error(ref msg)) => (msg.clone(), Styles::error()),
            None if self.submitting => ("Submitting...".to_string(), Styles::info()),
            None => (
                format!(
                    "{} sites, {} periods | fields marked * are required",
                    self.form.sites.len(),
                    self.form.periods.len()
                ),
                Styles::inactive(),
            ),
        };
        f.render_widget(
            Paragraph::new(banner)
                .style(style)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("New campaign").borders(Borders::ALL)),
            chunks[0],
        );

        let items: Vec<ListItem> = (0..self.form.field_count())
            .filter_map(|i| self.form.field(i).map(|field| ListItem::new(self.field_line(i, field))))
            .collect();
        self.list_state.select(Some(self.form.focus()));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            )
            .highlight_style(Styles::selected());
        f.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let missing = self.form.missing_required();
        let (hint, hint_style) = if !missing.is_empty() {
            (format!("Submit disabled, missing: {}", missing.join(", ")), Styles::inactive())
        } else if let Err(e) = self.form.to_new_campaign() {
            (format!("Submit disabled: {}", e), Styles::error())
        } else {
            ("Ctrl+S: submit".to_string(), Styles::success())
        };
        let footer = Line::from(vec![
            Span::styled(hint, hint_style),
            Span::styled(
                "  | F2: add site  F3: add period  F4: remove entry  Esc: cancel",
                Styles::inactive(),
            ),
        ]);
        f.render_widget(
            Paragraph::new(footer).block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.submitting || self.is_done() {
            return ScreenAction::None;
        }
        match key.code {
            KeyCode::Esc => return ScreenAction::NavigateTo(Screen::Dashboard),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.submit();
            }
            KeyCode::F(2) => self.form.add_site(),
            KeyCode::F(3) => self.form.add_period(),
            KeyCode::F(4) => {
                if !self.form.remove_focused_entry() {
                    return ScreenAction::SetStatus("Move into a site or period to remove it".to_string());
                }
            }
            _ => {
                if CommonKeyHandler::handle_form_keys(&mut self.form, key).is_some() {
                    if let Some(Banner::Error(_)) = self.banner {
                        self.banner = None;
                    }
                }
            }
        }
        ScreenAction::None
    }

    fn screen_type(&self) -> Screen {
        Screen::Create
    }

    fn help(&self) -> &'static str {
        "New Campaign:\n\
        Tab / ↓ - Next field\n\
        Shift+Tab / ↑ - Previous field\n\
        F2 - Add site\n\
        F3 - Add period\n\
        F4 - Remove the site or period under the cursor\n\
        Ctrl+S - Submit (when required fields are valid)\n\
        Esc - Cancel"
    }
}
