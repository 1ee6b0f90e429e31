//! Login screen

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::forms::{FieldKind, FormField};
use crate::tui::{
    app::Screen,
    handlers::CommonKeyHandler,
    traits::{FormHandler, ScreenAction, ScreenHandler},
    ui::{centered_rect, render_input, Styles},
};

const USERNAME: usize = 0;
const PASSWORD: usize = 1;

/// Login screen state
pub struct LoginScreen {
    pub fields: [FormField; 2],
    pub current_field: usize,
    pub error: Option<String>,
    pub busy: bool,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            fields: [
                FormField::new("Username", FieldKind::Text).required(),
                FormField::new("Password", FieldKind::Text).required(),
            ],
            current_field: USERNAME,
            error: None,
            busy: false,
        }
    }

    pub fn username(&self) -> &str {
        self.fields[USERNAME].value.trim()
    }

    /// Failed attempts keep the username and drop the password
    pub fn login_failed(&mut self, message: String) {
        self.busy = false;
        self.error = Some(message);
        self.fields[PASSWORD].clear();
        self.current_field = PASSWORD;
    }

    pub fn reset(&mut self) {
        self.fields[PASSWORD].clear();
        self.busy = false;
        self.current_field = if self.fields[USERNAME].is_empty() {
            USERNAME
        } else {
            PASSWORD
        };
    }

    fn submit(&mut self) -> ScreenAction {
        if self.fields.iter().any(|f| f.is_empty()) {
            self.error = Some("Username and password are required".to_string());
            return ScreenAction::None;
        }
        self.error = None;
        ScreenAction::Login {
            username: self.username().to_string(),
            password: self.fields[PASSWORD].value.clone(),
        }
    }
}

impl FormHandler for LoginScreen {
    fn get_current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, field: usize) {
        if field < self.fields.len() {
            self.current_field = field;
        }
    }

    fn get_field_count(&self) -> usize {
        self.fields.len()
    }

    fn current_input(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.current_field)
    }
}

impl ScreenHandler for LoginScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 60, area);
        f.render_widget(Clear, popup);

        let block = Block::default()
            .title("Campaign Dashboard - Sign in")
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        render_input(f, chunks[0], &self.fields[USERNAME], self.current_field == USERNAME, false);
        render_input(f, chunks[1], &self.fields[PASSWORD], self.current_field == PASSWORD, true);

        let (message, style) = if self.busy {
            ("Signing in...".to_string(), Styles::info())
        } else if let Some(ref error) = self.error {
            (error.clone(), Styles::error())
        } else {
            ("Enter: sign in | Tab: next field | Ctrl+C: quit".to_string(), Styles::inactive())
        };
        f.render_widget(
            Paragraph::new(message).style(style).alignment(Alignment::Center),
            chunks[2],
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.busy {
            return ScreenAction::None;
        }
        match key.code {
            KeyCode::Enter if self.current_field == USERNAME => {
                self.current_field = PASSWORD;
                ScreenAction::None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => ScreenAction::Quit,
            _ => {
                let action = CommonKeyHandler::handle_form_keys(self, key);
                if action.is_some() {
                    self.error = None;
                }
                action.unwrap_or(ScreenAction::None)
            }
        }
    }

    fn screen_type(&self) -> Screen {
        Screen::Login
    }

    fn help(&self) -> &'static str {
        "Login:\n\
        Tab / ↑/↓ - Switch field\n\
        Enter - Next field / sign in\n\
        Esc - Quit"
    }
}
