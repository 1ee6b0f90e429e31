//! Traits shared by the dashboard screens.
//!
//! Screens never talk to the API. Key handling returns a [`ScreenAction`]
//! and the [`App`](super::app::App) performs whatever request it names.

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use super::app::Screen as ScreenType;
use crate::forms::FormField;
use crate::models::NewCampaign;

/// What a screen asks the application to do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    /// Navigate to a different screen
    NavigateTo(ScreenType),
    /// Quit the application
    Quit,
    /// Set status message
    SetStatus(String),
    /// Set error message
    SetError(String),
    /// Exchange credentials for a session token
    Login { username: String, password: String },
    /// End the session and return to the login screen
    Logout,
    /// Load and show one campaign
    OpenDetail(String),
    /// Write the loaded campaign's report to the export directory
    Export,
    /// Submit a validated campaign
    SubmitCampaign(NewCampaign),
    /// No action taken
    None,
}

/// Core trait for all TUI screens
pub trait ScreenHandler {
    /// Draw the screen content
    fn draw(&mut self, f: &mut Frame, area: Rect);

    /// Handle keyboard input and return the resulting action
    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction;

    /// Get the screen type identifier
    fn screen_type(&self) -> ScreenType;

    /// Context shortcuts for the help popup
    fn help(&self) -> &'static str;

    /// Called when screen becomes active
    fn on_enter(&mut self) {}
}

/// Trait for screens with paginated content
pub trait Paginated {
    /// Get current page number (0-based)
    fn get_current_page(&self) -> usize;

    /// Set current page
    fn set_current_page(&mut self, page: usize);

    /// Get total number of pages
    fn get_total_pages(&self) -> usize;

    /// Go to next page
    fn next_page(&mut self) -> bool {
        let current = self.get_current_page();
        if current + 1 < self.get_total_pages() {
            self.set_current_page(current + 1);
            return true;
        }
        false
    }

    /// Go to previous page
    fn previous_page(&mut self) -> bool {
        let current = self.get_current_page();
        if current > 0 {
            self.set_current_page(current - 1);
            return true;
        }
        false
    }

    /// Go to first page
    fn go_to_first_page(&mut self) {
        self.set_current_page(0);
    }

    /// Go to last page
    fn go_to_last_page(&mut self) {
        let total = self.get_total_pages();
        if total > 0 {
            self.set_current_page(total - 1);
        }
    }
}

/// Trait for form handling
pub trait FormHandler {
    /// Get current field index
    fn get_current_field(&self) -> usize;

    /// Set current field
    fn set_current_field(&mut self, field: usize);

    /// Get total number of fields
    fn get_field_count(&self) -> usize;

    /// The input under the focus
    fn current_input(&mut self) -> Option<&mut FormField>;

    /// Move to next field
    fn next_field(&mut self) {
        let total = self.get_field_count();
        if total > 0 {
            self.set_current_field((self.get_current_field() + 1) % total);
        }
    }

    /// Move to previous field
    fn previous_field(&mut self) {
        let current = self.get_current_field();
        let total = self.get_field_count();
        if total > 0 {
            self.set_current_field(if current == 0 { total - 1 } else { current - 1 });
        }
    }

    fn handle_char_input(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.insert_char(c);
        }
    }

    fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.delete_char();
        }
    }

    fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.delete_char_forward();
        }
    }
}
