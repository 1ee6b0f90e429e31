//! Key handling shared between screens

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::traits::{FormHandler, Paginated, ScreenAction};

/// Common keyboard event handling utilities
pub struct CommonKeyHandler;

impl CommonKeyHandler {
    /// Page keys for the campaign list. Moving past either end reports it
    /// instead of fetching.
    pub fn handle_pagination_keys<T: Paginated>(
        paginated: &mut T,
        key: KeyEvent,
    ) -> Option<ScreenAction> {
        match key.code {
            KeyCode::Left | KeyCode::PageUp => Some(if paginated.previous_page() {
                ScreenAction::None
            } else {
                ScreenAction::SetStatus("Already on the first page".to_string())
            }),
            KeyCode::Right | KeyCode::PageDown => Some(if paginated.next_page() {
                ScreenAction::None
            } else {
                ScreenAction::SetStatus("Already on the last page".to_string())
            }),
            KeyCode::Home => {
                paginated.go_to_first_page();
                Some(ScreenAction::None)
            }
            KeyCode::End => {
                paginated.go_to_last_page();
                Some(ScreenAction::None)
            }
            _ => None,
        }
    }

    /// Handle form navigation and input
    pub fn handle_form_keys<T: FormHandler>(form: &mut T, key: KeyEvent) -> Option<ScreenAction> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Some(ScreenAction::None)
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                Some(ScreenAction::None)
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.handle_char_input(c);
                Some(ScreenAction::None)
            }
            KeyCode::Backspace => {
                form.handle_backspace();
                Some(ScreenAction::None)
            }
            KeyCode::Delete => {
                form.handle_delete();
                Some(ScreenAction::None)
            }
            KeyCode::Left => {
                if let Some(field) = form.current_input() {
                    field.move_cursor_left();
                }
                Some(ScreenAction::None)
            }
            KeyCode::Right => {
                if let Some(field) = form.current_input() {
                    field.move_cursor_right();
                }
                Some(ScreenAction::None)
            }
            KeyCode::Home => {
                if let Some(field) = form.current_input() {
                    field.move_cursor_to_start();
                }
                Some(ScreenAction::None)
            }
            KeyCode::End => {
                if let Some(field) = form.current_input() {
                    field.move_cursor_to_end();
                }
                Some(ScreenAction::None)
            }
            _ => None,
        }
    }
}
