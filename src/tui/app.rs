//! Main TUI application state and logic

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::screens::*;
use super::traits::{ScreenAction, ScreenHandler};
use super::ui::centered_rect;
use crate::api::{ApiError, CampaignApi};
use crate::config::Config;
use crate::listing::LoadState;
use crate::models::{ListQuery, NewCampaign};
use crate::report;
use crate::session::SessionStore;

/// How long the loop waits for a key before re-checking timers
const TICK_RATE: Duration = Duration::from_millis(200);

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Detail,
    Create,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Dashboard => "Campaigns",
            Screen::Detail => "Campaign Details",
            Screen::Create => "New Campaign",
        }
    }
}

/// A remote call waiting to be made by the loop
enum Request {
    Login { username: String, password: String },
    ListCampaigns(ListQuery),
    Detail(String),
    Create(NewCampaign),
}

/// Main TUI application state
pub struct App<A: CampaignApi> {
    /// Current active screen
    pub current_screen: Screen,
    /// Previous screen for navigation
    pub previous_screen: Option<Screen>,
    /// Application configuration
    pub config: Config,
    pub session: SessionStore,
    api: A,

    // Screen states
    pub login: LoginScreen,
    pub dashboard: DashboardScreen,
    pub detail: DetailScreen,
    pub create: CreateScreen,

    // Global application state
    pub should_quit: bool,
    pub show_help_popup: bool,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pending: Option<Request>,
    redirect_at: Option<Instant>,
}

impl<A: CampaignApi> App<A> {
    /// Create a new TUI application. A restored session starts on the
    /// campaign list, otherwise on the login screen.
    pub fn new(api: A, session: SessionStore, config: Config) -> Self {
        let current_screen = if session.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        let page_size = config.listing.page_size;

        Self {
            current_screen,
            previous_screen: None,
            config,
            session,
            api,

            login: LoginScreen::new(),
            dashboard: DashboardScreen::new(page_size),
            detail: DetailScreen::new(),
            create: CreateScreen::new(),

            should_quit: false,
            show_help_popup: false,
            status_message: None,
            error_message: None,
            pending: None,
            redirect_at: None,
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting main application loop on {:?}", self.current_screen);

        loop {
            self.check_redirect(Instant::now());

            // Show the loading state before each request blocks the loop
            while let Some(request) = self.next_request() {
                self.begin(&request);
                terminal.draw(|f| self.draw(f))?;
                self.perform(request).await;
            }

            terminal.draw(|f| self.draw(f))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        info!("Application loop completed");
        Ok(())
    }

    /// Make every queued request without drawing in between
    pub async fn process_pending(&mut self) {
        while let Some(request) = self.next_request() {
            self.begin(&request);
            self.perform(request).await;
        }
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // Global shortcuts
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Char('?') if matches!(self.current_screen, Screen::Dashboard | Screen::Detail) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Esc if self.show_help_popup => {
                self.show_help_popup = false;
                return;
            }
            _ => {}
        }

        if self.show_help_popup {
            return;
        }

        let action = match self.current_screen {
            Screen::Login => self.login.handle_key_event(key),
            Screen::Dashboard => self.dashboard.handle_key_event(key),
            Screen::Detail => self.detail.handle_key_event(key),
            Screen::Create => self.create.handle_key_event(key),
        };
        self.apply(action);
    }

    fn apply(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::NavigateTo(screen) => self.navigate_to_screen(screen),
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::SetStatus(message) => self.set_status(message),
            ScreenAction::SetError(message) => self.set_error(message),
            ScreenAction::Login { username, password } => {
                self.clear_messages();
                self.pending = Some(Request::Login { username, password });
            }
            ScreenAction::Logout => self.logout(),
            ScreenAction::OpenDetail(name) => {
                self.navigate_to_screen(Screen::Detail);
                self.pending = Some(Request::Detail(name));
            }
            ScreenAction::Export => self.export_report(),
            ScreenAction::SubmitCampaign(body) => {
                self.clear_messages();
                self.pending = Some(Request::Create(body));
            }
            ScreenAction::None => {}
        }
    }

    /// Next request to make: one queued by a screen, else a list fetch the
    /// filter state has scheduled.
    fn next_request(&mut self) -> Option<Request> {
        if let Some(request) = self.pending.take() {
            return Some(request);
        }
        if self.current_screen == Screen::Dashboard && self.session.is_authenticated() {
            return self.dashboard.filter.take_fetch().map(Request::ListCampaigns);
        }
        None
    }

    fn begin(&mut self, request: &Request) {
        match request {
            Request::Login { .. } => self.login.busy = true,
            Request::ListCampaigns(_) => self.dashboard.set_loading(),
            Request::Detail(name) => self.detail.set_loading(name),
            Request::Create(_) => self.create.submitting = true,
        }
    }

    async fn perform(&mut self, request: Request) {
        match request {
            Request::Login { username, password } => {
                match self.session.login(&self.api, &username, &password).await {
                    Ok(()) => {
                        self.login.reset();
                        self.navigate_to_screen(Screen::Dashboard);
                        self.set_status(format!("Signed in as {}", username));
                    }
                    Err(e) => {
                        warn!("Login failed for {}: {}", username, e);
                        let message = if e.is_invalid_credentials() {
                            "Invalid username or password".to_string()
                        } else {
                            e.to_string()
                        };
                        self.login.login_failed(message);
                    }
                }
            }
            Request::ListCampaigns(query) => {
                let result = self.api.list_campaigns(self.session.token(), &query).await;
                match result {
                    Ok(page) => {
                        info!("Loaded {} of {} campaigns (page {})", page.records.len(), page.total, query.page);
                        self.dashboard.set_page(page);
                    }
                    Err(e) => {
                        if let Some(message) = self.api_failure("list campaigns", e) {
                            self.dashboard.set_failed(message);
                        }
                    }
                }
            }
            Request::Detail(name) => {
                let result = self.api.get_campaign_detail(self.session.token(), &name).await;
                match result {
                    Ok(detail) => self.detail.detail = LoadState::Loaded(detail),
                    Err(e) => {
                        if let Some(message) = self.api_failure("load campaign", e) {
                            self.detail.detail = LoadState::Failed(message);
                        }
                    }
                }
            }
            Request::Create(body) => {
                let result = self.api.create_campaign(self.session.token(), &body).await;
                match result {
                    Ok(created) => {
                        info!("Created campaign {}", created.name);
                        self.create.submit_succeeded(&created.name);
                        self.redirect_at = Some(Instant::now() + self.config.redirect_delay());
                    }
                    Err(e) => {
                        if let Some(message) = self.api_failure("create campaign", e) {
                            self.create.submit_failed(message);
                        }
                    }
                }
            }
        }
    }

    /// Log a failed call and turn it into the message its view shows. A
    /// rejected token ends the session and sends the user to the login
    /// screen instead, in which case there is nothing for the view to show.
    fn api_failure(&mut self, operation: &str, e: ApiError) -> Option<String> {
        error!("Failed to {}: {}", operation, e);
        if e.is_unauthorized() {
            self.end_session();
            self.login.error = Some("Your session has expired, please sign in again".to_string());
            return None;
        }
        Some(e.to_string())
    }

    /// Leave the create screen once its success banner has been shown long
    /// enough
    pub fn check_redirect(&mut self, now: Instant) {
        if let Some(at) = self.redirect_at {
            if now >= at {
                self.redirect_at = None;
                self.create.reset();
                self.navigate_to_screen(Screen::Dashboard);
            }
        }
    }

    pub fn redirect_pending(&self) -> bool {
        self.redirect_at.is_some()
    }

    fn export_report(&mut self) {
        let Some(detail) = self.detail.detail.loaded() else {
            return;
        };
        match report::export_csv(detail, &self.config.export_dir) {
            Ok(path) => self.set_status(format!("Report saved to {}", path.display())),
            Err(e) => {
                error!("Export failed: {}", e);
                self.set_error(format!("Export failed: {}", e));
            }
        }
    }

    fn end_session(&mut self) {
        self.session.logout();
        self.dashboard = DashboardScreen::new(self.config.listing.page_size);
        self.detail = DetailScreen::new();
        self.create.reset();
        self.login.reset();
        self.pending = None;
        self.redirect_at = None;
        self.previous_screen = None;
        self.current_screen = Screen::Login;
    }

    fn logout(&mut self) {
        self.end_session();
        self.set_status("Logged out".to_string());
    }

    /// Navigate to a specific screen. Everything but the login screen needs
    /// a session.
    pub fn navigate_to_screen(&mut self, screen: Screen) {
        let screen = if screen != Screen::Login && !self.session.is_authenticated() {
            Screen::Login
        } else {
            screen
        };
        self.previous_screen = Some(self.current_screen);
        self.current_screen = screen;
        self.clear_messages();

        match screen {
            // The list is fetched again every time it is shown
            Screen::Dashboard => {
                self.dashboard.on_enter();
                self.dashboard.filter.refresh();
            }
            Screen::Create => self.create.reset(),
            Screen::Login => self.login.on_enter(),
            Screen::Detail => self.detail.on_enter(),
        }
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.status_message = None;
    }

    /// Clear status and error messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();

        // Main layout: status bar at bottom, content area above
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        match self.current_screen {
            Screen::Login => self.login.draw(f, chunks[0]),
            Screen::Dashboard => self.dashboard.draw(f, chunks[0]),
            Screen::Detail => self.detail.draw(f, chunks[0]),
            Screen::Create => self.create.draw(f, chunks[0]),
        }

        self.draw_status_bar(f, chunks[1]);

        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    /// Draw status bar with current screen info and shortcuts
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(ref msg) = self.status_message {
            format!("Status: {}", msg)
        } else if let Some(ref err) = self.error_message {
            format!("Error: {}", err)
        } else {
            let session = if self.session.is_authenticated() {
                "signed in"
            } else {
                "not signed in"
            };
            format!(
                "Campaign Dashboard - {} | {} | F1: Help | Ctrl+C: Quit",
                self.current_screen.title(),
                session
            )
        };

        let style = if self.error_message.is_some() {
            Style::default().fg(Color::Red)
        } else if self.status_message.is_some() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let status_bar = Paragraph::new(status_text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(status_bar, area);
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);

        f.render_widget(Clear, popup_area);

        let global_help = "Global Shortcuts:\n\
            F1 - Toggle this help\n\
            Esc - Close this help\n\
            Ctrl+C - Quit application\n\n";
        let screen_help = match self.current_screen {
            Screen::Login => self.login.help(),
            Screen::Dashboard => self.dashboard.help(),
            Screen::Detail => self.detail.help(),
            Screen::Create => self.create.help(),
        };

        let help_popup = Paragraph::new(format!("{}{}", global_help, screen_help))
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        f.render_widget(help_popup, popup_area);
    }
}
