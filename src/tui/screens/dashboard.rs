//! Campaign list: filter bar, sortable table and page footer

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::forms::{FieldKind, FormField};
use crate::listing::{FilterState, ListView, LoadState, SortColumn, SortDirection, SortState};
use crate::models::CampaignPage;
use crate::tui::{
    app::Screen,
    handlers::CommonKeyHandler,
    traits::{Paginated, ScreenAction, ScreenHandler},
    ui::{format_count, render_input, truncate, Styles},
};

/// Which date bound the filter editor is changing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Dashboard screen state
pub struct DashboardScreen {
    pub filter: FilterState,
    pub campaigns: LoadState<CampaignPage>,
    pub sort: SortState,
    pub table_state: TableState,
    /// Total from the last successful load, kept while the next page loads
    pub last_total: usize,
    pub editing: Option<(DateBound, FormField)>,
}

impl DashboardScreen {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterState::new(page_size),
            campaigns: LoadState::Idle,
            sort: SortState::default(),
            table_state: TableState::default(),
            last_total: 0,
            editing: None,
        }
    }

    pub fn set_loading(&mut self) {
        self.campaigns = LoadState::Loading;
    }

    pub fn set_page(&mut self, page: CampaignPage) {
        self.last_total = page.total;
        self.table_state
            .select(if page.records.is_empty() { None } else { Some(0) });
        self.campaigns = LoadState::Loaded(page);
    }

    pub fn set_failed(&mut self, message: String) {
        self.table_state.select(None);
        self.campaigns = LoadState::Failed(message);
    }

    /// Name of the highlighted row, in display order
    pub fn selected_name(&self) -> Option<String> {
        let page = self.campaigns.loaded()?;
        let rows = self.sort.apply(&page.records);
        self.table_state
            .selected()
            .and_then(|i| rows.get(i))
            .map(|campaign| campaign.name.clone())
    }

    fn row_count(&self) -> usize {
        self.campaigns.loaded().map(|p| p.records.len()).unwrap_or(0)
    }

    fn select_next(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let i = self.table_state.selected().map(|i| (i + 1) % count).unwrap_or(0);
        self.table_state.select(Some(i));
    }

    fn select_previous(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn start_editing(&mut self, bound: DateBound) {
        let current = match bound {
            DateBound::Start => self.filter.filter().start_date,
            DateBound::End => self.filter.filter().end_date,
        };
        let label = match bound {
            DateBound::Start => "Start date filter",
            DateBound::End => "End date filter",
        };
        let value = current.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        self.editing = Some((bound, FormField::new(label, FieldKind::Date).with_value(&value)));
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> ScreenAction {
        let Some((bound, ref mut field)) = self.editing else {
            return ScreenAction::None;
        };
        match key.code {
            KeyCode::Esc => {
                self.editing = None;
            }
            KeyCode::Enter => {
                let text = field.value.trim().to_string();
                let date = if text.is_empty() {
                    None
                } else {
                    match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                        Ok(date) => Some(date),
                        Err(_) => {
                            return ScreenAction::SetError(format!(
                                "'{}' is not a date (YYYY-MM-DD)",
                                text
                            ))
                        }
                    }
                };
                self.editing = None;
                match bound {
                    DateBound::Start => self.filter.set_start_date(date),
                    DateBound::End => self.filter.set_end_date(date),
                }
            }
            KeyCode::Char(c) => field.insert_char(c),
            KeyCode::Backspace => field.delete_char(),
            KeyCode::Delete => field.delete_char_forward(),
            KeyCode::Left => field.move_cursor_left(),
            KeyCode::Right => field.move_cursor_right(),
            _ => {}
        }
        ScreenAction::None
    }

    fn filter_summary(&self) -> Line<'static> {
        let filter = self.filter.filter();
        let date = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "any".to_string());
        Line::from(vec![
            Span::styled("Type: ", Styles::title()),
            Span::raw(
                filter
                    .campaign_type
                    .as_ref()
                    .map(|t| t.label().to_string())
                    .unwrap_or_else(|| "All".to_string()),
            ),
            Span::styled("  Start: ", Styles::title()),
            Span::raw(date(filter.start_date)),
            Span::styled("  End: ", Styles::title()),
            Span::raw(date(filter.end_date)),
            Span::styled(
                "   [t] type  [s] start  [e] end  [c] clear",
                Styles::inactive(),
            ),
        ])
    }

    fn draw_table(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Campaigns")
            .borders(Borders::ALL)
            .border_style(Styles::active_border());

        let message = match self.campaigns.view() {
            ListView::Loading => Some(("Loading campaigns...".to_string(), Styles::info())),
            ListView::Error => {
                let reason = match self.campaigns {
                    LoadState::Failed(ref reason) => reason.clone(),
                    _ => String::new(),
                };
                Some((format!("Could not load campaigns: {}  (r: retry)", reason), Styles::error()))
            }
            ListView::Empty => Some(("No campaigns match the current filters".to_string(), Styles::inactive())),
            ListView::Ready => None,
        };
        if let Some((text, style)) = message {
            f.render_widget(Paragraph::new(text).style(style).block(block), area);
            return;
        }
        let Some(page) = self.campaigns.loaded() else {
            return;
        };

        let header = Row::new(SortColumn::ALL.iter().enumerate().map(|(i, column)| {
            let arrow = match self.sort.direction_of(*column) {
                Some(SortDirection::Ascending) => " ▲",
                Some(SortDirection::Descending) => " ▼",
                None => "",
            };
            Cell::from(format!("{} {}{}", i + 1, column.title(), arrow))
        }))
        .style(Styles::title());

        let rows: Vec<Row> = self
            .sort
            .apply(&page.records)
            .into_iter()
            .map(|campaign| {
                Row::new(vec![
                    Cell::from(truncate(&campaign.name, 30)),
                    Cell::from(campaign.campaign_type.label().to_string()),
                    Cell::from(campaign.start_date.format("%Y-%m-%d").to_string()),
                    Cell::from(campaign.end_date.format("%Y-%m-%d").to_string()),
                    Cell::from(format_count(campaign.metrics.people_impacts)),
                    Cell::from(format_count(campaign.metrics.reach)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .highlight_style(Styles::selected())
            .highlight_symbol("> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }
}

impl Paginated for DashboardScreen {
    fn get_current_page(&self) -> usize {
        self.filter.page()
    }

    fn set_current_page(&mut self, page: usize) {
        self.filter.set_page(page);
    }

    fn get_total_pages(&self) -> usize {
        self.filter.total_pages(self.last_total)
    }

    fn next_page(&mut self) -> bool {
        self.filter.next_page(self.last_total)
    }

    fn previous_page(&mut self) -> bool {
        self.filter.previous_page()
    }
}

impl ScreenHandler for DashboardScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        match self.editing {
            Some((_, ref field)) => render_input(f, chunks[0], field, true, false),
            None => f.render_widget(
                Paragraph::new(self.filter_summary())
                    .block(Block::default().title("Filters").borders(Borders::ALL)),
                chunks[0],
            ),
        }

        self.draw_table(f, chunks[1]);

        let mut footer = vec![Span::raw(format!(
            "Page {} of {} | {} campaigns",
            self.filter.page() + 1,
            self.filter.total_pages(self.last_total),
            self.last_total
        ))];
        let nav_style = |enabled: bool| if enabled { Styles::default() } else { Styles::inactive() };
        footer.push(Span::styled("  ← prev", nav_style(self.filter.has_previous())));
        footer.push(Span::styled("  next →", nav_style(self.filter.has_next(self.last_total))));
        footer.push(Span::styled(
            "  | Enter: details  1-6: sort  n: new  l: logout",
            Styles::inactive(),
        ));
        f.render_widget(Paragraph::new(Line::from(footer)), chunks[2]);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.editing.is_some() {
            return self.handle_editing_key(key);
        }
        if self.campaigns.is_loading() {
            return ScreenAction::None;
        }
        if let Some(action) = CommonKeyHandler::handle_pagination_keys(self, key) {
            return action;
        }

        match key.code {
            KeyCode::Up => self.select_previous(),
            KeyCode::Down => self.select_next(),
            KeyCode::Enter => {
                if let Some(name) = self.selected_name() {
                    return ScreenAction::OpenDetail(name);
                }
            }
            KeyCode::Char('t') => self.filter.cycle_campaign_type(),
            KeyCode::Char('s') => self.start_editing(DateBound::Start),
            KeyCode::Char('e') => self.start_editing(DateBound::End),
            KeyCode::Char('c') => {
                if self.filter.has_active_filter() {
                    self.filter.reset();
                }
            }
            KeyCode::Char('r') => self.filter.refresh(),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.sort.toggle(SortColumn::ALL[index]);
            }
            KeyCode::Char('n') => return ScreenAction::NavigateTo(Screen::Create),
            KeyCode::Char('l') => return ScreenAction::Logout,
            KeyCode::Char('q') => return ScreenAction::Quit,
            _ => {}
        }
        ScreenAction::None
    }

    fn screen_type(&self) -> Screen {
        Screen::Dashboard
    }

    fn help(&self) -> &'static str {
        "Campaign List:\n\
        ↑/↓ - Select campaign\n\
        Enter - Open campaign details\n\
        ←/→ or PgUp/PgDn - Previous / next page\n\
        t - Cycle campaign type filter\n\
        s / e - Edit start / end date filter\n\
        c - Clear all filters\n\
        1-6 - Sort current page by column\n\
        r - Reload page\n\
        n - New campaign\n\
        l - Log out\n\
        q - Quit"
    }

    fn on_enter(&mut self) {
        self.editing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, CampaignType};
    use crossterm::event::KeyModifiers;

    fn press(screen: &mut DashboardScreen, code: KeyCode) -> ScreenAction {
        screen.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn page(names: &[(&str, i64)], total: usize) -> CampaignPage {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        CampaignPage {
            records: names
                .iter()
                .map(|(name, impacts)| {
                    let mut c = Campaign::new(name, CampaignType::Monthly, date, date);
                    c.metrics.people_impacts = *impacts;
                    c
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn test_enter_opens_row_in_sorted_order() {
        let mut screen = DashboardScreen::new(5);
        screen.set_page(page(&[("a", 1), ("b", 3), ("c", 2)], 3));

        press(&mut screen, KeyCode::Char('5'));
        press(&mut screen, KeyCode::Char('5'));
        assert_eq!(
            screen.sort.active(),
            Some((SortColumn::Impacts, SortDirection::Descending))
        );
        assert_eq!(press(&mut screen, KeyCode::Enter), ScreenAction::OpenDetail("b".to_string()));

        press(&mut screen, KeyCode::Down);
        assert_eq!(screen.selected_name().as_deref(), Some("c"));
    }

    #[test]
    fn test_sorting_does_not_schedule_fetch() {
        let mut screen = DashboardScreen::new(5);
        screen.filter.take_fetch();
        screen.set_page(page(&[("a", 1)], 1));
        press(&mut screen, KeyCode::Char('1'));
        assert!(screen.filter.take_fetch().is_none());
    }

    #[test]
    fn test_paging_respects_total() {
        let mut screen = DashboardScreen::new(5);
        screen.filter.take_fetch();
        screen.set_page(page(&[("a", 1)], 12));

        assert!(matches!(press(&mut screen, KeyCode::Left), ScreenAction::SetStatus(_)));
        assert!(screen.filter.take_fetch().is_none());

        assert_eq!(press(&mut screen, KeyCode::Right), ScreenAction::None);
        assert_eq!(screen.filter.take_fetch().unwrap().offset(), 5);

        press(&mut screen, KeyCode::End);
        assert_eq!(screen.filter.page(), 2);
        screen.filter.take_fetch();

        // (2 + 1) * 5 >= 12: no next page
        assert!(matches!(press(&mut screen, KeyCode::Right), ScreenAction::SetStatus(_)));
        assert_eq!(screen.filter.page(), 2);
        assert!(screen.filter.take_fetch().is_none());
    }

    #[test]
    fn test_date_filter_editing() {
        let mut screen = DashboardScreen::new(5);
        screen.set_page(page(&[("a", 1)], 12));
        screen.filter.set_page(2);
        screen.filter.take_fetch();

        press(&mut screen, KeyCode::Char('s'));
        for c in "2025-03-01".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        press(&mut screen, KeyCode::Enter);

        assert!(screen.editing.is_none());
        assert_eq!(screen.filter.filter().start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(screen.filter.page(), 0);
        assert!(screen.filter.take_fetch().is_some());
    }

    #[test]
    fn test_invalid_date_keeps_editor_open() {
        let mut screen = DashboardScreen::new(5);
        press(&mut screen, KeyCode::Char('e'));
        for c in "03/2025".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        assert!(matches!(press(&mut screen, KeyCode::Enter), ScreenAction::SetError(_)));
        assert!(screen.editing.is_some());
        assert_eq!(screen.filter.filter().end_date, None);
    }

    #[test]
    fn test_keys_ignored_while_loading() {
        let mut screen = DashboardScreen::new(5);
        screen.set_loading();
        assert_eq!(press(&mut screen, KeyCode::Char('n')), ScreenAction::None);
    }
}
