//! Campaign detail: summary, demographic charts, top sites and periods

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::listing::LoadState;
use crate::models::{CampaignDetail, CampaignSite};
use crate::report::{Bucket, DetailReport, PeriodPoint};
use crate::tui::{
    app::Screen,
    traits::{ScreenAction, ScreenHandler},
    ui::{format_count, truncate, Styles},
};

/// Detail screen state
pub struct DetailScreen {
    pub name: Option<String>,
    pub detail: LoadState<CampaignDetail>,
}

impl Default for DetailScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// A chart block that has something to draw
enum Panel<'a> {
    Ages(&'a [Bucket]),
    Nse(&'a [Bucket]),
    Sites(&'a [CampaignSite]),
    Periods(&'a [PeriodPoint]),
}

impl DetailScreen {
    pub fn new() -> Self {
        Self {
            name: None,
            detail: LoadState::Idle,
        }
    }

    pub fn set_loading(&mut self, name: &str) {
        self.name = Some(name.to_string());
        self.detail = LoadState::Loading;
    }

    fn draw_summary(f: &mut Frame, area: Rect, report: &DetailReport) {
        let c = report.campaign;
        let m = &c.metrics;
        let field = |label: &'static str, value: String| {
            vec![Span::styled(format!("{:<22}", label), Styles::title()), Span::raw(value)]
        };
        let lines = vec![
            Line::from(field("Type", c.campaign_type.label().to_string())),
            Line::from(field(
                "Dates",
                format!("{} to {}", c.start_date.format("%Y-%m-%d"), c.end_date.format("%Y-%m-%d")),
            )),
            Line::from(field("Metro universe", format_count(m.metro_universe))),
            Line::from(field(
                "Impacts",
                format!(
                    "{} people / {} vehicles",
                    format_count(m.people_impacts),
                    format_count(m.vehicle_impacts)
                ),
            )),
            Line::from(field("Reach", format_count(m.reach))),
            Line::from(field(
                "Frequency",
                format!("{:.2} calculated / {:.2} average", m.calculated_frequency, m.average_frequency),
            )),
            Line::from(field(
                "Gender",
                format!(
                    "{:.1}% men / {:.1}% women",
                    c.demographics.men * 100.0,
                    c.demographics.women * 100.0
                ),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title(format!("Campaign: {}", c.name))
                .borders(Borders::ALL)
                .border_style(Styles::active_border()),
        );
        f.render_widget(paragraph, area);
    }

    fn draw_distribution(f: &mut Frame, area: Rect, title: &str, buckets: &[Bucket]) {
        let data: Vec<(&str, u64)> = buckets.iter().map(|b| (b.label, b.percent())).collect();
        let chart = BarChart::default()
            .block(Block::default().title(format!("{} (%)", title)).borders(Borders::ALL))
            .data(data.as_slice())
            .bar_width(5)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
        f.render_widget(chart, area);
    }

    fn draw_sites(f: &mut Frame, area: Rect, sites: &[CampaignSite]) {
        let header = Row::new(vec!["Site", "Municipality", "Monthly impacts", "Monthly reach"])
            .style(Styles::title());
        let rows: Vec<Row> = sites
            .iter()
            .map(|site| {
                let r = &site.record;
                Row::new(vec![
                    Cell::from(truncate(&r.code, 14)),
                    Cell::from(truncate(&r.municipality, 18)),
                    Cell::from(format_count(r.monthly_impacts)),
                    Cell::from(format!("{:.0}", r.monthly_reach)),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(14),
            Constraint::Min(12),
            Constraint::Length(16),
            Constraint::Length(14),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title("Top sites").borders(Borders::ALL));
        f.render_widget(table, area);
    }

    fn draw_periods(f: &mut Frame, area: Rect, periods: &[PeriodPoint]) {
        let people: Vec<(f64, f64)> = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.people_impacts as f64))
            .collect();
        let vehicles: Vec<(f64, f64)> = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.vehicle_impacts as f64))
            .collect();
        let max = periods
            .iter()
            .map(|p| p.people_impacts.max(p.vehicle_impacts))
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        let x_max = (periods.len().saturating_sub(1)).max(1) as f64;

        let first = periods.first().map(|p| p.label.clone()).unwrap_or_default();
        let last = periods.last().map(|p| p.label.clone()).unwrap_or_default();

        let datasets = vec![
            Dataset::default()
                .name("People")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&people),
            Dataset::default()
                .name("Vehicles")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Magenta))
                .data(&vehicles),
        ];
        let chart = Chart::new(datasets)
            .block(Block::default().title("Impacts per period").borders(Borders::ALL))
            .x_axis(
                Axis::default()
                    .bounds([0.0, x_max])
                    .labels(vec![Span::raw(first), Span::raw(last)]),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, max])
                    .labels(vec![Span::raw("0"), Span::raw(format_count(max as i64))]),
            );
        f.render_widget(chart, area);
    }

    fn draw_report(f: &mut Frame, area: Rect, report: &DetailReport) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(area);
        Self::draw_summary(f, chunks[0], report);

        let mut blocks = Vec::new();
        if let Some(ref ages) = report.ages {
            blocks.push(Panel::Ages(ages));
        }
        if let Some(ref nse) = report.nse {
            blocks.push(Panel::Nse(nse));
        }
        if let Some(sites) = report.sites {
            blocks.push(Panel::Sites(sites));
        }
        if let Some(ref periods) = report.periods {
            blocks.push(Panel::Periods(periods));
        }

        if blocks.is_empty() {
            f.render_widget(
                Paragraph::new("No demographic, site or period data for this campaign")
                    .style(Styles::inactive())
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
            return;
        }

        // Two blocks per row
        let row_count = (blocks.len() + 1) / 2;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, row_count as u32); row_count])
            .split(chunks[1]);
        for (row, pair) in rows.iter().zip(blocks.chunks(2)) {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, pair.len() as u32); pair.len()])
                .split(*row);
            for (cell, block) in cells.iter().zip(pair) {
                match block {
                    Panel::Ages(buckets) => Self::draw_distribution(f, *cell, "Age", buckets),
                    Panel::Nse(buckets) => Self::draw_distribution(f, *cell, "NSE", buckets),
                    Panel::Sites(sites) => Self::draw_sites(f, *cell, sites),
                    Panel::Periods(periods) => Self::draw_periods(f, *cell, periods),
                }
            }
        }
    }
}

impl ScreenHandler for DetailScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let name = self.name.clone().unwrap_or_default();
        match self.detail {
            LoadState::Idle | LoadState::Loading => f.render_widget(
                Paragraph::new(format!("Loading {}...", name))
                    .style(Styles::info())
                    .block(Block::default().title("Campaign").borders(Borders::ALL)),
                area,
            ),
            LoadState::Failed(ref reason) => f.render_widget(
                Paragraph::new(format!("{}\n\nr: retry | Esc: back to list", reason))
                    .style(Styles::error())
                    .block(Block::default().title(format!("Campaign: {}", name)).borders(Borders::ALL)),
                area,
            ),
            LoadState::Loaded(ref detail) => {
                let report = DetailReport::build(detail);
                Self::draw_report(f, area, &report);
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        if self.detail.is_loading() {
            return ScreenAction::None;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => ScreenAction::NavigateTo(Screen::Dashboard),
            KeyCode::Char('e') if self.detail.loaded().is_some() => ScreenAction::Export,
            KeyCode::Char('r') => match self.name {
                Some(ref name) => ScreenAction::OpenDetail(name.clone()),
                None => ScreenAction::None,
            },
            KeyCode::Char('q') => ScreenAction::Quit,
            _ => ScreenAction::None,
        }
    }

    fn screen_type(&self) -> Screen {
        Screen::Detail
    }

    fn help(&self) -> &'static str {
        "Campaign Details:\n\
        e - Export CSV report\n\
        r - Reload\n\
        Esc / Backspace - Back to list\n\
        q - Quit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, CampaignType};
    use chrono::NaiveDate;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn loaded() -> DetailScreen {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut campaign = Campaign::new("verano", CampaignType::Monthly, date, date);
        campaign.demographics.age_25_34 = 0.4;
        let mut screen = DetailScreen::new();
        screen.set_loading("verano");
        screen.detail = LoadState::Loaded(CampaignDetail {
            campaign,
            periods: vec![],
            sites: vec![],
        });
        screen
    }

    #[test]
    fn test_export_only_when_loaded() {
        let mut screen = DetailScreen::new();
        screen.detail = LoadState::Failed("gone".to_string());
        let key = KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE);
        assert_eq!(screen.handle_key_event(key), ScreenAction::None);

        let mut screen = loaded();
        assert_eq!(screen.handle_key_event(key), ScreenAction::Export);
    }

    #[test]
    fn test_renders_only_blocks_with_data() {
        let mut screen = loaded();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|f| {
                let area = f.size();
                screen.draw(f, area);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Campaign: verano"));
        assert!(text.contains("Age (%)"));
        assert!(!text.contains("NSE (%)"));
        assert!(!text.contains("Top sites"));
    }
}
