//! Campaign list state: filter, page, fetch scheduling and client-side sort.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::models::{Campaign, CampaignFilter, CampaignPage, CampaignType, ListQuery};

/// Filter selection plus current page.
///
/// Any change to the filter sends the page back to 0. Every change of the
/// (filter, page) pair schedules exactly one fetch, collected with
/// [`FilterState::take_fetch`].
#[derive(Debug, Clone)]
pub struct FilterState {
    filter: CampaignFilter,
    page: usize,
    page_size: usize,
    fetch_pending: bool,
}

impl FilterState {
    /// Starts on page 0 with no filter and a fetch already scheduled
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: CampaignFilter::default(),
            page: 0,
            page_size: page_size.max(1),
            fetch_pending: true,
        }
    }

    pub fn filter(&self) -> &CampaignFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_active_filter(&self) -> bool {
        self.filter.is_active()
    }

    /// Replace the whole filter tuple
    pub fn apply(&mut self, filter: CampaignFilter) {
        self.filter = filter;
        self.page = 0;
        self.fetch_pending = true;
    }

    pub fn set_campaign_type(&mut self, campaign_type: Option<CampaignType>) {
        let filter = CampaignFilter {
            campaign_type,
            ..self.filter.clone()
        };
        self.apply(filter);
    }

    pub fn set_start_date(&mut self, start_date: Option<NaiveDate>) {
        let filter = CampaignFilter {
            start_date,
            ..self.filter.clone()
        };
        self.apply(filter);
    }

    pub fn set_end_date(&mut self, end_date: Option<NaiveDate>) {
        let filter = CampaignFilter {
            end_date,
            ..self.filter.clone()
        };
        self.apply(filter);
    }

    /// Clear every filter field
    pub fn reset(&mut self) {
        self.apply(CampaignFilter::default());
    }

    /// Step through "all", then each known type, then back to "all"
    pub fn cycle_campaign_type(&mut self) {
        let next = match self.filter.campaign_type {
            None => Some(CampaignType::Monthly),
            Some(CampaignType::Monthly) => Some(CampaignType::Biweekly),
            Some(_) => None,
        };
        self.set_campaign_type(next);
    }

    /// Jump to a page; the filter is left alone
    pub fn set_page(&mut self, page: usize) {
        if page != self.page {
            self.page = page;
            self.fetch_pending = true;
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self, total: usize) -> bool {
        (self.page + 1) * self.page_size < total
    }

    /// Returns false when already on the first page
    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.set_page(self.page - 1);
        true
    }

    /// Returns false when the current page is the last one for `total`
    pub fn next_page(&mut self, total: usize) -> bool {
        if !self.has_next(total) {
            return false;
        }
        self.set_page(self.page + 1);
        true
    }

    /// Number of pages needed for `total` records, at least one
    pub fn total_pages(&self, total: usize) -> usize {
        ((total + self.page_size - 1) / self.page_size).max(1)
    }

    /// Schedule a fetch of the current page without changing anything
    pub fn refresh(&mut self) {
        self.fetch_pending = true;
    }

    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.page, self.page_size).with_filter(self.filter.clone())
    }

    /// Query to run if a fetch is pending; clears the pending flag
    pub fn take_fetch(&mut self) -> Option<ListQuery> {
        if self.fetch_pending {
            self.fetch_pending = false;
            Some(self.query())
        } else {
            None
        }
    }
}

/// Progress of a single remote load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Failed(String),
    Loaded(T),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// What the list view shows. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Error,
    Ready,
    Empty,
}

impl LoadState<CampaignPage> {
    pub fn view(&self) -> ListView {
        match self {
            LoadState::Idle | LoadState::Loading => ListView::Loading,
            LoadState::Failed(_) => ListView::Error,
            LoadState::Loaded(page) if page.records.is_empty() => ListView::Empty,
            LoadState::Loaded(_) => ListView::Ready,
        }
    }
}

/// Sortable list columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Type,
    Start,
    End,
    Impacts,
    Reach,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::Name,
        SortColumn::Type,
        SortColumn::Start,
        SortColumn::End,
        SortColumn::Impacts,
        SortColumn::Reach,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SortColumn::Name => "Name",
            SortColumn::Type => "Type",
            SortColumn::Start => "Start",
            SortColumn::End => "End",
            SortColumn::Impacts => "Impacts",
            SortColumn::Reach => "Reach",
        }
    }

    pub fn parse(value: &str) -> Option<SortColumn> {
        match value.to_lowercase().as_str() {
            "name" => Some(SortColumn::Name),
            "type" => Some(SortColumn::Type),
            "start" => Some(SortColumn::Start),
            "end" => Some(SortColumn::End),
            "impacts" => Some(SortColumn::Impacts),
            "reach" => Some(SortColumn::Reach),
            _ => None,
        }
    }

    fn compare(&self, a: &Campaign, b: &Campaign) -> Ordering {
        match self {
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Type => a.campaign_type.as_str().cmp(b.campaign_type.as_str()),
            SortColumn::Start => a.start_date.cmp(&b.start_date),
            SortColumn::End => a.end_date.cmp(&b.end_date),
            SortColumn::Impacts => a.metrics.people_impacts.cmp(&b.metrics.people_impacts),
            SortColumn::Reach => a.metrics.reach.cmp(&b.metrics.reach),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort applied to the rows of the current page only. Changing it never
/// triggers a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(SortColumn, SortDirection)>,
}

impl SortState {
    pub fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            active: Some((column, direction)),
        }
    }

    pub fn active(&self) -> Option<(SortColumn, SortDirection)> {
        self.active
    }

    /// Header click: ascending, then descending, then unsorted. Picking a
    /// different column starts over at ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        self.active = match self.active {
            Some((current, SortDirection::Ascending)) if current == column => {
                Some((column, SortDirection::Descending))
            }
            Some((current, SortDirection::Descending)) if current == column => None,
            _ => Some((column, SortDirection::Ascending)),
        };
    }

    pub fn direction_of(&self, column: SortColumn) -> Option<SortDirection> {
        match self.active {
            Some((current, direction)) if current == column => Some(direction),
            _ => None,
        }
    }

    /// Rows in display order. Unsorted keeps server order; ties keep it too.
    pub fn apply<'a>(&self, records: &'a [Campaign]) -> Vec<&'a Campaign> {
        let mut rows: Vec<&Campaign> = records.iter().collect();
        if let Some((column, direction)) = self.active {
            rows.sort_by(|a, b| {
                let ordering = column.compare(a, b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn campaign(name: &str, impacts: i64, start: NaiveDate) -> Campaign {
        let mut c = Campaign::new(name, CampaignType::Monthly, start, date(12, 31));
        c.metrics.people_impacts = impacts;
        c
    }

    #[test]
    fn test_every_filter_change_resets_page() {
        let mut state = FilterState::new(5);
        state.take_fetch();

        state.set_page(3);
        state.set_campaign_type(Some(CampaignType::Monthly));
        assert_eq!(state.page(), 0);

        state.set_page(2);
        state.set_start_date(Some(date(1, 1)));
        assert_eq!(state.page(), 0);

        state.set_page(2);
        state.set_end_date(Some(date(6, 30)));
        assert_eq!(state.page(), 0);

        state.set_page(4);
        state.reset();
        assert_eq!(state.page(), 0);
        assert!(!state.has_active_filter());
    }

    #[test]
    fn test_page_change_keeps_filter() {
        let mut state = FilterState::new(5);
        state.set_campaign_type(Some(CampaignType::Biweekly));
        state.set_page(2);
        assert_eq!(state.filter().campaign_type, Some(CampaignType::Biweekly));
        assert_eq!(state.query().offset(), 10);
    }

    #[test]
    fn test_each_change_schedules_one_fetch() {
        let mut state = FilterState::new(5);
        assert!(state.take_fetch().is_some());
        assert!(state.take_fetch().is_none());

        state.cycle_campaign_type();
        let query = state.take_fetch().unwrap();
        assert_eq!(query.filter.campaign_type, Some(CampaignType::Monthly));
        assert!(state.take_fetch().is_none());

        // Same page again is not a change
        state.set_page(0);
        assert!(state.take_fetch().is_none());

        state.refresh();
        assert!(state.take_fetch().is_some());
    }

    #[test]
    fn test_page_bounds() {
        let mut state = FilterState::new(5);
        assert!(!state.has_previous());
        assert!(!state.previous_page());

        assert!(state.has_next(12));
        assert!(state.next_page(12));
        assert!(state.next_page(12));
        assert_eq!(state.page(), 2);
        // 15 >= 12: page 2 is the last
        assert!(!state.has_next(12));
        assert!(!state.next_page(12));
        assert!(state.has_previous());

        let exact = FilterState::new(5);
        assert!(!exact.has_next(5));
        assert!(!exact.has_next(0));
        assert_eq!(exact.total_pages(0), 1);
        assert_eq!(exact.total_pages(12), 3);
    }

    #[test]
    fn test_type_cycle_returns_to_all() {
        let mut state = FilterState::new(5);
        state.cycle_campaign_type();
        state.cycle_campaign_type();
        assert_eq!(state.filter().campaign_type, Some(CampaignType::Biweekly));
        state.cycle_campaign_type();
        assert_eq!(state.filter().campaign_type, None);
    }

    #[test]
    fn test_list_view_states() {
        assert_eq!(LoadState::<CampaignPage>::Idle.view(), ListView::Loading);
        assert_eq!(LoadState::<CampaignPage>::Loading.view(), ListView::Loading);
        assert_eq!(
            LoadState::<CampaignPage>::Failed("down".to_string()).view(),
            ListView::Error
        );
        assert_eq!(LoadState::Loaded(CampaignPage::default()).view(), ListView::Empty);

        let page = CampaignPage {
            records: vec![campaign("a", 1, date(1, 1))],
            total: 1,
        };
        assert_eq!(LoadState::Loaded(page).view(), ListView::Ready);
    }

    #[test]
    fn test_sort_toggle_cycle() {
        let mut sort = SortState::default();
        sort.toggle(SortColumn::Impacts);
        assert_eq!(sort.direction_of(SortColumn::Impacts), Some(SortDirection::Ascending));
        sort.toggle(SortColumn::Impacts);
        assert_eq!(sort.direction_of(SortColumn::Impacts), Some(SortDirection::Descending));
        sort.toggle(SortColumn::Impacts);
        assert_eq!(sort.active(), None);

        sort.toggle(SortColumn::Impacts);
        sort.toggle(SortColumn::Name);
        assert_eq!(sort.active(), Some((SortColumn::Name, SortDirection::Ascending)));
    }

    fn names(rows: Vec<&Campaign>) -> Vec<String> {
        rows.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_sort_orders_current_page_only() {
        let records = vec![
            campaign("b", 30, date(3, 1)),
            campaign("a", 10, date(1, 1)),
            campaign("c", 20, date(2, 1)),
        ];

        assert_eq!(names(SortState::default().apply(&records)), vec!["b", "a", "c"]);
        assert_eq!(
            names(SortState::by(SortColumn::Impacts, SortDirection::Descending).apply(&records)),
            vec!["b", "c", "a"]
        );
        assert_eq!(
            names(SortState::by(SortColumn::Start, SortDirection::Ascending).apply(&records)),
            vec!["a", "c", "b"]
        );
        // Input order untouched
        assert_eq!(records[0].name, "b");
    }
}
