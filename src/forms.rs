//! Create-campaign form: editable text fields, the two repeatable sub-lists
//! and the conversion into a [`NewCampaign`] request body.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Campaign, CampaignMetrics, CampaignType, Demographics, NewCampaign, PeriodRecord, SiteRecord};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(String),

    #[error("{field}: '{value}' is not a valid date (YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },

    #[error("{field}: '{value}' is not a valid number")]
    InvalidNumber { field: String, value: String },

    #[error("{field}: '{value}' is not a campaign type (mensual, catorcenal)")]
    InvalidCampaignType { field: String, value: String },
}

/// How a field's text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    CampaignType,
    Date,
    Integer,
    Decimal,
}

impl FieldKind {
    pub fn placeholder(&self) -> &'static str {
        match self {
            FieldKind::Text => "",
            FieldKind::CampaignType => "mensual / catorcenal",
            FieldKind::Date => "YYYY-MM-DD",
            FieldKind::Integer | FieldKind::Decimal => "0",
        }
    }
}

type FieldDef = (&'static str, FieldKind, bool);

const CAMPAIGN_FIELDS: [FieldDef; 25] = [
    ("Name", FieldKind::Text, true),
    ("Type", FieldKind::CampaignType, true),
    ("Start date", FieldKind::Date, true),
    ("End date", FieldKind::Date, true),
    ("Metro universe", FieldKind::Integer, false),
    ("People impacts", FieldKind::Integer, false),
    ("Vehicle impacts", FieldKind::Integer, false),
    ("Calculated frequency", FieldKind::Decimal, false),
    ("Average frequency", FieldKind::Decimal, false),
    ("Reach", FieldKind::Integer, false),
    ("NSE AB", FieldKind::Decimal, false),
    ("NSE C", FieldKind::Decimal, false),
    ("NSE C+", FieldKind::Decimal, false),
    ("NSE D", FieldKind::Decimal, false),
    ("NSE D+", FieldKind::Decimal, false),
    ("NSE E", FieldKind::Decimal, false),
    ("Age 0-14", FieldKind::Decimal, false),
    ("Age 15-19", FieldKind::Decimal, false),
    ("Age 20-24", FieldKind::Decimal, false),
    ("Age 25-34", FieldKind::Decimal, false),
    ("Age 35-44", FieldKind::Decimal, false),
    ("Age 45-64", FieldKind::Decimal, false),
    ("Age 65+", FieldKind::Decimal, false),
    ("Men", FieldKind::Decimal, false),
    ("Women", FieldKind::Decimal, false),
];

const SITE_FIELDS: [FieldDef; 11] = [
    ("Site code", FieldKind::Text, false),
    ("Furniture type", FieldKind::Text, false),
    ("Ad type", FieldKind::Text, false),
    ("State", FieldKind::Text, false),
    ("Municipality", FieldKind::Text, false),
    ("Metro zone", FieldKind::Text, false),
    ("Biweekly frequency", FieldKind::Decimal, false),
    ("Monthly frequency", FieldKind::Decimal, false),
    ("Biweekly impacts", FieldKind::Integer, false),
    ("Monthly impacts", FieldKind::Integer, false),
    ("Monthly reach", FieldKind::Decimal, false),
];

const PERIOD_FIELDS: [FieldDef; 3] = [
    ("Period", FieldKind::Text, false),
    ("People impacts", FieldKind::Integer, false),
    ("Vehicle impacts", FieldKind::Integer, false),
];

/// One editable input. The cursor counts characters, not bytes.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub cursor_position: usize,
}

impl FormField {
    pub fn new(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            required: false,
            value: String::new(),
            cursor_position: 0,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self.cursor_position = value.chars().count();
        self
    }

    fn from_def((label, kind, required): FieldDef) -> Self {
        Self {
            required,
            ..Self::new(label, kind)
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor_position);
        self.value.insert(at, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_position = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Field-level validation, for highlighting as the user types
    pub fn check(&self) -> Result<(), FormError> {
        self.check_as(self.label)
    }

    fn check_as(&self, name: &str) -> Result<(), FormError> {
        let value = self.value.trim();
        if value.is_empty() {
            return if self.required {
                Err(FormError::Required(name.to_string()))
            } else {
                Ok(())
            };
        }
        match self.kind {
            FieldKind::Date => parse_date(name, value).map(|_| ()),
            FieldKind::Integer => parse_integer(name, value).map(|_| ()),
            FieldKind::Decimal => parse_decimal(name, value).map(|_| ()),
            FieldKind::CampaignType => parse_campaign_type(name, value).map(|_| ()),
            FieldKind::Text => Ok(()),
        }
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| FormError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_campaign_type(field: &str, value: &str) -> Result<CampaignType, FormError> {
    match CampaignType::from(value.to_string()) {
        CampaignType::Other(_) => Err(FormError::InvalidCampaignType {
            field: field.to_string(),
            value: value.to_string(),
        }),
        known => Ok(known),
    }
}

fn parse_integer(field: &str, value: &str) -> Result<i64, FormError> {
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| FormError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(field: &str, value: &str) -> Result<f64, FormError> {
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(FormError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Reads a block of fields in table order, parsing each by its position.
struct FieldReader<'a> {
    fields: std::slice::Iter<'a, FormField>,
    prefix: String,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a [FormField], prefix: String) -> Self {
        Self {
            fields: fields.iter(),
            prefix,
        }
    }

    fn next(&mut self) -> Result<(String, &'a str), FormError> {
        let field = match self.fields.next() {
            Some(field) => field,
            None => return Ok((String::new(), "")),
        };
        let name = format!("{}{}", self.prefix, field.label);
        field.check_as(&name)?;
        Ok((name, field.value.trim()))
    }

    fn text(&mut self) -> Result<String, FormError> {
        Ok(self.next()?.1.to_string())
    }

    fn campaign_type(&mut self) -> Result<CampaignType, FormError> {
        let (name, value) = self.next()?;
        parse_campaign_type(&name, value)
    }

    fn date(&mut self) -> Result<NaiveDate, FormError> {
        let (name, value) = self.next()?;
        parse_date(&name, value)
    }

    fn integer(&mut self) -> Result<i64, FormError> {
        let (name, value) = self.next()?;
        parse_integer(&name, value)
    }

    fn decimal(&mut self) -> Result<f64, FormError> {
        let (name, value) = self.next()?;
        parse_decimal(&name, value)
    }
}

/// Where a flat field index points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    Campaign(usize),
    Site { entry: usize, field: usize },
    Period { entry: usize, field: usize },
}

/// The whole create form. Fields are addressed by one flat index running
/// through the campaign block, then every site, then every period.
#[derive(Debug, Clone)]
pub struct CampaignForm {
    pub fields: Vec<FormField>,
    pub sites: Vec<Vec<FormField>>,
    pub periods: Vec<Vec<FormField>>,
    focus: usize,
}

impl Default for CampaignForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignForm {
    pub fn new() -> Self {
        Self {
            fields: CAMPAIGN_FIELDS.iter().copied().map(FormField::from_def).collect(),
            sites: Vec::new(),
            periods: Vec::new(),
            focus: 0,
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len() + self.sites.len() * SITE_FIELDS.len() + self.periods.len() * PERIOD_FIELDS.len()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn set_focus(&mut self, index: usize) {
        if index < self.field_count() {
            self.focus = index;
        }
    }

    pub fn locate(&self, index: usize) -> Option<FieldLocation> {
        if index < self.fields.len() {
            return Some(FieldLocation::Campaign(index));
        }
        let index = index - self.fields.len();
        let site_span = self.sites.len() * SITE_FIELDS.len();
        if index < site_span {
            return Some(FieldLocation::Site {
                entry: index / SITE_FIELDS.len(),
                field: index % SITE_FIELDS.len(),
            });
        }
        let index = index - site_span;
        if index < self.periods.len() * PERIOD_FIELDS.len() {
            return Some(FieldLocation::Period {
                entry: index / PERIOD_FIELDS.len(),
                field: index % PERIOD_FIELDS.len(),
            });
        }
        None
    }

    pub fn field(&self, index: usize) -> Option<&FormField> {
        match self.locate(index)? {
            FieldLocation::Campaign(i) => self.fields.get(i),
            FieldLocation::Site { entry, field } => self.sites.get(entry)?.get(field),
            FieldLocation::Period { entry, field } => self.periods.get(entry)?.get(field),
        }
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut FormField> {
        match self.locate(index)? {
            FieldLocation::Campaign(i) => self.fields.get_mut(i),
            FieldLocation::Site { entry, field } => self.sites.get_mut(entry)?.get_mut(field),
            FieldLocation::Period { entry, field } => self.periods.get_mut(entry)?.get_mut(field),
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.field(self.focus)
    }

    pub fn focused_mut(&mut self) -> Option<&mut FormField> {
        self.field_mut(self.focus)
    }

    /// Append an empty site and move the focus to it
    pub fn add_site(&mut self) {
        self.sites.push(SITE_FIELDS.iter().copied().map(FormField::from_def).collect());
        self.focus = self.fields.len() + (self.sites.len() - 1) * SITE_FIELDS.len();
    }

    /// Append an empty period and move the focus to it
    pub fn add_period(&mut self) {
        self.periods.push(PERIOD_FIELDS.iter().copied().map(FormField::from_def).collect());
        self.focus = self.fields.len() + self.sites.len() * SITE_FIELDS.len() + (self.periods.len() - 1) * PERIOD_FIELDS.len();
    }

    pub fn remove_site(&mut self, index: usize) -> bool {
        if index >= self.sites.len() {
            return false;
        }
        self.sites.remove(index);
        self.clamp_focus();
        true
    }

    pub fn remove_period(&mut self, index: usize) -> bool {
        if index >= self.periods.len() {
            return false;
        }
        self.periods.remove(index);
        self.clamp_focus();
        true
    }

    /// Remove the site or period holding the focus. Campaign fields are
    /// never removed.
    pub fn remove_focused_entry(&mut self) -> bool {
        match self.locate(self.focus) {
            Some(FieldLocation::Site { entry, .. }) => {
                self.focus = self.fields.len() + entry * SITE_FIELDS.len();
                self.remove_site(entry)
            }
            Some(FieldLocation::Period { entry, .. }) => {
                self.focus = self.fields.len() + self.sites.len() * SITE_FIELDS.len() + entry * PERIOD_FIELDS.len();
                self.remove_period(entry)
            }
            _ => false,
        }
    }

    fn clamp_focus(&mut self) {
        let count = self.field_count();
        if self.focus >= count {
            self.focus = count.saturating_sub(1);
        }
    }

    /// Labels of the required fields still empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.required && field.is_empty())
            .map(|field| field.label)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.to_new_campaign().is_ok()
    }

    /// Build the request body. Empty numeric inputs become 0.
    pub fn to_new_campaign(&self) -> Result<NewCampaign, FormError> {
        let mut r = FieldReader::new(&self.fields, String::new());

        let name = r.text()?;
        let campaign_type = r.campaign_type()?;
        let start_date = r.date()?;
        let end_date = r.date()?;
        let metrics = CampaignMetrics {
            metro_universe: r.integer()?,
            people_impacts: r.integer()?,
            vehicle_impacts: r.integer()?,
            calculated_frequency: r.decimal()?,
            average_frequency: r.decimal()?,
            reach: r.integer()?,
        };
        let demographics = Demographics {
            nse_ab: r.decimal()?,
            nse_c: r.decimal()?,
            nse_c_plus: r.decimal()?,
            nse_d: r.decimal()?,
            nse_d_plus: r.decimal()?,
            nse_e: r.decimal()?,
            age_0_14: r.decimal()?,
            age_15_19: r.decimal()?,
            age_20_24: r.decimal()?,
            age_25_34: r.decimal()?,
            age_35_44: r.decimal()?,
            age_45_64: r.decimal()?,
            age_65_plus: r.decimal()?,
            men: r.decimal()?,
            women: r.decimal()?,
        };

        let mut sites = Vec::with_capacity(self.sites.len());
        for (i, entry) in self.sites.iter().enumerate() {
            let mut r = FieldReader::new(entry, format!("Site {} ", i + 1));
            sites.push(SiteRecord {
                code: r.text()?,
                furniture_type: r.text()?,
                ad_type: r.text()?,
                state: r.text()?,
                municipality: r.text()?,
                metro_zone: r.text()?,
                biweekly_frequency: r.decimal()?,
                monthly_frequency: r.decimal()?,
                biweekly_impacts: r.integer()?,
                monthly_impacts: r.integer()?,
                monthly_reach: r.decimal()?,
            });
        }

        let mut periods = Vec::with_capacity(self.periods.len());
        for (i, entry) in self.periods.iter().enumerate() {
            let mut r = FieldReader::new(entry, format!("Period {} ", i + 1));
            periods.push(PeriodRecord {
                period: r.text()?,
                people_impacts: r.integer()?,
                vehicle_impacts: r.integer()?,
            });
        }

        Ok(NewCampaign {
            campaign: Campaign {
                name,
                campaign_type,
                start_date,
                end_date,
                metrics,
                demographics,
            },
            sites,
            periods,
        })
    }
}

/// Required-field check for a body that did not come through the form
pub fn validate_new_campaign(campaign: &NewCampaign) -> Result<(), FormError> {
    if campaign.campaign.name.trim().is_empty() {
        return Err(FormError::Required("Name".to_string()));
    }
    if let CampaignType::Other(ref value) = campaign.campaign.campaign_type {
        if value.trim().is_empty() {
            return Err(FormError::Required("Type".to_string()));
        }
        return Err(FormError::InvalidCampaignType {
            field: "Type".to_string(),
            value: value.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut CampaignForm, index: usize, text: &str) {
        form.set_focus(index);
        let field = form.focused_mut().unwrap();
        field.clear();
        for c in text.chars() {
            field.insert_char(c);
        }
    }

    fn filled() -> CampaignForm {
        let mut form = CampaignForm::new();
        type_into(&mut form, 0, "verano");
        type_into(&mut form, 1, "mensual");
        type_into(&mut form, 2, "2025-06-01");
        type_into(&mut form, 3, "2025-08-31");
        form
    }

    #[test]
    fn test_submission_blocked_until_required_fields_set() {
        let mut form = CampaignForm::new();
        assert!(!form.is_valid());
        assert_eq!(form.missing_required(), vec!["Name", "Type", "Start date", "End date"]);

        type_into(&mut form, 0, "verano");
        type_into(&mut form, 1, "mensual");
        type_into(&mut form, 2, "2025-06-01");
        assert!(!form.is_valid());
        assert_eq!(
            form.to_new_campaign().unwrap_err(),
            FormError::Required("End date".to_string())
        );

        type_into(&mut form, 3, "2025-08-31");
        assert!(form.is_valid());
        assert!(form.missing_required().is_empty());
    }

    #[test]
    fn test_whitespace_does_not_satisfy_required() {
        let mut form = filled();
        type_into(&mut form, 0, "   ");
        assert!(!form.is_valid());
    }

    #[test]
    fn test_numeric_fields_default_to_zero() {
        let body = filled().to_new_campaign().unwrap();
        assert_eq!(body.campaign.campaign_type, CampaignType::Monthly);
        assert_eq!(body.campaign.metrics, CampaignMetrics::default());
        assert_eq!(body.campaign.demographics.women, 0.0);
        assert!(body.sites.is_empty());
        assert!(body.periods.is_empty());
    }

    #[test]
    fn test_bad_date_and_number_are_reported() {
        let mut form = filled();
        type_into(&mut form, 2, "01/06/2025");
        assert!(matches!(
            form.to_new_campaign().unwrap_err(),
            FormError::InvalidDate { ref field, .. } if field == "Start date"
        ));

        let mut form = filled();
        type_into(&mut form, 5, "12k");
        assert!(matches!(
            form.to_new_campaign().unwrap_err(),
            FormError::InvalidNumber { ref field, .. } if field == "People impacts"
        ));
    }

    #[test]
    fn test_campaign_type_outside_known_set_is_rejected() {
        let mut form = filled();
        type_into(&mut form, 1, "banana");
        assert!(!form.is_valid());
        assert_eq!(
            form.to_new_campaign().unwrap_err(),
            FormError::InvalidCampaignType {
                field: "Type".to_string(),
                value: "banana".to_string()
            }
        );

        type_into(&mut form, 1, "Catorcenal");
        assert_eq!(
            form.to_new_campaign().unwrap().campaign.campaign_type,
            CampaignType::Biweekly
        );
    }

    #[test]
    fn test_sub_lists_add_and_remove_by_position() {
        let mut form = filled();
        form.add_site();
        let first_site = form.focus();
        type_into(&mut form, first_site, "S1");
        form.add_site();
        let second_site = form.focus();
        type_into(&mut form, second_site, "S2");
        form.add_site();
        let third_site = form.focus();
        type_into(&mut form, third_site, "S3");
        form.add_period();
        let period = form.focus();
        type_into(&mut form, period, "2025-06");

        assert!(form.remove_site(1));
        assert!(!form.remove_site(5));

        let body = form.to_new_campaign().unwrap();
        let codes: Vec<&str> = body.sites.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["S1", "S3"]);
        assert_eq!(body.periods.len(), 1);
        assert_eq!(body.periods[0].period, "2025-06");
        assert_eq!(body.periods[0].people_impacts, 0);
    }

    #[test]
    fn test_sub_list_errors_name_the_entry() {
        let mut form = filled();
        form.add_period();
        let people = form.focus() + 1;
        type_into(&mut form, people, "many");
        assert_eq!(
            form.to_new_campaign().unwrap_err(),
            FormError::InvalidNumber {
                field: "Period 1 People impacts".to_string(),
                value: "many".to_string()
            }
        );
    }

    #[test]
    fn test_remove_focused_entry_keeps_focus_in_range() {
        let mut form = filled();
        form.add_period();
        form.set_focus(form.field_count() - 1);
        assert!(form.remove_focused_entry());
        assert_eq!(form.field_count(), CAMPAIGN_FIELDS.len());
        assert!(form.focus() < form.field_count());

        form.set_focus(0);
        assert!(!form.remove_focused_entry());
    }

    #[test]
    fn test_locate_walks_blocks_in_order() {
        let mut form = CampaignForm::new();
        form.add_site();
        form.add_period();
        assert_eq!(form.locate(0), Some(FieldLocation::Campaign(0)));
        assert_eq!(form.locate(25), Some(FieldLocation::Site { entry: 0, field: 0 }));
        assert_eq!(form.locate(36), Some(FieldLocation::Period { entry: 0, field: 0 }));
        assert_eq!(form.locate(39), None);
    }

    #[test]
    fn test_cursor_editing_handles_multibyte() {
        let mut field = FormField::new("Name", FieldKind::Text).with_value("Campaña");
        field.move_cursor_left();
        field.delete_char();
        assert_eq!(field.value, "Campaa");
        field.insert_char('ñ');
        assert_eq!(field.value, "Campaña");
        field.move_cursor_to_start();
        field.delete_char_forward();
        assert_eq!(field.value, "ampaña");
    }

    #[test]
    fn test_validate_new_campaign_requires_name() {
        let mut body = filled().to_new_campaign().unwrap();
        assert!(validate_new_campaign(&body).is_ok());
        body.campaign.name = " ".to_string();
        assert_eq!(
            validate_new_campaign(&body).unwrap_err(),
            FormError::Required("Name".to_string())
        );
    }

    #[test]
    fn test_validate_new_campaign_rejects_unknown_type() {
        let mut body = filled().to_new_campaign().unwrap();
        body.campaign.campaign_type = CampaignType::Other("banana".to_string());
        assert!(matches!(
            validate_new_campaign(&body).unwrap_err(),
            FormError::InvalidCampaignType { ref value, .. } if value == "banana"
        ));

        body.campaign.campaign_type = CampaignType::Other(String::new());
        assert_eq!(
            validate_new_campaign(&body).unwrap_err(),
            FormError::Required("Type".to_string())
        );
    }
}
