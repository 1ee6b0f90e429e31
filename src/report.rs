//! Chart-ready projections of a campaign detail and the CSV report export.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::{Campaign, CampaignDetail, CampaignSite};

/// Sites shown in the site summary
pub const TOP_SITES: usize = 10;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One bar of a distribution chart. `value` is a fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: &'static str,
    pub value: f64,
}

impl Bucket {
    fn new(label: &'static str, value: f64) -> Self {
        Self { label, value }
    }

    /// Value as a whole percentage, for bar heights
    pub fn percent(&self) -> u64 {
        (self.value * 100.0).round().max(0.0) as u64
    }

    /// Text bar of at most `width` cells; values past 100% fill it
    pub fn text_bar(&self, width: usize) -> String {
        let filled = self.percent().min(100) as usize * width / 100;
        "#".repeat(filled)
    }
}

/// One point of the period time series
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodPoint {
    pub label: String,
    pub people_impacts: i64,
    pub vehicle_impacts: i64,
}

pub fn age_distribution(campaign: &Campaign) -> Vec<Bucket> {
    let d = &campaign.demographics;
    vec![
        Bucket::new("0-14", d.age_0_14),
        Bucket::new("15-19", d.age_15_19),
        Bucket::new("20-24", d.age_20_24),
        Bucket::new("25-34", d.age_25_34),
        Bucket::new("35-44", d.age_35_44),
        Bucket::new("45-64", d.age_45_64),
        Bucket::new("65+", d.age_65_plus),
    ]
}

pub fn nse_distribution(campaign: &Campaign) -> Vec<Bucket> {
    let d = &campaign.demographics;
    vec![
        Bucket::new("AB", d.nse_ab),
        Bucket::new("C", d.nse_c),
        Bucket::new("C+", d.nse_c_plus),
        Bucket::new("D", d.nse_d),
        Bucket::new("D+", d.nse_d_plus),
        Bucket::new("E", d.nse_e),
    ]
}

pub fn gender_split(campaign: &Campaign) -> Vec<Bucket> {
    let d = &campaign.demographics;
    vec![Bucket::new("Men", d.men), Bucket::new("Women", d.women)]
}

/// First sites in service order, not ranked
pub fn top_sites(detail: &CampaignDetail) -> &[CampaignSite] {
    &detail.sites[..detail.sites.len().min(TOP_SITES)]
}

pub fn period_series(detail: &CampaignDetail) -> Vec<PeriodPoint> {
    detail
        .periods
        .iter()
        .map(|p| PeriodPoint {
            label: p.record.period.clone(),
            people_impacts: p.record.people_impacts,
            vehicle_impacts: p.record.vehicle_impacts,
        })
        .collect()
}

fn has_signal(buckets: &[Bucket]) -> bool {
    buckets.iter().any(|b| b.value > 0.0)
}

/// The blocks the detail view draws. A block is `None` when it has nothing to
/// show: no sites, no periods, or a distribution that is zero everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailReport<'a> {
    pub campaign: &'a Campaign,
    pub ages: Option<Vec<Bucket>>,
    pub nse: Option<Vec<Bucket>>,
    pub sites: Option<&'a [CampaignSite]>,
    pub periods: Option<Vec<PeriodPoint>>,
}

impl<'a> DetailReport<'a> {
    pub fn build(detail: &'a CampaignDetail) -> Self {
        let ages = age_distribution(&detail.campaign);
        let nse = nse_distribution(&detail.campaign);
        let sites = top_sites(detail);
        let periods = period_series(detail);

        Self {
            campaign: &detail.campaign,
            ages: has_signal(&ages).then_some(ages),
            nse: has_signal(&nse).then_some(nse),
            sites: (!sites.is_empty()).then_some(sites),
            periods: (!periods.is_empty()).then_some(periods),
        }
    }

    /// Number of blocks that will be drawn
    pub fn block_count(&self) -> usize {
        [
            self.ages.is_some(),
            self.nse.is_some(),
            self.sites.is_some(),
            self.periods.is_some(),
        ]
        .iter()
        .filter(|shown| **shown)
        .count()
    }
}

/// File name for a campaign's report; path separators and other unsafe
/// characters become `_`.
pub fn report_file_name(campaign_name: &str) -> String {
    let safe: String = campaign_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "campaign".to_string() } else { safe };
    format!("report_{}.csv", safe)
}

/// Write the report as `section,label,metric,value` rows
pub fn write_csv<W: std::io::Write>(detail: &CampaignDetail, writer: W) -> Result<(), ReportError> {
    let report = DetailReport::build(detail);
    let c = report.campaign;
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(["section", "label", "metric", "value"])?;

    let summary = [
        ("type", c.campaign_type.as_str().to_string()),
        ("start_date", c.start_date.format("%Y-%m-%d").to_string()),
        ("end_date", c.end_date.format("%Y-%m-%d").to_string()),
        ("metro_universe", c.metrics.metro_universe.to_string()),
        ("people_impacts", c.metrics.people_impacts.to_string()),
        ("vehicle_impacts", c.metrics.vehicle_impacts.to_string()),
        ("calculated_frequency", c.metrics.calculated_frequency.to_string()),
        ("average_frequency", c.metrics.average_frequency.to_string()),
        ("reach", c.metrics.reach.to_string()),
    ];
    for (metric, value) in summary {
        csv.write_record(["summary", c.name.as_str(), metric, value.as_str()])?;
    }

    for bucket in gender_split(c) {
        csv.write_record(["gender", bucket.label, "share", &bucket.value.to_string()])?;
    }
    if let Some(ref ages) = report.ages {
        for bucket in ages {
            csv.write_record(["age", bucket.label, "share", &bucket.value.to_string()])?;
        }
    }
    if let Some(ref nse) = report.nse {
        for bucket in nse {
            csv.write_record(["nse", bucket.label, "share", &bucket.value.to_string()])?;
        }
    }
    if let Some(sites) = report.sites {
        for site in sites {
            let code = site.record.code.as_str();
            csv.write_record(["site", code, "monthly_impacts", &site.record.monthly_impacts.to_string()])?;
            csv.write_record(["site", code, "monthly_reach", &site.record.monthly_reach.to_string()])?;
        }
    }
    if let Some(ref periods) = report.periods {
        for point in periods {
            let label = point.label.as_str();
            csv.write_record(["period", label, "people_impacts", &point.people_impacts.to_string()])?;
            csv.write_record(["period", label, "vehicle_impacts", &point.vehicle_impacts.to_string()])?;
        }
    }

    csv.flush()?;
    Ok(())
}

/// Export a campaign report into `dir`, creating it if needed
pub fn export_csv(detail: &CampaignDetail, dir: &Path) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(&detail.campaign.name));
    let file = fs::File::create(&path)?;
    write_csv(detail, file)?;
    info!("Exported report for {} to {}", detail.campaign.name, path.display());
    Ok(path)
}
