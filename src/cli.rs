use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::listing::SortColumn;
use crate::models::CampaignType;

#[derive(Parser)]
#[command(name = "campaign-dash")]
#[command(about = "Browse, chart, export and create advertising campaigns from the campaign analytics API")]
#[command(version)]
pub struct Cli {
    /// Base URL of the API (overrides CAMPAIGN_DASH_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and keep the session token for later commands
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show session state and API health
    Status,

    /// List one page of campaigns
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Campaigns per page (defaults to CAMPAIGN_DASH_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,

        /// Campaign type (mensual, catorcenal, all)
        #[arg(short = 't', long = "type")]
        campaign_type: Option<String>,

        /// Only campaigns still running on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only campaigns starting on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Sort the page by column (name, type, start, end, impacts, reach)
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Campaigns overlapping a date range
    Search {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
    },

    /// Show one campaign with its demographics, sites and periods
    Show {
        /// Campaign name
        name: String,
    },

    /// Write a campaign's CSV report
    Export {
        /// Campaign name
        name: String,

        /// Output directory (defaults to CAMPAIGN_DASH_EXPORT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a campaign from a JSON file
    Create {
        /// JSON document with the campaign, its sites and its periods
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Launch the interactive terminal dashboard
    Tui,
}

impl Commands {
    /// `all` or an empty value means no type filter
    pub fn parse_campaign_type(campaign_type: &str) -> Option<CampaignType> {
        let campaign_type = campaign_type.trim();
        if campaign_type.is_empty() || campaign_type.eq_ignore_ascii_case("all") {
            return None;
        }
        Some(CampaignType::from(campaign_type.to_string()))
    }

    pub fn parse_sort_column(column: &str) -> Result<SortColumn, anyhow::Error> {
        SortColumn::parse(column).ok_or_else(|| {
            anyhow::anyhow!(
                "Unsupported sort column: {}. Supported columns: name, type, start, end, impacts, reach",
                column
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from([
            "campaign-dash",
            "--api-url",
            "http://api.local:9000",
            "list",
            "--type",
            "mensual",
            "--from",
            "2025-01-01",
            "--sort",
            "reach",
            "--desc",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://api.local:9000"));
        match cli.command {
            Commands::List {
                page,
                campaign_type,
                from,
                to,
                sort,
                desc,
                ..
            } => {
                assert_eq!(page, 1);
                assert_eq!(campaign_type.as_deref(), Some("mensual"));
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1));
                assert_eq!(to, None);
                assert_eq!(sort.as_deref(), Some("reach"));
                assert!(desc);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["campaign-dash", "list", "--desc"]).is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["campaign-dash", "search", "--from", "2025-13-01", "--to", "2025-12-31"]).is_err());
    }

    #[test]
    fn test_sort_column_parsing() {
        assert_eq!(Commands::parse_sort_column("Impacts").unwrap(), SortColumn::Impacts);
        assert!(Commands::parse_sort_column("budget").is_err());
        assert_eq!(Commands::parse_campaign_type("catorcenal"), Some(CampaignType::Biweekly));
    }

    #[test]
    fn test_all_types_means_no_filter() {
        assert_eq!(Commands::parse_campaign_type("all"), None);
        assert_eq!(Commands::parse_campaign_type("ALL"), None);
        assert_eq!(Commands::parse_campaign_type(" "), None);
        assert_eq!(Commands::parse_campaign_type("mensual"), Some(CampaignType::Monthly));
    }
}
