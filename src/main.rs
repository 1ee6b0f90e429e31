use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing::{error, info};

use campaign_dash::api::{ApiError, CampaignApi, HttpCampaignClient};
use campaign_dash::cli::{Cli, Commands};
use campaign_dash::config::{Config, MAX_PAGE_SIZE};
use campaign_dash::forms::validate_new_campaign;
use campaign_dash::listing::{SortDirection, SortState};
use campaign_dash::logging;
use campaign_dash::models::{Campaign, CampaignFilter, ListQuery, NewCampaign};
use campaign_dash::report::{self, Bucket, DetailReport};
use campaign_dash::session::{FileTokenStore, SessionState, SessionStore};
use campaign_dash::tui::ui::{format_count, truncate};
use campaign_dash::tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "campaign_dash=info");
    }

    let cli = Cli::parse();
    logging::init(matches!(cli.command, Commands::Tui));

    let config = Config::from_env()?.with_api_url(cli.api_url.as_deref());
    config.validate()?;

    let api = HttpCampaignClient::new(&config)?;
    let mut session = SessionStore::open(FileTokenStore::new(&config.token_path))
        .context("Failed to read saved session")?;

    match &cli.command {
        Commands::Login { username, password } => {
            match session.login(&api, username, password).await {
                Ok(()) => println!("Logged in as {}", username.trim()),
                Err(e) => {
                    error!("Login failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }

        Commands::Status => {
            println!("API:     {}", config.api_base_url);
            match session.state() {
                SessionState::Authenticated { .. } => println!("Session: logged in"),
                SessionState::Anonymous => println!("Session: not logged in"),
            }
            match api.health().await {
                Ok(health) => println!("Health:  {}", health.status),
                Err(e) => println!("Health:  unreachable ({})", e),
            }
        }

        Commands::List {
            page,
            page_size,
            campaign_type,
            from,
            to,
            sort,
            desc,
        } => {
            let page_size = page_size
                .unwrap_or(config.listing.page_size)
                .clamp(1, MAX_PAGE_SIZE);
            let filter = CampaignFilter {
                campaign_type: campaign_type.as_deref().and_then(Commands::parse_campaign_type),
                start_date: *from,
                end_date: *to,
            };
            let sort = match sort {
                Some(column) => {
                    let direction = if *desc {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    };
                    SortState::by(Commands::parse_sort_column(column)?, direction)
                }
                None => SortState::default(),
            };

            let query = ListQuery::new(page.saturating_sub(1), page_size).with_filter(filter);
            let result = api
                .list_campaigns(session.token(), &query)
                .await
                .map_err(|e| session_error(&mut session, e))?;

            if result.records.is_empty() {
                if query.filter.is_active() {
                    println!("No campaigns match the current filters.");
                } else {
                    println!("No campaigns found.");
                }
                return Ok(());
            }

            print_campaign_table(&sort.apply(&result.records));
            let pages = result.total.div_ceil(page_size).max(1);
            println!();
            println!("Page {} of {} ({} campaigns)", (*page).max(1), pages, result.total);
        }

        Commands::Search { from, to } => {
            let campaigns = api
                .search_campaigns_by_date(session.token(), *from, *to)
                .await
                .map_err(|e| session_error(&mut session, e))?;

            if campaigns.is_empty() {
                println!("No campaigns between {} and {}.", from, to);
            } else {
                println!("Campaigns running between {} and {}:", from, to);
                println!();
                print_campaign_table(&campaigns.iter().collect::<Vec<_>>());
            }
        }

        Commands::Show { name } => {
            let detail = api
                .get_campaign_detail(session.token(), name)
                .await
                .map_err(|e| session_error(&mut session, e))?;
            print_detail(&DetailReport::build(&detail));
        }

        Commands::Export { name, output } => {
            let detail = api
                .get_campaign_detail(session.token(), name)
                .await
                .map_err(|e| session_error(&mut session, e))?;
            let dir = output.as_ref().unwrap_or(&config.export_dir);
            let path = report::export_csv(&detail, dir)?;
            println!("Report written to {}", path.display());
        }

        Commands::Create { file } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let campaign: NewCampaign = serde_json::from_str(&content)
                .with_context(|| format!("Invalid campaign document {}", file.display()))?;
            validate_new_campaign(&campaign)?;

            let created = api
                .create_campaign(session.token(), &campaign)
                .await
                .map_err(|e| session_error(&mut session, e))?;
            println!(
                "Created campaign '{}' with {} sites and {} periods",
                created.name,
                campaign.sites.len(),
                campaign.periods.len()
            );
        }

        Commands::Tui => {
            run_tui(api, session, config).await?;
        }
    }

    Ok(())
}

/// A rejected token is useless for every later command, so forget it
fn session_error(session: &mut SessionStore, e: ApiError) -> anyhow::Error {
    if e.is_unauthorized() {
        session.logout();
        anyhow::anyhow!("{}. Log in again with `campaign-dash login`", e)
    } else {
        e.into()
    }
}

async fn run_tui(api: HttpCampaignClient, session: SessionStore, config: Config) -> Result<()> {
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::{backend::CrosstermBackend, Terminal};

    info!("Starting campaign dashboard against {}", config.api_base_url);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api, session, config);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        error!("Dashboard exited with error: {}", e);
    }
    result
}

fn print_campaign_table(campaigns: &[&Campaign]) {
    println!(
        "{:<28} {:<11} {:<10} {:<10} {:>14} {:>12}",
        "Name", "Type", "Start", "End", "Impacts", "Reach"
    );
    println!("{}", "-".repeat(90));
    for campaign in campaigns {
        println!(
            "{:<28} {:<11} {:<10} {:<10} {:>14} {:>12}",
            truncate(&campaign.name, 28),
            truncate(campaign.campaign_type.label(), 11),
            campaign.start_date.format("%Y-%m-%d"),
            campaign.end_date.format("%Y-%m-%d"),
            format_count(campaign.metrics.people_impacts),
            format_count(campaign.metrics.reach),
        );
    }
}

fn print_distribution(title: &str, buckets: &[Bucket]) {
    println!();
    println!("{}", title);
    for bucket in buckets {
        println!("  {:<6} {:>4}% {}", bucket.label, bucket.percent(), bucket.text_bar(50));
    }
}

fn print_detail(report: &DetailReport) {
    let c = report.campaign;
    println!("{} ({})", c.name, c.campaign_type.label());
    println!("{}", "=".repeat(60));
    println!("Dates:               {} to {}", c.start_date, c.end_date);
    println!("Metro universe:      {}", format_count(c.metrics.metro_universe));
    println!("People impacts:      {}", format_count(c.metrics.people_impacts));
    println!("Vehicle impacts:     {}", format_count(c.metrics.vehicle_impacts));
    println!("Calculated freq.:    {:.2}", c.metrics.calculated_frequency);
    println!("Average freq.:       {:.2}", c.metrics.average_frequency);
    println!("Reach:               {}", format_count(c.metrics.reach));
    println!(
        "Men / Women:         {:.0}% / {:.0}%",
        c.demographics.men * 100.0,
        c.demographics.women * 100.0
    );

    if let Some(ref ages) = report.ages {
        print_distribution("Age distribution", ages);
    }
    if let Some(ref nse) = report.nse {
        print_distribution("Socioeconomic level (NSE)", nse);
    }

    if let Some(sites) = report.sites {
        println!();
        println!("Sites");
        println!(
            "  {:<12} {:<16} {:<16} {:>14} {:>12}",
            "Code", "Furniture", "Municipality", "Impacts/month", "Reach/month"
        );
        println!("  {}", "-".repeat(74));
        for site in sites {
            let s = &site.record;
            println!(
                "  {:<12} {:<16} {:<16} {:>14} {:>12.0}",
                truncate(&s.code, 12),
                truncate(&s.furniture_type, 16),
                truncate(&s.municipality, 16),
                format_count(s.monthly_impacts),
                s.monthly_reach,
            );
        }
    }

    if let Some(ref periods) = report.periods {
        println!();
        println!("Periods");
        println!("  {:<16} {:>16} {:>16}", "Period", "People", "Vehicles");
        println!("  {}", "-".repeat(50));
        for point in periods {
            println!(
                "  {:<16} {:>16} {:>16}",
                truncate(&point.label, 16),
                format_count(point.people_impacts),
                format_count(point.vehicle_impacts),
            );
        }
    }

    if report.block_count() == 0 {
        println!();
        println!("No demographic, site or period data for this campaign.");
    }
}
