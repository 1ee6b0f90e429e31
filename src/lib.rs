//! Terminal client for the campaign analytics API: list, filter and page
//! through campaigns, chart a campaign's audience and delivery, export a
//! report and create new campaigns.

pub mod api;
pub mod cli;
pub mod config;
pub mod forms;
pub mod listing;
pub mod logging;
pub mod models;
pub mod report;
pub mod session;
pub mod tui;
