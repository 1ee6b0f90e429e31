//! Campaign analytics API access
//!
//! The [`CampaignApi`] trait is the seam between the views and the remote
//! service. [`HttpCampaignClient`] talks to the real service over HTTP;
//! [`InMemoryCampaignApi`] keeps everything in process.

pub mod client;
pub mod errors;
pub mod memory;

pub use client::{CampaignApi, HttpCampaignClient};
pub use errors::ApiError;
pub use memory::InMemoryCampaignApi;
