//! Screen modules for the dashboard

pub mod create;
pub mod dashboard;
pub mod detail;
pub mod login;

// Re-export all screens
pub use create::CreateScreen;
pub use dashboard::DashboardScreen;
pub use detail::DetailScreen;
pub use login::LoginScreen;
