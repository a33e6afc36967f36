//! # YNAB client
//!
//! Minimal client for the one endpoint the exporter needs:
//! `GET /budgets/{budget_id}/categories`.
//!
//! ```rust,no_run
//! use ynab_client::YnabClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = YnabClient::builder()
//!         .token("personal-access-token")
//!         .build()?;
//!
//!     let raw = client.get_categories("last-used").await?;
//!     println!("{}", raw["data"]["category_groups"]);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;

pub use client::{YnabClient, YnabClientBuilder};
pub use error::{Result, YnabError};

/// Client version, sent in the user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
