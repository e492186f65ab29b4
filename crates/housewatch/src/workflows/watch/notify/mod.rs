//! Delivery of a run's matches. Runs after the seen-set is persisted; failures here never
//! undo that.

mod email;
mod render;

pub use email::{EmailNotifier, EmailSettings, BREVO_API_URL};
pub use render::{render_digest, subject_line};

use async_trait::async_trait;
use tracing::info;

use super::domain::Listing;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `matches` in order. Never called with an empty slice.
    async fn notify(&self, matches: &[Listing]) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("e-mail credentials missing: {0}")]
    MissingCredentials(&'static str),
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Fallback used when no e-mail settings are configured: matches go to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, matches: &[Listing]) -> Result<(), NotifyError> {
        info!(count = matches.len(), "{}", subject_line(matches.len()));
        for (position, listing) in matches.iter().enumerate() {
            info!(
                rank = position + 1,
                listing_id = %listing.id(),
                address = %listing.full_address(),
                price = %listing.formatted_price(),
                url = %listing.url,
                "match"
            );
        }
        Ok(())
    }
}
