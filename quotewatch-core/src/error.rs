//! Umbrella error for one dashboard interaction.

use crate::data::{FetchError, NormalizeError};
use crate::domain::InputError;
use crate::indicators::ParamsError;
use crate::snapshot::SnapshotError;
use thiserror::Error;

/// Every variant is terminal for the interaction: nothing is retried or
/// repaired, and no partial indicator or snapshot output is returned.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl DashboardError {
    /// Short category for logs and exit messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Input(_) => "input",
            DashboardError::Params(_) => "params",
            DashboardError::Fetch(_) => "fetch",
            DashboardError::Normalize(NormalizeError::Schema { .. }) => "schema",
            DashboardError::Normalize(NormalizeError::Parse { .. }) => "parse",
            DashboardError::Snapshot(SnapshotError::InsufficientData { .. }) => "insufficient_data",
            DashboardError::Snapshot(SnapshotError::ZeroPreviousClose) => "zero_previous_close",
        }
    }
}
