//! Validated solve requests.

use serde::{Deserialize, Serialize};

use crate::config::DiscBounds;
use crate::error::{Error, Result};

/// A disc count that has passed the configured bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiscCount(u32);

impl DiscCount {
    /// Validate a requested disc count.
    pub fn new(requested: i64, bounds: DiscBounds) -> Result<Self> {
        if !bounds.contains(requested) {
            return Err(Error::InvalidRequest(format!(
                "Please enter a number between {} and {}",
                bounds.min, bounds.max
            )));
        }
        u32::try_from(requested)
            .map(DiscCount)
            .map_err(|_| Error::InvalidRequest(format!("unsupported disc count {requested}")))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Body of a solve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub discs: i64,
}

impl From<DiscCount> for SolveRequest {
    fn from(discs: DiscCount) -> Self {
        Self {
            discs: i64::from(discs.0),
        }
    }
}
