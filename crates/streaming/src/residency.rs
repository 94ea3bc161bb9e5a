use foundation::Time;
use runtime::WorkId;
use serde::Serialize;

use crate::asset::Asset;
use crate::load::{LoadError, LoadHandle};
use crate::texture::Texture;

/// Lifecycle of one tile's content:
/// Queued → Loading → Loaded | Failed
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidencyState {
    Queued,
    Loading,
    Loaded,
    Failed,
}

pub(crate) struct Resident {
    pub asset: Box<dyn Asset>,
    pub texture: Box<dyn Texture>,
    /// Asset timestamp the texture was last built from.
    pub timestamp: u64,
}

pub(crate) enum Residency {
    Queued(WorkId),
    Loading(LoadHandle),
    Loaded(Resident),
    Failed {
        error: LoadError,
        retry_at: Option<Time>,
    },
}

impl Residency {
    pub fn state(&self) -> ResidencyState {
        match self {
            Residency::Queued(_) => ResidencyState::Queued,
            Residency::Loading(_) => ResidencyState::Loading,
            Residency::Loaded(_) => ResidencyState::Loaded,
            Residency::Failed { .. } => ResidencyState::Failed,
        }
    }

    pub fn is_retry_due(&self, now: Time) -> bool {
        matches!(
            self,
            Residency::Failed { retry_at: Some(at), .. } if now.seconds() >= at.seconds()
        )
    }
}
