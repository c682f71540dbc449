use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// One contact lifecycle event as delivered by the host surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEvent {
    pub contact: ContactId,
    pub position: SurfacePoint,
    pub phase: ContactPhase,
}

impl SurfaceEvent {
    pub fn new(contact: ContactId, position: SurfacePoint, phase: ContactPhase) -> Self {
        Self {
            contact,
            position,
            phase,
        }
    }

    pub fn began(contact: u64, x: f32, y: f32) -> Self {
        Self::new(ContactId(contact), SurfacePoint::new(x, y), ContactPhase::Began)
    }

    pub fn moved(contact: u64, x: f32, y: f32) -> Self {
        Self::new(ContactId(contact), SurfacePoint::new(x, y), ContactPhase::Moved)
    }

    pub fn ended(contact: u64, x: f32, y: f32) -> Self {
        Self::new(ContactId(contact), SurfacePoint::new(x, y), ContactPhase::Ended)
    }

    pub fn cancelled(contact: u64, x: f32, y: f32) -> Self {
        Self::new(
            ContactId(contact),
            SurfacePoint::new(x, y),
            ContactPhase::Cancelled,
        )
    }
}
