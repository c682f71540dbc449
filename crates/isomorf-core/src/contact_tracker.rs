use crate::snapshot::LayoutSnapshot;
use isomorf_domain_layout::{ControlZone, Zone};
use isomorf_ports::types::{ContactId, SurfacePoint};
use std::collections::HashMap;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown contact: {0}")]
    UnknownContact(ContactId),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub position: SurfacePoint,
    pub zone: Zone,
    /// False when the contact is on a key but no channel was free for it.
    pub sounding: bool,
}

/// Zone change produced by one lifecycle step. `None` means "not live".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneTransition {
    pub contact: ContactId,
    pub previous: Option<Zone>,
    pub current: Option<Zone>,
}

/// Live contacts keyed by id. Classification is positional and recomputed on
/// every step; the tracker keeps no other history.
#[derive(Default)]
pub struct ContactTracker {
    contacts: HashMap<ContactId, Contact>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        layout: &LayoutSnapshot,
        id: ContactId,
        position: SurfacePoint,
    ) -> ZoneTransition {
        let zone = layout.classify(position);
        let previous = self
            .contacts
            .insert(
                id,
                Contact {
                    id,
                    position,
                    zone,
                    sounding: false,
                },
            )
            .map(|old| old.zone);
        ZoneTransition {
            contact: id,
            previous,
            current: Some(zone),
        }
    }

    pub fn update(
        &mut self,
        layout: &LayoutSnapshot,
        id: ContactId,
        position: SurfacePoint,
    ) -> Result<ZoneTransition, InputError> {
        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or(InputError::UnknownContact(id))?;
        let previous = contact.zone;
        contact.position = position;
        contact.zone = layout.classify(position);
        Ok(ZoneTransition {
            contact: id,
            previous: Some(previous),
            current: Some(contact.zone),
        })
    }

    pub fn end(&mut self, id: ContactId) -> Result<ZoneTransition, InputError> {
        let contact = self
            .contacts
            .remove(&id)
            .ok_or(InputError::UnknownContact(id))?;
        Ok(ZoneTransition {
            contact: id,
            previous: Some(contact.zone),
            current: None,
        })
    }

    pub fn set_sounding(&mut self, id: ContactId, sounding: bool) {
        if let Some(contact) = self.contacts.get_mut(&id) {
            contact.sounding = sounding;
        }
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.contacts.contains_key(&id)
    }

    /// True while any live contact sits in `control`.
    pub fn is_pressing(&self, control: ControlZone) -> bool {
        self.contacts
            .values()
            .any(|contact| contact.zone.control() == Some(control))
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn ids(&self) -> Vec<ContactId> {
        let mut ids: Vec<_> = self.contacts.keys().copied().collect();
        ids.sort();
        ids
    }
}
