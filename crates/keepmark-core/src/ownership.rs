//! Ownership authorization shared by the note and bookmark controllers.
//!
//! A record with no owner belongs to the public scratch space: any caller,
//! authenticated or anonymous, may read, modify, or delete it. An owned record
//! is only reachable by its owner.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Bookmark, ContentKind, Identity, Note};

/// A record that may carry an owner.
pub trait Owned {
    fn owner_id(&self) -> Option<Uuid>;
    fn kind(&self) -> ContentKind;
}

impl Owned for Note {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Note
    }
}

impl Owned for Bookmark {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Bookmark
    }
}

/// The operation being authorized, used in the 403 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Update,
    Delete,
}

impl Access {
    fn verb(&self) -> &'static str {
        match self {
            Access::Read => "access",
            Access::Update => "update",
            Access::Delete => "delete",
        }
    }
}

pub fn can_access(owner: Option<Uuid>, caller: Option<Uuid>) -> bool {
    match owner {
        None => true,
        Some(owner) => caller == Some(owner),
    }
}

/// Fail with [`Error::Forbidden`] unless `caller` may perform `access` on `record`.
pub fn ensure_access<T: Owned>(record: &T, caller: Option<&Identity>, access: Access) -> Result<()> {
    if can_access(record.owner_id(), caller.map(|c| c.id)) {
        return Ok(());
    }
    Err(Error::Forbidden(format!(
        "Not authorized to {} this {}",
        access.verb(),
        record.kind().noun()
    )))
}
