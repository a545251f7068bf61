//! Cart Models

use jiff::Timestamp;
use rebate::content::{CartHeader, CartStatus, CartUuid, SessionUuid, UserUuid};

/// Cart Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub uuid: CartUuid,
    pub session: SessionUuid,
    pub user: Option<UserUuid>,
    pub status: CartStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    /// Header carried by priced content.
    #[must_use]
    pub fn header(&self) -> CartHeader {
        CartHeader {
            uuid: self.uuid,
            session: self.session,
            user: self.user,
            status: self.status,
        }
    }
}

/// New Cart Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCart {
    pub uuid: CartUuid,
    pub session: SessionUuid,
    pub user: Option<UserUuid>,
}

impl NewCart {
    /// A cart with a fresh id for `session`.
    #[must_use]
    pub fn for_session(session: SessionUuid, user: Option<UserUuid>) -> Self {
        Self {
            uuid: CartUuid::new(),
            session,
            user,
        }
    }
}
