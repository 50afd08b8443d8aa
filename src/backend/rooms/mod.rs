//! Rooms Module
//!
//! Membership lists for private conversations, public conversations and the
//! lobby, plus the authorization rule for joining private rooms.

/// Membership bookkeeping
pub mod manager;

pub use manager::{RoomAddress, RoomBroadcast, RoomManager, LOBBY_ROOM_ID};

use crate::shared::identity::ConnectionIdentity;

/// Whether `identity` may join the private room `room_id`
///
/// Admins may join any private conversation. Everyone else may only join
/// their own support conversation, whose id is their identity key.
pub fn may_join_private(identity: &ConnectionIdentity, room_id: &str) -> bool {
    identity.role.is_admin() || identity.identity_key == room_id
}
