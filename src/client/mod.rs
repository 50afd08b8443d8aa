//! # Client Module
//!
//! Client-side state machines for the portal's live features. Nothing here
//! depends on the backend or on a concrete socket implementation, so the
//! module compiles without the `ssr` feature.
//!
//! ## Key Components
//!
//! - `gateway.rs`: Guarded event gateway, queues actions and subscriptions
//!   until the transport is ready
//! - `notification_center.rs`: Notification drawer controller
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portal_realtime::client::{GuardedGateway, NotificationCenter, Transport};
//! use portal_realtime::shared::{NotificationCenterConfig, ServerEvent};
//!
//! # fn demo<T: Transport>(transport: T, incoming: ServerEvent) {
//! let mut gateway = GuardedGateway::new(transport);
//! let mut center = NotificationCenter::new(NotificationCenterConfig::default());
//!
//! if let Some(fetch) = center.request_fetch() {
//!     let _ = gateway.emit_event(&fetch);
//! }
//! if let Some(follow_up) = center.handle_server_event(&incoming) {
//!     let _ = gateway.emit_event(&follow_up);
//! }
//! # }
//! ```

pub mod gateway;
pub mod notification_center;

pub use gateway::{
    EventCallback, Emitted, FlushReport, GatewayError, GuardedGateway, HandlerId, Subscription,
    Transport,
};
pub use notification_center::NotificationCenter;
