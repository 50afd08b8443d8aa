//! Notifications Module
//!
//! Persisted, localized notifications for customers and the shared admin
//! inbox.
//!
//! # Architecture
//!
//! - **`templates`** - Locale dictionaries, token substitution, fallback chains
//! - **`store`** - Canonical row persistence (trait + in-memory store)
//! - **`directory`** - Recipient profile lookups (trait + in-memory directory)
//! - **`db`** - PostgreSQL implementations of the two collaborators above
//! - **`mailer`** - Secondary (email) channel
//! - **`dispatcher`** - The create → persist → push → email pipeline
//! - **`handlers`** - REST routes
//!
//! Rows are always stored in English. Every read re-renders them for the
//! reader's locale from the stored payload, so dictionary updates apply to
//! old rows too.

pub mod templates;

pub mod store;

pub mod directory;

pub mod db;

pub mod mailer;

pub mod dispatcher;

pub mod handlers;

pub use dispatcher::{DispatchRequest, DispatcherSettings, Inbox, NotificationDispatcher, RecipientIdentity};
pub use mailer::{DisabledChannel, OutboundEmail, SecondaryChannel, SmtpMailer, SmtpSettings};
pub use store::{InMemoryNotificationStore, MarkReadOutcome, NotificationStore};
pub use directory::{InMemoryDirectory, RecipientDirectory, RecipientProfile};
pub use templates::LocaleCatalog;
