//! # Notification Center
//!
//! Client-side controller behind the notification drawer. It holds the list
//! of notifications, decides how many are visible, and turns user actions
//! and server events into the [`ClientEvent`]s to send.
//!
//! ## Features
//!
//! - **Preview**: `preview_count` items are visible while the drawer is closed
//! - **Paging**: opening reveals `first_page_count` more, each further page `page_size`
//! - **Progressive reveal**: a page appears item by item over `reveal_duration`
//! - **Optimistic reads**: expanding an unread item marks it read locally
//! - **Deferred re-sort**: collapsing a freshly read item re-sorts after `resort_delay`
//! - **Coalesced refresh**: nudges arriving during a fetch trigger one follow-up fetch
//!
//! The controller never reads the clock; callers pass `now` and drive
//! [`NotificationCenter::tick`] from their frame or timer loop.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portal_realtime::client::notification_center::NotificationCenter;
//! use portal_realtime::shared::NotificationCenterConfig;
//! use std::time::Instant;
//!
//! let mut center = NotificationCenter::new(NotificationCenterConfig::default());
//! let fetch = center.request_fetch();
//! // ... send `fetch`, feed server events to `handle_server_event` ...
//! center.open_drawer(Instant::now());
//! center.tick(Instant::now());
//! for item in center.visible() {
//!     println!("{}", item.title);
//! }
//! ```

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use uuid::Uuid;

use crate::shared::config::NotificationCenterConfig;
use crate::shared::event::{ClientEvent, ServerEvent};
use crate::shared::notification::{NotificationList, NotificationView};

/// Drawer and list state
pub struct NotificationCenter {
    config: NotificationCenterConfig,
    items: Vec<NotificationView>,
    unread_count: usize,
    drawer_open: bool,
    /// Extra items currently shown beyond the preview
    revealed: usize,
    /// Extra items shown once all scheduled reveals have fired
    reveal_target: usize,
    reveal_schedule: VecDeque<Instant>,
    expanded: HashSet<Uuid>,
    /// Items that were unread when expanded; collapsing them re-sorts
    read_on_expand: HashSet<Uuid>,
    resort_at: Option<Instant>,
    fetch_in_flight: bool,
    refetch_queued: bool,
}

impl NotificationCenter {
    pub fn new(config: NotificationCenterConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
            unread_count: 0,
            drawer_open: false,
            revealed: 0,
            reveal_target: 0,
            reveal_schedule: VecDeque::new(),
            expanded: HashSet::new(),
            read_on_expand: HashSet::new(),
            resort_at: None,
            fetch_in_flight: false,
            refetch_queued: false,
        }
    }

    pub fn config(&self) -> &NotificationCenterConfig {
        &self.config
    }

    pub fn items(&self) -> &[NotificationView] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn is_open(&self) -> bool {
        self.drawer_open
    }

    pub fn is_expanded(&self, id: Uuid) -> bool {
        self.expanded.contains(&id)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_flight
    }

    /// Number of items currently on screen
    pub fn visible_count(&self) -> usize {
        let shown = if self.drawer_open {
            self.config.preview_count + self.revealed
        } else {
            self.config.preview_count
        };
        shown.min(self.items.len())
    }

    pub fn visible(&self) -> &[NotificationView] {
        &self.items[..self.visible_count()]
    }

    /// Whether another page can be revealed
    pub fn has_more(&self) -> bool {
        let planned = if self.drawer_open {
            self.config.preview_count + self.reveal_target
        } else {
            self.config.preview_count
        };
        planned < self.items.len()
    }

    // -- Drawer ----------------------------------------------------------

    pub fn open_drawer(&mut self, now: Instant) {
        if self.drawer_open {
            return;
        }
        self.drawer_open = true;
        self.revealed = 0;
        self.reveal_target = 0;
        self.reveal_schedule.clear();
        self.schedule_reveal(self.config.first_page_count, now);
    }

    pub fn close_drawer(&mut self) {
        self.drawer_open = false;
        self.revealed = 0;
        self.reveal_target = 0;
        self.reveal_schedule.clear();
    }

    /// Reveal the next page; returns how many items were scheduled
    pub fn next_page(&mut self, now: Instant) -> usize {
        if !self.drawer_open {
            return 0;
        }
        self.schedule_reveal(self.config.page_size, now)
    }

    fn schedule_reveal(&mut self, requested: usize, now: Instant) -> usize {
        let hidden = self
            .items
            .len()
            .saturating_sub(self.config.preview_count + self.reveal_target);
        let count = requested.min(hidden);
        if count == 0 {
            return 0;
        }

        let step = self.config.reveal_duration / count as u32;
        for i in 1..=count {
            self.reveal_schedule.push_back(now + step * i as u32);
        }
        self.reveal_target += count;
        tracing::debug!("[NotificationCenter] Revealing {} items", count);
        count
    }

    /// Advance timers; returns true when anything visible changed
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while self.reveal_schedule.front().is_some_and(|due| *due <= now) {
            self.reveal_schedule.pop_front();
            self.revealed += 1;
            changed = true;
        }

        if self.resort_at.is_some_and(|due| due <= now) {
            self.resort_at = None;
            self.resort();
            changed = true;
        }

        changed
    }

    // -- Item actions ----------------------------------------------------

    /// Expand or collapse an item
    ///
    /// Expanding an unread item flips it to read locally and returns the
    /// mark-read event to send.
    pub fn toggle_expand(&mut self, id: Uuid, now: Instant) -> Option<ClientEvent> {
        if self.expanded.remove(&id) {
            if self.read_on_expand.remove(&id) {
                self.resort_at = Some(now + self.config.resort_delay);
            }
            return None;
        }

        let item = self.items.iter_mut().find(|item| item.notification_id == id)?;
        self.expanded.insert(id);
        if item.is_read {
            return None;
        }

        item.is_read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        self.read_on_expand.insert(id);
        Some(ClientEvent::MarkNotificationRead { notification_id: id })
    }

    pub fn delete(&mut self, id: Uuid) -> Option<ClientEvent> {
        let index = self.items.iter().position(|item| item.notification_id == id)?;
        let removed = self.items.remove(index);
        if !removed.is_read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        self.expanded.remove(&id);
        self.read_on_expand.remove(&id);
        Some(ClientEvent::DeleteNotification { notification_id: id })
    }

    pub fn mark_all_read(&mut self) -> Option<ClientEvent> {
        if self.unread_count == 0 {
            return None;
        }
        for item in &mut self.items {
            item.is_read = true;
        }
        self.unread_count = 0;
        self.resort();
        Some(ClientEvent::MarkAllNotificationsRead)
    }

    pub fn clear_all(&mut self) -> Option<ClientEvent> {
        if self.items.is_empty() {
            return None;
        }
        self.items.clear();
        self.unread_count = 0;
        self.expanded.clear();
        self.read_on_expand.clear();
        self.resort_at = None;
        self.close_drawer();
        Some(ClientEvent::ClearNotifications)
    }

    // -- Server events ---------------------------------------------------

    /// Start a list pull unless one is already running
    ///
    /// While a pull is in flight further requests collapse into a single
    /// follow-up pull issued when the current one completes.
    pub fn request_fetch(&mut self) -> Option<ClientEvent> {
        if self.fetch_in_flight {
            self.refetch_queued = true;
            return None;
        }
        self.fetch_in_flight = true;
        Some(ClientEvent::FetchNotifications)
    }

    /// The pull failed; release the in-flight slot
    pub fn fetch_failed(&mut self) -> Option<ClientEvent> {
        self.fetch_in_flight = false;
        self.take_queued_fetch()
    }

    /// Feed one server event; returns a follow-up event to send, if any
    pub fn handle_server_event(&mut self, event: &ServerEvent) -> Option<ClientEvent> {
        match event {
            ServerEvent::NotificationReceived(view) => {
                self.insert(view.clone());
                None
            }
            ServerEvent::NotificationsListRefresh { .. } => self.request_fetch(),
            ServerEvent::NotificationsList(list) => self.apply_list(list.clone()),
            ServerEvent::LocaleChanged { .. } => self.request_fetch(),
            _ => None,
        }
    }

    /// Insert a pushed notification ahead of the server list
    pub fn insert(&mut self, view: NotificationView) {
        if self
            .items
            .iter()
            .any(|item| item.notification_id == view.notification_id)
        {
            return;
        }
        if !view.is_read {
            self.unread_count += 1;
        }
        self.items.insert(0, view);
    }

    /// Replace local state with the server list
    pub fn apply_list(&mut self, list: NotificationList) -> Option<ClientEvent> {
        self.items = list.items;
        self.unread_count = list.unread_count;

        let known: HashSet<Uuid> = self.items.iter().map(|item| item.notification_id).collect();
        self.expanded.retain(|id| known.contains(id));
        self.read_on_expand.retain(|id| known.contains(id));
        if self.read_on_expand.is_empty() {
            self.resort();
        }

        let hidden = self.items.len().saturating_sub(self.config.preview_count);
        self.reveal_target = self.reveal_target.min(hidden);
        self.revealed = self.revealed.min(self.reveal_target);
        while self.revealed + self.reveal_schedule.len() > self.reveal_target {
            self.reveal_schedule.pop_back();
        }

        self.fetch_in_flight = false;
        self.take_queued_fetch()
    }

    fn take_queued_fetch(&mut self) -> Option<ClientEvent> {
        if !self.refetch_queued {
            return None;
        }
        self.refetch_queued = false;
        self.fetch_in_flight = true;
        Some(ClientEvent::FetchNotifications)
    }

    /// Unread first, newest first within each group
    fn resort(&mut self) {
        self.items
            .sort_by(|a, b| a.is_read.cmp(&b.is_read).then(b.created_at.cmp(&a.created_at)));
    }
}
