//! Notification dispatch integration tests
//!
//! Persist, push, nudge and email through one assembled state

use crate::common::{connect, TestApp};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use portal_realtime::backend::notifications::{
    DispatchRequest, Inbox, MarkReadOutcome, NotificationStore, RecipientIdentity,
};
use portal_realtime::shared::{
    Audience, ClientEvent, Locale, NewNotification, RenderedNotification, RoomKind, Role, ServerEvent,
    TemplateKey,
};
use serde_json::json;

fn subscription_created(user_id: &str) -> DispatchRequest {
    DispatchRequest {
        audience: Audience::User,
        kind: "subscription".to_string(),
        event: Some("created".to_string()),
        identity: RecipientIdentity {
            user_id: user_id.to_string(),
            display_name: Some("Anna".to_string()),
            ..RecipientIdentity::default()
        },
        payload: json!({ "plan": "Pro" }),
    }
}

#[tokio::test]
async fn test_icelandic_user_gets_localized_push_and_email() {
    let app = TestApp::new()
        .await
        .with_recipient("u1", "u1@example.com", Some("is"))
        .await;
    let hub = &app.state.hub;
    let mut tab = connect(hub, "u1", Role::User, Locale::Is);
    let mut admin = connect(hub, "ops", Role::Admin, Locale::En);
    tab.drain();
    admin.drain();

    let row = app
        .state
        .dispatcher
        .dispatch(subscription_created("u1"))
        .await
        .unwrap();

    // Stored canonical English
    assert_eq!(row.title, "Subscription created");
    assert_eq!(row.body, "Hi Anna, your Pro subscription has been created.");
    assert_eq!(row.recipient_id, "u1");
    assert!(!row.for_admin);

    let events = tab.drain();
    assert_eq!(events.len(), 2);
    match &events[0] {
        ServerEvent::NotificationReceived(view) => {
            assert_eq!(view.notification_id, row.notification_id);
            assert_eq!(view.title, "Áskrift stofnuð");
            assert_eq!(view.body, "Hæ Anna, Pro áskriftin þín hefur verið stofnuð.");
            // No Icelandic link; English fills the gap
            assert_eq!(view.link.as_deref(), Some("/account/subscriptions"));
        }
        other => panic!("expected notification_received, got {:?}", other),
    }
    assert_eq!(events[1].name(), "notifications_list_refresh");
    assert!(admin.drain().is_empty());

    let emails = app.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "u1@example.com");
    assert_eq!(emails[0].subject, "Áskrift stofnuð");
    assert!(emails[0]
        .body_html
        .contains("https://portal.example.com/account/subscriptions"));
}

#[tokio::test]
async fn test_fetch_list_matches_localized_render() {
    let app = TestApp::new().await;
    let dispatcher = &app.state.dispatcher;
    let row = dispatcher.dispatch(subscription_created("u1")).await.unwrap();

    let list = dispatcher
        .fetch_list(&Inbox::user("u1"), Locale::Is)
        .await
        .unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.unread_count, 1);

    let canonical = RenderedNotification {
        title: row.title.clone(),
        body: row.body.clone(),
        link: row.link.clone(),
    };
    let expected = dispatcher.catalog().render_localized(
        Locale::Is,
        TemplateKey::from_wire("subscription", Some("created")),
        &canonical,
        &row.raw_payload,
    );
    assert_eq!(list.items[0].title, expected.title);
    assert_eq!(list.items[0].body, expected.body);
    assert_eq!(list.items[0].link, expected.link);

    // Other recipients see nothing
    let other = dispatcher
        .fetch_list(&Inbox::user("u2"), Locale::En)
        .await
        .unwrap();
    assert_eq!(other.total, 0);
}

#[tokio::test]
async fn test_user_without_email_opt_in_gets_no_email() {
    let app = TestApp::new().await;
    app.state
        .dispatcher
        .dispatch(subscription_created("u1"))
        .await
        .unwrap();
    assert!(app.emails().await.is_empty());
}

#[tokio::test]
async fn test_empty_recipient_is_rejected_before_storage() {
    let app = TestApp::new().await;
    let result = app
        .state
        .dispatcher
        .dispatch(subscription_created("  "))
        .await;

    assert!(result.is_err());
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_user_named_admin_is_isolated_from_admin_inbox() {
    let app = TestApp::new().await;
    let dispatcher = &app.state.dispatcher;

    let mut admin_request = subscription_created("u1");
    admin_request.audience = Audience::Admin;
    let admin_row = dispatcher.dispatch(admin_request).await.unwrap();

    // A user-audience dispatch may not address the admin inbox id
    let rejected = dispatcher
        .dispatch(subscription_created("admin"))
        .await
        .unwrap_err();
    assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);

    // A user row that still carries the id lives in its own inbox
    let user_row = app
        .store
        .insert(NewNotification {
            recipient_id: "admin".to_string(),
            title: "Personal".to_string(),
            body: "Only for the user called admin".to_string(),
            link: None,
            kind: "generic".to_string(),
            event: None,
            for_admin: false,
            raw_payload: json!({}),
        })
        .await
        .unwrap();

    let admin_list = dispatcher.fetch_list(&Inbox::admin(), Locale::En).await.unwrap();
    assert_eq!(admin_list.total, 1);
    assert_eq!(admin_list.items[0].notification_id, admin_row.notification_id);

    let user_inbox = Inbox::for_identity("admin", Role::User);
    let user_list = dispatcher.fetch_list(&user_inbox, Locale::En).await.unwrap();
    assert_eq!(user_list.total, 1);
    assert_eq!(user_list.items[0].notification_id, user_row.notification_id);

    let denied = dispatcher
        .delete(&user_inbox, admin_row.notification_id)
        .await
        .unwrap_err();
    assert_eq!(denied.status_code(), StatusCode::NOT_FOUND);
    assert!(dispatcher.mark_read(&user_inbox, admin_row.notification_id).await.is_err());
    assert_eq!(dispatcher.clear_all(&user_inbox).await.unwrap(), 1);

    let admin_list = dispatcher.fetch_list(&Inbox::admin(), Locale::En).await.unwrap();
    assert_eq!(admin_list.total, 1);
    assert_eq!(admin_list.unread_count, 1);
}

#[tokio::test]
async fn test_dispatch_both_writes_admin_then_user() {
    let app = TestApp::new().await;
    let mut admin = connect(&app.state.hub, "ops", Role::Admin, Locale::Is);
    admin.drain();

    let rows = app
        .state
        .dispatcher
        .dispatch_both(subscription_created("u1"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows[0].for_admin);
    assert_eq!(rows[0].recipient_id, "admin");
    assert!(!rows[1].for_admin);
    assert_eq!(rows[1].recipient_id, "u1");

    // Admin connections see the canonical text regardless of their locale
    let events = admin.drain();
    match &events[0] {
        ServerEvent::NotificationReceived(view) => assert_eq!(view.title, "Subscription created"),
        other => panic!("expected notification_received, got {:?}", other),
    }

    // Admin email goes to the support address in English
    let emails = app.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "support@example.com");
    assert_eq!(emails[0].subject, "Subscription created");
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = TestApp::new().await;
    let dispatcher = &app.state.dispatcher;
    let row = dispatcher.dispatch(subscription_created("u1")).await.unwrap();
    let mut tab = connect(&app.state.hub, "u1", Role::User, Locale::En);
    tab.drain();

    let inbox = Inbox::user("u1");
    let first = dispatcher.mark_read(&inbox, row.notification_id).await.unwrap();
    assert_eq!(first, MarkReadOutcome::Updated);
    crate::assert_has_event!(tab.drain(), "notifications_list_refresh");

    let second = dispatcher.mark_read(&inbox, row.notification_id).await.unwrap();
    assert_eq!(second, MarkReadOutcome::AlreadyRead);
    assert!(tab.drain().is_empty());

    let list = dispatcher.fetch_list(&inbox, Locale::En).await.unwrap();
    assert_eq!(list.unread_count, 0);

    // Someone else's id is not found
    let foreign = dispatcher
        .mark_read(&Inbox::user("u2"), row.notification_id)
        .await
        .unwrap_err();
    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_operations_nudge_only_on_change() {
    let app = TestApp::new().await;
    let dispatcher = &app.state.dispatcher;
    dispatcher.dispatch(subscription_created("u1")).await.unwrap();
    dispatcher.dispatch(subscription_created("u1")).await.unwrap();
    let mut tab = connect(&app.state.hub, "u1", Role::User, Locale::En);
    tab.drain();

    let inbox = Inbox::user("u1");
    assert_eq!(dispatcher.mark_all_read(&inbox).await.unwrap(), 2);
    crate::assert_has_event!(tab.drain(), "notifications_list_refresh");
    assert_eq!(dispatcher.mark_all_read(&inbox).await.unwrap(), 0);
    assert!(tab.drain().is_empty());

    assert_eq!(dispatcher.clear_all(&inbox).await.unwrap(), 2);
    crate::assert_has_event!(tab.drain(), "notifications_list_refresh");
    assert_eq!(dispatcher.clear_all(&inbox).await.unwrap(), 0);
    assert!(tab.drain().is_empty());
}

#[tokio::test]
async fn test_private_message_notifies_admins() {
    let app = TestApp::new().await;
    let events = &app.state.events;
    let mut customer = connect(&app.state.hub, "u1", Role::User, Locale::Is);
    let mut admin = connect(&app.state.hub, "ops", Role::Admin, Locale::En);

    events
        .handle(
            customer.id(),
            ClientEvent::JoinPrivateRoom {
                room_id: "u1".to_string(),
            },
        )
        .await
        .unwrap();
    customer.drain();
    admin.drain();

    events
        .handle(
            customer.id(),
            ClientEvent::SendMessage {
                kind: RoomKind::Private,
                room_id: "u1".to_string(),
                body: "Where is my invoice?".to_string(),
            },
        )
        .await
        .unwrap();

    crate::assert_has_event!(customer.drain(), "room_message");
    let admin_events = admin.drain();
    let received = admin_events
        .iter()
        .find_map(|event| match event {
            ServerEvent::NotificationReceived(view) => Some(view.clone()),
            _ => None,
        })
        .expect("admin notified");
    assert_eq!(received.title, "New message from u1");
    assert_eq!(received.body, "Where is my invoice?");
    assert!(received.for_admin);

    let admin_list = app
        .state
        .dispatcher
        .fetch_list(&Inbox::admin(), Locale::En)
        .await
        .unwrap();
    assert_eq!(admin_list.total, 1);
}

#[tokio::test]
async fn test_fetch_over_socket_uses_connection_locale() {
    let app = TestApp::new().await;
    app.state
        .dispatcher
        .dispatch(subscription_created("u1"))
        .await
        .unwrap();
    let mut tab = connect(&app.state.hub, "u1", Role::User, Locale::Is);
    tab.drain();

    app.state
        .events
        .handle_frame(tab.id(), r#"{"event":"fetch_notifications"}"#)
        .await;

    let events = tab.drain();
    match &events[0] {
        ServerEvent::NotificationsList(list) => {
            assert_eq!(list.total, 1);
            assert_eq!(list.items[0].title, "Áskrift stofnuð");
        }
        other => panic!("expected notifications_list, got {:?}", other),
    }
}
