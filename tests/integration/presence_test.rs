//! Presence and room membership integration tests

use crate::common::{connect, TestApp};
use assert_matches::assert_matches;
use portal_realtime::backend::rooms::RoomAddress;
use portal_realtime::shared::{ClientEvent, Locale, Role, RoomKind, ServerEvent};

fn member_keys(event: &ServerEvent) -> Vec<String> {
    match event {
        ServerEvent::PrivateRoomUsersUpdate(update)
        | ServerEvent::PublicRoomUsersUpdate(update)
        | ServerEvent::LobbyRoomUsersUpdate(update) => update
            .users
            .iter()
            .map(|user| user.identity_key.clone())
            .collect(),
        other => panic!("expected a room update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_guest_joins_and_leaves_public_room() {
    let app = TestApp::new().await;
    let events = &app.state.events;
    let mut member = connect(&app.state.hub, "u2", Role::User, Locale::En);
    let mut guest = connect(&app.state.hub, "g-1", Role::Guest, Locale::En);

    let join = |room_id: &str| ClientEvent::JoinPublicRoom {
        room_id: room_id.to_string(),
    };
    events.handle(member.id(), join("room-42")).await.unwrap();
    events.handle(guest.id(), join("room-42")).await.unwrap();

    let seen = member.drain();
    let last = seen.last().expect("room update");
    assert_eq!(last.name(), "public_room_users_update");
    assert_eq!(member_keys(last), vec!["u2".to_string(), "g-1".to_string()]);
    guest.drain();

    events
        .handle(
            guest.id(),
            ClientEvent::SendMessage {
                kind: RoomKind::Public,
                room_id: "room-42".to_string(),
                body: "Is anyone here?".to_string(),
            },
        )
        .await
        .unwrap();
    let relayed = member.drain();
    assert_eq!(relayed.len(), 1);
    assert_matches!(&relayed[0], ServerEvent::RoomMessage(message) => {
        assert_eq!(message.from, "g-1");
        assert_eq!(message.room_id, "room-42");
        assert_eq!(message.body, "Is anyone here?");
    });

    let report = app.state.hub.disconnect(guest.id());
    assert_eq!(report.room_broadcasts, 1);
    assert!(report.went_offline);

    let after = member.drain();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].name(), "public_room_users_update");
    assert_eq!(member_keys(&after[0]), vec!["u2".to_string()]);
    assert!(!app.state.hub.is_online("g-1"));
}

#[tokio::test]
async fn test_disconnect_broadcasts_once_per_room_plus_presence() {
    let app = TestApp::new().await;
    let hub = &app.state.hub;
    let rooms = [
        RoomAddress::new(RoomKind::Public, "a"),
        RoomAddress::new(RoomKind::Public, "b"),
        RoomAddress::lobby(),
    ];

    let leaving = connect(hub, "u1", Role::User, Locale::En);
    let mut peer = connect(hub, "u2", Role::User, Locale::En);
    for room in &rooms {
        hub.join_room(leaving.id(), room.clone()).unwrap();
        hub.join_room(peer.id(), room.clone()).unwrap();
    }
    let mut admin = connect(hub, "ops", Role::Admin, Locale::En);
    peer.drain();
    admin.drain();

    let report = hub.disconnect(leaving.id());
    assert_eq!(report.room_broadcasts, rooms.len());

    let peer_events = peer.drain();
    assert_eq!(peer_events.len(), rooms.len());
    for event in &peer_events {
        assert_eq!(member_keys(event), vec!["u2".to_string()]);
    }

    let admin_events = admin.drain();
    assert_eq!(admin_events.len(), 1);
    match &admin_events[0] {
        ServerEvent::OnlineUsersUpdate { users } => {
            assert!(users.iter().all(|user| user.identity_key != "u1"));
        }
        other => panic!("expected online_users_update, got {:?}", other),
    }
    assert!(hub.rooms_of(leaving.id()).is_empty());
}

#[tokio::test]
async fn test_second_tab_keeps_identity_online() {
    let app = TestApp::new().await;
    let hub = &app.state.hub;
    let first = connect(hub, "u1", Role::User, Locale::En);
    let second = connect(hub, "u1", Role::User, Locale::Is);

    let online: Vec<_> = hub
        .presence_snapshot()
        .into_iter()
        .filter(|entry| entry.identity_key == "u1")
        .collect();
    assert_eq!(online.len(), 1);

    let report = hub.disconnect(second.id());
    assert!(!report.went_offline);
    assert!(hub.is_online("u1"));
    let entry = hub
        .presence_snapshot()
        .into_iter()
        .find(|entry| entry.identity_key == "u1")
        .expect("still online");
    assert_eq!(entry.connection_id, first.id());

    assert!(hub.disconnect(first.id()).went_offline);
    assert!(!hub.is_online("u1"));
}

#[tokio::test]
async fn test_set_locale_acknowledges_and_normalizes() {
    let app = TestApp::new().await;
    let mut tab = connect(&app.state.hub, "u1", Role::User, Locale::En);
    let events = &app.state.events;

    events
        .handle(tab.id(), ClientEvent::SetLocale { locale: "IS-is".into() })
        .await
        .unwrap();
    assert_matches!(
        tab.drain().as_slice(),
        [ServerEvent::LocaleChanged { locale: Locale::Is }]
    );
    assert_eq!(app.state.hub.live_locale("u1"), Some(Locale::Is));

    // Unknown codes fall back to the default locale
    events
        .handle(tab.id(), ClientEvent::SetLocale { locale: "xx".into() })
        .await
        .unwrap();
    assert_eq!(app.state.hub.live_locale("u1"), Some(Locale::En));
}

#[tokio::test]
async fn test_foreign_private_room_is_refused() {
    let app = TestApp::new().await;
    let mut intruder = connect(&app.state.hub, "u2", Role::User, Locale::En);

    app.state
        .events
        .handle_frame(
            intruder.id(),
            r#"{"event":"join_private_room","data":{"room_id":"u1"}}"#,
        )
        .await;

    crate::assert_has_event!(intruder.drain(), "error");
    assert!(app.state.hub.rooms_of(intruder.id()).is_empty());

    // Admins may join any private conversation
    let admin = connect(&app.state.hub, "ops", Role::Admin, Locale::En);
    app.state
        .events
        .handle(
            admin.id(),
            ClientEvent::JoinPrivateRoom {
                room_id: "u1".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(app.state.hub.rooms_of(admin.id()).len(), 1);
}
