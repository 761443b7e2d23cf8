//! End-to-end hub behavior, driven directly against the public API rather
//! than through a spawned binary — there's no listener process to spawn
//! here, so these exercise the hub the way the unit tests exercise a single
//! store or session component, just across a full scenario.

use haven_relay::config::RelayConfig;
use haven_relay::hub::Hub;
use haven_relay::protocol::{ClientMessage, MembershipAction, ServerMessage};
use haven_relay::session::SessionHandle;
use haven_relay::storage::Store;
use haven_relay::types::ConnectionId;
use tokio::sync::mpsc;

async fn spawn_connection(hub: &std::sync::Arc<Hub>) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
    let (tx, rx) = mpsc::channel(haven_relay::types::OUTBOUND_QUEUE_CAPACITY);
    let handle = SessionHandle::new(ConnectionId::new(), tx);
    let connection_id = handle.connection_id;
    hub.attach(handle).await;
    (connection_id, rx)
}

async fn register(
    hub: &std::sync::Arc<Hub>,
    conn: ConnectionId,
    username: &str,
    fingerprint: Option<&str>,
    recovery_code: Option<&str>,
) {
    hub.handle_client_message(
        conn,
        ClientMessage::Register {
            username: username.into(),
            fingerprint: fingerprint.map(String::from),
            recovery_code: recovery_code.map(String::from),
        },
    )
    .await;
}

#[tokio::test]
async fn new_user_registration_issues_a_recovery_code() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());
    let (conn, mut rx) = spawn_connection(&hub).await;

    register(&hub, conn, "nyx", Some("fp-1"), None).await;

    match rx.recv().await.unwrap() {
        ServerMessage::RegisterAck {
            success,
            username,
            recovery_code,
            is_new_user,
            error,
            ..
        } => {
            assert!(success);
            assert_eq!(username.unwrap(), "nyx");
            assert!(recovery_code.is_some());
            assert_eq!(is_new_user, Some(true));
            assert!(error.is_none());
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn returning_user_with_matching_fingerprint_reconnects_without_a_code() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn1, mut rx1) = spawn_connection(&hub).await;
    register(&hub, conn1, "nyx", Some("fp-1"), None).await;
    rx1.recv().await.unwrap();

    let (conn2, mut rx2) = spawn_connection(&hub).await;
    register(&hub, conn2, "nyx", Some("fp-1"), None).await;

    // conn1 previously held the username, so logging in again elsewhere
    // evicts it even though it belongs to the same returning user.
    match rx1.recv().await.unwrap() {
        ServerMessage::Kicked { reason } => assert_eq!(reason, "owner logged in elsewhere"),
        other => panic!("unexpected message: {other:?}"),
    }

    match rx2.recv().await.unwrap() {
        ServerMessage::RegisterAck {
            success,
            recovery_code,
            is_new_user,
            ..
        } => {
            assert!(success);
            assert!(recovery_code.is_none());
            assert_eq!(is_new_user, Some(false));
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn mismatched_fingerprint_without_recovery_code_requires_recovery() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn1, mut rx1) = spawn_connection(&hub).await;
    register(&hub, conn1, "nyx", Some("fp-1"), None).await;
    rx1.recv().await.unwrap();

    let (conn2, mut rx2) = spawn_connection(&hub).await;
    register(&hub, conn2, "nyx", Some("fp-2"), None).await;

    match rx2.recv().await.unwrap() {
        ServerMessage::RegisterAck { success, error, .. } => {
            assert!(!success);
            assert_eq!(error.unwrap(), "RECOVERY_REQUIRED");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    // conn1 is untouched: a rejected registration never evicts anyone.
    assert!(rx1.try_recv().is_err());
}

#[tokio::test]
async fn reclaim_with_valid_recovery_code_evicts_the_prior_session() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn1, mut rx1) = spawn_connection(&hub).await;
    register(&hub, conn1, "nyx", Some("fp-1"), None).await;
    let code = match rx1.recv().await.unwrap() {
        ServerMessage::RegisterAck { recovery_code, .. } => recovery_code.unwrap(),
        other => panic!("unexpected message: {other:?}"),
    };

    // A different fingerprint with no recovery code is simply rejected —
    // the username is never up for grabs without it.
    let (conn_wrong, mut rx_wrong) = spawn_connection(&hub).await;
    register(&hub, conn_wrong, "nyx", Some("fp-evil"), None).await;
    match rx_wrong.recv().await.unwrap() {
        ServerMessage::RegisterAck { success, error, .. } => {
            assert!(!success);
            assert_eq!(error.unwrap(), "RECOVERY_REQUIRED");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    // The real owner reclaims from a new device using the recovery code.
    let (conn_owner, mut rx_owner) = spawn_connection(&hub).await;
    register(&hub, conn_owner, "nyx", Some("fp-new-device"), Some(&code)).await;

    match rx1.recv().await.unwrap() {
        ServerMessage::Kicked { reason } => assert_eq!(reason, "owner logged in elsewhere"),
        other => panic!("unexpected message: {other:?}"),
    }
    match rx_owner.recv().await.unwrap() {
        ServerMessage::RegisterAck { success, username, .. } => {
            assert!(success);
            assert_eq!(username.unwrap(), "nyx");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn room_create_join_and_message_fan_out_reaches_every_member() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn_a, mut rx_a) = spawn_connection(&hub).await;
    register(&hub, conn_a, "alice", Some("fp-a"), None).await;
    rx_a.recv().await.unwrap(); // RegisterAck

    let (conn_b, mut rx_b) = spawn_connection(&hub).await;
    register(&hub, conn_b, "bob", Some("fp-b"), None).await;
    rx_b.recv().await.unwrap(); // RegisterAck
    rx_a.recv().await.unwrap(); // UserJoined(bob)

    hub.handle_client_message(
        conn_a,
        ClientMessage::RoomCreate {
            name: "lobby".into(),
            is_public: true,
        },
    )
    .await;
    let room_id = match rx_a.recv().await.unwrap() {
        ServerMessage::RoomCreated { success, room, .. } => {
            assert!(success);
            room.unwrap().room_id
        }
        other => panic!("unexpected message: {other:?}"),
    };
    // Public room creation is broadcast to every other registered session.
    match rx_b.recv().await.unwrap() {
        ServerMessage::RoomCreated { room, .. } => assert_eq!(room.unwrap().room_id, room_id),
        other => panic!("unexpected message: {other:?}"),
    }

    hub.handle_client_message(conn_b, ClientMessage::RoomJoin { room_id }).await;
    match rx_b.recv().await.unwrap() {
        ServerMessage::RoomJoined { success, room_id: joined_id, .. } => {
            assert!(success);
            assert_eq!(joined_id, room_id);
        }
        other => panic!("unexpected message: {other:?}"),
    }
    match rx_a.recv().await.unwrap() {
        ServerMessage::RoomMembers { action, user, .. } => {
            assert_eq!(action, MembershipAction::Joined);
            assert_eq!(user, "bob");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    hub.handle_client_message(
        conn_a,
        ClientMessage::RoomMessage {
            room_id,
            content: "hello room".into(),
        },
    )
    .await;

    match rx_a.recv().await.unwrap() {
        ServerMessage::RoomMessage { content, from, .. } => {
            assert_eq!(content, "hello room");
            assert_eq!(from, "alice");
        }
        other => panic!("unexpected message: {other:?}"),
    }
    match rx_b.recv().await.unwrap() {
        ServerMessage::RoomMessage { content, .. } => assert_eq!(content, "hello room"),
        other => panic!("unexpected message: {other:?}"),
    }

    let history = hub.store().recent_messages(room_id, 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "hello room");
}

#[tokio::test]
async fn leaving_a_room_notifies_remaining_members_but_keeps_the_room() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn_a, mut rx_a) = spawn_connection(&hub).await;
    register(&hub, conn_a, "alice", Some("fp-a"), None).await;
    rx_a.recv().await.unwrap();
    let (conn_b, mut rx_b) = spawn_connection(&hub).await;
    register(&hub, conn_b, "bob", Some("fp-b"), None).await;
    rx_b.recv().await.unwrap();
    rx_a.recv().await.unwrap(); // UserJoined(bob)

    hub.handle_client_message(
        conn_a,
        ClientMessage::RoomCreate {
            name: "lobby".into(),
            is_public: false,
        },
    )
    .await;
    let room_id = match rx_a.recv().await.unwrap() {
        ServerMessage::RoomCreated { room, .. } => room.unwrap().room_id,
        other => panic!("unexpected message: {other:?}"),
    };
    // Private room: no broadcast reaches bob.
    assert!(rx_b.try_recv().is_err());

    hub.handle_client_message(conn_b, ClientMessage::RoomJoin { room_id }).await;
    rx_b.recv().await.unwrap(); // RoomJoined
    rx_a.recv().await.unwrap(); // RoomMembers(joined)

    hub.handle_client_message(conn_b, ClientMessage::RoomLeave { room_id }).await;
    match rx_b.recv().await.unwrap() {
        ServerMessage::RoomLeft { success, room_id: left_id, .. } => {
            assert!(success);
            assert_eq!(left_id, room_id);
        }
        other => panic!("unexpected message: {other:?}"),
    }
    match rx_a.recv().await.unwrap() {
        ServerMessage::RoomMembers { action, user, .. } => {
            assert_eq!(action, MembershipAction::Left);
            assert_eq!(user, "bob");
        }
        other => panic!("unexpected message: {other:?}"),
    }

    // The room itself still exists — only the cleanup job reaps empty rooms.
    assert!(hub.store().get_room(room_id).unwrap().is_some());
}

#[tokio::test]
async fn room_list_excludes_private_rooms_the_requester_has_not_joined() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());

    let (conn_a, mut rx_a) = spawn_connection(&hub).await;
    register(&hub, conn_a, "alice", Some("fp-a"), None).await;
    rx_a.recv().await.unwrap();
    let (conn_b, mut rx_b) = spawn_connection(&hub).await;
    register(&hub, conn_b, "bob", Some("fp-b"), None).await;
    rx_b.recv().await.unwrap();
    rx_a.recv().await.unwrap(); // UserJoined(bob)

    hub.handle_client_message(
        conn_a,
        ClientMessage::RoomCreate {
            name: "public-room".into(),
            is_public: true,
        },
    )
    .await;
    rx_a.recv().await.unwrap();
    rx_b.recv().await.unwrap(); // broadcast of the public room

    hub.handle_client_message(
        conn_a,
        ClientMessage::RoomCreate {
            name: "secret-room".into(),
            is_public: false,
        },
    )
    .await;
    rx_a.recv().await.unwrap();
    assert!(rx_b.try_recv().is_err());

    hub.handle_client_message(conn_b, ClientMessage::RoomList).await;
    match rx_b.recv().await.unwrap() {
        ServerMessage::RoomListResponse { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].name, "public-room");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn direct_message_to_unknown_user_is_rejected_and_never_persisted() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());
    let (conn, mut rx) = spawn_connection(&hub).await;
    register(&hub, conn, "alice", Some("fp-a"), None).await;
    rx.recv().await.unwrap();

    hub.handle_client_message(
        conn,
        ClientMessage::DirectMessage {
            to: "ghost".into(),
            content: "hi".into(),
        },
    )
    .await;

    match rx.recv().await.unwrap() {
        ServerMessage::Error { code, .. } => assert_eq!(code, "USER_NOT_FOUND"),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn history_limit_is_clamped_to_the_spec_hard_cap() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());
    let (conn, mut rx) = spawn_connection(&hub).await;
    register(&hub, conn, "alice", Some("fp-a"), None).await;
    rx.recv().await.unwrap();
    hub.handle_client_message(
        conn,
        ClientMessage::RoomCreate {
            name: "lobby".into(),
            is_public: true,
        },
    )
    .await;
    let room_id = match rx.recv().await.unwrap() {
        ServerMessage::RoomCreated { room, .. } => room.unwrap().room_id,
        other => panic!("unexpected message: {other:?}"),
    };

    hub.handle_client_message(
        conn,
        ClientMessage::RoomHistory {
            room_id,
            limit: Some(100_000),
            before: None,
        },
    )
    .await;

    match rx.recv().await.unwrap() {
        ServerMessage::RoomHistoryResponse { messages, .. } => {
            assert!(messages.len() <= haven_relay::types::MAX_HISTORY_LIMIT)
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn room_history_reports_has_more_and_returns_oldest_first() {
    let hub = Hub::new(Store::open_temporary().unwrap(), RelayConfig::default());
    let (conn, mut rx) = spawn_connection(&hub).await;
    register(&hub, conn, "alice", Some("fp-a"), None).await;
    rx.recv().await.unwrap();
    hub.handle_client_message(
        conn,
        ClientMessage::RoomCreate {
            name: "lobby".into(),
            is_public: true,
        },
    )
    .await;
    let room_id = match rx.recv().await.unwrap() {
        ServerMessage::RoomCreated { room, .. } => room.unwrap().room_id,
        other => panic!("unexpected message: {other:?}"),
    };

    for i in 0..3 {
        hub.handle_client_message(
            conn,
            ClientMessage::RoomMessage {
                room_id,
                content: format!("msg-{i}"),
            },
        )
        .await;
        rx.recv().await.unwrap();
    }

    hub.handle_client_message(
        conn,
        ClientMessage::RoomHistory {
            room_id,
            limit: Some(2),
            before: None,
        },
    )
    .await;

    match rx.recv().await.unwrap() {
        ServerMessage::RoomHistoryResponse { messages, has_more, .. } => {
            assert!(has_more);
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].content, "msg-1");
            assert_eq!(messages[1].content, "msg-2");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}
