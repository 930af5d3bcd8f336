//! Integration tests for connection lifecycle and the wire framing.

mod helpers;

use cinesync_proto::{ClientMessage, ServerMessage};
use helpers::TestEngine;

#[tokio::test]
async fn reconnect_supersedes_the_old_connection() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    // Bob reconnects: the old connection is torn down, the room sees a
    // member:left, and only then can the new connection rejoin.
    let mut bob2 = app.connect_as(bob.user_id, "bob").await;
    let msg = owner.recv_until(|m| matches!(m, ServerMessage::MemberLeft { .. }));
    assert!(matches!(
        msg,
        ServerMessage::MemberLeft { user_id, .. } if user_id == bob.user_id
    ));
    assert!(!bob.handle.is_alive());

    bob2.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    let msg = bob2.recv();
    let ServerMessage::RoomJoined { room, .. } = msg else {
        panic!("expected room:joined, got {msg:?}");
    };
    assert_eq!(room.members.len(), 2);
    assert_eq!(app.engine.connections.connection_count(), 2);
}

#[tokio::test]
async fn undecodable_frames_get_a_validation_error() {
    let app = TestEngine::new();
    let mut client = app.connect("ana").await;

    client.send_raw(&app.engine, "not json at all").await;
    let ServerMessage::Error { code, .. } = client.recv() else {
        panic!("expected error");
    };
    assert_eq!(code, "validation");

    client
        .send_raw(&app.engine, r#"{"type": "video:warp", "currentTime": 1.0}"#)
        .await;
    let ServerMessage::Error { code, .. } = client.recv() else {
        panic!("expected error");
    };
    assert_eq!(code, "validation");
}

#[tokio::test]
async fn frames_for_unknown_connections_are_ignored() {
    let app = TestEngine::new();
    let client = app.connect("ana").await;
    let conn_id = client.handle.id;
    app.engine.unregister_connection(&conn_id).await;

    // Must not panic or fabricate events.
    app.engine
        .handle_inbound(&conn_id, r#"{"type": "video:play", "currentTime": 1.0}"#)
        .await;
}

#[tokio::test]
async fn pong_refreshes_liveness() {
    let app = TestEngine::new();
    let client = app.connect("ana").await;
    let before = client.handle.last_pong();

    client
        .send(&app.engine, ClientMessage::Pong { timestamp: 12345 })
        .await;
    assert!(client.handle.last_pong() >= before);
    assert!(client.handle.is_alive());
}

#[tokio::test]
async fn backpressured_members_are_dropped_not_queued() {
    let config = cinesync_core::config::realtime::RealtimeConfig {
        channel_buffer_size: 4,
        ..Default::default()
    };
    let app = TestEngine::with_config(config);
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();

    // Bob never reads; after his 4-slot buffer fills, further fan-out to
    // him is dropped while owner keeps receiving.
    for i in 0..10 {
        owner
            .send(
                &app.engine,
                ClientMessage::RoomMessage {
                    message: format!("msg {i}"),
                },
            )
            .await;
        owner.drain();
    }

    let mut bob_received = 0;
    while bob.rx.try_recv().is_ok() {
        bob_received += 1;
    }
    assert!(bob_received <= 5, "expected drops, got {bob_received}");

    let dropped = app.engine.metrics_snapshot().messages_dropped;
    assert!(dropped > 0);
}
