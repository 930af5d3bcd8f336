//! Integration tests for membership, presence, and moderation.

mod helpers;

use cinesync_core::config::realtime::RealtimeConfig;
use cinesync_proto::{ClientMessage, ServerMessage};
use helpers::TestEngine;

#[tokio::test]
async fn join_delivers_snapshot_and_notifies_the_room() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;

    let msg = bob.recv();
    let ServerMessage::RoomJoined {
        room,
        sync_state,
        messages,
    } = msg
    else {
        panic!("expected room:joined, got {msg:?}");
    };
    assert_eq!(room.id, room_id);
    assert_eq!(room.members.len(), 2);
    assert_eq!(sync_state.current_time, 0.0);
    assert!(messages.is_empty());

    let msg = owner.recv_until(|m| matches!(m, ServerMessage::MemberJoined { .. }));
    let ServerMessage::MemberJoined { user_id, members } = msg else {
        unreachable!()
    };
    assert_eq!(user_id, bob.user_id);
    assert_eq!(members.len(), 2);
}

#[tokio::test]
async fn full_room_rejects_joiners_without_any_broadcast() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 2).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    let mut cleo = app.connect("cleo").await;
    cleo.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;

    let msg = cleo.recv();
    let ServerMessage::Error { code, .. } = msg else {
        panic!("expected error, got {msg:?}");
    };
    assert_eq!(code, "room_full");
    owner.expect_silence();
    bob.expect_silence();
}

#[tokio::test]
async fn returning_member_is_not_double_counted() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 2).await;

    // Owner rejoining their own room must not consume the second seat.
    owner.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    let msg = owner.recv_until(|m| matches!(m, ServerMessage::RoomJoined { .. }));
    let ServerMessage::RoomJoined { room, .. } = msg else {
        unreachable!()
    };
    assert_eq!(room.members.len(), 1);

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    let msg = bob.recv();
    assert!(matches!(msg, ServerMessage::RoomJoined { .. }));
}

#[tokio::test]
async fn disconnect_of_a_regular_member_broadcasts_member_left() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();

    let bob_conn = bob.handle.id;
    app.engine.unregister_connection(&bob_conn).await;

    let msg = owner.recv_until(|m| matches!(m, ServerMessage::MemberLeft { .. }));
    let ServerMessage::MemberLeft { user_id, members } = msg else {
        unreachable!()
    };
    assert_eq!(user_id, bob.user_id);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, owner.user_id);
}

#[tokio::test]
async fn owner_disconnect_freezes_instead_of_closing() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    let owner_conn = owner.handle.id;
    app.engine.unregister_connection(&owner_conn).await;

    let msg = bob.recv_until(|m| matches!(m, ServerMessage::RoomUpdated { .. }));
    let ServerMessage::RoomUpdated { room } = msg else {
        unreachable!()
    };
    let owner_entry = room
        .members
        .iter()
        .find(|m| m.user_id == owner.user_id)
        .expect("owner must remain a member while frozen");
    assert!(!owner_entry.online);
    assert_eq!(app.engine.rooms.room_count(), 1);
}

#[tokio::test]
async fn owner_leave_closes_the_room_for_everyone() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    owner.send(&app.engine, ClientMessage::RoomLeave { room_id }).await;

    assert!(matches!(bob.recv(), ServerMessage::RoomClosed {}));
    assert!(matches!(
        owner.recv_until(|m| matches!(m, ServerMessage::RoomClosed {})),
        ServerMessage::RoomClosed {}
    ));
    assert_eq!(app.engine.rooms.room_count(), 0);
    assert!(bob.handle.current_room().is_none());
}

#[tokio::test]
async fn kick_is_owner_only_and_owner_is_unkickable() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    let mut cleo = app.connect("cleo").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    cleo.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();
    cleo.drain();

    // Non-owner cannot kick.
    bob.send(
        &app.engine,
        ClientMessage::MemberKick {
            target_user_id: cleo.user_id,
        },
    )
    .await;
    let ServerMessage::Error { code, .. } = bob.recv() else {
        panic!("expected error");
    };
    assert_eq!(code, "forbidden");

    // Owner cannot kick themselves.
    owner
        .send(
            &app.engine,
            ClientMessage::MemberKick {
                target_user_id: owner.user_id,
            },
        )
        .await;
    let ServerMessage::Error { code, .. } = owner.recv() else {
        panic!("expected error");
    };
    assert_eq!(code, "forbidden");

    // Owner kicks bob: bob gets room:left, the rest see member:kicked.
    owner
        .send(
            &app.engine,
            ClientMessage::MemberKick {
                target_user_id: bob.user_id,
            },
        )
        .await;
    assert!(matches!(
        bob.recv_until(|m| matches!(m, ServerMessage::RoomLeft {})),
        ServerMessage::RoomLeft {}
    ));
    let msg = cleo.recv_until(|m| matches!(m, ServerMessage::MemberKicked { .. }));
    let ServerMessage::MemberKicked { user_id, members } = msg else {
        unreachable!()
    };
    assert_eq!(user_id, bob.user_id);
    assert_eq!(members.len(), 2);
    assert!(bob.handle.current_room().is_none());
}

#[tokio::test]
async fn mute_and_unmute_round_trip() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let room_id = app.create_and_join(&mut owner, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    owner
        .send(
            &app.engine,
            ClientMessage::MemberMute {
                target_user_id: bob.user_id,
                reason: Some("spoilers".to_string()),
            },
        )
        .await;
    let msg = bob.recv_until(|m| matches!(m, ServerMessage::MemberMuted { .. }));
    let ServerMessage::MemberMuted {
        user_id,
        muted_by,
        reason,
    } = msg
    else {
        unreachable!()
    };
    assert_eq!(user_id, bob.user_id);
    assert_eq!(muted_by, owner.user_id);
    assert_eq!(reason.as_deref(), Some("spoilers"));

    owner
        .send(
            &app.engine,
            ClientMessage::MemberUnmute {
                target_user_id: bob.user_id,
            },
        )
        .await;
    let msg = bob.recv_until(|m| matches!(m, ServerMessage::MemberUnmuted { .. }));
    assert!(matches!(
        msg,
        ServerMessage::MemberUnmuted { user_id } if user_id == bob.user_id
    ));
}

#[tokio::test]
async fn leaving_a_foreign_room_is_a_silent_no_op() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut ana = app.connect("ana").await;
    let room_a = app.create_and_join(&mut ana, movie, 10).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id: room_a }).await;

    let mut cleo = app.connect("cleo").await;
    let room_b = app.create_and_join(&mut cleo, movie, 10).await;
    ana.drain();
    bob.drain();
    cleo.drain();

    // Bob asks to leave a room he never joined. No room:left may reach him:
    // his client would clear its view of room A while the server still
    // counts him as a member there.
    bob.send(&app.engine, ClientMessage::RoomLeave { room_id: room_b }).await;

    bob.expect_silence();
    ana.expect_silence();
    cleo.expect_silence();
    assert_eq!(bob.handle.current_room(), Some(room_a));

    // A real leave still gets its confirmation.
    bob.send(&app.engine, ClientMessage::RoomLeave { room_id: room_a }).await;
    assert!(matches!(
        bob.recv_until(|m| matches!(m, ServerMessage::RoomLeft {})),
        ServerMessage::RoomLeft {}
    ));
    assert!(bob.handle.current_room().is_none());
}

#[tokio::test]
async fn owner_reconnect_thaws_a_frozen_room() {
    let app = TestEngine::new();
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let owner_id = owner.user_id;
    let room_id = app.create_and_join(&mut owner, movie, 2).await;

    let mut bob = app.connect("bob").await;
    bob.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    owner.drain();
    bob.drain();

    owner
        .send(&app.engine, ClientMessage::VideoPlay { current_time: 10.0 })
        .await;
    bob.drain();

    let owner_conn = owner.handle.id;
    app.engine.unregister_connection(&owner_conn).await;
    bob.drain();

    // Frozen: the ticker leaves the room alone.
    app.engine.sync.tick().await;
    bob.expect_silence();

    // The owner comes back and rejoins. Their seat was kept, so the
    // full room still admits them.
    let mut owner = app.connect_as(owner_id, "ana").await;
    owner.send(&app.engine, ClientMessage::RoomJoin { room_id }).await;
    let msg = owner.recv_until(|m| matches!(m, ServerMessage::RoomJoined { .. }));
    let ServerMessage::RoomJoined { room, .. } = msg else {
        unreachable!()
    };
    assert_eq!(room.members.len(), 2);
    bob.drain();

    // Thawed: drift correction flows again.
    app.engine.sync.tick().await;
    let msg = bob.recv_until(|m| matches!(m, ServerMessage::VideoSync { .. }));
    let ServerMessage::VideoSync { sync_state } = msg else {
        unreachable!()
    };
    assert!(sync_state.is_playing);
    assert!(sync_state.current_time >= 10.0);
}

#[tokio::test]
async fn janitor_closes_abandoned_rooms() {
    let config = RealtimeConfig {
        room_empty_timeout_seconds: 0,
        ..RealtimeConfig::default()
    };
    let app = TestEngine::with_config(config);
    let movie = app.add_movie();
    let mut owner = app.connect("ana").await;
    let _room_id = app.create_and_join(&mut owner, movie, 10).await;

    // An occupied room survives the sweep.
    cinesync_realtime::room::janitor::sweep(&app.engine).await;
    assert_eq!(app.engine.rooms.room_count(), 1);

    let owner_conn = owner.handle.id;
    app.engine.unregister_connection(&owner_conn).await;

    // Frozen and empty past the timeout: the sweep closes it.
    cinesync_realtime::room::janitor::sweep(&app.engine).await;
    assert_eq!(app.engine.rooms.room_count(), 0);
}

#[tokio::test]
async fn room_creation_validates_capacity() {
    let config = RealtimeConfig {
        max_members_ceiling: 8,
        ..RealtimeConfig::default()
    };
    let app = TestEngine::with_config(config);
    let movie = app.add_movie();
    let owner = app.connect("ana").await;

    let err = app
        .engine
        .create_room(owner.user_id, "ana", movie, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind.code(), "validation");

    let err = app
        .engine
        .create_room(owner.user_id, "ana", movie, 9)
        .await
        .unwrap_err();
    assert_eq!(err.kind.code(), "validation");

    assert!(app
        .engine
        .create_room(owner.user_id, "ana", movie, 8)
        .await
        .is_ok());
}
