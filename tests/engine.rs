use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use hearth::config::{Config, ListenConfig};
use hearth::data::DbInviteCreate;
use hearth::state::Broadcast;
use hearth::types::{
    Identity, InviteCode, InviteCreate, InviteId, InviteKind, InviteStatus, InviteTarget,
    MessageServer, Room, RoomCreate, Time, User,
};
use hearth::{Error, ServerState};

/// A single-connection in-memory pool: more than one connection to
/// `sqlite::memory:` would each get their own empty database.
async fn setup() -> Arc<ServerState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    let config = Config {
        rust_log: "info".into(),
        database_url: "sqlite::memory:".into(),
        listen: ListenConfig::default(),
        store_timeout_ms: 5000,
    };
    Arc::new(ServerState::init(config, pool))
}

async fn mint(s: &ServerState, name: &str) -> (User, Identity) {
    let (user, _token) = s
        .services()
        .sessions
        .mint(name)
        .await
        .expect("mint a user");
    let identity = Identity::from(&user);
    (user, identity)
}

async fn general(s: &ServerState) -> Room {
    s.data()
        .room_get_by_name("general")
        .await
        .expect("seeded general room")
}

async fn make_room(s: &ServerState, owner: &Identity, name: &str) -> Room {
    let snapshot = s
        .services()
        .rooms
        .create(
            RoomCreate {
                name: name.into(),
                description: None,
                is_private: false,
            },
            owner.user_id,
        )
        .await
        .expect("create room");
    snapshot.room
}

/// connect a fresh session and move it into a room
async fn enter(
    s: &ServerState,
    identity: &Identity,
    room_id: hearth::types::RoomId,
) -> hearth::types::ConnectionId {
    let conn = hearth::types::ConnectionId::new();
    s.services().members.connect(identity, conn).await;
    s.services()
        .members
        .join(identity, conn, room_id)
        .await
        .expect("join room");
    conn
}

fn code_invite(limit: u32) -> InviteCreate {
    InviteCreate {
        kind: InviteKind::Code,
        target_user_id: None,
        target_email: None,
        expires_in_hours: Some(24),
        usage_limit: Some(limit),
        message: None,
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Broadcast>) -> Vec<Broadcast> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn join_and_switch_emit_leave_before_join() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let room_a = make_room(&s, &alice, "alpha").await;
    let room_b = make_room(&s, &make_room_owner(&s).await, "beta").await;

    // put alice in alpha, then watch the bus while she switches to beta
    let conn = hearth::types::ConnectionId::new();
    s.services().members.connect(&alice, conn).await;
    s.services()
        .members
        .join(&alice, conn, room_a.id)
        .await
        .expect("join alpha");

    let mut rx = s.subscribe();
    s.services()
        .members
        .join(&alice, conn, room_b.id)
        .await
        .expect("switch to beta");

    let mut saw_leave = None;
    let mut saw_join = None;
    for (i, ev) in drain(&mut rx).iter().enumerate() {
        if let Broadcast::Room { room_id, msg, .. } = ev {
            match msg {
                MessageServer::UserLeft { user_id, .. } if *user_id == alice.user_id => {
                    assert_eq!(*room_id, room_a.id);
                    saw_leave = Some(i);
                }
                MessageServer::UserJoined { user, .. } if user.user_id == alice.user_id => {
                    assert_eq!(*room_id, room_b.id);
                    saw_join = Some(i);
                }
                _ => {}
            }
        }
    }
    let (leave, join) = (saw_leave.expect("a leave event"), saw_join.expect("a join event"));
    assert!(leave < join, "old room must hear the leave first");

    // the store agrees with the live table
    assert_eq!(s.services().members.current_room(alice.user_id), Some(room_b.id));
    let members_a = s.services().members.list_members(room_a.id).await.unwrap();
    assert!(members_a.iter().all(|m| m.user_id != alice.user_id));
}

async fn make_room_owner(s: &ServerState) -> Identity {
    let (_, id) = mint(s, "owner").await;
    id
}

#[tokio::test]
async fn empty_room_deactivates_but_general_survives() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let room = make_room(&s, &alice, "ephemeral").await;
    let general = general(&s).await;

    // alice was moved into the room on creation; leaving for general
    // empties it
    let conn = hearth::types::ConnectionId::new();
    s.services()
        .members
        .join(&alice, conn, general.id)
        .await
        .expect("back to general");

    let rooms = s.services().rooms.list().await.unwrap();
    assert!(rooms.iter().all(|r| r.id != room.id), "empty room is hidden");
    assert!(rooms.iter().any(|r| r.id == general.id));

    // rejoining reactivates it
    s.services()
        .members
        .join(&alice, conn, room.id)
        .await
        .expect("rejoin");
    let rooms = s.services().rooms.list().await.unwrap();
    assert!(rooms.iter().any(|r| r.id == room.id));
}

#[tokio::test]
async fn private_room_requires_membership() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, outsider) = mint(&s, "outsider").await;
    let snapshot = s
        .services()
        .rooms
        .create(
            RoomCreate {
                name: "sanctum".into(),
                description: None,
                is_private: true,
            },
            owner.user_id,
        )
        .await
        .unwrap();

    let conn = hearth::types::ConnectionId::new();
    let err = s
        .services()
        .members
        .join(&outsider, conn, snapshot.room.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPermissions));

    // an invite is the way in
    let invite = s
        .services()
        .invites
        .issue(owner.user_id, snapshot.room.id, code_invite(1))
        .await
        .unwrap();
    s.services()
        .invites
        .redeem(&invite.code, &outsider)
        .await
        .expect("redeem into private room");
    assert_eq!(
        s.data()
            .room_member_get(snapshot.room.id, outsider.user_id)
            .await
            .unwrap()
            .map(|m| m.user_id),
        Some(outsider.user_id)
    );
}

#[tokio::test]
async fn disconnect_is_idempotent_and_ownership_checked() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let general = general(&s).await;

    let old_conn = hearth::types::ConnectionId::new();
    s.services().members.connect(&alice, old_conn).await;
    s.services()
        .members
        .join(&alice, old_conn, general.id)
        .await
        .unwrap();

    // a newer connection supersedes the old one
    let new_conn = hearth::types::ConnectionId::new();
    s.services().members.connect(&alice, new_conn).await;

    // the old transport's disconnect must not kill the new session
    s.services().members.disconnect(alice.user_id, old_conn).await;
    assert!(s.services().members.is_online(alice.user_id));

    // a fresh connection starts roomless; rejoin before watching the bus
    s.services()
        .members
        .join(&alice, new_conn, general.id)
        .await
        .unwrap();
    let mut rx = s.subscribe();

    s.services().members.disconnect(alice.user_id, new_conn).await;
    assert!(!s.services().members.is_online(alice.user_id));

    // and doing it again is a no-op
    s.services().members.disconnect(alice.user_id, new_conn).await;
    assert!(!s.services().members.is_online(alice.user_id));

    let leaves = drain(&mut rx)
        .iter()
        .filter(|ev| {
            matches!(
                ev,
                Broadcast::Room {
                    msg: MessageServer::UserLeft { user_id, .. },
                    ..
                } if *user_id == alice.user_id
            )
        })
        .count();
    assert_eq!(leaves, 1, "double disconnect emits exactly one leave");
}

#[tokio::test]
async fn messages_are_validated_and_ordered() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let general = general(&s).await;
    enter(&s, &alice, general.id).await;

    let err = s
        .services()
        .messages
        .send(&alice, general.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadStatic(_)));

    let err = s
        .services()
        .messages
        .send(&alice, general.id, &"x".repeat(1001))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadStatic(_)));

    for i in 0..5 {
        s.services()
            .messages
            .send(&alice, general.id, &format!("message {i}"))
            .await
            .unwrap();
    }
    let history = s.services().messages.history(general.id).await.unwrap();
    assert_eq!(history.len(), 5);
    for pair in history.windows(2) {
        assert!(pair[0].seq < pair[1].seq, "history is in acceptance order");
    }
    assert_eq!(history[0].content, "message 0");
    assert_eq!(history[4].content, "message 4");
    assert_eq!(history[0].author_name, "alice");
}

#[tokio::test]
async fn message_content_is_trimmed() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let general = general(&s).await;
    enter(&s, &alice, general.id).await;
    let msg = s
        .services()
        .messages
        .send(&alice, general.id, "  hello  ")
        .await
        .unwrap();
    assert_eq!(msg.content, "hello");
}

#[tokio::test]
async fn sends_are_gated_on_live_room_membership() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let (_, bob) = mint(&s, "bob").await;
    let general = general(&s).await;
    let other = make_room(&s, &bob, "elsewhere").await;

    // never joined anything
    let err = s
        .services()
        .messages
        .send(&alice, general.id, "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPermissions));

    // a superseding connection moves alice away; the old transport's view
    // of general goes stale and its sends stop being accepted
    enter(&s, &alice, general.id).await;
    enter(&s, &alice, other.id).await;
    let err = s
        .services()
        .messages
        .send(&alice, general.id, "still here?")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPermissions));

    assert!(s
        .services()
        .messages
        .history(general.id)
        .await
        .unwrap()
        .is_empty());

    // sends into the room she is actually in still work
    s.services()
        .messages
        .send(&alice, other.id, "hello")
        .await
        .expect("send in current room");
}

#[tokio::test]
async fn concurrent_joins_leave_the_freshest_member_list_last() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let (_, bob) = mint(&s, "bob").await;
    let general = general(&s).await;

    let alice_conn = hearth::types::ConnectionId::new();
    let bob_conn = hearth::types::ConnectionId::new();
    s.services().members.connect(&alice, alice_conn).await;
    s.services().members.connect(&bob, bob_conn).await;

    let mut rx = s.subscribe();
    let services = s.services();
    let (a, b) = tokio::join!(
        services.members.join(&alice, alice_conn, general.id),
        services.members.join(&bob, bob_conn, general.id),
    );
    a.unwrap();
    b.unwrap();

    // the last list frame on the bus must be the freshest read
    let mut last_list = None;
    for ev in drain(&mut rx) {
        if let Broadcast::Room {
            room_id,
            msg: MessageServer::RoomUserList { users, .. },
            ..
        } = ev
        {
            if room_id == general.id {
                last_list = Some(users);
            }
        }
    }
    let users = last_list.expect("at least one member list frame");
    assert!(users.iter().any(|u| u.user_id == alice.user_id));
    assert!(users.iter().any(|u| u.user_id == bob.user_id));
}

#[tokio::test]
async fn online_count_tracks_live_sessions_per_room() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let (_, bob) = mint(&s, "bob").await;
    let general = general(&s).await;
    let other = make_room(&s, &alice, "annex").await;

    let alice_conn = enter(&s, &alice, general.id).await;
    let bob_conn = enter(&s, &bob, general.id).await;
    assert_eq!(s.services().members.online_count(general.id), 2);

    // switching rooms moves the count, disconnecting drops it
    s.services()
        .members
        .join(&alice, alice_conn, other.id)
        .await
        .unwrap();
    assert_eq!(s.services().members.online_count(general.id), 1);
    assert_eq!(s.services().members.online_count(other.id), 1);

    s.services().members.disconnect(bob.user_id, bob_conn).await;
    assert_eq!(s.services().members.online_count(general.id), 0);
}

#[tokio::test]
async fn room_create_validates_and_rejects_duplicates() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;

    let err = s
        .services()
        .rooms
        .create(
            RoomCreate {
                name: "a/b".into(),
                description: None,
                is_private: false,
            },
            alice.user_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    make_room(&s, &alice, "taken").await;
    let err = s
        .services()
        .rooms
        .create(
            RoomCreate {
                name: "taken".into(),
                description: None,
                is_private: false,
            },
            alice.user_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict));
}

#[tokio::test]
async fn single_use_invite_survives_a_redemption_race() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, bob) = mint(&s, "bob").await;
    let (_, carol) = mint(&s, "carol").await;
    let room = make_room(&s, &owner, "race").await;

    let invite = s
        .services()
        .invites
        .issue(owner.user_id, room.id, code_invite(1))
        .await
        .unwrap();

    let s1 = s.clone();
    let s2 = s.clone();
    let code1 = invite.code.clone();
    let code2 = invite.code.clone();
    let (r1, r2) = tokio::join!(
        async move { s1.services().invites.redeem(&code1, &bob).await },
        async move { s2.services().invites.redeem(&code2, &carol).await },
    );

    let wins = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1, "exactly one racer may redeem a single-use code");

    let stored = s.data().invite_get_by_code(&invite.code).await.unwrap();
    assert_eq!(stored.used_count, 1);
    assert_eq!(stored.status, InviteStatus::Accepted);
}

#[tokio::test]
async fn invite_limit_and_lifecycle() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, bob) = mint(&s, "bob").await;
    let (_, carol) = mint(&s, "carol").await;
    let (_, dave) = mint(&s, "dave").await;
    let room = make_room(&s, &owner, "party").await;

    let invite = s
        .services()
        .invites
        .issue(owner.user_id, room.id, code_invite(2))
        .await
        .unwrap();

    s.services().invites.redeem(&invite.code, &bob).await.unwrap();

    // redeeming twice is a membership conflict, not a second use
    let err = s
        .services()
        .invites
        .redeem(&invite.code, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict));
    let stored = s.data().invite_get_by_code(&invite.code).await.unwrap();
    assert_eq!(stored.used_count, 1);

    s.services().invites.redeem(&invite.code, &carol).await.unwrap();
    let err = s
        .services()
        .invites
        .redeem(&invite.code, &dave)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InviteLimitReached));
}

#[tokio::test]
async fn expired_invite_is_rejected_and_lazily_flipped() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, bob) = mint(&s, "bob").await;
    let room = make_room(&s, &owner, "stale").await;

    // the service clamps expiry to at least an hour, so plant an
    // already-expired row
    let now = Time::now_utc();
    let invite = s
        .data()
        .invite_insert(DbInviteCreate {
            id: InviteId::new(),
            code: InviteCode("expired1".into()),
            room_id: room.id,
            issued_by: owner.user_id,
            kind: InviteKind::Code,
            target: InviteTarget::None,
            expires_at: now - Duration::from_secs(60),
            usage_limit: 1,
            message: None,
            created_at: now - Duration::from_secs(3600),
        })
        .await
        .unwrap();

    let err = s
        .services()
        .invites
        .redeem(&invite.code, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InviteExpired));

    let stored = s.data().invite_get_by_code(&invite.code).await.unwrap();
    assert_eq!(stored.status, InviteStatus::Expired);
}

#[tokio::test]
async fn failed_membership_move_returns_the_consumed_use() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let room = make_room(&s, &owner, "fragile").await;
    let invite = s
        .services()
        .invites
        .issue(owner.user_id, room.id, code_invite(1))
        .await
        .unwrap();

    // consume the last use, then give it back the way redeem's error
    // branch does when the membership move fails after the counter moved
    let won = s
        .data()
        .invite_try_redeem(&invite.code, Time::now_utc())
        .await
        .unwrap();
    assert!(won);
    let burned = s.data().invite_get_by_code(&invite.code).await.unwrap();
    assert_eq!(burned.used_count, 1);
    assert_eq!(burned.status, InviteStatus::Accepted);

    s.data().invite_undo_redeem(&invite.code).await.unwrap();
    let restored = s.data().invite_get_by_code(&invite.code).await.unwrap();
    assert_eq!(restored.used_count, 0);
    assert_eq!(restored.status, InviteStatus::Pending);

    // the code is live again and a real redemption still goes through
    let (_, bob) = mint(&s, "bob").await;
    let snapshot = s
        .services()
        .invites
        .redeem(&invite.code, &bob)
        .await
        .expect("redeem restored invite");
    assert_eq!(snapshot.room.id, room.id);
}

#[tokio::test]
async fn direct_invite_is_target_only() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (bob_user, bob) = mint(&s, "bob").await;
    let (_, mallory) = mint(&s, "mallory").await;
    let room = make_room(&s, &owner, "exclusive").await;

    let invite = s
        .services()
        .invites
        .issue(
            owner.user_id,
            room.id,
            InviteCreate {
                kind: InviteKind::Direct,
                target_user_id: Some(bob_user.id),
                target_email: None,
                expires_in_hours: None,
                usage_limit: None,
                message: Some("come look at this".into()),
            },
        )
        .await
        .unwrap();

    let err = s
        .services()
        .invites
        .redeem(&invite.code, &mallory)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotInviteTarget));

    s.services().invites.redeem(&invite.code, &bob).await.unwrap();

    // a second direct invite to the same (now member) user is a conflict
    let err = s
        .services()
        .invites
        .issue(
            owner.user_id,
            room.id,
            InviteCreate {
                kind: InviteKind::Direct,
                target_user_id: Some(bob_user.id),
                target_email: None,
                expires_in_hours: None,
                usage_limit: None,
                message: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict));
}

#[tokio::test]
async fn issue_requires_membership_and_clamps_bounds() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, outsider) = mint(&s, "outsider").await;
    let room = make_room(&s, &owner, "bounds").await;

    let err = s
        .services()
        .invites
        .issue(outsider.user_id, room.id, code_invite(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPermissions));

    let invite = s
        .services()
        .invites
        .issue(
            owner.user_id,
            room.id,
            InviteCreate {
                kind: InviteKind::Code,
                target_user_id: None,
                target_email: None,
                expires_in_hours: Some(10_000),
                usage_limit: Some(9_999),
                message: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invite.usage_limit, 100);
    let week = Time::now_utc() + Duration::from_secs(168 * 3600 + 60);
    assert!(invite.expires_at < week, "expiry clamped to a week");
}

#[tokio::test]
async fn revoke_is_issuer_only_and_kills_the_code() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, bob) = mint(&s, "bob").await;
    let room = make_room(&s, &owner, "revocable").await;

    let invite = s
        .services()
        .invites
        .issue(owner.user_id, room.id, code_invite(5))
        .await
        .unwrap();

    let err = s
        .services()
        .invites
        .revoke(&invite.code, bob.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPermissions));

    s.services()
        .invites
        .revoke(&invite.code, owner.user_id)
        .await
        .unwrap();

    let err = s
        .services()
        .invites
        .redeem(&invite.code, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InviteExpired));

    // revoking twice is a conflict
    let err = s
        .services()
        .invites
        .revoke(&invite.code, owner.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict));
}

#[tokio::test]
async fn preview_shows_live_codes_and_nothing_else() {
    let s = setup().await;
    let (_, owner) = mint(&s, "owner").await;
    let (_, bob) = mint(&s, "bob").await;
    let room = make_room(&s, &owner, "lobby").await;

    let invite = s
        .services()
        .invites
        .issue(owner.user_id, room.id, code_invite(1))
        .await
        .unwrap();

    let preview = s.services().invites.preview(&invite.code).await.unwrap();
    assert_eq!(preview.room_name, "lobby");
    assert_eq!(preview.inviter, "owner");
    assert_eq!(preview.uses_remaining, 1);

    // unknown and dead codes are indistinguishable
    let err = s
        .services()
        .invites
        .preview(&InviteCode("n0tacode".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound));

    s.services().invites.redeem(&invite.code, &bob).await.unwrap();
    let err = s.services().invites.preview(&invite.code).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));
}

#[tokio::test]
async fn typing_state_expires_and_skips_echo() {
    let s = setup().await;
    let (_, alice) = mint(&s, "alice").await;
    let general = general(&s).await;
    let conn = hearth::types::ConnectionId::new();

    let mut rx = s.subscribe();
    s.services()
        .presence
        .set_typing(alice.user_id, conn, general.id, true)
        .await;

    assert_eq!(
        s.services().presence.typing_users(general.id),
        vec![alice.user_id]
    );
    let events = drain(&mut rx);
    assert!(events.iter().any(|ev| matches!(
        ev,
        Broadcast::Room {
            origin: Some(o),
            msg: MessageServer::UserTyping { is_typing: true, .. },
            ..
        } if *o == conn
    )));

    s.services()
        .presence
        .set_typing(alice.user_id, conn, general.id, false)
        .await;
    assert!(s.services().presence.typing_users(general.id).is_empty());
}

#[tokio::test]
async fn unknown_token_is_a_failed_login() {
    let s = setup().await;
    use hearth::services::IdentityVerifier;
    let err = s
        .services()
        .sessions
        .verify("not-a-real-token")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingAuth));

    let (user, token) = s.services().sessions.mint("alice").await.unwrap();
    let identity = s.services().sessions.verify(&token).await.unwrap();
    assert_eq!(identity.user_id, user.id);
    assert_eq!(identity.display_name, "alice");
}

mod http {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;
    use utoipa_axum::router::OpenApiRouter;

    fn app(s: Arc<ServerState>) -> axum::Router {
        let (router, _api) = OpenApiRouter::new()
            .nest("/api/v1", hearth::routes::routes())
            .split_for_parts();
        router.with_state(s)
    }

    #[tokio::test]
    async fn rest_surface_round_trip() {
        let s = setup().await;
        let (_, token) = {
            let (user, token) = s.services().sessions.mint("alice").await.unwrap();
            (user, token)
        };
        let app = app(s.clone());

        // no token, no entry
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/user/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        // create a room over http
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/room")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"from http"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let snapshot: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot["room"]["name"], "from http");
        assert_eq!(snapshot["members"].as_array().unwrap().len(), 1);

        // a dead code previews as 404 with no detail
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/invite/n0tacode")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
