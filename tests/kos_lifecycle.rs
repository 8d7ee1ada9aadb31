//! Entry lifecycle integration tests.
//!
//! These exercise the add/remove/reactivate/sweep flows against a real
//! Postgres database. They are skipped unless TEST_DATABASE_URL points at
//! a disposable database. Entry mutations live in one sequential test so
//! the statistics assertions cannot race each other.

use brotherhood_kos::database::Database;
use brotherhood_kos::models::Actor;
use brotherhood_kos::services::{AuthService, KosService, NotificationService, RobloxProfile};
use brotherhood_kos::utils::errors::KosError;
use chrono::{Duration, Utc};
use rand::Rng;
use teloxide::Bot;

async fn test_db() -> Option<Database> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(Database::new(pool))
}

fn kos_service(db: &Database) -> KosService {
    // Notifications disabled: no chat configured.
    let notifier = NotificationService::new(Bot::new("123456:TEST"), None);
    KosService::new(db.clone(), notifier, 7)
}

fn random_profile() -> RobloxProfile {
    let id: u64 = rand::thread_rng().gen_range(1_000_000..u64::MAX);
    RobloxProfile {
        id: id.to_string(),
        name: format!("player_{id}"),
        display_name: format!("Player {id}"),
        thumbnail_url: None,
    }
}

fn moderator() -> Actor {
    Actor::new("42", "moderator")
}

#[tokio::test]
async fn entry_lifecycle_properties() {
    let Some(db) = test_db().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let kos = kos_service(&db);
    let actor = moderator();

    // --- add / conflict / remove / history ---

    let profile = random_profile();
    let before = kos.stats().await.unwrap();

    // Add with no expiry: not permanent, no time box.
    let entry = kos.add(&profile, "griefing", &actor, None, false).await.unwrap();
    assert!(entry.is_active());
    assert!(!entry.is_permanent);
    assert!(entry.expires_at.is_none());

    let after_add = kos.stats().await.unwrap();
    assert_eq!(after_add.active, before.active + 1);

    let history = kos.entry_history(entry.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "added");

    // Adding again without removing conflicts.
    let conflict = kos.add(&profile, "again", &actor, None, false).await;
    assert!(matches!(conflict, Err(KosError::Conflict(_))));

    // Remove archives and appends (not replaces) history.
    let removed = kos.remove(&profile.id, "resolved", &actor).await.unwrap();
    assert!(removed.is_archived());
    assert_eq!(removed.id, entry.id);

    let after_remove = kos.stats().await.unwrap();
    assert_eq!(after_remove.active, before.active);
    assert_eq!(after_remove.archived, before.archived + 1);

    let history = kos.entry_history(entry.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "removed");
    assert_eq!(history[1].action, "added");

    // Removing again is NotFound.
    let missing = kos.remove(&profile.id, "again", &actor).await;
    assert!(matches!(missing, Err(KosError::NotFound(_))));

    // --- re-add reactivates the same row ---

    let second = kos.add(&profile, "back at it", &actor, None, false).await.unwrap();
    assert_eq!(second.id, entry.id, "re-add must reuse the archived row");
    assert!(second.is_active());
    assert_eq!(second.reason, "back at it");
    assert!(second.removed_at.is_none());
    kos.remove(&profile.id, "cleanup", &actor).await.unwrap();

    // --- expiry sweep: idempotent, spares permanent entries ---

    // One entry that will be backdated past its expiry...
    let expiring = random_profile();
    let timed = kos
        .add(
            &expiring,
            "timed ban",
            &actor,
            Some(Utc::now() + Duration::hours(1)),
            false,
        )
        .await
        .unwrap();

    // ...and a permanent one that must never be swept.
    let permanent = random_profile();
    kos.add(&permanent, "permanent ban", &actor, None, true)
        .await
        .unwrap();

    sqlx::query("UPDATE kos_entries SET expires_at = $2 WHERE id = $1")
        .bind(timed.id)
        .bind(Utc::now() - Duration::minutes(5))
        .execute(db.pool())
        .await
        .unwrap();
    // Give the permanent entry a stale expiry too; the flag must win.
    sqlx::query(
        "UPDATE kos_entries SET expires_at = $2 WHERE roblox_user_id = $1 AND status = 'active'",
    )
    .bind(&permanent.id)
    .bind(Utc::now() - Duration::minutes(5))
    .execute(db.pool())
    .await
    .unwrap();

    let first_run = kos.archive_expired().await.unwrap();
    assert!(first_run >= 1);

    let swept = kos.find(&expiring.id).await.unwrap();
    assert!(swept.is_none(), "expired entry must be archived");

    let kept = kos.find(&permanent.id).await.unwrap();
    assert!(kept.is_some(), "permanent entry must survive the sweep");

    let history = kos.entry_history(timed.id, 10).await.unwrap();
    assert_eq!(history[0].action, "expired");

    // Second run right away does not touch the already-archived entry.
    kos.archive_expired().await.unwrap();
    let history = kos.entry_history(timed.id, 10).await.unwrap();
    let expired_records = history.iter().filter(|r| r.action == "expired").count();
    assert_eq!(expired_records, 1, "sweep must be idempotent");
}

#[tokio::test]
async fn session_expiry_boundaries() {
    let Some(db) = test_db().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let auth = AuthService::new(db.clone(), "test-secret".to_string(), 60, 24);
    let actor = Actor::new("9042", "session-tester");

    let issued = auth.create_auth_code(&actor).await.unwrap();
    let session = auth.login(&issued.code).await.unwrap();

    // A fresh session verifies and resolves the issuing actor.
    let verified = auth.verify_session(&session.token).await.unwrap();
    assert_eq!(verified.id, actor.id);

    // Codes are single-use.
    let reuse = auth.login(&issued.code).await;
    assert!(matches!(reuse, Err(KosError::Auth)));

    // Verified one second before expiry succeeds; after expiry fails closed.
    sqlx::query("UPDATE api_sessions SET expires_at = $1 WHERE actor_id = $2")
        .bind(Utc::now() + Duration::seconds(1))
        .bind(&actor.id)
        .execute(db.pool())
        .await
        .unwrap();
    assert!(auth.verify_session(&session.token).await.is_ok());

    sqlx::query("UPDATE api_sessions SET expires_at = $1 WHERE actor_id = $2")
        .bind(Utc::now() - Duration::seconds(1))
        .bind(&actor.id)
        .execute(db.pool())
        .await
        .unwrap();
    let expired = auth.verify_session(&session.token).await;
    assert!(matches!(expired, Err(KosError::Auth)));

    // Garbage tokens fail with the same error.
    let bogus = auth.verify_session("deadbeef").await;
    assert!(matches!(bogus, Err(KosError::Auth)));
}
