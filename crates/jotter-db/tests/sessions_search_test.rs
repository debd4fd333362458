//! Integration tests for sessions, settings and search.

use chrono::{Duration, NaiveDate};
use jotter_db::test_fixtures::TestDatabase;
use jotter_db::{
    AccentColor, CreateNoteRequest, CreateTodoRequest, Error, NoteKind, NoteRepository, Priority,
    SearchHitKind, SessionRepository, SettingsRepository, TimeFormat, TodoRepository,
    UpdateSettingsRequest, UserRepository, TOKEN_PREFIX,
};

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_session_issue_validate_revoke() {
    let t = TestDatabase::new().await;

    let issued = t
        .db
        .sessions
        .issue(t.user.id, Duration::hours(1))
        .await
        .unwrap();
    assert!(issued.token.starts_with(TOKEN_PREFIX));

    let session = t.db.sessions.validate(&issued.token).await.unwrap().unwrap();
    assert_eq!(session.user_id, t.user.id);

    assert!(t.db.sessions.validate("jt_bogus").await.unwrap().is_none());
    assert!(t.db.sessions.validate("no-prefix").await.unwrap().is_none());

    t.db.sessions.revoke(&issued.token).await.unwrap();
    assert!(t.db.sessions.validate(&issued.token).await.unwrap().is_none());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_expired_sessions_are_rejected() {
    let t = TestDatabase::new().await;
    let issued = t
        .db
        .sessions
        .issue(t.user.id, Duration::milliseconds(1))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(t.db.sessions.validate(&issued.token).await.unwrap().is_none());
    assert!(t.db.sessions.purge_expired().await.unwrap() >= 1);

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_upsert_by_email_is_idempotent() {
    let t = TestDatabase::new().await;
    let again = t
        .db
        .users
        .upsert_by_email(&t.user.email.to_uppercase(), None)
        .await
        .unwrap();
    assert_eq!(again.id, t.user.id);
    assert_eq!(again.name, t.user.name);

    assert!(matches!(
        t.db.users.upsert_by_email("not-an-email", None).await,
        Err(Error::InvalidInput(_))
    ));

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_settings_default_then_persist() {
    let t = TestDatabase::new().await;
    let user = t.user.id;

    let defaults = t.db.settings.get(user).await.unwrap();
    assert_eq!(defaults.time_format, TimeFormat::TwentyFourHour);
    assert!(defaults.accent.is_none());
    assert!(defaults.updated_at.is_none());

    let accent = AccentColor {
        lightness: 0.7,
        chroma: 0.12,
        hue: 30.0,
    };
    let saved = t
        .db
        .settings
        .update(
            user,
            UpdateSettingsRequest {
                time_format: Some(TimeFormat::TwelveHour),
                accent: Some(accent),
                clear_accent: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.time_format, TimeFormat::TwelveHour);
    assert_eq!(saved.accent, Some(accent));
    assert!(saved.updated_at.is_some());

    let cleared = t
        .db
        .settings
        .update(
            user,
            UpdateSettingsRequest {
                clear_accent: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.accent.is_none());
    assert_eq!(cleared.time_format, TimeFormat::TwelveHour);

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_search_finds_notes_and_todos() {
    let t = TestDatabase::new().await;
    let user = t.user.id;

    let note = t
        .db
        .notes
        .create(
            user,
            CreateNoteRequest {
                kind: NoteKind::Generic,
                date: None,
                folder_id: None,
                title: Some("Sourdough starter".into()),
                content: "Feed twice a day with rye flour".into(),
            },
        )
        .await
        .unwrap();
    let todo = t
        .db
        .todos
        .create(
            user,
            CreateTodoRequest {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                content: "Buy rye flour".into(),
                priority: Priority::Medium,
            },
        )
        .await
        .unwrap();
    t.db.todos
        .create(
            user,
            CreateTodoRequest {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                content: "Unrelated chore".into(),
                priority: Priority::Medium,
            },
        )
        .await
        .unwrap();

    let hits = t.db.search.search(user, "rye flour", 20).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().any(|h| h.kind == SearchHitKind::Note && h.id == note.id));
    assert!(hits.iter().any(|h| h.kind == SearchHitKind::Todo && h.id == todo.id));

    // Literal wildcard characters are not treated as patterns.
    assert!(t.db.search.search(user, "%", 20).await.unwrap().is_empty());

    assert!(matches!(
        t.db.search.search(user, "  ", 20).await,
        Err(Error::InvalidInput(_))
    ));

    t.cleanup().await;
}
