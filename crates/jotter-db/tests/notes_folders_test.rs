//! Integration tests for notes and the folder tree.

use chrono::NaiveDate;
use jotter_db::test_fixtures::TestDatabase;
use jotter_db::{
    CreateFolderRequest, CreateNoteRequest, Error, FolderRepository, NoteKind, NoteRepository,
    UpdateNoteRequest,
};
use uuid::Uuid;

fn generic(title: &str, folder_id: Option<Uuid>) -> CreateNoteRequest {
    CreateNoteRequest {
        kind: NoteKind::Generic,
        date: None,
        folder_id,
        title: Some(title.to_string()),
        content: String::new(),
    }
}

fn folder(name: &str, parent_id: Option<Uuid>) -> CreateFolderRequest {
    CreateFolderRequest {
        name: name.to_string(),
        parent_id,
    }
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_daily_notes_listed_by_date() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

    let note = t
        .db
        .notes
        .create(
            user,
            CreateNoteRequest {
                kind: NoteKind::Daily,
                date: Some(date),
                folder_id: None,
                title: None,
                content: "standup went long".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(note.kind, NoteKind::Daily);
    assert!(note.slug.is_none());

    let view = t.db.day_view(user, date).await.unwrap();
    assert_eq!(view.notes.len(), 1);
    assert!(view.todos.is_empty());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_generic_note_slugs_are_unique_per_folder() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let work = t.db.folders.create(user, folder("Work", None)).await.unwrap();

    let first = t.db.notes.create(user, generic("Reading List", None)).await.unwrap();
    let second = t.db.notes.create(user, generic("reading list!", None)).await.unwrap();
    let in_folder = t
        .db
        .notes
        .create(user, generic("Reading List", Some(work.id)))
        .await
        .unwrap();

    assert_eq!(first.slug.as_deref(), Some("reading-list"));
    assert_eq!(second.slug.as_deref(), Some("reading-list-2"));
    assert_eq!(in_folder.slug.as_deref(), Some("reading-list"));

    let found = t
        .db
        .notes
        .get_by_slug(user, Some(work.id), "reading-list")
        .await
        .unwrap();
    assert_eq!(found.id, in_folder.id);

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_retitle_and_move_reslug_on_clash() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let archive = t.db.folders.create(user, folder("Archive", None)).await.unwrap();

    t.db.notes
        .create(user, generic("Ideas", Some(archive.id)))
        .await
        .unwrap();
    let note = t.db.notes.create(user, generic("Scratch", None)).await.unwrap();

    let renamed = t
        .db
        .notes
        .update(
            user,
            note.id,
            UpdateNoteRequest {
                title: Some("Ideas".into()),
                content: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.slug.as_deref(), Some("ideas"));

    let moved = t
        .db
        .notes
        .move_to_folder(user, note.id, Some(archive.id))
        .await
        .unwrap();
    assert_eq!(moved.folder_id, Some(archive.id));
    assert_eq!(moved.slug.as_deref(), Some("ideas-2"));

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_restore_reslugs_when_slug_taken() {
    let t = TestDatabase::new().await;
    let user = t.user.id;

    let original = t.db.notes.create(user, generic("Plans", None)).await.unwrap();
    t.db.notes.soft_delete(user, original.id).await.unwrap();
    let replacement = t.db.notes.create(user, generic("Plans", None)).await.unwrap();
    assert_eq!(replacement.slug.as_deref(), Some("plans"));

    let trash = t.db.notes.list_trash(user).await.unwrap();
    assert_eq!(trash.len(), 1);

    let restored = t.db.notes.restore(user, original.id).await.unwrap();
    assert_eq!(restored.slug.as_deref(), Some("plans-2"));
    assert!(t.db.notes.list_trash(user).await.unwrap().is_empty());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_folder_tree_is_depth_first() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let a = t.db.folders.create(user, folder("A", None)).await.unwrap();
    let b = t.db.folders.create(user, folder("B", None)).await.unwrap();
    let a1 = t.db.folders.create(user, folder("A1", Some(a.id))).await.unwrap();
    let a1x = t.db.folders.create(user, folder("A1x", Some(a1.id))).await.unwrap();

    let tree = t.db.folders.list_tree(user).await.unwrap();
    let order: Vec<(Uuid, i32)> = tree.iter().map(|f| (f.id, f.depth)).collect();
    assert_eq!(order, vec![(a.id, 0), (a1.id, 1), (a1x.id, 2), (b.id, 0)]);

    let fetched = t.db.folders.get(user, a1x.id).await.unwrap();
    assert_eq!(fetched.depth, 2);

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_folder_cannot_move_under_descendant() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let parent = t.db.folders.create(user, folder("Parent", None)).await.unwrap();
    let child = t.db.folders.create(user, folder("Child", Some(parent.id))).await.unwrap();

    let err = t
        .db
        .folders
        .move_to(user, parent.id, Some(child.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = t
        .db
        .folders
        .move_to(user, parent.id, Some(parent.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let moved = t.db.folders.move_to(user, child.id, None).await.unwrap();
    assert!(moved.parent_id.is_none());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_folder_delete_trashes_subtree_notes() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let top = t.db.folders.create(user, folder("Top", None)).await.unwrap();
    let nested = t.db.folders.create(user, folder("Nested", Some(top.id))).await.unwrap();
    let shallow = t.db.notes.create(user, generic("Shallow", Some(top.id))).await.unwrap();
    let deep = t.db.notes.create(user, generic("Deep", Some(nested.id))).await.unwrap();

    t.db.folders.delete(user, top.id).await.unwrap();

    assert!(t.db.folders.list_tree(user).await.unwrap().is_empty());
    let trash_ids: Vec<Uuid> = t
        .db
        .notes
        .list_trash(user)
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert!(trash_ids.contains(&shallow.id));
    assert!(trash_ids.contains(&deep.id));

    let restored = t.db.notes.restore(user, deep.id).await.unwrap();
    assert!(restored.folder_id.is_none());

    t.cleanup().await;
}
