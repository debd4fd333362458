//! Integration tests for `[[tag]]` mentions, tags, projects and comments.

use chrono::NaiveDate;
use jotter_db::test_fixtures::TestDatabase;
use jotter_db::{
    CommentRepository, CommentTarget, CreateProjectRequest, CreateTodoRequest, Error, ItemRef,
    Priority, ProjectRepository, TagRepository, TodoRepository, UpdateProjectRequest,
    UpdateTodoRequest,
};

fn todo(content: &str) -> CreateTodoRequest {
    CreateTodoRequest {
        date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        content: content.to_string(),
        priority: Priority::Low,
    }
}

fn project(name: &str) -> CreateProjectRequest {
    CreateProjectRequest {
        name: name.to_string(),
        color: "#3b82f6".to_string(),
        emoji: Some("🌱".to_string()),
    }
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_mentions_create_tags_case_insensitively() {
    let t = TestDatabase::new().await;
    let user = t.user.id;

    let first = t
        .db
        .todos
        .create(user, todo("plant [[Garden]] beds"))
        .await
        .unwrap();
    assert_eq!(first.tags, vec!["Garden".to_string()]);

    t.db.todos
        .create(user, todo("water the [[garden]] and [[Herbs]]"))
        .await
        .unwrap();

    let tags = t.db.tags.list(user).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Garden", "Herbs"]);
    assert_eq!(tags[0].mention_count, 2);

    // Removing the mention from content drops it.
    let edited = t
        .db
        .todos
        .update(
            user,
            first.id,
            UpdateTodoRequest {
                content: Some("plant beds".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(edited.tags.is_empty());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_deleted_items_do_not_count_as_mentions() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let item = t.db.todos.create(user, todo("[[errands]]")).await.unwrap();
    t.db.todos.soft_delete(user, item.id).await.unwrap();

    let tags = t.db.tags.list(user).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].mention_count, 0);

    let items = t.db.tags.items(user, tags[0].id).await.unwrap();
    assert!(items.todos.is_empty());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_tag_rename_rewrites_content_and_detects_conflicts() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let item = t.db.todos.create(user, todo("call [[ Mom ]] today")).await.unwrap();
    t.db.todos.create(user, todo("[[family]] dinner")).await.unwrap();

    let tags = t.db.tags.list(user).await.unwrap();
    let mom = tags.iter().find(|t| t.name == "Mom").unwrap();
    let family = tags.iter().find(|t| t.name == "family").unwrap();

    let renamed = t.db.tags.rename(user, mom.id, "Mum").await.unwrap();
    assert_eq!(renamed.name, "Mum");
    assert_eq!(renamed.mention_count, 1);

    let rewritten = t.db.todos.get(user, item.id).await.unwrap();
    assert_eq!(rewritten.content, "call [[Mum]] today");
    assert_eq!(rewritten.tags, vec!["Mum".to_string()]);

    let err = t.db.tags.rename(user, family.id, "MUM").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_project_names_unique_per_user() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let other = TestDatabase::create_user(&t.db).await;

    t.db.projects.create(user, project("Home")).await.unwrap();
    let err = t.db.projects.create(user, project("Home")).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Same name for a different user is fine.
    t.db.projects.create(other.id, project("Home")).await.unwrap();

    TestDatabase::delete_user(&t.db, other.id).await;
    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_assignments_are_idempotent_and_listed() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let proj = t.db.projects.create(user, project("Renovation")).await.unwrap();
    let item = t.db.todos.create(user, todo("buy paint")).await.unwrap();
    let comment = t
        .db
        .comments
        .create(user, CommentTarget::Todo(item.id), "white or cream?")
        .await
        .unwrap();

    t.db.projects.assign(user, proj.id, ItemRef::Todo(item.id)).await.unwrap();
    t.db.projects.assign(user, proj.id, ItemRef::Todo(item.id)).await.unwrap();
    t.db.projects
        .assign(user, proj.id, ItemRef::Comment(comment.id))
        .await
        .unwrap();

    let fetched = t.db.projects.get(user, proj.id).await.unwrap();
    assert_eq!(fetched.item_count, 2);

    let items = t.db.projects.items(user, proj.id).await.unwrap();
    assert_eq!(items.todos.len(), 1);
    assert_eq!(items.todos[0].project_ids, vec![proj.id]);
    assert_eq!(items.comments.len(), 1);

    t.db.projects
        .unassign(user, proj.id, ItemRef::Todo(item.id))
        .await
        .unwrap();
    assert!(t.db.projects.items(user, proj.id).await.unwrap().todos.is_empty());

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_archived_projects_hidden_by_default() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let proj = t.db.projects.create(user, project("Old")).await.unwrap();

    let updated = t
        .db
        .projects
        .update(
            user,
            proj.id,
            UpdateProjectRequest {
                archived: Some(true),
                emoji: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.archived);
    assert!(updated.emoji.is_none());

    assert!(t.db.projects.list(user, false).await.unwrap().is_empty());
    assert_eq!(t.db.projects.list(user, true).await.unwrap().len(), 1);

    t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_comment_lifecycle() {
    let t = TestDatabase::new().await;
    let user = t.user.id;
    let item = t.db.todos.create(user, todo("ship it")).await.unwrap();
    let target = CommentTarget::Todo(item.id);

    let comment = t
        .db
        .comments
        .create(user, target, "blocked on [[review]]")
        .await
        .unwrap();
    assert_eq!(comment.target, target);
    assert_eq!(comment.tags, vec!["review".to_string()]);

    let updated = t.db.comments.update(user, comment.id, "unblocked").await.unwrap();
    assert!(updated.tags.is_empty());
    assert_eq!(t.db.comments.list_for(user, target).await.unwrap().len(), 1);

    t.db.comments.delete(user, comment.id).await.unwrap();
    assert!(t.db.comments.list_for(user, target).await.unwrap().is_empty());
    assert!(matches!(
        t.db.comments.delete(user, comment.id).await,
        Err(Error::NotFound(_))
    ));

    t.cleanup().await;
}
