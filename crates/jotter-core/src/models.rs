//! Domain models for jotter.
//!
//! Rows are owned by a user; every repository call is scoped by `user_id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// USERS & SESSIONS
// =============================================================================

/// An account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated session, resolved from an opaque bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Result of issuing a session. The raw token is only ever returned here;
/// the database stores its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

// =============================================================================
// TODOS
// =============================================================================

/// Todo priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidInput(format!("Unknown priority: {}", other))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A todo attached to a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub content: String,
    pub priority: Priority,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Ordering within the day (drag-and-drop).
    pub position: i32,
    /// Todo this one was copied from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_from_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Mentioned tag names (computed)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Assigned project IDs (computed)
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub date: NaiveDate,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub content: Option<String>,
    pub priority: Option<Priority>,
    /// Moving a todo to another day appends it to the end of that day.
    pub date: Option<NaiveDate>,
}

// =============================================================================
// NOTES & FOLDERS
// =============================================================================

/// Daily notes hang off a date; generic notes live in the folder tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Daily,
    Generic,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Daily => "daily",
            NoteKind::Generic => "generic",
        }
    }
}

impl FromStr for NoteKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(NoteKind::Daily),
            "generic" => Ok(NoteKind::Generic),
            other => Err(Error::InvalidInput(format!("Unknown note kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Containing folder (None = root) for generic notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub content: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub kind: NoteKind,
    pub date: Option<NaiveDate>,
    pub folder_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl CreateNoteRequest {
    /// Daily notes need a date and no folder; generic notes need a title and no date.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            NoteKind::Daily => {
                if self.date.is_none() {
                    return Err(Error::InvalidInput("Daily notes require a date".into()));
                }
                if self.folder_id.is_some() {
                    return Err(Error::InvalidInput(
                        "Daily notes cannot be placed in a folder".into(),
                    ));
                }
            }
            NoteKind::Generic => {
                if self.date.is_some() {
                    return Err(Error::InvalidInput("Generic notes have no date".into()));
                }
                match self.title.as_deref().map(str::trim) {
                    Some(t) if !t.is_empty() => {}
                    _ => {
                        return Err(Error::InvalidInput("Generic notes require a title".into()))
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    /// Renaming a generic note re-derives its slug.
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A folder in the generic-notes tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteFolder {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Parent folder ID for nested hierarchy (None = root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Depth in the tree, 0 for root folders (computed)
    #[serde(default)]
    pub depth: i32,
    /// Number of live notes directly in this folder (computed)
    #[serde(default)]
    pub note_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

// =============================================================================
// PROJECTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    /// Number of assigned items (computed)
    #[serde(default)]
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub color: String,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    /// Empty string clears the emoji.
    pub emoji: Option<String>,
    pub archived: Option<bool>,
}

/// Everything assigned to (or mentioning) something.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCollection {
    pub notes: Vec<Note>,
    pub todos: Vec<Todo>,
    pub comments: Vec<Comment>,
}

// =============================================================================
// TAGS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Number of live items mentioning this tag (computed)
    #[serde(default)]
    pub mention_count: i64,
}

/// Reference to a taggable / assignable / commentable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    Note(Uuid),
    Todo(Uuid),
    Comment(Uuid),
}

impl ItemRef {
    pub fn id(&self) -> Uuid {
        match self {
            ItemRef::Note(id) | ItemRef::Todo(id) | ItemRef::Comment(id) => *id,
        }
    }

    /// Junction column holding this item's id.
    pub fn column(&self) -> &'static str {
        match self {
            ItemRef::Note(_) => "note_id",
            ItemRef::Todo(_) => "todo_id",
            ItemRef::Comment(_) => "comment_id",
        }
    }

    /// Table the referenced item lives in.
    pub fn table(&self) -> &'static str {
        match self {
            ItemRef::Note(_) => "notes",
            ItemRef::Todo(_) => "todos",
            ItemRef::Comment(_) => "comments",
        }
    }
}

// =============================================================================
// COMMENTS
// =============================================================================

/// What a comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum CommentTarget {
    Todo(Uuid),
    Note(Uuid),
}

impl CommentTarget {
    pub fn id(&self) -> Uuid {
        match self {
            CommentTarget::Todo(id) | CommentTarget::Note(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: CommentTarget,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }
}

impl FromStr for TimeFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "12h" => Ok(TimeFormat::TwelveHour),
            "24h" => Ok(TimeFormat::TwentyFourHour),
            other => Err(Error::InvalidInput(format!(
                "Unknown time format: {} (expected 12h or 24h)",
                other
            ))),
        }
    }
}

/// Custom accent color as OKLCH components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccentColor {
    /// 0.0 ..= 1.0
    pub lightness: f64,
    /// 0.0 ..= 0.5
    pub chroma: f64,
    /// 0.0 ..= 360.0
    pub hue: f64,
}

impl AccentColor {
    pub fn validate(&self) -> Result<()> {
        fn check(name: &str, value: f64, max: f64) -> Result<()> {
            if !value.is_finite() || !(0.0..=max).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "Accent {} must be between 0 and {}, got {}",
                    name, max, value
                )));
            }
            Ok(())
        }
        check("lightness", self.lightness, 1.0)?;
        check("chroma", self.chroma, 0.5)?;
        check("hue", self.hue, 360.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub time_format: TimeFormat,
    pub accent: Option<AccentColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserSettings {
    /// Settings used for users who never saved any.
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            time_format: TimeFormat::default(),
            accent: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub time_format: Option<TimeFormat>,
    pub accent: Option<AccentColor>,
    /// Remove the custom accent (takes precedence over `accent`).
    #[serde(default)]
    pub clear_accent: bool,
}

// =============================================================================
// VIEWS
// =============================================================================

/// Everything shown for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub todos: Vec<Todo>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchHitKind {
    Note,
    Todo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub kind: SearchHitKind,
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_str() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
    }

    #[test]
    fn create_todo_request_defaults_priority() {
        let req: CreateTodoRequest =
            serde_json::from_str(r#"{"date":"2026-10-16","content":"buy milk"}"#).unwrap();
        assert_eq!(req.priority, Priority::Medium);
    }

    #[test]
    fn daily_note_requires_date() {
        let req = CreateNoteRequest {
            kind: NoteKind::Daily,
            date: None,
            folder_id: None,
            title: None,
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn generic_note_requires_title() {
        let mut req = CreateNoteRequest {
            kind: NoteKind::Generic,
            date: None,
            folder_id: None,
            title: Some("   ".into()),
            content: String::new(),
        };
        assert!(req.validate().is_err());
        req.title = Some("Reading list".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn generic_note_rejects_date() {
        let req = CreateNoteRequest {
            kind: NoteKind::Generic,
            date: NaiveDate::from_ymd_opt(2026, 1, 1),
            folder_id: None,
            title: Some("x".into()),
            content: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn item_ref_serializes_with_kind_and_id() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ItemRef::Todo(id)).unwrap();
        assert_eq!(json["kind"], "todo");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(ItemRef::Comment(id).column(), "comment_id");
    }

    #[test]
    fn time_format_uses_short_names() {
        assert_eq!(
            serde_json::to_string(&TimeFormat::TwelveHour).unwrap(),
            "\"12h\""
        );
        assert_eq!("24h".parse::<TimeFormat>().unwrap(), TimeFormat::TwentyFourHour);
        assert!("25h".parse::<TimeFormat>().is_err());
    }

    #[test]
    fn accent_color_range_validation() {
        let ok = AccentColor {
            lightness: 0.7,
            chroma: 0.15,
            hue: 250.0,
        };
        assert!(ok.validate().is_ok());

        let bad_hue = AccentColor { hue: 361.0, ..ok };
        assert!(bad_hue.validate().is_err());

        let nan = AccentColor {
            lightness: f64::NAN,
            ..ok
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn default_settings_use_24h_without_accent() {
        let s = UserSettings::defaults_for(Uuid::nil());
        assert_eq!(s.time_format, TimeFormat::TwentyFourHour);
        assert!(s.accent.is_none());
    }
}
