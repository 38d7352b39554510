use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

/// User record resolved from a credential by the identity authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    #[serde(rename = "full_name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "low", alias = "Low", alias = "LOW")]
    Low,
    #[serde(rename = "medium", alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(rename = "high", alias = "High", alias = "HIGH")]
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Server representation of a task. The authority is the only writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// The authority stores priority as free text; anything unrecognized reads as absent.
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<TaskPriority>,
    #[serde(default, with = "calendar_date")]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Server timestamps are opaque to the client.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

/// Body of `POST /{owner}/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(with = "calendar_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority: None,
            due_date: None,
            category_id: None,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: Date) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Body of `PUT /{owner}/tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
}

/// Server-side narrowing for `GET /{owner}/tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn completed(completed: Option<bool>) -> Self {
        Self {
            completed,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search.trim().to_owned())
        };
        self
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search".to_owned(), search.clone()));
        }
        if let Some(completed) = self.completed {
            pairs.push(("completed".to_owned(), completed.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Body of `PUT /users/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
}

/// Body of `POST /chat`. A `null` conversation id asks the assistant to open a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub conversation_id: Option<i64>,
    pub response: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<TaskPriority>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let priority = raw.and_then(|value| serde_json::from_value::<TaskPriority>(value).ok());
    Ok(priority)
}

/// `YYYY-MM-DD` calendar dates; blank strings read as absent.
mod calendar_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::macros::format_description;
    use time::Date;

    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => {
                let text = date
                    .format(format_description!("[year]-[month]-[day]"))
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                Date::parse(value, format_description!("[year]-[month]-[day]"))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
