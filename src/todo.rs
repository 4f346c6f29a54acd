use serde::{Deserialize, Serialize};

use crate::Entity;

/// A todo item as served by JSONPlaceholder's `/todos` resource.
///
/// Every field has a default so partial payloads (`{"title": "x"}`) build a
/// complete provisional todo.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Entity)]
#[serde(default, rename_all = "camelCase")]
#[entity(collection = "todos", name = "todo")]
pub struct Todo {
    #[entity(id)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub title: String,
    pub completed: bool,
}

impl Todo {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            user_id: None,
            title: title.into(),
            completed: false,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}
