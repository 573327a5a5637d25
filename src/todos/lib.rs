use anyhow::Result;
use libsql::Connection;
use serde::{Deserialize, Serialize};

pub const MAX_CONTENT_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i32,
    pub content: String,
    pub is_completed: bool,
    pub owner: String,
    pub created_at: String,
}

/// A todo plus the owner id the serialized form leaves out.
/// Handlers compare `owner_id` against the caller before acting.
#[derive(Debug, Clone)]
pub struct OwnedTodo {
    pub todo: Todo,
    pub owner_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodo {
    pub content: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTodo {
    pub content: Option<String>,
    pub is_completed: Option<bool>,
}

pub struct Todos<'a> {
    conn: &'a Connection,
}

impl<'a> Todos<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_todo(&self, owner_id: i32, input: &CreateTodo) -> Result<Todo> {
        let query = r#"
            INSERT INTO todos (content, is_completed, owner_id)
            VALUES (?, ?, ?)
            RETURNING id
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    input.content.as_str(),
                    i32::from(input.is_completed),
                    owner_id
                ],
            )
            .await?;

        let id: i32 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            anyhow::bail!("Failed to create todo")
        };

        match self.get_todo(id).await? {
            Some(owned) => Ok(owned.todo),
            None => anyhow::bail!("Failed to read back created todo {}", id),
        }
    }

    pub async fn get_todo(&self, id: i32) -> Result<Option<OwnedTodo>> {
        let query = r#"
            SELECT todos.id, todos.content, todos.is_completed, todos.owner_id,
                   users.username, todos.created_at
            FROM todos
            JOIN users ON users.id = todos.owner_id
            WHERE todos.id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_owned_todo(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Reads are scoped to one owner; there is no unscoped listing.
    pub async fn list_for_owner(&self, owner_id: i32, limit: i32, offset: i32) -> Result<Vec<Todo>> {
        let query = r#"
            SELECT todos.id, todos.content, todos.is_completed, todos.owner_id,
                   users.username, todos.created_at
            FROM todos
            JOIN users ON users.id = todos.owner_id
            WHERE todos.owner_id = ?
            ORDER BY todos.created_at
            LIMIT ? OFFSET ?
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![owner_id, limit, offset])
            .await?;

        let mut todos = Vec::new();
        while let Some(row) = rows.next().await? {
            todos.push(Self::row_to_owned_todo(&row)?.todo);
        }

        Ok(todos)
    }

    pub async fn update_todo(&self, id: i32, input: &UpdateTodo) -> Result<Option<Todo>> {
        if self.get_todo(id).await?.is_none() {
            return Ok(None);
        }

        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(content) = &input.content {
            updates.push("content = ?");
            params.push(content.clone().into());
        }
        if let Some(is_completed) = input.is_completed {
            updates.push("is_completed = ?");
            params.push(i32::from(is_completed).into());
        }

        if updates.is_empty() {
            return Ok(self.get_todo(id).await?.map(|owned| owned.todo));
        }

        updates.push("updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')");
        params.push(id.into());

        let query = format!("UPDATE todos SET {} WHERE id = ?", updates.join(", "));

        self.conn.execute(&query, params).await?;
        Ok(self.get_todo(id).await?.map(|owned| owned.todo))
    }

    pub async fn delete_todo(&self, id: i32) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    fn row_to_owned_todo(row: &libsql::Row) -> Result<OwnedTodo> {
        let is_completed: i32 = row.get(2)?;

        Ok(OwnedTodo {
            todo: Todo {
                id: row.get(0)?,
                content: row.get(1)?,
                is_completed: is_completed != 0,
                owner: row.get(4)?,
                created_at: row.get(5)?,
            },
            owner_id: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_todo_defaults_is_completed_to_false() {
        let input: CreateTodo = serde_json::from_str(r#"{"content":"buy milk"}"#).unwrap();
        assert_eq!(input.content, "buy milk");
        assert!(!input.is_completed);
    }

    #[test]
    fn create_todo_accepts_explicit_is_completed() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"content":"done already","is_completed":true}"#).unwrap();
        assert!(input.is_completed);
    }

    #[test]
    fn create_todo_rejects_missing_content() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"is_completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.content.is_none());
        assert!(input.is_completed.is_none());
    }

    #[test]
    fn todo_serializes_owner_as_username() {
        let todo = Todo {
            id: 7,
            content: "buy milk".to_string(),
            is_completed: false,
            owner: "ada".to_string(),
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["owner"], "ada");
        assert!(json.get("owner_id").is_none());
    }
}
