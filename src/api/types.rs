use serde::Serialize;

use crate::db::User;
use crate::entities::{messages, tools, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub question: String,
    pub role: users::Role,
    pub status: users::UserStatus,
    pub created_at: String,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            question: model.question,
            role: model.role,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            question: user.question,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardMessageDto {
    pub id: i32,
    pub author: String,
    /// Raw comment text; clients render it unescaped.
    pub comment: String,
    pub created_at: String,
}

impl BoardMessageDto {
    #[must_use]
    pub fn from_row(message: messages::Model, author: Option<users::Model>) -> Self {
        Self {
            id: message.id,
            author: author.map_or_else(|| "unknown".to_string(), |u| u.username),
            comment: message.comment,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolDto {
    pub id: i32,
    pub name: String,
    pub path: String,
    pub description: String,
}

impl From<tools::Model> for ToolDto {
    fn from(model: tools::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            path: model.path,
            description: model.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArtifactDto {
    pub name: String,
    pub size: u64,
}
