//! Error types for the laundry service.

use serde::Serialize;

/// Domain-level errors (constraint violations on entity values).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("{entity}.{property} is required")]
    Required {
        entity: &'static str,
        property: &'static str,
    },

    #[error("{entity}.{property} exceeds the maximum length of {max} characters (got {actual})")]
    MaxLength {
        entity: &'static str,
        property: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord {
        entity: &'static str,
        reason: String,
    },
}

/// Errors raised while assembling a schema model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Entity {0} is declared more than once")]
    DuplicateEntity(String),

    #[error("Entity {entity} references unknown entity {principal}")]
    UnknownPrincipal { entity: String, principal: String },

    #[error("Entity {entity} has no property named {property}")]
    UnknownProperty { entity: String, property: String },

    #[error("Foreign keys form a cycle through {0}")]
    Cycle(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Schema error: {0}")]
    Schema(String),
}

/// The step of a CRUD operation that failed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Retrieving,
    Saving,
    Updating,
    Deleting,
}

impl std::fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceAction::Retrieving => "retrieving",
            ServiceAction::Saving => "saving",
            ServiceAction::Updating => "updating",
            ServiceAction::Deleting => "deleting",
        };
        write!(f, "{}", s)
    }
}

/// Application-level errors returned by every CRUD operation.
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{} not found", capitalize(.entity))]
    NotFound { entity: &'static str },

    #[error("An error occurred while {action} the {entity}: {detail}")]
    Persistence {
        action: ServiceAction,
        entity: &'static str,
        detail: String,
    },
}

impl ServiceError {
    pub fn persistence(action: ServiceAction, entity: &'static str, err: RepoError) -> Self {
        ServiceError::Persistence {
            action,
            entity,
            detail: err.to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Wire form of a CRUD result: `{"ok": true, "value": ...}` or
/// `{"ok": false, "message": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> From<Result<T, ServiceError>> for OperationResponse<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(value) => OperationResponse {
                ok: true,
                value: Some(value),
                message: None,
            },
            Err(err) => OperationResponse {
                ok: false,
                value: None,
                message: Some(err.to_string()),
            },
        }
    }
}
