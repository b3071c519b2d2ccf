//! Auth and query data types

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Credential bundle issued by the identity provider
///
/// Token fields are opaque to the app; only the user and expiry are read.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Fill `expires_at` from `expires_in` when the provider omitted it
    pub fn stamped(mut self) -> Self {
        if self.expires_at.is_none() {
            if let Some(expires_in) = self.expires_in {
                self.expires_at = Some(Utc::now().timestamp() + expires_in);
            }
        }
        self
    }

    /// True when the access token expires within `margin_secs`
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => at - Utc::now().timestamp() <= margin_secs,
            None => false,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Auth-state change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// Session after the change; `None` once signed out
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOrder {
    pub column: String,
    pub ascending: bool,
}

/// Read query against one table
///
/// `columns` is passed through as the projection, so related tables can be
/// embedded the way the query API allows (`"id, title, leads(full_name)"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub table: String,
    pub columns: String,
    pub order: Option<QueryOrder>,
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(QueryOrder {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string parameters in the form the REST endpoint expects
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let projection: String = self.columns.chars().filter(|c| !c.is_whitespace()).collect();
        let mut pairs = vec![("select".to_string(), projection)];

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}
