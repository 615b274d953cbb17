//! # vndb-client
//!
//! Typed command surface over [`vndb_protocol`]:
//!
//! - [`Client`]: `dbstats`, generic `get`/`set`, and per-entity helpers
//! - [`Filter`]: the filter-expression builder
//! - [`types`]: `DbStats`, `Results`, `GetOptions`, `EntityType`
//! - [`ClientError`]: server errors, unexpected keywords, payload shape
//!
//! Everything here is string formatting and payload typing; the session
//! engine underneath does the actual protocol work.

#![deny(unsafe_code)]

pub mod error;
pub mod filter;
pub mod types;

use serde::de::DeserializeOwned;
use serde_json::Value;

use vndb_protocol::{Message, Session, SessionConfig, registry};

pub use error::ClientError;
pub use filter::Filter;
pub use types::{DbStats, EntityType, GetOptions, Results, ServerErrorBody};

/// A generic fetch: entity type, flags, filter, and paging options.
#[derive(Clone, Debug)]
pub struct GetRequest {
    /// Entity category to fetch.
    pub entity: EntityType,
    /// Field groups to include; defaults to `basic` when empty.
    pub flags: Vec<String>,
    /// Filter expression selecting the records.
    pub filter: Filter,
    /// Paging and sorting options.
    pub options: Option<GetOptions>,
}

impl GetRequest {
    /// A request with default options.
    #[must_use]
    pub fn new(entity: EntityType, flags: &[&str], filter: Filter) -> Self {
        Self {
            entity,
            flags: flags.iter().map(ToString::to_string).collect(),
            filter,
            options: None,
        }
    }

    /// Attach paging/sorting options.
    #[must_use]
    pub fn with_options(mut self, options: GetOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The command string and JSON argument handed to dispatch.
    fn to_command(&self) -> (String, Value) {
        let flags = if self.flags.is_empty() {
            "basic".to_owned()
        } else {
            self.flags.join(",")
        };
        let command = format!("get {} {} {}", self.entity, flags, self.filter);
        let args = match &self.options {
            Some(options) if !options.is_empty() => {
                serde_json::to_value(options).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        (command, args)
    }
}

/// Typed client over one [`Session`].
#[derive(Clone)]
pub struct Client {
    session: Session,
}

impl Client {
    /// Wrap an existing session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Connect a dedicated (local) session and wrap it.
    pub async fn connect(config: SessionConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Session::connect(config).await?))
    }

    /// The client over the ambient global session, if one is running.
    pub async fn global() -> Option<Self> {
        registry::global().current().await.map(Self::new)
    }

    /// The underlying session handle.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Close the underlying session.
    pub async fn close(&self) {
        self.session.close().await;
    }

    // ─── Generic commands ────────────────────────────────────────────────

    /// Fetch database-wide statistics.
    pub async fn dbstats(&self) -> Result<DbStats, ClientError> {
        let msg = self.session.dispatch("dbstats", Value::Null).await?;
        expect_payload("dbstats", "dbstats", msg)
    }

    /// Fetch one page of records.
    pub async fn get(&self, request: &GetRequest) -> Result<Results<Value>, ClientError> {
        let (command, args) = request.to_command();
        let msg = self.session.dispatch(command.clone(), args).await?;
        expect_payload(&command, "results", msg)
    }

    /// Update fields on one record.
    pub async fn set(
        &self,
        entity: EntityType,
        id: u64,
        fields: Value,
    ) -> Result<(), ClientError> {
        let command = format!("set {entity} {id}");
        let msg = self.session.dispatch(command.clone(), fields).await?;
        match msg.keyword.as_str() {
            "ok" => Ok(()),
            "error" => Err(server_error(msg.payload)),
            _ => Err(ClientError::Unexpected {
                command,
                keyword: msg.keyword.clone(),
            }),
        }
    }

    // ─── Per-entity helpers ──────────────────────────────────────────────

    /// Fetch visual novels.
    pub async fn get_vn(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Vn, flags, filter)).await
    }

    /// Fetch releases.
    pub async fn get_release(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Release, flags, filter))
            .await
    }

    /// Fetch producers.
    pub async fn get_producer(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Producer, flags, filter))
            .await
    }

    /// Fetch characters.
    pub async fn get_character(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Character, flags, filter))
            .await
    }

    /// Fetch staff members.
    pub async fn get_staff(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Staff, flags, filter))
            .await
    }

    /// Fetch user accounts.
    pub async fn get_user(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::User, flags, filter))
            .await
    }

    /// Fetch entries from the authenticated user's list.
    pub async fn get_ulist(
        &self,
        flags: &[&str],
        filter: Filter,
    ) -> Result<Results<Value>, ClientError> {
        self.get(&GetRequest::new(EntityType::Ulist, flags, filter))
            .await
    }

    /// Update one entry on the authenticated user's list.
    pub async fn set_ulist(&self, id: u64, fields: Value) -> Result<(), ClientError> {
        self.set(EntityType::Ulist, id, fields).await
    }
}

/// Interpret a response that should carry a typed payload under `expected`.
fn expect_payload<T: DeserializeOwned>(
    command: &str,
    expected: &str,
    msg: Message,
) -> Result<T, ClientError> {
    match msg.keyword.as_str() {
        keyword if keyword == expected => {
            serde_json::from_value(msg.payload).map_err(|source| ClientError::Payload {
                keyword: expected.to_owned(),
                source,
            })
        }
        "error" => Err(server_error(msg.payload)),
        _ => Err(ClientError::Unexpected {
            command: command.to_owned(),
            keyword: msg.keyword.clone(),
        }),
    }
}

/// Map an `error` payload to [`ClientError::Server`], tolerating payloads
/// that do not match the documented shape.
fn server_error(payload: Value) -> ClientError {
    match serde_json::from_value::<ServerErrorBody>(payload.clone()) {
        Ok(body) => ClientError::Server {
            id: body.id,
            msg: body.msg,
        },
        Err(_) => ClientError::Server {
            id: "unknown".to_owned(),
            msg: payload.to_string(),
        },
    }
}
