//! Unified error types for fleet-filters.
//!
//! Every mutating command returns either a cost or one of the error kinds
//! below. Command-facing errors carry a [`MessageKey`]; turning a key into
//! user text is the caller's job.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Stable key identifying a user-visible failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageKey(pub &'static str);

impl MessageKey {
    /// The raw key string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Message keys raised by the core.
pub mod messages {
    use super::MessageKey;

    pub const UNKNOWN_COMPANY: MessageKey = MessageKey("error.company.unknown");
    pub const UNKNOWN_TOWN: MessageKey = MessageKey("error.town.unknown");
    pub const UNKNOWN_STATION: MessageKey = MessageKey("error.station.unknown");
    pub const UNKNOWN_VEHICLE: MessageKey = MessageKey("error.vehicle.unknown");
    pub const UNKNOWN_ORDER_LIST: MessageKey = MessageKey("error.order-list.unknown");
    pub const UNKNOWN_ENGINE: MessageKey = MessageKey("error.engine.unknown");
    pub const UNKNOWN_CARGO: MessageKey = MessageKey("error.cargo.unknown");
    pub const UNKNOWN_GROUP: MessageKey = MessageKey("error.group.unknown");
    pub const DUPLICATE_ID: MessageKey = MessageKey("error.entity.duplicate-id");
    pub const VEHICLE_TYPE_MISMATCH: MessageKey = MessageKey("error.group.vehicle-type-mismatch");
    pub const NOT_PRIMARY_VEHICLE: MessageKey = MessageKey("error.vehicle.not-primary");
    pub const CANNOT_CREATE_GROUP: MessageKey = MessageKey("error.group.cannot-create");
    pub const TOO_MANY_GROUPS: MessageKey = MessageKey("error.group.too-many");
    pub const GROUP_CYCLE: MessageKey = MessageKey("error.group.parent-cycle");
    pub const NAME_NOT_UNIQUE: MessageKey = MessageKey("error.group.name-not-unique");
    pub const NAME_TOO_LONG: MessageKey = MessageKey("error.group.name-too-long");
    pub const NOT_OWNER: MessageKey = MessageKey("error.company.not-owner");
    pub const AXIS_DISABLED: MessageKey = MessageKey("error.filter.axis-disabled");
    pub const UNKNOWN_ELEMENT: MessageKey = MessageKey("error.filter.unknown-element");
    pub const DUPLICATE_ELEMENT: MessageKey = MessageKey("error.filter.duplicate-element");
    pub const TOWN_DESTROYED: MessageKey = MessageKey("error.town.destroyed");
    pub const UNKNOWN_MODEL: MessageKey = MessageKey("error.filter.unknown-model");
    pub const FOREIGN_SHARER: MessageKey = MessageKey("error.order-list.foreign-sharer");
    pub const RESERVED_GROUP: MessageKey = MessageKey("error.group.reserved");
}

/// Classification of a failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidArgument,
    PoolExhausted,
    InvariantViolation,
    NameConflict,
    Authorisation,
    Config,
    Io,
    Scenario,
}

/// Main error type for fleet-filters operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FleetError {
    /// Unknown id, unknown vehicle type or cross-owner operation
    #[error("Invalid argument ({key}): {context}")]
    InvalidArgument { key: MessageKey, context: String },

    /// Not enough free slots in the group pool
    #[error("Group pool exhausted ({key}): {required} slots required, {available} available")]
    PoolExhausted {
        key: MessageKey,
        required: usize,
        available: usize,
    },

    /// Caller broke a structural rule (cycles, duplicates, town destruction)
    #[error("Invariant violation ({key}): {context}")]
    InvariantViolation { key: MessageKey, context: String },

    /// Group name already used in the same owner and vehicle type scope
    #[error("Name conflict ({key}): '{name}' is already in use")]
    NameConflict { key: MessageKey, name: String },

    /// Actor does not own the target
    #[error("Not authorised ({key}): {context}")]
    Authorisation { key: MessageKey, context: String },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Scenario documents that fail to parse or cross-reference
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}

/// Convenient Result type for fleet-filters operations
pub type Result<T> = std::result::Result<T, FleetError>;

impl FleetError {
    pub fn invalid_argument(key: MessageKey, context: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key,
            context: context.into(),
        }
    }

    pub fn invariant(key: MessageKey, context: impl Into<String>) -> Self {
        Self::InvariantViolation {
            key,
            context: context.into(),
        }
    }

    pub fn not_owner(context: impl Into<String>) -> Self {
        Self::Authorisation {
            key: messages::NOT_OWNER,
            context: context.into(),
        }
    }

    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::NameConflict {
            key: messages::NAME_NOT_UNIQUE,
            name: name.into(),
        }
    }

    pub const fn pool_exhausted(required: usize, available: usize) -> Self {
        Self::PoolExhausted {
            key: messages::TOO_MANY_GROUPS,
            required,
            available,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario(message.into())
    }

    /// The kind of failure, as reported to command callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::NameConflict { .. } => ErrorKind::NameConflict,
            Self::Authorisation { .. } => ErrorKind::Authorisation,
            Self::Config(_) => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
            Self::Scenario(_) => ErrorKind::Scenario,
        }
    }

    /// Message key for command-facing errors.
    #[must_use]
    pub const fn message_key(&self) -> Option<MessageKey> {
        match self {
            Self::InvalidArgument { key, .. }
            | Self::PoolExhausted { key, .. }
            | Self::InvariantViolation { key, .. }
            | Self::NameConflict { key, .. }
            | Self::Authorisation { key, .. } => Some(*key),
            Self::Config(_) | Self::Io { .. } | Self::Scenario(_) => None,
        }
    }
}

impl From<std::io::Error> for FleetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Scenario(format!("JSON: {err}"))
    }
}

impl From<serde_yaml::Error> for FleetError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Scenario(format!("YAML: {err}"))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is prepended to the error's existing context, so a
/// chain reads outermost first: `"loading scenario: reading file: ..."`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, only evaluated on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<FleetError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
///
/// Keyed command errors keep their key; only the free-form text grows.
fn add_context_to_error(err: FleetError, new_ctx: &str) -> FleetError {
    match err {
        FleetError::InvalidArgument { key, context } => FleetError::InvalidArgument {
            key,
            context: chain_context(new_ctx, &context),
        },
        FleetError::InvariantViolation { key, context } => FleetError::InvariantViolation {
            key,
            context: chain_context(new_ctx, &context),
        },
        FleetError::Authorisation { key, context } => FleetError::Authorisation {
            key,
            context: chain_context(new_ctx, &context),
        },
        FleetError::Io {
            path,
            message,
            source,
        } => FleetError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        FleetError::Config(msg) => FleetError::Config(chain_context(new_ctx, &msg)),
        FleetError::Scenario(msg) => FleetError::Scenario(chain_context(new_ctx, &msg)),
        other @ (FleetError::PoolExhausted { .. } | FleetError::NameConflict { .. }) => other,
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an `InvalidArgument` error with the given key.
    fn or_invalid(self, key: MessageKey, context: impl Into<String>) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    fn or_invalid(self, key: MessageKey, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| FleetError::invalid_argument(key, context))
    }
}
