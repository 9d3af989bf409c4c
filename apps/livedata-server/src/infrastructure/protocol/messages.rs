//! Protocol Messages
//!
//! The message kinds exchanged with remote subscriber processes. Every
//! request produces exactly one response of the matching kind, except
//! `LIVE_DATA_UPDATE`, which is an unsolicited push and carries no
//! correlation id.

use serde::{Deserialize, Serialize};

use crate::domain::message::FieldMessage;
use crate::domain::specification::LiveDataSpecification;

/// Sentinel correlation id meaning "no correlation".
pub const NO_CORRELATION: i64 = -1;

const fn default_correlation() -> i64 {
    NO_CORRELATION
}

/// Generic result code carried by response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    /// The request succeeded.
    Success,
    /// The requested item could not be resolved or is not present.
    NotPresent,
    /// The server failed internally.
    InternalError,
}

/// A protocol message, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProtocolMessage {
    /// Capability negotiation request with credential fields.
    #[serde(rename = "CONNECTION_REQUEST")]
    ConnectionRequest {
        /// Request correlation id.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// Connecting user.
        user: String,
        /// Optional credential.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },

    /// Connection negotiation response with the available-server list.
    #[serde(rename = "CONNECTION_RESPONSE")]
    ConnectionResponse {
        /// Correlation id of the originating request.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// Result code.
        result: ResultCode,
        /// Optional human-readable detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Servers available to this client.
        #[serde(default)]
        available_servers: Vec<String>,
    },

    /// Point-in-time snapshot request.
    #[serde(rename = "SNAPSHOT_REQUEST")]
    SnapshotRequest {
        /// Request correlation id.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// The specification to snapshot.
        specification: LiveDataSpecification,
    },

    /// Snapshot response.
    #[serde(rename = "SNAPSHOT_RESPONSE")]
    SnapshotResponse {
        /// Correlation id of the originating request.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// Result code.
        result: ResultCode,
        /// Optional human-readable detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// The resolved subscription identifier.
        subscription_id: String,
        /// The normalization scheme applied.
        normalization_scheme: String,
        /// Snapshot fields.
        #[serde(default)]
        snapshot: FieldMessage,
    },

    /// Subscription response, carrying the initial snapshot.
    #[serde(rename = "SUBSCRIPTION_RESPONSE")]
    SubscriptionResponse {
        /// Correlation id of the originating request.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// Result code.
        result: ResultCode,
        /// Optional human-readable detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// The resolved subscription identifier.
        subscription_id: String,
        /// The normalization scheme applied.
        normalization_scheme: String,
        /// Topic the subscription publishes on.
        topic: String,
        /// Initial merged snapshot.
        #[serde(default)]
        snapshot: FieldMessage,
    },

    /// Unsubscribe request.
    #[serde(rename = "UNSUBSCRIBE")]
    Unsubscribe {
        /// Request correlation id.
        #[serde(default = "default_correlation")]
        correlation_id: i64,
        /// The specification to release.
        specification: LiveDataSpecification,
    },

    /// Unsolicited live update push. No correlation id.
    #[serde(rename = "LIVE_DATA_UPDATE")]
    LiveDataUpdate {
        /// Topic the update belongs to.
        topic: String,
        /// Merged last-known-value fields.
        fields: FieldMessage,
    },
}

impl ProtocolMessage {
    /// The explicit type tag of this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionRequest { .. } => "CONNECTION_REQUEST",
            Self::ConnectionResponse { .. } => "CONNECTION_RESPONSE",
            Self::SnapshotRequest { .. } => "SNAPSHOT_REQUEST",
            Self::SnapshotResponse { .. } => "SNAPSHOT_RESPONSE",
            Self::SubscriptionResponse { .. } => "SUBSCRIPTION_RESPONSE",
            Self::Unsubscribe { .. } => "UNSUBSCRIBE",
            Self::LiveDataUpdate { .. } => "LIVE_DATA_UPDATE",
        }
    }

    /// The correlation id, if this kind carries one.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<i64> {
        match self {
            Self::ConnectionRequest { correlation_id, .. }
            | Self::ConnectionResponse { correlation_id, .. }
            | Self::SnapshotRequest { correlation_id, .. }
            | Self::SnapshotResponse { correlation_id, .. }
            | Self::SubscriptionResponse { correlation_id, .. }
            | Self::Unsubscribe { correlation_id, .. } => Some(*correlation_id),
            Self::LiveDataUpdate { .. } => None,
        }
    }
}
