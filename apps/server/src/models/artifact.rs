//! Binary artifacts a container can reference.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of artifact stored in the artifact store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Packet capture of the test run.
    Pcap,
    /// TLS key log matching the packet capture.
    Keylog,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcap => "pcap",
            Self::Keylog => "keylog",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pcap" => Some(Self::Pcap),
            "keylog" | "keylogfile" => Some(Self::Keylog),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pcap => "application/vnd.tcpdump.pcap",
            Self::Keylog => "text/plain",
        }
    }

    /// File name offered to clients downloading the artifact.
    pub fn file_name(&self, container_identifier: &str) -> String {
        let stem: String = container_identifier
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        match self {
            Self::Pcap => format!("{stem}.pcap"),
            Self::Keylog => format!("{stem}.keylog"),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response after storing an artifact.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredArtifactResponse {
    pub container_id: Uuid,
    pub kind: ArtifactKind,
    pub storage_id: Uuid,
    pub size: usize,
}
