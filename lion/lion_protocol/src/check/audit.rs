//! Conformance auditing.
//!
//! Records the outcome of top-level checks, bounded per protocol.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lion_core::id::{ProtocolId, TypeDefId};
use serde::{Deserialize, Serialize};

use super::CheckMode;

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the check completed.
    pub timestamp: DateTime<Utc>,

    pub protocol_id: ProtocolId,

    /// Name of the protocol checked against.
    pub protocol: String,

    /// The candidate's type (for instances, the instance's type).
    pub candidate_id: TypeDefId,

    pub candidate: String,

    pub mode: CheckMode,

    /// Whether the candidate conformed.
    pub conforms: bool,
}

/// An audit log.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<DashMap<ProtocolId, Vec<AuditEntry>>>,

    /// The maximum number of entries to keep per protocol.
    max_entries_per_protocol: usize,
}

impl AuditLog {
    /// Create a new audit log keeping at most `max_entries_per_protocol`
    /// entries for each protocol.
    pub fn new(max_entries_per_protocol: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_protocol,
        }
    }

    /// Record a completed check, dropping the oldest entries past the limit.
    pub fn log_check(&self, entry: AuditEntry) {
        let mut protocol_entries = self.entries.entry(entry.protocol_id).or_insert_with(Vec::new);
        protocol_entries.push(entry);

        if protocol_entries.len() > self.max_entries_per_protocol {
            let to_remove = protocol_entries.len() - self.max_entries_per_protocol;
            protocol_entries.drain(0..to_remove);
        }
    }

    /// Entries recorded for a protocol, oldest first.
    pub fn get_entries(&self, protocol_id: &ProtocolId) -> Vec<AuditEntry> {
        match self.entries.get(protocol_id) {
            Some(entries) => entries.clone(),
            None => Vec::new(),
        }
    }

    pub fn clear_entries(&self, protocol_id: &ProtocolId) {
        self.entries.remove(protocol_id);
    }

    /// Total number of entries across all protocols.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(protocol_id: ProtocolId, candidate: &str, conforms: bool) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            protocol_id,
            protocol: "Walker".to_string(),
            candidate_id: TypeDefId::new(),
            candidate: candidate.to_string(),
            mode: CheckMode::Subtype,
            conforms,
        }
    }

    #[test]
    fn test_log_and_get_entries() {
        let log = AuditLog::new(10);
        let protocol_id = ProtocolId::new();

        log.log_check(entry(protocol_id, "Dog", true));

        let entries = log.get_entries(&protocol_id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].candidate, "Dog");
        assert!(entries[0].conforms);
        assert!(log.get_entries(&ProtocolId::new()).is_empty());
    }

    #[test]
    fn test_clear_entries() {
        let log = AuditLog::new(10);
        let protocol_id = ProtocolId::new();
        log.log_check(entry(protocol_id, "Dog", true));

        log.clear_entries(&protocol_id);
        assert!(log.is_empty());
    }

    #[test]
    fn test_max_entries_per_protocol() {
        let log = AuditLog::new(2);
        let protocol_id = ProtocolId::new();

        for name in ["first", "second", "third"] {
            log.log_check(entry(protocol_id, name, false));
        }

        let entries = log.get_entries(&protocol_id);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].candidate, "second");
    }
}
