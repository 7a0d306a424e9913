use crate::node::NodeId;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Derive a document seed from a stable key (file path or transcription id)
/// using CRC32.
pub fn document_seed(key: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within one document.
///
/// Ids have the shape `"{seed}-{n}"`. The counter is part of the persisted
/// document state, so ids minted after a reload never collide with ids
/// already in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(key: &str) -> Self {
        Self {
            seed: document_seed(key),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate the next sequential id.
    pub fn next_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId::new(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
