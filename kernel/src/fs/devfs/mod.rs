use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use spin::RwLock;

use super::vfs::{FsError, INode, Result};

mod serial;

pub use self::serial::SerialINode;

/// Device nodes published by bound drivers, by name.
#[derive(Default)]
pub struct DevFs {
    nodes: RwLock<BTreeMap<String, Arc<dyn INode>>>,
}

impl DevFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, name: &str, inode: Arc<dyn INode>) -> Result<()> {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(name) {
            return Err(FsError::EntryExist);
        }
        nodes.insert(name.into(), inode);
        Ok(())
    }

    /// Remove `name`. Files already opened on it keep their reference.
    pub fn withdraw(&self, name: &str) -> Option<Arc<dyn INode>> {
        self.nodes.write().remove(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn INode>> {
        self.nodes
            .read()
            .get(name)
            .cloned()
            .ok_or(FsError::EntryNotFound)
    }

    pub fn names(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }
}
