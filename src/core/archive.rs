//! The archive tree: an arena of object nodes owned by the root.
//!
//! Every [`ArchiveObject`] of a tree lives in the `nodes` vector of one
//! [`Archive`] and is addressed by an [`ObjectId`]. Nodes are never freed one
//! by one; dropping or clearing the archive releases the whole tree at once.

use indexmap::IndexMap;

use super::object::{ArchiveObject, ArchiveObjectMut};
use super::property::{ObjectId, Property};

/// Version value of an archive that never had one set.
pub const UNSET_VERSION: f32 = -1.0;

/// One tree node - ordered name to property map.
///
/// Lookups are hashed; iteration follows insertion order.
#[derive(Clone, Debug, Default)]
pub(crate) struct Node {
    entries: IndexMap<String, Property>,
}

impl Node {
    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.entries.get_mut(name)
    }

    /// Insert or replace, keeping the original position of a replaced entry.
    pub(crate) fn set(&mut self, name: &str, property: Property) {
        match self.entries.get_mut(name) {
            Some(slot) => *slot = property,
            None => {
                self.entries.insert(name.to_string(), property);
            }
        }
    }

    /// Remove an entry, shifting later entries down to keep the order.
    pub(crate) fn remove(&mut self, name: &str) -> Option<Property> {
        self.entries.shift_remove(name)
    }

    pub(crate) fn entries(&self) -> &IndexMap<String, Property> {
        &self.entries
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Root of a property tree.
///
/// Owns the node arena and the configuration shared by every node, such as
/// the format version.
#[derive(Clone, Debug)]
pub struct Archive {
    nodes: Vec<Node>,
    version: f32,
}

impl Archive {
    /// Handle of the root object.
    pub const ROOT: ObjectId = ObjectId(0);

    /// Create an archive holding one empty root object.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            version: UNSET_VERSION,
        }
    }

    /// Create an empty archive with a version already set.
    pub fn with_version(version: f32) -> Self {
        Self {
            version,
            ..Self::new()
        }
    }

    /// Version shared by all objects of this tree (`-1.0` when unset).
    pub fn version(&self) -> f32 {
        self.version
    }

    pub fn set_version(&mut self, version: f32) {
        self.version = version;
    }

    /// Read view of the root object.
    pub fn root(&self) -> ArchiveObject<'_> {
        ArchiveObject::new(self, Self::ROOT)
    }

    /// Write view of the root object.
    pub fn root_mut(&mut self) -> ArchiveObjectMut<'_> {
        ArchiveObjectMut::new(self, Self::ROOT)
    }

    /// Read view of any node of this tree.
    pub fn object(&self, id: ObjectId) -> Option<ArchiveObject<'_>> {
        (id.index() < self.nodes.len()).then(|| ArchiveObject::new(self, id))
    }

    /// Write view of any node of this tree.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<ArchiveObjectMut<'_>> {
        if id.index() < self.nodes.len() {
            Some(ArchiveObjectMut::new(self, id))
        } else {
            None
        }
    }

    /// Number of nodes allocated in the arena, the root included.
    ///
    /// Nodes detached by `delete_object` stay allocated until [`Archive::clear`].
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Release every node and start over with an empty root.
    ///
    /// The version is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::default());
    }

    pub(crate) fn alloc(&mut self) -> ObjectId {
        let id = ObjectId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        id
    }

    pub(crate) fn node(&self, id: ObjectId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: ObjectId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Archive {
    /// Trees are equal when their roots hold the same entries, in the same
    /// order, recursively. Arena layout and version are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}
