//! Read and write views of one archive node.
//!
//! [`ArchiveObject`] borrows the archive immutably and can be copied freely;
//! [`ArchiveObjectMut`] holds the archive mutably, so at most one write view
//! of a tree exists at a time.
//!
//! Absence is never an error: every getter returns `None`/`false` for a
//! missing name. A present property of the wrong type is a programming error;
//! the plain getters log it and panic in debug builds, while the `try_`
//! variants report it as [`Error::TypeMismatch`].

use smallvec::SmallVec;
use std::fmt;

use super::archive::{Archive, Node};
use super::convert::{FromProperty, ToProperty};
use super::property::{Array, ObjectId, Property};
use super::traits::Archivable;
use crate::util::{Error, PropertyType, Result};

/// Ordered `(name, property)` listing of one object.
pub type PropertyList<'a> = SmallVec<[(&'a str, &'a Property); 20]>;

/// Report a failed read of a present property.
///
/// Always logged. Type mismatches are fatal in debug builds.
pub(crate) fn shape_checked<T>(name: &str, result: Result<Option<T>>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(property = name, "{}", err);
            if cfg!(debug_assertions) && err.is_mismatch() {
                panic!("{}", err);
            }
            None
        }
    }
}

/// Name of the `index`-th element in indexed sequences (`i0`, `i1`, ...).
pub(crate) fn index_name(prefix: &str, index: usize) -> String {
    format!("{}{}", prefix, index)
}

// ============================================================================
// Read view
// ============================================================================

/// Read-only handle to one node of an [`Archive`].
#[derive(Clone, Copy)]
pub struct ArchiveObject<'a> {
    archive: &'a Archive,
    id: ObjectId,
}

impl<'a> ArchiveObject<'a> {
    pub(crate) fn new(archive: &'a Archive, id: ObjectId) -> Self {
        Self { archive, id }
    }

    fn node(&self) -> &'a Node {
        self.archive.node(self.id)
    }

    /// Arena handle of this node.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn archive(&self) -> &'a Archive {
        self.archive
    }

    /// Version stored on the root of the tree.
    pub fn version(&self) -> f32 {
        self.archive.version()
    }

    /// Number of properties in this object.
    pub fn len(&self) -> usize {
        self.node().entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.node().entries().is_empty()
    }

    /// Check if a property exists.
    pub fn contains(&self, name: &str) -> bool {
        self.node().get(name).is_some()
    }

    /// Raw access to a stored property.
    pub fn find_property(&self, name: &str) -> Option<&'a Property> {
        self.node().get(name)
    }

    /// Type tag of a stored property.
    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        self.find_property(name).map(Property::property_type)
    }

    /// Ordered listing of the properties currently stored.
    pub fn properties(&self) -> PropertyList<'a> {
        self.iter().collect()
    }

    /// Iterate properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Property)> + 'a {
        self.node().entries().iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Nested object stored under `name`.
    pub fn try_get_object(&self, name: &str) -> Result<Option<ArchiveObject<'a>>> {
        match self.find_property(name) {
            None => Ok(None),
            Some(Property::Object(id)) => Ok(Some(ArchiveObject::new(self.archive, *id))),
            Some(_) => Err(Error::NotAnObject(name.to_string())),
        }
    }

    /// Nested object stored under `name`; asserts if `name` holds something else.
    pub fn get_object(&self, name: &str) -> Option<ArchiveObject<'a>> {
        shape_checked(name, self.try_get_object(name))
    }

    /// Elements of an array of objects.
    pub fn get_objects(&self, name: &str) -> Option<Vec<ArchiveObject<'a>>> {
        let result = match self.find_property(name) {
            None => Ok(None),
            Some(Property::Array(Array::Object(ids))) => Ok(Some(
                ids.iter()
                    .map(|id| ArchiveObject::new(self.archive, *id))
                    .collect(),
            )),
            Some(Property::Array(Array::Empty)) => Ok(Some(Vec::new())),
            Some(other) => Err(Error::mismatch(name, "object/array", other.describe())),
        };
        shape_checked(name, result)
    }

    /// Typed read that reports a mismatch instead of asserting.
    pub fn try_get<T: FromProperty>(&self, name: &str) -> Result<Option<T>> {
        T::read_property(self, name)
    }

    /// Typed read. `None` if `name` is absent.
    pub fn get<T: FromProperty>(&self, name: &str) -> Option<T> {
        shape_checked(name, self.try_get(name))
    }

    /// Typed read into `out`, which is left untouched on failure.
    pub fn get_property<T: FromProperty>(&self, name: &str, out: &mut T) -> bool {
        match self.get(name) {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    /// Raw bytes stored with `set_binary_block`.
    pub fn get_binary_block(&self, name: &str) -> Option<Vec<u8>> {
        let result = match self.find_property(name) {
            None => Ok(None),
            Some(Property::Array(Array::Binary(bytes))) => Ok(Some(bytes.clone())),
            Some(Property::String(bytes)) => Ok(Some(bytes.clone())),
            Some(Property::Array(Array::Empty)) => Ok(Some(Vec::new())),
            Some(other) => Err(Error::mismatch(name, "binary/array", other.describe())),
        };
        shape_checked(name, result)
    }

    /// Load an [`Archivable`] stored under `name` into `out`.
    pub fn load_archivable<T: Archivable + ?Sized>(&self, name: &str, out: &mut T) -> bool {
        match self.get_object(name) {
            Some(object) => {
                out.load(&object);
                true
            }
            None => false,
        }
    }

    /// Load a default-constructed [`Archivable`] stored under `name`.
    pub fn get_archivable<T: Archivable + Default>(&self, name: &str) -> Option<T> {
        let object = self.get_object(name)?;
        let mut value = T::default();
        value.load(&object);
        Some(value)
    }

    /// Load a list written by `set_archivable_list`, or an array of objects.
    ///
    /// Child lists are read `i0, i1, ...` until the first missing index.
    pub fn get_archivable_list<T: Archivable + Default>(&self, name: &str) -> Option<Vec<T>> {
        let load = |object: &ArchiveObject<'_>| {
            let mut value = T::default();
            value.load(object);
            value
        };

        match self.find_property(name)? {
            Property::Array(Array::Object(_)) | Property::Array(Array::Empty) => {
                Some(self.get_objects(name)?.iter().map(load).collect())
            }
            Property::Object(id) => {
                let list = ArchiveObject::new(self.archive, *id);
                let mut out = Vec::new();
                while let Some(item) = list.get_object(&index_name("i", out.len())) {
                    out.push(load(&item));
                }
                Some(out)
            }
            other => shape_checked(
                name,
                Err(Error::mismatch(name, "object", other.describe())),
            ),
        }
    }
}

impl PartialEq for ArchiveObject<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|((ln, lp), (rn, rp))| {
            ln == rn && property_eq(self.archive, lp, other.archive, rp)
        })
    }
}

fn property_eq(la: &Archive, lp: &Property, ra: &Archive, rp: &Property) -> bool {
    match (lp, rp) {
        (Property::Object(l), Property::Object(r)) => {
            ArchiveObject::new(la, *l) == ArchiveObject::new(ra, *r)
        }
        (Property::Array(Array::Object(l)), Property::Array(Array::Object(r))) => {
            l.len() == r.len()
                && l.iter()
                    .zip(r)
                    .all(|(l, r)| ArchiveObject::new(la, *l) == ArchiveObject::new(ra, *r))
        }
        _ => lp == rp,
    }
}

impl fmt::Debug for ArchiveObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entry<'a>(&'a Archive, &'a Property);

        impl fmt::Debug for Entry<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.1 {
                    Property::Object(id) => ArchiveObject::new(self.0, *id).fmt(f),
                    Property::Array(Array::Object(ids)) => f
                        .debug_list()
                        .entries(ids.iter().map(|id| ArchiveObject::new(self.0, *id)))
                        .finish(),
                    other => other.fmt(f),
                }
            }
        }

        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k, Entry(self.archive, v))))
            .finish()
    }
}

// ============================================================================
// Write view
// ============================================================================

/// What a name currently holds, resolved before the arena is mutated.
enum Slot {
    Vacant,
    Object(ObjectId),
    Occupied(String),
}

/// Mutable handle to one node of an [`Archive`].
pub struct ArchiveObjectMut<'a> {
    archive: &'a mut Archive,
    id: ObjectId,
}

impl<'a> ArchiveObjectMut<'a> {
    pub(crate) fn new(archive: &'a mut Archive, id: ObjectId) -> Self {
        Self { archive, id }
    }

    /// Arena handle of this node.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Version stored on the root of the tree.
    pub fn version(&self) -> f32 {
        self.archive.version()
    }

    /// Read view of this node.
    pub fn as_object(&self) -> ArchiveObject<'_> {
        ArchiveObject::new(self.archive, self.id)
    }

    /// Shorter-lived write view of the same node.
    pub fn reborrow(&mut self) -> ArchiveObjectMut<'_> {
        ArchiveObjectMut::new(self.archive, self.id)
    }

    /// Write view of another node of the same tree.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<ArchiveObjectMut<'_>> {
        self.archive.object_mut(id)
    }

    pub fn len(&self) -> usize {
        self.as_object().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_object().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.as_object().contains(name)
    }

    /// See [`ArchiveObject::get`].
    pub fn get<T: FromProperty>(&self, name: &str) -> Option<T> {
        self.as_object().get(name)
    }

    /// See [`ArchiveObject::try_get`].
    pub fn try_get<T: FromProperty>(&self, name: &str) -> Result<Option<T>> {
        self.as_object().try_get(name)
    }

    /// See [`ArchiveObject::get_property`].
    pub fn get_property<T: FromProperty>(&self, name: &str, out: &mut T) -> bool {
        self.as_object().get_property(name, out)
    }

    fn slot(&self, name: &str) -> Slot {
        match self.archive.node(self.id).get(name) {
            None | Some(Property::Array(Array::Empty)) => Slot::Vacant,
            Some(Property::Object(id)) => Slot::Object(*id),
            Some(other) => Slot::Occupied(other.describe()),
        }
    }

    /// Store a property, checking that `name` does not already hold a
    /// different type.
    ///
    /// Empty arrays have no element type and can be replaced by anything.
    pub fn insert_property(&mut self, name: &str, property: Property) -> Result<()> {
        let node = self.archive.node_mut(self.id);
        if let Some(existing) = node.get(name) {
            let (old, new) = (existing.property_type(), property.property_type());
            if old != new && old != PropertyType::Invalid && new != PropertyType::Invalid {
                return Err(Error::mismatch(name, old, new));
            }
        }
        node.set(name, property);
        Ok(())
    }

    /// Copy `value` into the archive under `name`.
    pub fn set_property<T: ToProperty + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        value.write_property(self, name)
    }

    /// Store a raw byte block.
    pub fn set_binary_block(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.insert_property(name, Property::Array(Array::Binary(data.to_vec())))
    }

    /// Store an [`Archivable`] as a child object.
    pub fn set_archivable<T: Archivable + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let mut child = self.create_child(name)?;
        value.save(&mut child)
    }

    /// Store a list of [`Archivable`]s as a child holding `i0, i1, ...`.
    pub fn set_archivable_list<T: Archivable>(&mut self, name: &str, items: &[T]) -> Result<()> {
        let mut list = self.create_child(name)?;
        for (i, item) in items.iter().enumerate() {
            let mut child = list.create_child(&index_name("i", i))?;
            item.save(&mut child)?;
        }
        Ok(())
    }

    /// Insert a new empty nested object.
    ///
    /// An object already stored under `name` is emptied and reused; any
    /// other non-empty property there is an error.
    pub fn create_child(&mut self, name: &str) -> Result<ArchiveObjectMut<'_>> {
        let id = match self.slot(name) {
            Slot::Object(id) => {
                self.archive.node_mut(id).clear();
                id
            }
            Slot::Vacant => self.attach_new(name),
            Slot::Occupied(_) => return Err(Error::NotAnObject(name.to_string())),
        };
        Ok(ArchiveObjectMut::new(self.archive, id))
    }

    /// The nested object under `name`, created if absent.
    pub fn child(&mut self, name: &str) -> Result<ArchiveObjectMut<'_>> {
        let id = match self.slot(name) {
            Slot::Object(id) => id,
            Slot::Vacant => self.attach_new(name),
            Slot::Occupied(_) => return Err(Error::NotAnObject(name.to_string())),
        };
        Ok(ArchiveObjectMut::new(self.archive, id))
    }

    fn attach_new(&mut self, name: &str) -> ObjectId {
        let id = self.archive.alloc();
        self.archive.node_mut(self.id).set(name, Property::Object(id));
        id
    }

    /// Store an array of `count` empty objects and return their handles.
    pub fn create_object_array(&mut self, name: &str, count: usize) -> Result<Vec<ObjectId>> {
        if let Slot::Occupied(actual) = self.slot(name) {
            if self.archive.node(self.id).get(name).map(Property::property_type)
                != Some(PropertyType::Object)
            {
                return Err(Error::mismatch(name, "object/array", actual));
            }
        }
        let ids: Vec<ObjectId> = (0..count).map(|_| self.archive.alloc()).collect();
        self.archive
            .node_mut(self.id)
            .set(name, Property::Array(Array::Object(ids.clone())));
        Ok(ids)
    }

    /// Write view of the nested object under `name`.
    pub fn get_object_mut(&mut self, name: &str) -> Option<ArchiveObjectMut<'_>> {
        let id = shape_checked(name, self.as_object().try_get_object(name).map(|o| o.map(|o| o.id())))?;
        Some(ArchiveObjectMut::new(self.archive, id))
    }

    /// Remove a property and return it.
    pub fn delete_property(&mut self, name: &str) -> Option<Property> {
        self.archive.node_mut(self.id).remove(name)
    }

    /// Remove a nested object (or array of objects).
    ///
    /// The subtree stays allocated in the arena until the archive is cleared.
    /// Returns false if `name` is absent or not an object.
    pub fn delete_object(&mut self, name: &str) -> bool {
        match self.archive.node(self.id).get(name) {
            Some(Property::Object(_)) | Some(Property::Array(Array::Object(_))) => {
                self.archive.node_mut(self.id).remove(name);
                true
            }
            _ => false,
        }
    }

    /// Deep-merge `other` into this object, replacing same-named leaves and
    /// merging same-named objects.
    pub fn update(&mut self, other: &ArchiveObject<'_>) -> Result<()> {
        for (name, property) in other.iter() {
            match property {
                Property::Object(id) => {
                    let source = ArchiveObject::new(other.archive, *id);
                    self.child(name)?.update(&source)?;
                }
                Property::Array(Array::Object(ids)) => {
                    let targets = self.create_object_array(name, ids.len())?;
                    for (source, target) in ids.iter().zip(targets) {
                        let source = ArchiveObject::new(other.archive, *source);
                        ArchiveObjectMut::new(self.archive, target).update(&source)?;
                    }
                }
                leaf => self.insert_property(name, leaf.clone())?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ArchiveObjectMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_object().fmt(f)
    }
}
