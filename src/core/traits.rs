//! The persistence contract for user types.

use super::object::{ArchiveObject, ArchiveObjectMut};
use crate::util::Result;

// ============================================================================
// Archivable
// ============================================================================

/// A type that can save itself into an archive object and load itself back.
///
/// Types are stored as nested objects with
/// [`ArchiveObjectMut::set_archivable`] and read back with
/// [`ArchiveObject::get_archivable`] or [`ArchiveObject::load_archivable`].
///
/// `load` is infallible: absent fields keep their current values, so a type
/// can read archives written by older versions of itself. Use
/// [`ArchiveObject::version`] to branch on the format version.
pub trait Archivable {
    /// Write every persistent field into `obj`.
    fn save(&self, obj: &mut ArchiveObjectMut<'_>) -> Result<()>;

    /// Read fields back from `obj`.
    fn load(&mut self, obj: &ArchiveObject<'_>);
}

impl<T: Archivable + ?Sized> Archivable for Box<T> {
    fn save(&self, obj: &mut ArchiveObjectMut<'_>) -> Result<()> {
        (**self).save(obj)
    }

    fn load(&mut self, obj: &ArchiveObject<'_>) {
        (**self).load(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Archive;

    #[derive(Debug, Default, PartialEq)]
    struct Camera {
        name: String,
        fov: f32,
        position: [f64; 3],
    }

    impl Archivable for Camera {
        fn save(&self, obj: &mut ArchiveObjectMut<'_>) -> Result<()> {
            obj.set_property("name", &self.name)?;
            obj.set_property("fov", &self.fov)?;
            obj.set_property("position", &self.position)
        }

        fn load(&mut self, obj: &ArchiveObject<'_>) {
            obj.get_property("name", &mut self.name);
            obj.get_property("fov", &mut self.fov);
            obj.get_property("position", &mut self.position);
        }
    }

    fn camera(name: &str, fov: f32) -> Camera {
        Camera {
            name: name.to_string(),
            fov,
            position: [0.0, 1.0, 2.0],
        }
    }

    #[test]
    fn test_archivable_round_trip() {
        let mut archive = Archive::with_version(1.0);
        archive
            .root_mut()
            .set_archivable("camera", &camera("main", 45.0))
            .expect("save");

        let loaded: Camera = archive.root().get_archivable("camera").expect("present");
        assert_eq!(loaded, camera("main", 45.0));
        assert!(archive.root().get_archivable::<Camera>("missing").is_none());
    }

    #[test]
    fn test_load_keeps_absent_fields() {
        let mut archive = Archive::new();
        archive
            .root_mut()
            .child("camera")
            .expect("child")
            .set_property("fov", &60.0f32)
            .expect("set");

        let mut cam = camera("keep", 10.0);
        assert!(archive.root().load_archivable("camera", &mut cam));
        assert_eq!(cam.name, "keep");
        assert_eq!(cam.fov, 60.0);
    }

    #[test]
    fn test_archivable_list() {
        let cams = vec![camera("a", 1.0), camera("b", 2.0), camera("c", 3.0)];

        let mut archive = Archive::new();
        archive
            .root_mut()
            .set_archivable_list("cameras", &cams)
            .expect("save list");

        let list = archive.root().get_object("cameras").expect("list object");
        assert_eq!(list.len(), 3);
        assert!(list.contains("i2"));

        let loaded: Vec<Camera> = archive.root().get_archivable_list("cameras").expect("present");
        assert_eq!(loaded, cams);
    }

    #[test]
    fn test_boxed_archivable() {
        let boxed: Box<Camera> = Box::new(camera("boxed", 5.0));
        let mut archive = Archive::new();
        archive.root_mut().set_archivable("cam", &boxed).expect("save");

        let mut out: Box<Camera> = Box::default();
        assert!(archive.root().load_archivable("cam", &mut out));
        assert_eq!(*out, *boxed);
    }
}
