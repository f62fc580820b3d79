use crate::error::{ObjectError, Result};

use super::{MAX_INSTANCE, ObjectType};

/// A fixed-capacity table of objects of one type, kept sorted by instance.
///
/// Index lookups are total: an unknown instance or an out-of-range index
/// yields [`ObjectDirectory::count`] instead of failing, so protocol code can
/// compare against the count without branching on an error.
///
/// # Examples
///
/// ```
/// use bacnet_shed::object::ObjectType;
/// use bacnet_shed::object::directory::ObjectDirectory;
///
/// let mut dir: ObjectDirectory<()> = ObjectDirectory::new(ObjectType::AnalogOutput, 2);
/// assert_eq!(dir.object_instance_add(7, ()), Ok(true));
/// assert_eq!(dir.instance_to_index(7), 0);
/// assert_eq!(dir.instance_to_index(8), dir.count());
/// ```
#[derive(Debug, Clone)]
pub struct ObjectDirectory<T> {
    object_type: ObjectType,
    capacity: usize,
    entries: Vec<(u32, T)>,
}

impl<T> ObjectDirectory<T> {
    pub fn new(object_type: ObjectType, capacity: usize) -> Self {
        Self {
            object_type,
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, instance: u32) -> std::result::Result<usize, usize> {
        self.entries.binary_search_by_key(&instance, |(i, _)| *i)
    }

    pub fn valid_instance(&self, instance: u32) -> bool {
        self.position(instance).is_ok()
    }

    /// Instance at `index`, or `count()` when out of range.
    pub fn index_to_instance(&self, index: usize) -> u32 {
        match self.entries.get(index) {
            Some((instance, _)) => *instance,
            None => self.count() as u32,
        }
    }

    /// Index of `instance`, or `count()` when unknown.
    pub fn instance_to_index(&self, instance: u32) -> usize {
        self.position(instance).unwrap_or(self.count())
    }

    /// Inserts a new object.
    ///
    /// Returns `Ok(false)` without touching the table when the instance is
    /// already present.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the table is full, `InvalidArgument` when the
    /// instance is above [`MAX_INSTANCE`].
    pub fn object_instance_add(&mut self, instance: u32, value: T) -> Result<bool> {
        if instance > MAX_INSTANCE {
            return Err(ObjectError::InvalidArgument(format!(
                "instance {instance} exceeds {MAX_INSTANCE}"
            )));
        }
        match self.position(instance) {
            Ok(_) => Ok(false),
            Err(_) if self.entries.len() >= self.capacity => Err(ObjectError::CapacityExceeded {
                object_type: self.object_type,
                capacity: self.capacity,
            }),
            Err(at) => {
                self.entries.insert(at, (instance, value));
                Ok(true)
            }
        }
    }

    /// Removes and returns the object, if present.
    pub fn remove(&mut self, instance: u32) -> Option<T> {
        self.position(instance)
            .ok()
            .map(|at| self.entries.remove(at).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lowest instance number not in use.
    pub fn next_free_instance(&self) -> Option<u32> {
        let mut candidate = 0u32;
        for (instance, _) in &self.entries {
            if *instance != candidate {
                break;
            }
            candidate += 1;
        }
        (candidate < MAX_INSTANCE).then_some(candidate)
    }

    pub fn get(&self, instance: u32) -> Option<&T> {
        self.position(instance).ok().map(|at| &self.entries[at].1)
    }

    pub fn get_mut(&mut self, instance: u32) -> Option<&mut T> {
        self.position(instance)
            .ok()
            .map(move |at| &mut self.entries[at].1)
    }

    /// Like [`get`](Self::get) but reports a typed `NotFound`.
    pub fn lookup(&self, instance: u32) -> Result<&T> {
        self.get(instance).ok_or(ObjectError::NotFound {
            object_type: self.object_type,
            instance,
        })
    }

    /// Like [`get_mut`](Self::get_mut) but reports a typed `NotFound`.
    pub fn lookup_mut(&mut self, instance: u32) -> Result<&mut T> {
        let object_type = self.object_type;
        self.get_mut(instance)
            .ok_or(ObjectError::NotFound {
                object_type,
                instance,
            })
    }

    pub fn instances(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(instance, _)| *instance)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().map(|(instance, value)| (*instance, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(instance, value)| (*instance, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(capacity: usize) -> ObjectDirectory<&'static str> {
        ObjectDirectory::new(ObjectType::LoadControl, capacity)
    }

    #[test]
    fn index_order_follows_instance_order() {
        let mut dir = directory(4);
        dir.object_instance_add(9, "c").ok();
        dir.object_instance_add(1, "a").ok();
        dir.object_instance_add(5, "b").ok();
        assert_eq!(dir.index_to_instance(0), 1);
        assert_eq!(dir.index_to_instance(1), 5);
        assert_eq!(dir.index_to_instance(2), 9);
        assert_eq!(dir.instance_to_index(5), 1);
    }

    #[test]
    fn out_of_range_lookups_return_count() {
        let mut dir = directory(4);
        for i in 0..4 {
            dir.object_instance_add(i, "x").ok();
        }
        assert_eq!(dir.count(), 4);
        assert!(!dir.valid_instance(4));
        assert_eq!(dir.index_to_instance(4), 4);
        assert_eq!(dir.instance_to_index(4), 4);
        assert_eq!(dir.instance_to_index(u32::MAX), 4);
        assert_eq!(dir.index_to_instance(usize::MAX), 4);
    }

    #[test]
    fn add_fails_when_full() {
        let mut dir = directory(1);
        assert_eq!(dir.object_instance_add(0, "a"), Ok(true));
        assert!(matches!(
            dir.object_instance_add(1, "b"),
            Err(ObjectError::CapacityExceeded { capacity: 1, .. })
        ));
    }

    #[test]
    fn duplicate_add_keeps_original() {
        let mut dir = directory(2);
        dir.object_instance_add(3, "first").ok();
        assert_eq!(dir.object_instance_add(3, "second"), Ok(false));
        assert_eq!(dir.get(3), Some(&"first"));
        assert_eq!(dir.count(), 1);
    }

    #[test]
    fn next_free_instance_fills_gaps() {
        let mut dir = directory(4);
        dir.object_instance_add(0, "a").ok();
        dir.object_instance_add(1, "b").ok();
        dir.object_instance_add(3, "c").ok();
        assert_eq!(dir.next_free_instance(), Some(2));
        dir.remove(0);
        assert_eq!(dir.next_free_instance(), Some(0));
    }

    #[test]
    fn lookup_reports_not_found() {
        let dir = directory(1);
        assert_eq!(
            dir.lookup(2),
            Err(ObjectError::NotFound {
                object_type: ObjectType::LoadControl,
                instance: 2
            })
        );
    }
}
