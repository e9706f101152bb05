//! Name-keyed, ordered container of device records.
//!
//! The directory owns every [`DeviceRecord`].  Names are unique and the
//! records are kept sorted by the directory's ordering function, so any
//! mutation goes through [`DeviceDirectory::update`] which re-sorts
//! afterwards.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::debug;

use super::device::{compare_records, Device, DeviceRecord};

/// Ordering used to sort the directory.
pub type RecordOrder = fn(&DeviceRecord, &DeviceRecord) -> Ordering;

/// Errors returned by directory operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// A record with the same name is already in the directory.
    #[error("a device named {0:?} is already registered")]
    DuplicateName(String),
}

/// Owning collection of device records with unique names.
pub struct DeviceDirectory {
    records: Vec<DeviceRecord>,
    order: RecordOrder,
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::with_order(compare_records)
    }
}

impl DeviceDirectory {
    /// Creates an empty directory sorted by [`compare_records`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory sorted by `order`.
    pub fn with_order(order: RecordOrder) -> Self {
        Self {
            records: Vec::new(),
            order,
        }
    }

    /// Adds `record`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::DuplicateName`] when a record with the same
    /// name already exists; the directory is left unchanged.
    pub fn insert(&mut self, record: DeviceRecord) -> Result<(), DirectoryError> {
        if self.contains(record.name()) {
            return Err(DirectoryError::DuplicateName(record.name().to_owned()));
        }
        debug!(name = record.name(), "device record added");
        self.records.push(record);
        self.resort();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DeviceRecord> {
        self.records.iter().find(|r| r.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Finds the record currently bound to `device`.
    pub fn find_by_device(&self, device: &Device) -> Option<&DeviceRecord> {
        self.records
            .iter()
            .find(|r| r.device().is_some_and(|d| d.id == device.id && d.name == device.name))
    }

    /// Runs `f` on the named record and restores the sort order afterwards.
    ///
    /// Returns `None` if no such record exists.
    pub fn update<R>(&mut self, name: &str, f: impl FnOnce(&mut DeviceRecord) -> R) -> Option<R> {
        let record = self.records.iter_mut().find(|r| r.name() == name)?;
        let result = f(record);
        self.resort();
        Some(result)
    }

    /// Records in directory order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.iter()
    }

    /// Record names in directory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(DeviceRecord::name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn resort(&mut self) {
        let order = self.order;
        self.records.sort_by(|a, b| order(a, b));
    }
}

impl std::fmt::Debug for DeviceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::DeviceKind;

    fn record(id: u64, name: &str) -> DeviceRecord {
        DeviceRecord::new(Device::new(id, name, DeviceKind::Pen), ":0", false)
    }

    #[test]
    fn test_directory_starts_empty() {
        let dir = DeviceDirectory::new();
        assert!(dir.is_empty());
        assert_eq!(dir.len(), 0);
    }

    #[test]
    fn test_insert_then_get_by_name() {
        let mut dir = DeviceDirectory::new();
        dir.insert(record(1, "pen")).expect("insert");
        assert!(dir.contains("pen"));
        assert_eq!(dir.get("pen").map(|r| r.name()), Some("pen"));
        assert!(dir.get("eraser").is_none());
    }

    #[test]
    fn test_insert_duplicate_name_is_rejected() {
        let mut dir = DeviceDirectory::new();
        dir.insert(record(1, "pen")).expect("insert");
        assert_eq!(
            dir.insert(record(2, "pen")),
            Err(DirectoryError::DuplicateName("pen".to_string()))
        );
        assert_eq!(dir.len(), 1);
        // The first record is untouched.
        assert_eq!(dir.get("pen").and_then(|r| r.device()).map(|d| d.id), Some(1));
    }

    #[test]
    fn test_records_are_kept_sorted() {
        let mut dir = DeviceDirectory::new();
        dir.insert(record(1, "charlie")).unwrap();
        dir.insert(record(2, "alpha")).unwrap();
        dir.insert(record(3, "bravo")).unwrap();
        assert_eq!(dir.names().collect::<Vec<_>>(), vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_update_resorts_after_unbind() {
        // Arrange
        let mut dir = DeviceDirectory::new();
        dir.insert(record(1, "alpha")).unwrap();
        dir.insert(record(2, "bravo")).unwrap();

        // Act – an absent device sinks below present ones
        let found = dir.update("alpha", DeviceRecord::unbind);

        // Assert
        assert_eq!(found, Some(()));
        assert_eq!(dir.names().collect::<Vec<_>>(), vec!["bravo", "alpha"]);
    }

    #[test]
    fn test_update_missing_record_returns_none() {
        let mut dir = DeviceDirectory::new();
        assert_eq!(dir.update("ghost", |_| 1), None);
    }

    #[test]
    fn test_find_by_device_matches_live_handle_only() {
        let mut dir = DeviceDirectory::new();
        dir.insert(record(7, "pen")).unwrap();
        let live = Device::new(7, "pen", DeviceKind::Pen);
        assert_eq!(dir.find_by_device(&live).map(|r| r.name()), Some("pen"));

        dir.update("pen", DeviceRecord::unbind);
        assert!(dir.find_by_device(&live).is_none());
    }

    #[test]
    fn test_custom_order_is_honoured() {
        fn reverse_name(a: &DeviceRecord, b: &DeviceRecord) -> Ordering {
            b.name().cmp(a.name())
        }
        let mut dir = DeviceDirectory::with_order(reverse_name);
        dir.insert(record(1, "a")).unwrap();
        dir.insert(record(2, "c")).unwrap();
        dir.insert(record(3, "b")).unwrap();
        assert_eq!(dir.names().collect::<Vec<_>>(), vec!["c", "b", "a"]);
    }
}
