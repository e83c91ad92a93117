//! Autopilot ↔ Intune ↔ Entra reconciliation
//!
//! The join is anchored on Autopilot: every Autopilot identity yields exactly
//! one [`ReconciledRow`], whether or not Intune or Entra know the device.

pub mod fetch;

use crate::graph::devices::{DeviceRecord, DirectoryDeviceRecord, ManagedDeviceRecord, PrimaryUser};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Primary users keyed by Intune managed device id
pub type PrimaryUsers = HashMap<String, PrimaryUser>;

/// One physical device as seen across all three sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    pub enrolled: bool,
    pub intune_device_name: Option<String>,
    pub entra_device_name: Option<String>,
    pub entra_device_id: Option<String>,
    pub entra_object_id: Option<String>,
    pub serial_number: Option<String>,
    pub user_principal_name: Option<String>,
    pub user_display_name: Option<String>,
    pub group_tag: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub autopilot_id: String,
    pub intune_device_id: Option<String>,
}

/// Lower-cased, trimmed join key; `None` for blank ids
pub fn normalize_device_id(id: &str) -> Option<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// All-zero GUID Graph reports in place of a missing device link
pub const NIL_DEVICE_ID: &str = "00000000-0000-0000-0000-000000000000";

fn non_blank(value: Option<&String>) -> Option<&String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != NIL_DEVICE_ID
    })
}

/// Indexed view over the three fetched inventories
pub struct Inventory {
    devices: Vec<DeviceRecord>,
    managed: HashMap<String, ManagedDeviceRecord>,
    directory: HashMap<String, DirectoryDeviceRecord>,
}

impl Inventory {
    pub fn new(
        devices: Vec<DeviceRecord>,
        managed: Vec<ManagedDeviceRecord>,
        directory: Vec<DirectoryDeviceRecord>,
    ) -> Self {
        let managed = managed
            .into_iter()
            .filter(|m| !m.id.trim().is_empty())
            .map(|m| (m.id.clone(), m))
            .collect();

        // First registration wins when Entra holds duplicates for one device id
        let mut directory_index = HashMap::new();
        for record in directory {
            if let Some(key) = record.device_id.as_deref().and_then(normalize_device_id) {
                directory_index.entry(key).or_insert(record);
            }
        }

        Self {
            devices,
            managed,
            directory: directory_index,
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// The Intune record an Autopilot identity points at, if Intune has it
    pub fn management_match(&self, device: &DeviceRecord) -> Option<&ManagedDeviceRecord> {
        non_blank(device.managed_device_id.as_ref()).and_then(|id| self.managed.get(id))
    }

    /// Managed device ids that need a primary-user lookup, in Autopilot order
    pub fn primary_user_targets(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.devices
            .iter()
            .filter_map(|d| self.management_match(d))
            .filter(|m| seen.insert(m.id.clone()))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Directory id used for the Entra join.
    ///
    /// Intune's value wins over Autopilot's own: an Autopilot identity that
    /// predates a re-enrollment still carries the old registration's id.
    pub fn resolve_directory_id<'a>(
        &self,
        device: &'a DeviceRecord,
        management: Option<&'a ManagedDeviceRecord>,
    ) -> Option<&'a String> {
        management
            .and_then(|m| non_blank(m.azure_ad_device_id.as_ref()))
            .or_else(|| non_blank(device.azure_active_directory_device_id.as_ref()))
    }

    pub fn reconcile_device(&self, device: &DeviceRecord, users: &PrimaryUsers) -> ReconciledRow {
        let management = self.management_match(device);
        let directory_id = self.resolve_directory_id(device, management);
        let directory = directory_id
            .and_then(|id| normalize_device_id(id))
            .and_then(|key| self.directory.get(&key));
        let user = management.and_then(|m| users.get(&m.id));

        ReconciledRow {
            enrolled: management.is_some(),
            intune_device_name: management.and_then(|m| m.device_name.clone()),
            entra_device_name: directory.and_then(|d| d.display_name.clone()),
            entra_device_id: directory_id.cloned(),
            entra_object_id: directory.map(|d| d.id.clone()),
            serial_number: device.serial_number.clone(),
            user_principal_name: user.and_then(|u| u.user_principal_name.clone()),
            user_display_name: user.and_then(|u| u.display_name.clone()),
            group_tag: device.group_tag.clone(),
            model: device.model.clone(),
            manufacturer: device.manufacturer.clone(),
            autopilot_id: device.id.clone(),
            intune_device_id: management.map(|m| m.id.clone()),
        }
    }

    /// Left outer join of every Autopilot identity against Intune and Entra
    pub fn reconcile(&self, users: &PrimaryUsers) -> Vec<ReconciledRow> {
        self.devices
            .iter()
            .map(|device| self.reconcile_device(device, users))
            .collect()
    }
}

/// Headline counts for the run banner and the report header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub devices: usize,
    pub enrolled: usize,
    pub directory_matched: usize,
    pub with_primary_user: usize,
}

impl InventorySummary {
    pub fn from_rows(rows: &[ReconciledRow]) -> Self {
        Self {
            devices: rows.len(),
            enrolled: rows.iter().filter(|r| r.enrolled).count(),
            directory_matched: rows.iter().filter(|r| r.entra_object_id.is_some()).count(),
            with_primary_user: rows
                .iter()
                .filter(|r| r.user_principal_name.is_some())
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autopilot(id: &str, serial: &str, managed: Option<&str>, aad: Option<&str>) -> DeviceRecord {
        DeviceRecord {
            id: id.into(),
            serial_number: Some(serial.into()),
            managed_device_id: managed.map(Into::into),
            azure_active_directory_device_id: aad.map(Into::into),
            ..Default::default()
        }
    }

    fn managed(id: &str, name: &str, aad: Option<&str>) -> ManagedDeviceRecord {
        ManagedDeviceRecord {
            id: id.into(),
            device_name: Some(name.into()),
            azure_ad_device_id: aad.map(Into::into),
        }
    }

    fn directory(object_id: &str, device_id: &str, name: &str) -> DirectoryDeviceRecord {
        DirectoryDeviceRecord {
            id: object_id.into(),
            device_id: Some(device_id.into()),
            display_name: Some(name.into()),
        }
    }

    #[test]
    fn test_two_device_scenario() {
        let inventory = Inventory::new(
            vec![
                autopilot("ap-1", "S1", Some("M1"), None),
                autopilot("ap-2", "S2", None, None),
            ],
            vec![managed("M1", "INTUNE-1", Some("D-1"))],
            vec![directory("obj-1", "d-1", "Laptop-A")],
        );

        let rows = inventory.reconcile(&PrimaryUsers::new());
        assert_eq!(rows.len(), 2);

        assert!(rows[0].enrolled);
        assert_eq!(rows[0].entra_device_name.as_deref(), Some("Laptop-A"));
        assert_eq!(rows[0].entra_object_id.as_deref(), Some("obj-1"));
        assert_eq!(rows[0].intune_device_name.as_deref(), Some("INTUNE-1"));

        assert!(!rows[1].enrolled);
        assert_eq!(rows[1].entra_device_name, None);
        assert_eq!(rows[1].intune_device_id, None);
    }

    #[test]
    fn test_row_count_matches_autopilot_count() {
        let devices: Vec<_> = (0..25)
            .map(|i| {
                let managed_id = format!("M{}", i);
                autopilot(
                    &format!("ap-{}", i),
                    &format!("S{}", i),
                    (i % 3 == 0).then_some(managed_id.as_str()),
                    (i % 4 == 0).then_some("d-x"),
                )
            })
            .collect();
        let inventory = Inventory::new(
            devices,
            vec![managed("M0", "A", None), managed("M3", "B", Some("d-x"))],
            vec![directory("obj-x", "D-X", "Shared")],
        );

        assert_eq!(inventory.reconcile(&PrimaryUsers::new()).len(), 25);
    }

    #[test]
    fn test_intune_directory_id_takes_precedence() {
        let inventory = Inventory::new(
            vec![autopilot("ap-1", "S1", Some("M1"), Some("stale-id"))],
            vec![managed("M1", "INTUNE-1", Some("fresh-id"))],
            vec![
                directory("obj-stale", "stale-id", "Old-Name"),
                directory("obj-fresh", "fresh-id", "New-Name"),
            ],
        );

        let row = &inventory.reconcile(&PrimaryUsers::new())[0];
        assert_eq!(row.entra_device_id.as_deref(), Some("fresh-id"));
        assert_eq!(row.entra_device_name.as_deref(), Some("New-Name"));
        assert_eq!(row.entra_object_id.as_deref(), Some("obj-fresh"));
    }

    #[test]
    fn test_falls_back_to_autopilot_directory_id() {
        let inventory = Inventory::new(
            vec![
                autopilot("ap-1", "S1", None, Some("ABC-123")),
                autopilot("ap-2", "S2", Some("M2"), Some("DEF-456")),
            ],
            vec![managed("M2", "INTUNE-2", None)],
            vec![
                directory("obj-1", "abc-123", "One"),
                directory("obj-2", "def-456", "Two"),
            ],
        );

        let rows = inventory.reconcile(&PrimaryUsers::new());
        assert_eq!(rows[0].entra_device_name.as_deref(), Some("One"));
        assert_eq!(rows[0].entra_device_id.as_deref(), Some("ABC-123"));
        // Intune match without its own directory id still falls back
        assert_eq!(rows[1].entra_device_name.as_deref(), Some("Two"));
        assert!(rows[1].enrolled);
    }

    #[test]
    fn test_nil_intune_directory_id_does_not_shadow_autopilot() {
        let inventory = Inventory::new(
            vec![autopilot("ap-1", "S1", Some("M1"), Some("ABC-123"))],
            vec![managed("M1", "INTUNE-1", Some(NIL_DEVICE_ID))],
            vec![
                directory("obj-nil", NIL_DEVICE_ID, "Placeholder"),
                directory("obj-1", "abc-123", "Laptop"),
            ],
        );

        let row = &inventory.reconcile(&PrimaryUsers::new())[0];
        assert!(row.enrolled);
        assert_eq!(row.entra_device_id.as_deref(), Some("ABC-123"));
        assert_eq!(row.entra_object_id.as_deref(), Some("obj-1"));
        assert_eq!(row.entra_device_name.as_deref(), Some("Laptop"));
    }

    #[test]
    fn test_nil_managed_device_id_is_not_enrolled() {
        let inventory = Inventory::new(
            vec![autopilot("ap-1", "S1", Some(NIL_DEVICE_ID), None)],
            vec![managed(NIL_DEVICE_ID, "GHOST", None)],
            vec![],
        );

        assert!(!inventory.reconcile(&PrimaryUsers::new())[0].enrolled);
        assert!(inventory.primary_user_targets().is_empty());
    }

    #[test]
    fn test_directory_join_is_case_insensitive() {
        let inventory = Inventory::new(
            vec![autopilot("ap-1", "S1", None, Some("ABC-123"))],
            vec![],
            vec![directory("obj-1", "abc-123", "Laptop")],
        );
        assert_eq!(
            inventory.reconcile(&PrimaryUsers::new())[0]
                .entra_object_id
                .as_deref(),
            Some("obj-1")
        );
    }

    #[test]
    fn test_dangling_managed_id_is_not_enrolled() {
        let inventory = Inventory::new(
            vec![autopilot(
                "ap-1",
                "S1",
                Some("00000000-0000-0000-0000-000000000000"),
                None,
            )],
            vec![managed("M1", "INTUNE-1", None)],
            vec![],
        );
        let row = &inventory.reconcile(&PrimaryUsers::new())[0];
        assert!(!row.enrolled);
        assert!(inventory.primary_user_targets().is_empty());
    }

    #[test]
    fn test_primary_user_attached_only_to_matches() {
        let inventory = Inventory::new(
            vec![
                autopilot("ap-1", "S1", Some("M1"), None),
                autopilot("ap-2", "S2", Some("M1"), None),
                autopilot("ap-3", "S3", None, None),
            ],
            vec![managed("M1", "INTUNE-1", None)],
            vec![],
        );
        assert_eq!(inventory.primary_user_targets(), vec!["M1".to_string()]);

        let mut users = PrimaryUsers::new();
        users.insert(
            "M1".into(),
            PrimaryUser {
                user_principal_name: Some("ada@contoso.com".into()),
                display_name: Some("Ada Lovelace".into()),
            },
        );

        let rows = inventory.reconcile(&users);
        assert_eq!(rows[0].user_principal_name.as_deref(), Some("ada@contoso.com"));
        assert_eq!(rows[1].user_display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(rows[2].user_principal_name, None);
    }

    #[test]
    fn test_summary_counts() {
        let inventory = Inventory::new(
            vec![
                autopilot("ap-1", "S1", Some("M1"), None),
                autopilot("ap-2", "S2", None, Some("d-2")),
            ],
            vec![managed("M1", "INTUNE-1", Some("d-1"))],
            vec![directory("obj-2", "d-2", "Two")],
        );
        let summary = InventorySummary::from_rows(&inventory.reconcile(&PrimaryUsers::new()));
        assert_eq!(
            summary,
            InventorySummary {
                devices: 2,
                enrolled: 1,
                directory_matched: 1,
                with_primary_user: 0,
            }
        );
    }

    #[test]
    fn test_normalize_device_id() {
        assert_eq!(normalize_device_id(" ABC-123 ").as_deref(), Some("abc-123"));
        assert_eq!(normalize_device_id("   "), None);
    }
}
