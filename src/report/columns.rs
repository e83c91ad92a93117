//! The fixed 13-column report schema

use crate::inventory::ReconciledRow;

pub const COLUMN_COUNT: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    EnrollmentStatus,
    IntuneDeviceName,
    EntraDeviceName,
    EntraDeviceId,
    EntraObjectId,
    SerialNumber,
    UserPrincipalName,
    UserDisplayName,
    GroupTag,
    Model,
    Manufacturer,
    AutopilotId,
    IntuneDeviceId,
}

/// Table declaration order
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column::EnrollmentStatus,
    Column::IntuneDeviceName,
    Column::EntraDeviceName,
    Column::EntraDeviceId,
    Column::EntraObjectId,
    Column::SerialNumber,
    Column::UserPrincipalName,
    Column::UserDisplayName,
    Column::GroupTag,
    Column::Model,
    Column::Manufacturer,
    Column::AutopilotId,
    Column::IntuneDeviceId,
];

/// Columns that get a free-text filter box in the report header
pub const TEXT_FILTER_COLUMNS: [Column; 7] = [
    Column::IntuneDeviceName,
    Column::EntraDeviceName,
    Column::SerialNumber,
    Column::UserPrincipalName,
    Column::UserDisplayName,
    Column::Model,
    Column::Manufacturer,
];

pub const ENROLLED_TEXT: &str = "Enrolled";
pub const NOT_ENROLLED_TEXT: &str = "Not enrolled";

impl Column {
    /// Position in declaration order
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier used in markup and persisted layouts.
    ///
    /// Labels may be reworded between releases; ids must not.
    pub fn id(self) -> &'static str {
        match self {
            Column::EnrollmentStatus => "enrollment",
            Column::IntuneDeviceName => "intune-name",
            Column::EntraDeviceName => "entra-name",
            Column::EntraDeviceId => "entra-device-id",
            Column::EntraObjectId => "entra-object-id",
            Column::SerialNumber => "serial",
            Column::UserPrincipalName => "upn",
            Column::UserDisplayName => "user-name",
            Column::GroupTag => "group-tag",
            Column::Model => "model",
            Column::Manufacturer => "manufacturer",
            Column::AutopilotId => "autopilot-id",
            Column::IntuneDeviceId => "intune-id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::EnrollmentStatus => "Enrollment Status",
            Column::IntuneDeviceName => "Intune Device Name",
            Column::EntraDeviceName => "Entra Device Name",
            Column::EntraDeviceId => "Entra Device ID",
            Column::EntraObjectId => "Entra Object ID",
            Column::SerialNumber => "Serial Number",
            Column::UserPrincipalName => "Primary User UPN",
            Column::UserDisplayName => "Primary User Name",
            Column::GroupTag => "Group Tag",
            Column::Model => "Model",
            Column::Manufacturer => "Manufacturer",
            Column::AutopilotId => "Autopilot ID",
            Column::IntuneDeviceId => "Intune Device ID",
        }
    }

    pub fn from_id(id: &str) -> Option<Column> {
        COLUMNS.iter().copied().find(|c| c.id() == id)
    }

    /// Displayed (unescaped) text of this column for a row, trimmed the way
    /// the report script reads cell text back
    pub fn text(self, row: &ReconciledRow) -> &str {
        let value = match self {
            Column::EnrollmentStatus => {
                return if row.enrolled {
                    ENROLLED_TEXT
                } else {
                    NOT_ENROLLED_TEXT
                };
            }
            Column::IntuneDeviceName => &row.intune_device_name,
            Column::EntraDeviceName => &row.entra_device_name,
            Column::EntraDeviceId => &row.entra_device_id,
            Column::EntraObjectId => &row.entra_object_id,
            Column::SerialNumber => &row.serial_number,
            Column::UserPrincipalName => &row.user_principal_name,
            Column::UserDisplayName => &row.user_display_name,
            Column::GroupTag => &row.group_tag,
            Column::Model => &row.model,
            Column::Manufacturer => &row.manufacturer,
            Column::AutopilotId => return row.autopilot_id.trim(),
            Column::IntuneDeviceId => &row.intune_device_id,
        };
        value.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Every column's text for one row, in declaration order
pub fn row_cells(row: &ReconciledRow) -> [String; COLUMN_COUNT] {
    COLUMNS.map(|c| c.text(row).to_string())
}
