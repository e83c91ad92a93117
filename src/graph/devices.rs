//! Device inventory reads
//!
//! Typed records for the three device sources and the Graph calls that list
//! them. Every optional attribute is an `Option` so a record missing a join
//! key simply fails to match later on instead of failing to decode.

use crate::error::Result;
use crate::graph::GraphClient;
use serde::{Deserialize, Serialize};

pub const AUTOPILOT_DEVICES_ENDPOINT: &str = "deviceManagement/windowsAutopilotDeviceIdentities";
pub const MANAGED_DEVICES_ENDPOINT: &str =
    "deviceManagement/managedDevices?$select=id,deviceName,azureADDeviceId";
pub const DIRECTORY_DEVICES_ENDPOINT: &str = "devices?$select=id,deviceId,displayName";

/// Windows Autopilot device identity (enrollment source)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub group_tag: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub managed_device_id: Option<String>,
    #[serde(default, alias = "azureAdDeviceId")]
    pub azure_active_directory_device_id: Option<String>,
}

/// Intune managed device (management source)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDeviceRecord {
    pub id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default, rename = "azureADDeviceId")]
    pub azure_ad_device_id: Option<String>,
}

/// Entra ID device registration (directory source)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryDeviceRecord {
    /// Directory object id, used for admin center links
    pub id: String,
    /// Device id, the join key shared with Autopilot and Intune
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Primary user of a managed device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryUser {
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

pub async fn list_autopilot_devices(client: &GraphClient) -> Result<Vec<DeviceRecord>> {
    client.get_all_pages(AUTOPILOT_DEVICES_ENDPOINT).await
}

pub async fn list_managed_devices(client: &GraphClient) -> Result<Vec<ManagedDeviceRecord>> {
    client.get_all_pages(MANAGED_DEVICES_ENDPOINT).await
}

pub async fn list_directory_devices(client: &GraphClient) -> Result<Vec<DirectoryDeviceRecord>> {
    client.get_all_pages(DIRECTORY_DEVICES_ENDPOINT).await
}

/// Look up the users attached to a managed device and keep the first one
pub async fn primary_user(
    client: &GraphClient,
    managed_device_id: &str,
) -> Result<Option<PrimaryUser>> {
    let endpoint = format!(
        "deviceManagement/managedDevices/{}/users",
        urlencoding::encode(managed_device_id)
    );
    let users: Vec<PrimaryUser> = client.get_all_pages(&endpoint).await?;
    Ok(users.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_autopilot_record_accepts_both_directory_id_names() {
        let v1: DeviceRecord = serde_json::from_value(json!({
            "id": "ap-1",
            "serialNumber": "SER1",
            "azureActiveDirectoryDeviceId": "D-1"
        }))
        .unwrap();
        assert_eq!(v1.azure_active_directory_device_id.as_deref(), Some("D-1"));

        let beta: DeviceRecord = serde_json::from_value(json!({
            "id": "ap-2",
            "azureAdDeviceId": "D-2",
            "groupTag": null
        }))
        .unwrap();
        assert_eq!(beta.azure_active_directory_device_id.as_deref(), Some("D-2"));
        assert!(beta.group_tag.is_none());
        assert!(beta.managed_device_id.is_none());
    }

    #[test]
    fn test_managed_device_field_casing() {
        let managed: ManagedDeviceRecord = serde_json::from_value(json!({
            "id": "m-1",
            "deviceName": "LAPTOP-01",
            "azureADDeviceId": "d-1"
        }))
        .unwrap();
        assert_eq!(managed.device_name.as_deref(), Some("LAPTOP-01"));
        assert_eq!(managed.azure_ad_device_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn test_directory_record_ignores_unknown_fields() {
        let dir: DirectoryDeviceRecord = serde_json::from_value(json!({
            "id": "obj-1",
            "deviceId": "d-1",
            "displayName": "Laptop-A",
            "operatingSystem": "Windows"
        }))
        .unwrap();
        assert_eq!(dir.id, "obj-1");
        assert_eq!(dir.device_id.as_deref(), Some("d-1"));
    }
}
