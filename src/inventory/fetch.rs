//! Sequential retrieval of the three inventories and the primary users
//!
//! One request is in flight at a time. A failed listing aborts the run; a
//! failed primary-user lookup only blanks that device's user columns.

use crate::error::Result;
use crate::graph::GraphClient;
use crate::graph::devices::{
    list_autopilot_devices, list_directory_devices, list_managed_devices, primary_user,
};
use crate::inventory::{Inventory, PrimaryUsers};

/// Outcome of the per-device primary-user pass
#[derive(Debug, Default)]
pub struct PrimaryUserLookup {
    pub users: PrimaryUsers,
    /// Managed device ids whose lookup failed
    pub failed: Vec<String>,
}

/// Fetch Autopilot, Intune and Entra device listings, in that order
pub async fn fetch_inventory(client: &GraphClient) -> Result<Inventory> {
    let devices = list_autopilot_devices(client).await?;
    tracing::debug!(count = devices.len(), "autopilot devices");

    let managed = list_managed_devices(client).await?;
    tracing::debug!(count = managed.len(), "intune managed devices");

    let directory = list_directory_devices(client).await?;
    tracing::debug!(count = directory.len(), "entra devices");

    Ok(Inventory::new(devices, managed, directory))
}

/// Look up the primary user of each managed device, one at a time.
///
/// `on_step` is called once per device after its lookup finishes.
pub async fn fetch_primary_users(
    client: &GraphClient,
    managed_device_ids: &[String],
    mut on_step: impl FnMut(&str),
) -> PrimaryUserLookup {
    let mut lookup = PrimaryUserLookup::default();

    for id in managed_device_ids {
        match primary_user(client, id).await {
            Ok(Some(user)) => {
                lookup.users.insert(id.clone(), user);
            }
            Ok(None) => {
                tracing::debug!(managed_device_id = %id, "no primary user");
            }
            Err(e) => {
                tracing::warn!(managed_device_id = %id, error = %e, "primary user lookup failed");
                lookup.failed.push(id.clone());
            }
        }
        on_step(id);
    }

    lookup
}
