//! Core provisioning types: requests, volume descriptors, and access modes.
//!
//! These types form the data model shared between the provisioning controller
//! and the [`Provisioner`](crate::Provisioner) implementations.  They are all
//! [`Serialize`]/[`Deserialize`] because the controller persists the returned
//! descriptor as the durable cluster record; the crate itself keeps no state
//! beyond the directory tree on disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Annotation key stamped onto every volume this provisioner creates.
///
/// Its value is the provisioner's configured identity string, and it is the
/// only metadata tying a directory back to the instance that created it.
/// [`HostPathProvisioner::delete`](crate::HostPathProvisioner) refuses to
/// touch volumes whose annotation does not match its own identity.
pub const PROVISIONER_ID_ANNOTATION: &str = "rk8s.io/hostpath-provisioner-id";

// ---------------------------------------------------------------------------
// Volume identity
// ---------------------------------------------------------------------------

/// Name of a volume, assigned by the provisioning controller.
///
/// Names are assumed unique across the cluster; the on-disk path of a volume
/// is derived directly from its name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VolumeName(pub String);

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VolumeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VolumeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Access mode & reclaim policy
// ---------------------------------------------------------------------------

/// Describes how a volume may be accessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    /// Single-node read-write.
    ReadWriteOnce,
    /// Multi-node read-only.
    ReadOnlyMany,
    /// Multi-node read-write.
    ReadWriteMany,
}

/// What happens to the backing directory when the volume is released.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Remove the backing directory (the dynamic-provisioning default).
    #[default]
    Delete,
    /// Keep the backing directory for manual reclamation.
    Retain,
    /// Scrub and reuse (legacy; carried through verbatim).
    Recycle,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Inputs for a single provisioning attempt.
///
/// Constructed by the provisioning controller from the claim, its storage
/// class, and the volume name it chose; ephemeral, one per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Name the controller chose for the new volume.
    pub name: VolumeName,
    /// Requested capacity in bytes.  Signed so that invalid (non-positive)
    /// requests are representable and can be rejected explicitly.
    pub capacity_bytes: i64,
    /// Access modes requested by the claim.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Reclaim policy from the storage class.
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    /// Raw storage-class parameters, resolved by
    /// [`ProvisionerParameters::resolve`](crate::ProvisionerParameters::resolve).
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Volume descriptor
// ---------------------------------------------------------------------------

/// Description of a provisioned volume, handed back to the controller.
///
/// The controller persists this as the PersistentVolume object; on deletion
/// it passes the stored descriptor back in, and the on-disk path is read
/// straight out of [`host_path`](Self::host_path) rather than re-derived from
/// the storage class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Volume name, equal to the requested name.
    pub name: VolumeName,
    /// Object annotations, including [`PROVISIONER_ID_ANNOTATION`].
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Provisioned capacity in bytes.
    pub capacity_bytes: i64,
    /// Access modes copied verbatim from the request.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Reclaim policy copied verbatim from the request.
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    /// Backing directory on the shared filesystem.
    pub host_path: PathBuf,
}

impl VolumeDescriptor {
    /// Identity of the provisioner that created this volume, if stamped.
    pub fn provisioner_id(&self) -> Option<&str> {
        self.annotations
            .get(PROVISIONER_ID_ANNOTATION)
            .map(String::as_str)
    }
}
