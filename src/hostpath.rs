//! Directory-backed provisioner implementation.
//!
//! [`HostPathProvisioner`] implements [`Provisioner`] by mapping each volume
//! onto a directory `<pvdir>/<volume-name>` on a shared filesystem.  The
//! directory tree is the only durable state: nothing is tracked in memory
//! between calls, and every invocation reconstructs what it needs from its
//! inputs and the disk.  Volumes are stamped with the provisioner's identity
//! annotation so several cooperating instances can share one cluster without
//! reclaiming each other's volumes.
//!
//! # On-disk layout
//!
//! ```text
//! <pvdir>/
//!   <volume-name>/     # backing directory, handed to Pods as a hostPath
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::error::ProvisionerError;
use crate::params::ProvisionerParameters;
use crate::provisioner::Provisioner;
use crate::types::{PROVISIONER_ID_ANNOTATION, ProvisionRequest, VolumeDescriptor};

/// Built-in provisioner name, also the default identity when the hosting
/// binary does not configure one.
pub const DEFAULT_PROVISIONER_NAME: &str = "rk8s.io/hostpath";

/// Extended attribute carrying a CephFS directory quota, in bytes.
const QUOTA_XATTR: &str = "ceph.quota.max_bytes";

/// Clear the process umask.
///
/// Volume directories are created mode `0o777` so that Pods running under
/// arbitrary UIDs can write to them; a non-zero umask would subtract bits
/// from that unpredictably per environment.  The hosting binary should call
/// this once at startup.  Provisioning additionally chmods each directory
/// after creation, so permissions stay deterministic even if this call is
/// skipped.
pub fn clear_umask() {
    nix::sys::stat::umask(nix::sys::stat::Mode::empty());
}

/// Encode a byte capacity as the decimal ASCII value CephFS expects.
fn quota_attr_value(capacity_bytes: i64) -> Vec<u8> {
    capacity_bytes.to_string().into_bytes()
}

/// Provisioner backed by plain directories under a storage-class-configured
/// root.
///
/// Stateless aside from the identity string, which is injected at
/// construction so that multiple instances with distinct identities can
/// coexist in one process.
pub struct HostPathProvisioner {
    /// Unique identity stamped onto every volume this instance creates.
    identity: String,
}

impl HostPathProvisioner {
    /// Create a provisioner with the given identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// Identity this instance stamps onto and requires of its volumes.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[async_trait]
impl Provisioner for HostPathProvisioner {
    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn provision(
        &self,
        request: ProvisionRequest,
    ) -> Result<VolumeDescriptor, ProvisionerError> {
        // Both validation steps run before any filesystem access, so a bad
        // class or claim never leaves anything behind.
        let params = ProvisionerParameters::resolve(&request.parameters)?;

        if request.capacity_bytes <= 0 {
            return Err(ProvisionerError::InvalidCapacity(request.capacity_bytes));
        }
        debug!(capacity_bytes = request.capacity_bytes, "requested capacity");

        let path = params.pv_dir.join(&request.name.0);

        // Recursive creation doubles as the idempotency guard: an existing
        // leaf is fine, a parent that exists as a non-directory is not.
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true).mode(0o777);
        builder
            .create(&path)
            .await
            .map_err(|e| ProvisionerError::CreateDir {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        // The mode passed to mkdir is filtered by the umask and by ACLs
        // inherited from the parent; force the final mode explicitly.
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o777))
            .await
            .map_err(|e| ProvisionerError::CreateDir {
                path: path.display().to_string(),
                reason: format!("chmod: {e}"),
            })?;

        if params.cephfs_quota
            && let Err(e) = xattr::set(&path, QUOTA_XATTR, &quota_attr_value(request.capacity_bytes))
        {
            // Compensate before surfacing the error: the directory created
            // above must not outlive a failed quota set.  The rollback's own
            // failure is logged but the quota error stays the primary one.
            if let Err(rm) = tokio::fs::remove_dir_all(&path).await {
                warn!(path = %path.display(), error = %rm, "rollback of volume directory failed");
            }
            return Err(ProvisionerError::SetQuota {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }

        info!(path = %path.display(), "hostpath volume provisioned");

        Ok(VolumeDescriptor {
            name: request.name,
            annotations: HashMap::from([(
                PROVISIONER_ID_ANNOTATION.to_owned(),
                self.identity.clone(),
            )]),
            capacity_bytes: request.capacity_bytes,
            access_modes: request.access_modes,
            reclaim_policy: request.reclaim_policy,
            host_path: path,
        })
    }

    #[instrument(skip(self, volume), fields(name = %volume.name))]
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<(), ProvisionerError> {
        // Prove ownership before touching the disk.
        let Some(id) = volume.provisioner_id() else {
            return Err(ProvisionerError::IdentityMissing(volume.name.clone()));
        };
        if id != self.identity {
            return Err(ProvisionerError::Ignored {
                volume: volume.name.clone(),
                reason: "identity annotation on volume does not match ours".to_owned(),
            });
        }

        // The descriptor records where the volume was provisioned; deleting
        // from it avoids a dependency on the storage class still existing.
        match tokio::fs::remove_dir_all(&volume.host_path).await {
            Ok(()) => {
                info!(path = %volume.host_path.display(), "hostpath volume removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %volume.host_path.display(), "volume directory already gone");
                Ok(())
            }
            Err(e) => Err(ProvisionerError::RemoveDir {
                path: volume.host_path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessMode, ReclaimPolicy};
    use std::path::Path;
    use std::sync::Arc;

    fn request(pv_dir: &Path, name: &str, capacity_bytes: i64) -> ProvisionRequest {
        ProvisionRequest {
            name: name.into(),
            capacity_bytes,
            access_modes: vec![AccessMode::ReadWriteMany],
            reclaim_policy: ReclaimPolicy::Delete,
            parameters: HashMap::from([(
                "pvdir".to_owned(),
                pv_dir.to_string_lossy().into_owned(),
            )]),
        }
    }

    #[tokio::test]
    async fn provision_creates_directory_and_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("pv");
        let p = HostPathProvisioner::new(DEFAULT_PROVISIONER_NAME);

        let vol = p
            .provision(request(&root, "pvc-abc123", 1 << 30))
            .await
            .unwrap();

        assert_eq!(vol.host_path, root.join("pvc-abc123"));
        assert!(vol.host_path.is_dir());
        assert_eq!(vol.capacity_bytes, 1 << 30);
        assert_eq!(vol.provisioner_id(), Some(DEFAULT_PROVISIONER_NAME));
        assert_eq!(vol.access_modes, vec![AccessMode::ReadWriteMany]);
        assert_eq!(vol.reclaim_policy, ReclaimPolicy::Delete);
    }

    #[tokio::test]
    async fn provision_forces_directory_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        let vol = p.provision(request(tmp.path(), "pvc-mode", 1)).await.unwrap();

        // Regardless of the test process's umask, the chmod step must leave
        // the leaf world-writable.
        let mode = tokio::fs::metadata(&vol.host_path)
            .await
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o777);
    }

    #[tokio::test]
    async fn provision_rejects_non_positive_capacity() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("pv");
        let p = HostPathProvisioner::new("id");

        for capacity in [0, -1] {
            let err = p
                .provision(request(&root, "pvc-bad", capacity))
                .await
                .unwrap_err();
            assert!(matches!(err, ProvisionerError::InvalidCapacity(c) if c == capacity));
        }
        // Validation fails before any filesystem access.
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn provision_rejects_unknown_parameter_before_any_mutation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("pv");
        let p = HostPathProvisioner::new("id");

        let mut req = request(&root, "pvc-typo", 1024);
        req.parameters.insert("pvquota".to_owned(), "1".to_owned());

        let err = p.provision(req).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::UnknownParameter(k) if k == "pvquota"));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn provision_is_idempotent_for_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        let first = p.provision(request(tmp.path(), "pvc-twice", 1024)).await.unwrap();
        let second = p.provision(request(tmp.path(), "pvc-twice", 1024)).await.unwrap();

        assert_eq!(first.host_path, second.host_path);
        assert!(second.host_path.is_dir());
    }

    #[tokio::test]
    async fn provision_fails_when_parent_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("pv");
        tokio::fs::write(&root, b"not a directory").await.unwrap();
        let p = HostPathProvisioner::new("id");

        let err = p.provision(request(&root, "pvc-blocked", 1024)).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn quota_failure_rolls_back_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        // Setting a ceph-namespace xattr on an ordinary filesystem fails, so
        // this exercises the rollback path deterministically.
        let mut req = request(tmp.path(), "pvc-quota", 2147483648);
        req.parameters
            .insert("cephfsquota".to_owned(), "true".to_owned());

        let err = p.provision(req).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::SetQuota { .. }));
        assert!(!tmp.path().join("pvc-quota").exists());
    }

    #[test]
    fn quota_value_is_decimal_ascii() {
        assert_eq!(quota_attr_value(2147483648), b"2147483648".to_vec());
        assert_eq!(quota_attr_value(1), b"1".to_vec());
    }

    #[tokio::test]
    async fn provision_then_delete_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        let vol = p.provision(request(tmp.path(), "pvc-rt", 1024)).await.unwrap();
        assert!(vol.host_path.is_dir());

        p.delete(&vol).await.unwrap();
        assert!(!vol.host_path.exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent_for_absent_path() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        let vol = p.provision(request(tmp.path(), "pvc-gone", 1024)).await.unwrap();
        p.delete(&vol).await.unwrap();

        // A second delete of the same volume must also succeed.
        p.delete(&vol).await.unwrap();
    }

    #[tokio::test]
    async fn delete_declines_foreign_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let ours = HostPathProvisioner::new("provisioner-a");
        let theirs = HostPathProvisioner::new("provisioner-b");

        let vol = ours
            .provision(request(tmp.path(), "pvc-foreign", 1024))
            .await
            .unwrap();

        let err = theirs.delete(&vol).await.unwrap_err();
        assert!(err.is_ignorable());
        assert!(matches!(err, ProvisionerError::Ignored { .. }));
        // The volume must be left alone.
        assert!(vol.host_path.is_dir());
    }

    #[tokio::test]
    async fn delete_rejects_missing_identity_annotation() {
        let tmp = tempfile::tempdir().unwrap();
        let p = HostPathProvisioner::new("id");

        let mut vol = p
            .provision(request(tmp.path(), "pvc-unmarked", 1024))
            .await
            .unwrap();
        vol.annotations.clear();

        let err = p.delete(&vol).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::IdentityMissing(_)));
        assert!(!err.is_ignorable());
        assert!(vol.host_path.is_dir());
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let tmp = tempfile::tempdir().unwrap();
        let p: Arc<dyn Provisioner> = Arc::new(HostPathProvisioner::new("id"));

        let vol = p.provision(request(tmp.path(), "pvc-dyn", 1024)).await.unwrap();
        p.delete(&vol).await.unwrap();
        assert!(!vol.host_path.exists());
    }
}
