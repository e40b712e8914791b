//! Provisioner error types.
//!
//! All errors in the `libhostpath` crate are represented by the
//! [`ProvisionerError`] enum, which derives [`thiserror::Error`] for
//! ergonomic error handling.  One variant, [`ProvisionerError::Ignored`], is
//! not a failure at all: it tells the provisioning controller that this
//! instance deliberately declines to act on a volume another instance owns,
//! and the object should be left alone rather than retried.  Use
//! [`ProvisionerError::is_ignorable`] to distinguish it.

use thiserror::Error;

use crate::types::VolumeName;

/// Unified error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// The storage class carries a parameter key this provisioner does not
    /// recognize.  Rejected outright rather than skipped, so that a typo in
    /// a class does not silently disable an option.
    #[error("invalid storage class option {0:?}")]
    UnknownParameter(String),

    /// The quota flag parameter had a value other than `"true"`/`"false"`.
    #[error("invalid value for cephfsquota: {0} (should be true or false)")]
    InvalidQuotaFlag(String),

    /// The storage class did not supply a PV root directory.
    #[error("missing PV directory (pvdir)")]
    MissingRootDir,

    /// The requested capacity was not strictly positive.  The request itself
    /// is invalid; retrying cannot help.
    #[error("storage capacity must be positive (got {0})")]
    InvalidCapacity(i64),

    /// Creating the backing directory failed.
    #[error("failed to create directory {path}: {reason}")]
    CreateDir {
        /// Directory the creation was attempted at.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Removing the backing directory failed.
    #[error("failed to remove directory {path}: {reason}")]
    RemoveDir {
        /// Directory the removal was attempted at.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Setting the CephFS quota attribute failed.
    #[error("failed to set quota on {path}: {reason}")]
    SetQuota {
        /// Directory the attribute was to be set on.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// A deletion was routed here for a volume carrying no identity
    /// annotation at all.  Unexpected: the controller should never have
    /// dispatched it to us.
    #[error("identity annotation not found on volume {0}")]
    IdentityMissing(VolumeName),

    /// This provisioner declines to act on the volume; another cooperating
    /// instance owns it.  Not a failure — the controller should drop the
    /// work item instead of retrying.
    #[error("ignoring volume {volume}: {reason}")]
    Ignored {
        /// Volume being declined.
        volume: VolumeName,
        /// Human-readable reason for declining.
        reason: String,
    },
}

impl ProvisionerError {
    /// `true` for the "not mine, leave it alone" condition and `false` for
    /// every real failure.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }
}
