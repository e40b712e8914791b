//! Storage-class parameter resolution.
//!
//! A storage class selecting this provisioner carries a small string-to-string
//! parameter map.  [`ProvisionerParameters::resolve`] validates and normalizes
//! it before any filesystem work begins, so a misconfigured class always fails
//! with a configuration error and never leaves partial state behind.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ProvisionerError;

/// Parameter key naming the PV root directory.  Required.
pub const PARAM_PV_DIR: &str = "pvdir";

/// Parameter key enabling CephFS quota attributes.  Optional, `"true"` or
/// `"false"`.
pub const PARAM_CEPHFS_QUOTA: &str = "cephfsquota";

/// Resolved configuration from a storage class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerParameters {
    /// Root directory all volumes are provisioned under.
    pub pv_dir: PathBuf,
    /// Whether to set the `ceph.quota.max_bytes` attribute on each volume
    /// directory.
    pub cephfs_quota: bool,
}

impl ProvisionerParameters {
    /// Validate and normalize a storage-class parameter map.
    ///
    /// Keys are matched case-insensitively.  Validation is strict: any key
    /// outside the recognized set is rejected, naming the offending key, so
    /// typos in a storage class surface immediately instead of silently
    /// disabling an option.  Pure function of its input; performs no
    /// filesystem access.
    pub fn resolve(parameters: &HashMap<String, String>) -> Result<Self, ProvisionerError> {
        let mut pv_dir = String::new();
        let mut cephfs_quota = false;

        for (key, value) in parameters {
            match key.to_lowercase().as_str() {
                PARAM_PV_DIR => pv_dir = value.clone(),
                PARAM_CEPHFS_QUOTA => {
                    cephfs_quota = match value.as_str() {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(ProvisionerError::InvalidQuotaFlag(other.to_owned()));
                        }
                    }
                }
                _ => return Err(ProvisionerError::UnknownParameter(key.clone())),
            }
        }

        if pv_dir.is_empty() {
            return Err(ProvisionerError::MissingRootDir);
        }

        Ok(Self {
            pv_dir: PathBuf::from(pv_dir),
            cephfs_quota,
        })
    }
}
