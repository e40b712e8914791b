//! # libhostpath — directory-backed dynamic PV provisioning for RK8s
//!
//! `libhostpath` implements the core of a Kubernetes dynamic volume
//! provisioner that maps each PersistentVolumeClaim onto a directory beneath
//! a configured root on a shared filesystem, returned to the caller as a
//! host-path-backed volume descriptor.  The watch loop, work queue, leader
//! election and retry backoff all live in the external provisioning
//! controller; this crate only provides the two operations that controller
//! invokes.  It follows the RK8s architecture conventions (Tokio async
//! runtime, `tracing` for observability, `thiserror` for structured errors).
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Core data model: `ProvisionRequest`, `VolumeDescriptor`, access modes. |
//! | [`error`] | [`ProvisionerError`] enum covering all failure modes. |
//! | [`params`] | Storage-class parameter resolution ([`ProvisionerParameters`]). |
//! | [`provisioner`] | [`Provisioner`] trait — the controller-facing boundary. |
//! | [`hostpath`] | [`HostPathProvisioner`] — directory lifecycle implementation. |

pub mod error;
pub mod hostpath;
pub mod params;
pub mod provisioner;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use error::ProvisionerError;
pub use hostpath::{DEFAULT_PROVISIONER_NAME, HostPathProvisioner, clear_umask};
pub use params::ProvisionerParameters;
pub use provisioner::Provisioner;
pub use types::*;
