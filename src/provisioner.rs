//! Provisioner trait — the controller-facing boundary.
//!
//! The external provisioning controller watches claims and volumes, decides
//! when a volume must be created or reclaimed, and drives whichever object
//! implements [`Provisioner`].  Keeping the boundary a trait lets alternate
//! implementations (including test doubles that stub the filesystem) stand in
//! without touching the controller side.

use async_trait::async_trait;

use crate::error::ProvisionerError;
use crate::types::{ProvisionRequest, VolumeDescriptor};

/// A dynamic volume provisioner.
///
/// Implementations are stateless between calls: every invocation operates
/// only on its inputs and on the filesystem, so calls are reentrant and
/// concurrent calls for different volume names are safe by construction
/// (disjoint paths).  Calls for the *same* name are not synchronized here —
/// the controller is expected to dispatch at most one in-flight operation per
/// volume at a time, and idempotent directory creation is the only guard
/// beyond that.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provision backing storage for a new volume.
    ///
    /// On success the returned [`VolumeDescriptor`] is complete and the
    /// volume is fully provisioned; no in-progress state is modeled.  On
    /// failure nothing of the attempt remains on disk, and the error is the
    /// controller's to retry or report — this crate never retries internally.
    async fn provision(
        &self,
        request: ProvisionRequest,
    ) -> Result<VolumeDescriptor, ProvisionerError>;

    /// Reclaim the backing storage of a released volume.
    ///
    /// `volume` is the descriptor previously returned by
    /// [`provision`](Self::provision), as persisted by the controller.
    /// Implementations must verify ownership before touching anything and
    /// return an error for which
    /// [`is_ignorable`](ProvisionerError::is_ignorable) is `true` when the
    /// volume belongs to a different provisioner instance.  Removal is
    /// idempotent: deleting an already-absent volume succeeds.
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<(), ProvisionerError>;
}
