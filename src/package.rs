//! The immutable bundle passed between pipeline stages.

use std::sync::Arc;

use crate::error::BuildError;
use crate::geom::ExtendedSurface;
use crate::network::Network;
use crate::skeleton::Skeleton;

/// An immutable {network, skeleton, extended surface, label} aggregate.
///
/// Validated once at construction and read-only thereafter; unpacking returns
/// the exact values that went in. The label records strategy provenance for
/// hosts that display or log it.
#[derive(Debug, Clone)]
pub struct SkeletonPackage {
    network: Arc<Network>,
    skeleton: Skeleton,
    label: String,
}

impl SkeletonPackage {
    /// Bundle a network and skeleton.
    ///
    /// # Errors
    /// `MissingUpstream` when the skeleton sequence is empty; a package must
    /// never expose a hollow traversal to downstream stages.
    pub fn new(
        network: Arc<Network>,
        skeleton: Skeleton,
        label: impl Into<String>,
    ) -> Result<Self, BuildError> {
        if skeleton.is_empty() {
            return Err(BuildError::MissingUpstream {
                kind: "skeleton sequence",
            });
        }
        Ok(Self {
            network,
            skeleton,
            label: label.into(),
        })
    }

    #[must_use]
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// The strip-width-grown surface the network was built on.
    #[must_use]
    pub fn extended_surface(&self) -> &Arc<ExtendedSurface> {
        self.network.extended_surface()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}
