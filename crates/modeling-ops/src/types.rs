use geom_kernel::{KernelError, KernelId, KernelSolidHandle};
use fixture_types::TopoKind;
use serde::{Deserialize, Serialize};

/// A solid owned by one pipeline step.
///
/// Not `Clone`: combine and feature operations take it by value, so a
/// superseded solid cannot be used by mistake. Each solid carries a
/// generation tag that selections drawn from it must match: the kernel's
/// handle number, which a kernel never reuses.
#[derive(Debug, PartialEq, Eq)]
pub struct Solid {
    handle: KernelSolidHandle,
    generation: u64,
}

impl Solid {
    /// Wrap a freshly produced kernel handle.
    pub fn new(handle: KernelSolidHandle) -> Self {
        Self {
            generation: handle.id(),
            handle,
        }
    }

    pub fn handle(&self) -> &KernelSolidHandle {
        &self.handle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An ordered set of faces or edges drawn from one generation of a solid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    kind: TopoKind,
    ids: Vec<KernelId>,
    generation: u64,
}

impl Selection {
    pub(crate) fn new(kind: TopoKind, ids: Vec<KernelId>, generation: u64) -> Self {
        Self {
            kind,
            ids,
            generation,
        }
    }

    pub fn kind(&self) -> TopoKind {
        self.kind
    }

    pub fn ids(&self) -> &[KernelId] {
        &self.ids
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check that this selection was drawn from `solid` as it is now.
    pub fn check_current(&self, solid: &Solid) -> Result<(), OpError> {
        if self.generation != solid.generation() {
            return Err(OpError::StaleSelection {
                selection: self.generation,
                solid: solid.generation(),
            });
        }
        Ok(())
    }
}

/// Rounding applied by the Feature Applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeatureKind {
    Fillet,
    Chamfer,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKind::Fillet => write!(f, "fillet"),
            FeatureKind::Chamfer => write!(f, "chamfer"),
        }
    }
}

/// A selection plus the rounding to apply to it.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub selection: Selection,
    pub kind: FeatureKind,
    /// Fillet radius or chamfer distance.
    pub size: f64,
}

/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("degenerate profile: {points} distinct points, at least {required} required")]
    DegenerateProfile { points: usize, required: usize },

    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("boolean {op} failed: {reason}")]
    BooleanFailure { op: String, reason: String },

    #[error("selection index {index} out of range ({count} candidates)")]
    SelectionOutOfRange { index: usize, count: usize },

    #[error("{kind} of size {size} is infeasible: {reason}")]
    InfeasibleFeature {
        kind: FeatureKind,
        size: f64,
        reason: String,
    },

    #[error("selection from generation {selection} used on solid generation {solid}")]
    StaleSelection { selection: u64, solid: u64 },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}
