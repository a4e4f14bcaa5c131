//! Per-entity node stored in the transform hierarchy

use std::cell::Cell;

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::math::{Mat3, Transform2D};

/// Spatial object in the hierarchy
///
/// The world matrix and the decomposed world transform are memoized
/// separately; `None` marks a stale cache. A fresh cache on a node implies
/// fresh caches on all of its ancestors, because computing it reads them.
#[derive(Debug)]
pub(crate) struct EntityNode {
    pub(crate) name: String,
    pub(crate) local: Transform2D,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: Vec<ComponentId>,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) live: bool,
    pub(crate) world_matrix: Cell<Option<Mat3>>,
    pub(crate) world_transform: Cell<Option<Transform2D>>,
    pub(crate) matrix_recomputes: Cell<u64>,
}

impl EntityNode {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform2D::IDENTITY,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            enabled: true,
            visible: true,
            live: false,
            world_matrix: Cell::new(None),
            world_transform: Cell::new(None),
            matrix_recomputes: Cell::new(0),
        }
    }

    /// Drop both memoized world values
    pub(crate) fn invalidate(&self) {
        self.world_matrix.set(None);
        self.world_transform.set(None);
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.world_matrix.get().is_none()
    }
}
