//! Scene errors

use std::fmt;

use thiserror::Error;

use crate::foundation::collections::{ComponentId, EntityId, ModuleId};

/// Error type user components and modules return
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a component or module callback
pub type ComponentResult = Result<(), BoxedError>;

/// Frame step a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// Module pre-update
    PreUpdate,
    /// Synchronous component update
    Update,
    /// Concurrent component update
    AsyncUpdate,
    /// Module post-update
    PostUpdate,
    /// Drawable draw call
    Draw,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreUpdate => "pre-update",
            Self::Update => "update",
            Self::AsyncUpdate => "async update",
            Self::PostUpdate => "post-update",
            Self::Draw => "draw",
        };
        f.write_str(name)
    }
}

/// Scene runtime errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// A lifecycle call named an entity that does not exist
    #[error("Unknown entity: {0:?}")]
    UnknownEntity(EntityId),

    /// A lifecycle call named a component that does not exist
    #[error("Unknown component: {0:?}")]
    UnknownComponent(ComponentId),

    /// A lifecycle call named a module that does not exist
    #[error("Unknown module: {0:?}")]
    UnknownModule(ModuleId),

    /// A component callback failed
    #[error("Component '{name}' failed during {phase}: {source}")]
    ComponentFailed {
        /// Component name
        name: String,
        /// Frame step
        phase: FramePhase,
        /// Error returned by the component
        source: BoxedError,
    },

    /// A module callback failed
    #[error("Module '{name}' failed during {phase}: {source}")]
    ModuleFailed {
        /// Module name
        name: String,
        /// Frame step
        phase: FramePhase,
        /// Error returned by the module
        source: BoxedError,
    },
}

impl SceneError {
    /// Frame step the error came from, for callback failures
    pub fn phase(&self) -> Option<FramePhase> {
        match self {
            Self::ComponentFailed { phase, .. } | Self::ModuleFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Convenience result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
