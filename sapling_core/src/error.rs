// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error and diagnostic types.

use alloc::string::String;
use core::fmt;

use crate::hooks::HookKind;

/// How a component's hook calls diverged from its previous render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookMismatch {
    /// More hook calls than last render.
    MoreHooks,
    /// Fewer hook calls than last render.
    FewerHooks {
        /// Hooks called last render.
        expected: usize,
        /// Hooks called this render.
        actual: usize,
    },
    /// A different hook kind was called at this position.
    KindChanged {
        /// Kind recorded last render.
        expected: HookKind,
        /// Kind called this render.
        found: HookKind,
    },
    /// Same kind, but the state type changed.
    StateTypeChanged,
}

impl fmt::Display for HookMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoreHooks => f.write_str("more hooks were called than during the previous render"),
            Self::FewerHooks { expected, actual } => {
                write!(f, "{actual} hooks were called, the previous render called {expected}")
            }
            Self::KindChanged { expected, found } => {
                write!(f, "expected a {expected:?} hook, found {found:?}")
            }
            Self::StateTypeChanged => f.write_str("the state type of the hook changed"),
        }
    }
}

/// Errors surfaced by the engine.
///
/// Errors raised inside a pass abort it: the work-in-progress tree is
/// discarded and the committed tree and host remain as they were.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A component's hook calls differ between two renders.
    #[error("hook consistency violation in `{component}` at hook {index}: {mismatch}")]
    HookConsistency {
        /// Display name of the component.
        component: &'static str,
        /// Position in the hook chain.
        index: usize,
        /// What diverged.
        mismatch: HookMismatch,
    },
    /// A component body reported a failure.
    #[error("component `{component}` failed: {message}")]
    Component {
        /// Display name of the component.
        component: &'static str,
        /// Message supplied by the component.
        message: String,
    },
    /// A setter was called for a fiber that is no longer mounted, or whose
    /// root has been dropped.
    #[error("state update dispatched outside of a mounted component")]
    DispatchOutsideComponent,
    /// A setter was called while a pass was running and the root rejects
    /// re-entrant updates.
    #[error("state update dispatched while a pass is running")]
    ReentrantUpdate,
    /// Deferred re-entrant updates kept scheduling passes.
    #[error("exceeded {limit} nested update passes")]
    NestedUpdateLimit {
        /// The configured limit.
        limit: u32,
    },
    /// The root was accessed from inside its own pass.
    #[error("root is busy running a pass")]
    RootBusy,
}

impl Error {
    /// Creates a [`Error::Component`] error.
    pub fn component(component: &'static str, message: impl Into<String>) -> Self {
        Self::Component {
            component,
            message: message.into(),
        }
    }
}

/// A non-fatal condition reported during a pass.
///
/// Diagnostics never abort a pass. They are delivered to the trace sink and
/// collected in the pass report.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// A child descriptor shape the reconciler does not handle. The entry is
    /// treated as having no children.
    #[error("unsupported descriptor under fiber {parent}: {shape}")]
    UnsupportedDescriptor {
        /// Slot index of the fiber whose children were being reconciled.
        parent: u32,
        /// Description of the rejected shape.
        shape: &'static str,
    },
    /// No host ancestor could be found for a fiber needing a mutation. The
    /// mutation is skipped.
    #[error("no host parent for fiber {fiber}")]
    HostParentNotFound {
        /// Slot index of the fiber.
        fiber: u32,
    },
}
