// Copyright 2026 the Sapling Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber kinds and mutation flags.

use bitflags::bitflags;

/// The kind of tree position a fiber represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FiberTag {
    /// The root of a container. Exactly one pair per root.
    Root,
    /// A concrete host element.
    HostNode,
    /// A host text node.
    TextNode,
    /// A function component. Owns a hook chain, never a host instance.
    FunctionComponent,
}

impl FiberTag {
    /// Returns whether fibers of this kind own a host instance.
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::HostNode | Self::TextNode)
    }
}

bitflags! {
    /// Mutation intents carried from the render phase into commit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FiberFlags: u8 {
        /// Insert (or move) this fiber's host nodes.
        const PLACEMENT = 1 << 0;
        /// Patch this fiber's host instance with its new props.
        const UPDATE = 1 << 1;
        /// Remove the fibers listed in `deletions`.
        const CHILD_DELETION = 1 << 2;
    }
}

impl FiberFlags {
    /// Every flag the commit phase acts on.
    pub const MUTATION_MASK: Self = Self::PLACEMENT
        .union(Self::UPDATE)
        .union(Self::CHILD_DELETION);
}
