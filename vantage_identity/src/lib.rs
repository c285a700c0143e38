// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Identity: stable identities for scenes and view layers.
//!
//! Saved views must re-locate their target scene and view layer across
//! renames, file reloads, duplication, and library linking. This crate
//! assigns each container an [`IdentityToken`]:
//! - a random UUID stored as a custom attribute on writable containers,
//!   created lazily on first reference and never regenerated except under
//!   duplicate repair;
//! - a composite `lib::<path>::<name>` key for linked/read-only
//!   containers, which cannot carry an attribute and cannot be renamed
//!   anyway.
//!
//! Duplicating a container copies its token, so [`IdentityResolver`]
//! also detects token collisions and re-keys all but the first holder.
//! Resolution is a linear scan with a human-readable-name fallback;
//! a miss is recovered by the caller with its own default, never an
//! error.

mod resolver;

pub use resolver::{IDENTITY_ATTR, IdentityResolver, IdentityToken};
