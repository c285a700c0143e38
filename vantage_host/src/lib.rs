// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Host: the capability surface Vantage assumes from its host.
//!
//! Vantage never talks to a renderer, scene graph, or window system
//! directly. Everything it needs from the surrounding 3D editor is
//! expressed as the [`Host`] trait:
//! - live viewport pose and display-style access,
//! - camera objects and the active-camera switch,
//! - scene / view-layer enumeration with custom string attributes and a
//!   writability distinction for linked assets,
//! - selection bounds and a selection fingerprint,
//! - an embedded named text blob for persistence,
//! - thumbnail rendering producing opaque handles,
//! - an asynchronous "frame selection" request polled to completion via
//!   [`FrameRequest`].
//!
//! [`MockHost`] is a deterministic in-memory implementation used by the
//! workspace's own tests; it is exported so downstream scenario tests can
//! drive the full stack without a real editor.
//!
//! ## Example
//!
//! ```rust
//! use vantage_host::{Host, MockHost};
//!
//! let mut host = MockHost::new();
//! let viewport = host.add_viewport();
//! let pose = host.viewport_pose(viewport).unwrap();
//! assert!(pose.perspective);
//! ```

mod host;
mod ids;
mod mock;
mod provider;

pub use host::{CameraState, ContainerOrigin, FrameRequest, Host, HostError, ViewportState};
pub use ids::{CameraId, LayerId, SceneId, ThumbnailId, ViewportId};
pub use mock::MockHost;
pub use provider::{ActiveViewportProvider, FallbackViewportProvider};
