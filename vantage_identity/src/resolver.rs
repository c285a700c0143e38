// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;
use vantage_host::{Host, LayerId, SceneId};

/// Custom attribute key the UUID token is stored under.
pub const IDENTITY_ATTR: &str = "vantage_uuid";

/// Stable identity of a scene or view layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityToken {
    /// Random token stored on a writable container.
    Token(String),
    /// Composite key for a linked/read-only container. `name` is the
    /// container name, or `scene::layer` for a layer path.
    Library {
        /// Normalized origin path of the library file.
        path: String,
        /// Name path within the library.
        name: String,
    },
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.write_str(token),
            Self::Library { path, name } => write!(f, "lib::{path}::{name}"),
        }
    }
}

/// Assigns, repairs, and resolves container identities against a host.
///
/// Stateless; owned by the session so tests can inject it alongside the
/// other services.
#[derive(Debug, Default)]
pub struct IdentityResolver;

impl IdentityResolver {
    /// A new resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Identity of a scene, creating a token on first reference for
    /// writable scenes. Returns `None` when the scene no longer exists or
    /// its token cannot be written.
    pub fn scene_identity(&self, host: &mut dyn Host, scene: SceneId) -> Option<IdentityToken> {
        let origin = host.scene_origin(scene)?;
        if let vantage_host::ContainerOrigin::Linked { path } = origin {
            let name = host.scene_name(scene)?;
            return Some(IdentityToken::Library { path, name });
        }
        if let Some(existing) = host.scene_attr(scene, IDENTITY_ATTR) {
            return Some(IdentityToken::Token(existing));
        }
        let token = Uuid::new_v4().to_string();
        if let Err(err) = host.set_scene_attr(scene, IDENTITY_ATTR, &token) {
            warn!(?scene, %err, "failed to assign scene identity");
            return None;
        }
        Some(IdentityToken::Token(token))
    }

    /// Identity of a view layer. Layers of linked scenes get the scene's
    /// composite key extended with the layer name.
    pub fn layer_identity(
        &self,
        host: &mut dyn Host,
        scene: SceneId,
        layer: LayerId,
    ) -> Option<IdentityToken> {
        let origin = host.scene_origin(scene)?;
        if let vantage_host::ContainerOrigin::Linked { path } = origin {
            let scene_name = host.scene_name(scene)?;
            let layer_name = host.layer_name(layer)?;
            return Some(IdentityToken::Library {
                path,
                name: format!("{scene_name}::{layer_name}"),
            });
        }
        if let Some(existing) = host.layer_attr(layer, IDENTITY_ATTR) {
            return Some(IdentityToken::Token(existing));
        }
        let token = Uuid::new_v4().to_string();
        if let Err(err) = host.set_layer_attr(layer, IDENTITY_ATTR, &token) {
            warn!(?layer, %err, "failed to assign layer identity");
            return None;
        }
        Some(IdentityToken::Token(token))
    }

    /// Find the scene matching a stored identity string, falling back to
    /// a human-readable name match. The caller supplies its own default
    /// (typically the current scene) on a full miss.
    #[must_use]
    pub fn resolve_scene(
        &self,
        host: &dyn Host,
        identity: &str,
        fallback_name: Option<&str>,
    ) -> Option<SceneId> {
        for scene in host.scenes() {
            if let Some(current) = Self::read_scene_identity(host, scene)
                && current == identity
            {
                return Some(scene);
            }
        }
        let name = fallback_name?;
        host.scenes()
            .into_iter()
            .find(|scene| host.scene_name(*scene).as_deref() == Some(name))
    }

    /// Find the view layer within `scene` matching a stored identity
    /// string, with the same name fallback as [`Self::resolve_scene`].
    #[must_use]
    pub fn resolve_layer(
        &self,
        host: &dyn Host,
        scene: SceneId,
        identity: &str,
        fallback_name: Option<&str>,
    ) -> Option<LayerId> {
        for layer in host.layers(scene) {
            if let Some(current) = Self::read_layer_identity(host, scene, layer)
                && current == identity
            {
                return Some(layer);
            }
        }
        let name = fallback_name?;
        host.layers(scene)
            .into_iter()
            .find(|layer| host.layer_name(*layer).as_deref() == Some(name))
    }

    /// Re-key all but the first writable scene sharing a token. Returns
    /// the number of scenes re-keyed. Idempotent once tokens are unique.
    pub fn repair_duplicate_scene_tokens(&self, host: &mut dyn Host) -> usize {
        let mut seen: HashMap<String, SceneId> = HashMap::new();
        let mut repaired = 0;
        for scene in host.scenes() {
            let writable = host
                .scene_origin(scene)
                .is_some_and(|origin| origin.is_writable());
            if !writable {
                continue;
            }
            let Some(token) = host.scene_attr(scene, IDENTITY_ATTR) else {
                continue;
            };
            if let Some(first) = seen.get(&token) {
                let fresh = Uuid::new_v4().to_string();
                debug!(?scene, kept = ?first, "re-keying duplicated scene token");
                if host.set_scene_attr(scene, IDENTITY_ATTR, &fresh).is_ok() {
                    repaired += 1;
                }
            } else {
                seen.insert(token, scene);
            }
        }
        repaired
    }

    /// Re-key duplicated layer tokens within one owning scene. Duplicates
    /// are only possible among siblings, so the scan is scoped to the
    /// owner.
    pub fn repair_duplicate_layer_tokens(&self, host: &mut dyn Host, scene: SceneId) -> usize {
        let writable = host
            .scene_origin(scene)
            .is_some_and(|origin| origin.is_writable());
        if !writable {
            return 0;
        }
        let mut seen: HashMap<String, LayerId> = HashMap::new();
        let mut repaired = 0;
        for layer in host.layers(scene) {
            let Some(token) = host.layer_attr(layer, IDENTITY_ATTR) else {
                continue;
            };
            if seen.contains_key(&token) {
                let fresh = Uuid::new_v4().to_string();
                debug!(?layer, ?scene, "re-keying duplicated layer token");
                if host.set_layer_attr(layer, IDENTITY_ATTR, &fresh).is_ok() {
                    repaired += 1;
                }
            } else {
                seen.insert(token, layer);
            }
        }
        repaired
    }

    /// Repair duplicates first, then ensure every writable scene and
    /// layer carries a token. Run after document load and when container
    /// counts change.
    pub fn initialize_all(&self, host: &mut dyn Host) {
        self.repair_duplicate_scene_tokens(host);
        for scene in host.scenes() {
            let _ = self.scene_identity(host, scene);
            self.repair_duplicate_layer_tokens(host, scene);
            for layer in host.layers(scene) {
                let _ = self.layer_identity(host, scene, layer);
            }
        }
    }

    fn read_scene_identity(host: &dyn Host, scene: SceneId) -> Option<String> {
        match host.scene_origin(scene)? {
            vantage_host::ContainerOrigin::Linked { path } => {
                let name = host.scene_name(scene)?;
                Some(format!("lib::{path}::{name}"))
            }
            vantage_host::ContainerOrigin::Editable => host.scene_attr(scene, IDENTITY_ATTR),
        }
    }

    fn read_layer_identity(host: &dyn Host, scene: SceneId, layer: LayerId) -> Option<String> {
        match host.scene_origin(scene)? {
            vantage_host::ContainerOrigin::Linked { path } => {
                let scene_name = host.scene_name(scene)?;
                let layer_name = host.layer_name(layer)?;
                Some(format!("lib::{path}::{scene_name}::{layer_name}"))
            }
            vantage_host::ContainerOrigin::Editable => host.layer_attr(layer, IDENTITY_ATTR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_host::{ContainerOrigin, MockHost};

    #[test]
    fn token_created_once_and_stable() {
        let mut host = MockHost::new();
        let scene = host.current_scene();
        let resolver = IdentityResolver::new();

        let first = resolver.scene_identity(&mut host, scene).unwrap();
        let second = resolver.scene_identity(&mut host, scene).unwrap();
        assert_eq!(first, second);

        host.rename_scene(scene, "Renamed");
        let third = resolver.scene_identity(&mut host, scene).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn linked_scene_uses_composite_key() {
        let mut host = MockHost::new();
        let linked = host.add_scene(
            "Props",
            ContainerOrigin::Linked {
                path: "/lib/props.blend".to_owned(),
            },
        );
        let resolver = IdentityResolver::new();
        let identity = resolver.scene_identity(&mut host, linked).unwrap();
        assert_eq!(identity.to_string(), "lib::/lib/props.blend::Props");

        let resolved = resolver.resolve_scene(&host, "lib::/lib/props.blend::Props", None);
        assert_eq!(resolved, Some(linked));
    }

    #[test]
    fn duplicate_repair_rekeys_all_but_first() {
        let mut host = MockHost::new();
        let a = host.current_scene();
        let b = host.add_scene("Scene.001", ContainerOrigin::Editable);
        let resolver = IdentityResolver::new();

        let original = resolver.scene_identity(&mut host, a).unwrap();
        // Duplication copies the attribute block wholesale.
        host.copy_scene_attrs(a, b);

        assert_eq!(resolver.repair_duplicate_scene_tokens(&mut host), 1);
        let kept = host.scene_attr(a, IDENTITY_ATTR).unwrap();
        let rekeyed = host.scene_attr(b, IDENTITY_ATTR).unwrap();
        assert_eq!(IdentityToken::Token(kept.clone()), original);
        assert_ne!(kept, rekeyed);

        // Idempotent on a second run.
        assert_eq!(resolver.repair_duplicate_scene_tokens(&mut host), 0);
    }

    #[test]
    fn layer_repair_is_scoped_to_owner() {
        let mut host = MockHost::new();
        let scene = host.current_scene();
        let other = host.add_scene("Other", ContainerOrigin::Editable);
        let la = host.layers(scene)[0];
        let lb = host.add_layer(scene, "ViewLayer.001");
        let lc = host.add_layer(other, "ViewLayer");
        let resolver = IdentityResolver::new();

        resolver.layer_identity(&mut host, scene, la).unwrap();
        host.copy_layer_attrs(la, lb);
        // Same token in a different scene is not a duplicate.
        host.copy_layer_attrs(la, lc);

        assert_eq!(resolver.repair_duplicate_layer_tokens(&mut host, scene), 1);
        assert_eq!(resolver.repair_duplicate_layer_tokens(&mut host, other), 0);
        assert_eq!(
            host.layer_attr(la, IDENTITY_ATTR),
            host.layer_attr(lc, IDENTITY_ATTR)
        );
    }

    #[test]
    fn resolution_falls_back_to_name() {
        let mut host = MockHost::new();
        let scene = host.current_scene();
        let resolver = IdentityResolver::new();
        resolver.scene_identity(&mut host, scene).unwrap();

        let miss = resolver.resolve_scene(&host, "not-a-token", Some("Scene"));
        assert_eq!(miss, Some(scene));

        let full_miss = resolver.resolve_scene(&host, "not-a-token", Some("Nope"));
        assert_eq!(full_miss, None);
    }

    #[test]
    fn initialize_all_ensures_tokens() {
        let mut host = MockHost::new();
        let extra = host.add_scene("B", ContainerOrigin::Editable);
        host.add_layer(extra, "L1");
        let resolver = IdentityResolver::new();

        resolver.initialize_all(&mut host);
        for scene in host.scenes() {
            assert!(host.scene_attr(scene, IDENTITY_ATTR).is_some());
            for layer in host.layers(scene) {
                assert!(host.layer_attr(layer, IDENTITY_ATTR).is_some());
            }
        }
    }
}
