// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::host::Host;
use crate::ids::ViewportId;

/// Picks the viewport an operation should target when the caller did not
/// name one explicitly.
pub trait ActiveViewportProvider {
    /// The viewport to target, or `None` when no 3D viewport is open.
    fn current(&self, host: &dyn Host) -> Option<ViewportId>;
}

/// Default provider with a deterministic priority order:
/// explicit binding, then the focused viewport, then the first open one.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackViewportProvider {
    explicit: Option<ViewportId>,
}

impl FallbackViewportProvider {
    /// A provider with no explicit binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the provider to one viewport. Cleared with `None`.
    pub fn set_explicit(&mut self, viewport: Option<ViewportId>) {
        self.explicit = viewport;
    }

    /// The current explicit binding, if any.
    #[must_use]
    pub fn explicit(&self) -> Option<ViewportId> {
        self.explicit
    }
}

impl ActiveViewportProvider for FallbackViewportProvider {
    fn current(&self, host: &dyn Host) -> Option<ViewportId> {
        if let Some(explicit) = self.explicit {
            // A stale explicit binding falls through to the next tier.
            if host.viewports().contains(&explicit) {
                return Some(explicit);
            }
        }
        if let Some(focused) = host.focused_viewport() {
            return Some(focused);
        }
        host.viewports().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHost;

    #[test]
    fn explicit_beats_focused() {
        let mut host = MockHost::new();
        let a = host.add_viewport();
        let b = host.add_viewport();
        host.set_focused_viewport(Some(a));

        let mut provider = FallbackViewportProvider::new();
        provider.set_explicit(Some(b));
        assert_eq!(provider.current(&host), Some(b));
    }

    #[test]
    fn stale_explicit_falls_back_to_focused() {
        let mut host = MockHost::new();
        let a = host.add_viewport();
        let b = host.add_viewport();
        host.set_focused_viewport(Some(a));
        host.remove_viewport(b);

        let mut provider = FallbackViewportProvider::new();
        provider.set_explicit(Some(b));
        assert_eq!(provider.current(&host), Some(a));
    }

    #[test]
    fn first_available_when_nothing_focused() {
        let mut host = MockHost::new();
        let a = host.add_viewport();
        let _b = host.add_viewport();

        let provider = FallbackViewportProvider::new();
        assert_eq!(provider.current(&host), Some(a));
    }

    #[test]
    fn none_when_no_viewports() {
        let host = MockHost::new();
        let provider = FallbackViewportProvider::new();
        assert_eq!(provider.current(&host), None);
    }
}
