//! Navigation gate: which screens are reachable for a session status.
//!
//! The active [`ScreenGroup`] is a pure function of [`SessionStatus`]. The
//! gate also keeps the navigation stack of the active group; changing group
//! remounts it from the group's root screen, so nothing pushed while
//! authenticated survives a log-out and back-navigation cannot re-enter a
//! protected screen.

use cafe_catalog_core::SessionStatus;
use thiserror::Error;
use tracing::debug;

use crate::session::SessionWatcher;

/// Errors raised by stack operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The screen does not belong to the active group.
    #[error("screen {screen:?} is not reachable from {group:?}")]
    Unreachable {
        /// Requested screen.
        screen: Screen,
        /// Active group.
        group: ScreenGroup,
    },
}

/// A screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Shown while the persisted token is being checked.
    Loading,
    /// Sign-in form.
    Login,
    /// Sign-up form.
    Register,
    /// Product list.
    Products,
    /// Single product editor.
    Product,
    /// Authenticated landing screen.
    Protected,
}

impl Screen {
    /// Group the screen belongs to.
    #[must_use]
    pub const fn group(self) -> ScreenGroup {
        match self {
            Self::Loading => ScreenGroup::Loading,
            Self::Login | Self::Register => ScreenGroup::Unauthenticated,
            Self::Products | Self::Product | Self::Protected => ScreenGroup::Authenticated,
        }
    }
}

/// Set of screens mounted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenGroup {
    /// Loading view only.
    Loading,
    /// Login and registration.
    Unauthenticated,
    /// Product management and protected screens.
    Authenticated,
}

impl ScreenGroup {
    /// Group mounted for `status`.
    #[must_use]
    pub const fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Checking => Self::Loading,
            SessionStatus::NotAuthenticated => Self::Unauthenticated,
            SessionStatus::Authenticated => Self::Authenticated,
        }
    }

    /// Screens in the group, root first.
    #[must_use]
    pub const fn screens(self) -> &'static [Screen] {
        match self {
            Self::Loading => &[Screen::Loading],
            Self::Unauthenticated => &[Screen::Login, Screen::Register],
            Self::Authenticated => &[Screen::Products, Screen::Product, Screen::Protected],
        }
    }

    /// Screen shown when the group is mounted.
    #[must_use]
    pub const fn root(self) -> Screen {
        match self {
            Self::Loading => Screen::Loading,
            Self::Unauthenticated => Screen::Login,
            Self::Authenticated => Screen::Products,
        }
    }
}

/// Navigation state for the active screen group.
#[derive(Debug, Clone)]
pub struct NavigationGate {
    group: ScreenGroup,
    stack: Vec<Screen>,
}

impl Default for NavigationGate {
    fn default() -> Self {
        Self::new(SessionStatus::Checking)
    }
}

impl NavigationGate {
    /// Gate mounted for `status`.
    #[must_use]
    pub fn new(status: SessionStatus) -> Self {
        let group = ScreenGroup::for_status(status);
        Self {
            group,
            stack: vec![group.root()],
        }
    }

    /// Active group.
    #[must_use]
    pub const fn group(&self) -> ScreenGroup {
        self.group
    }

    /// Screen on top of the stack.
    #[must_use]
    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or_else(|| self.group.root())
    }

    /// Stack contents, root first.
    #[must_use]
    pub fn stack(&self) -> &[Screen] {
        &self.stack
    }

    /// Follow a status change. Returns `true` when the group was remounted.
    pub fn sync(&mut self, status: SessionStatus) -> bool {
        let group = ScreenGroup::for_status(status);
        if group == self.group {
            return false;
        }

        debug!(from = ?self.group, to = ?group, "Remounting screen group");
        self.group = group;
        self.stack.clear();
        self.stack.push(group.root());
        true
    }

    /// Navigate to `screen`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Unreachable`] if the screen is outside the
    /// active group.
    pub fn push(&mut self, screen: Screen) -> Result<(), NavigationError> {
        if screen.group() != self.group {
            return Err(NavigationError::Unreachable {
                screen,
                group: self.group,
            });
        }
        self.stack.push(screen);
        Ok(())
    }

    /// Go back. The root screen is never popped.
    pub fn pop(&mut self) -> Option<Screen> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop()
    }

    /// Wait for the next session update and sync to it.
    ///
    /// Returns `None` once the session store has been dropped, otherwise
    /// whether the group was remounted.
    pub async fn follow(&mut self, watcher: &mut SessionWatcher) -> Option<bool> {
        watcher.changed().await.ok()?;
        let status = watcher.borrow_and_update().status;
        Some(self.sync(status))
    }
}
