//! Route guard.
//!
//! [`guard`] is the pure decision. [`RouteGuard`] is a tiny router that keeps
//! the current route and re-evaluates it whenever the session changes.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use strum::{EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::session::{SessionEvent, SessionManager, SubscriptionId};

/// The client's views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Route {
    /// Credential form.
    Login,
    /// Task list. Requires a session.
    Dashboard,
}

impl Route {
    /// Path the route is mounted at.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }

    /// Resolve a path. Anything unknown lands on the login view.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        Self::iter()
            .find(|route| route.path() == trimmed)
            .unwrap_or(Self::Login)
    }

    /// `true` when the route needs an authenticated session.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of asking for a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Show the requested view.
    Render(Route),
    /// Go somewhere else instead.
    Redirect(Route),
}

impl RouteDecision {
    /// The route that ends up on screen.
    #[must_use]
    pub fn target(self) -> Route {
        match self {
            Self::Render(route) | Self::Redirect(route) => route,
        }
    }
}

/// Decide what to show for `route` given the authentication status.
#[must_use]
pub fn guard(route: Route, is_authenticated: bool) -> RouteDecision {
    match route {
        route if route.is_protected() && !is_authenticated => {
            RouteDecision::Redirect(Route::Login)
        }
        Route::Login if is_authenticated => RouteDecision::Redirect(Route::Dashboard),
        route => RouteDecision::Render(route),
    }
}

#[derive(Debug)]
struct GuardState {
    route: Route,
    is_authenticated: bool,
}

impl GuardState {
    fn settle(&mut self, requested: Route) -> RouteDecision {
        let decision = guard(requested, self.is_authenticated);
        self.route = decision.target();
        decision
    }
}

/// Router that follows the session.
///
/// Subscribes on [`attach`](Self::attach) and unsubscribes on drop. The
/// listener only holds the guard's own state, never the manager.
pub struct RouteGuard {
    session: Arc<SessionManager>,
    state: Arc<RwLock<GuardState>>,
    subscription: SubscriptionId,
}

impl fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGuard")
            .field("current", &self.current())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl RouteGuard {
    /// Start at `initial` (after guarding it) and follow `session` from now on.
    pub fn attach(session: Arc<SessionManager>, initial: Route) -> Self {
        let mut state = GuardState {
            route: Route::Login,
            is_authenticated: session.is_authenticated(),
        };
        state.settle(initial);
        let state = Arc::new(RwLock::new(state));

        let listener_state = Arc::clone(&state);
        let subscription = session.subscribe(move |event| {
            let mut state = listener_state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match event {
                SessionEvent::Changed(snapshot) => {
                    state.is_authenticated = snapshot.is_authenticated;
                    let current = state.route;
                    state.settle(current);
                }
                SessionEvent::Navigate(route) => {
                    state.settle(*route);
                }
            }
            debug!(route = state.route.path(), "route settled");
        });

        Self {
            session,
            state,
            subscription,
        }
    }

    /// The route currently on screen.
    #[must_use]
    pub fn current(&self) -> Route {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .route
    }

    /// User-initiated navigation.
    pub fn navigate(&self, route: Route) -> RouteDecision {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .settle(route)
    }
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        self.session.unsubscribe(self.subscription);
    }
}
