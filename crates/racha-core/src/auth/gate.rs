//! Routing decisions driven by the session.

use tokio::sync::watch;

use super::session::SessionSnapshot;
use crate::models::Group;

/// Top-level area the app should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Session still loading; show nothing actionable
    Splash,
    /// Not authenticated; show login/registration
    SignIn,
    /// Authenticated area
    Groups,
}

pub fn route_for(snapshot: &SessionSnapshot) -> Route {
    if snapshot.is_loading {
        Route::Splash
    } else if snapshot.is_authenticated() {
        Route::Groups
    } else {
        Route::SignIn
    }
}

/// Wait out the loading phase and return the first real route.
pub async fn wait_for_route(mut rx: watch::Receiver<SessionSnapshot>) -> Route {
    match rx.wait_for(|s| !s.is_loading).await {
        Ok(snapshot) => route_for(&snapshot),
        // Store dropped while loading
        Err(_) => Route::SignIn,
    }
}

/// Pick the group to open after login: the remembered one if it still
/// exists, otherwise the first.
pub fn landing_group<'a>(groups: &'a [Group], last_group: Option<&str>) -> Option<&'a Group> {
    last_group
        .and_then(|id| groups.iter().find(|g| g.id == id))
        .or_else(|| groups.first())
}
