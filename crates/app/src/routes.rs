use services::SessionStore;

/// The three addressable locations of the app, 1:1 with views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Game,
    Result,
}

/// Minimal navigation state: which view is active.
///
/// Navigating never resets session state; session lifecycle is driven
/// explicitly by store actions. The game location has an entry hook, the
/// other two are always reachable.
#[derive(Debug)]
pub struct Router {
    current: Route,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Route::Home,
        }
    }

    #[must_use]
    pub fn current(&self) -> Route {
        self.current
    }

    /// Switches the active view, consulting the game entry hook.
    ///
    /// A refused entry falls back to `Home`.
    pub fn navigate(&mut self, to: Route, store: &SessionStore) {
        if to == Route::Game && !allow_game_entry(store) {
            self.current = Route::Home;
            return;
        }
        self.current = to;
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry hook for the game view.
///
/// Deliberately permissive: the store's own state drives every validity
/// check once the view is active.
// TODO: refuse entry and fall back to Home when no questions are loaded
// (pending a product decision on direct links into a running game).
fn allow_game_entry(_store: &SessionStore) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use services::Clock;
    use std::sync::Arc;

    fn empty_store() -> SessionStore {
        SessionStore::new(Arc::new(InMemoryBackend::new()), Clock::default())
    }

    #[test]
    fn router_starts_at_home() {
        assert_eq!(Router::new().current(), Route::Home);
    }

    #[test]
    fn game_entry_is_currently_permitted_even_without_questions() {
        let store = empty_store();
        let mut router = Router::new();

        router.navigate(Route::Game, &store);
        assert_eq!(router.current(), Route::Game);

        router.navigate(Route::Result, &store);
        assert_eq!(router.current(), Route::Result);

        router.navigate(Route::Home, &store);
        assert_eq!(router.current(), Route::Home);
    }
}
