//! Navigation hook invoked after a successful sign-in.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Route the application moves to after signing in
pub const DEFAULT_POST_LOGIN_ROUTE: &str = "/dashboard";

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that records every route it is sent to.
#[derive(Debug, Default)]
pub struct RouteHistory {
    routes: Mutex<Vec<String>>,
}

impl RouteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: &str) {
        debug!(route, "Navigating");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_history_records_in_order() {
        let history = RouteHistory::new();
        assert_eq!(history.current(), None);

        history.navigate("/dashboard");
        history.navigate("/metrics");
        assert_eq!(history.current().as_deref(), Some("/metrics"));
        assert_eq!(history.routes(), vec!["/dashboard", "/metrics"]);
    }
}
