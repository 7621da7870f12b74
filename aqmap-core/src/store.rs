//! Dashboard state store with reducer and middleware hooks

use crate::action::Action;
use crate::effect::DispatchResult;
use crate::state::DashboardState;

/// A reducer handles one action and reports changes plus effects
pub type Reducer = fn(&mut DashboardState, Action) -> DispatchResult;

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging or other cross-cutting concerns
/// around every dispatch.
pub trait Middleware {
    /// Called before the action is dispatched to the reducer
    fn before(&mut self, action: &Action);

    /// Called after the action is processed by the reducer
    fn after(&mut self, action: &Action, state_changed: bool);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl Middleware for NoopMiddleware {
    fn before(&mut self, _action: &Action) {}
    fn after(&mut self, _action: &Action, _state_changed: bool) {}
}

/// Owns the dashboard state; the only place it is mutated.
pub struct Store<M: Middleware = NoopMiddleware> {
    state: DashboardState,
    reducer: Reducer,
    middleware: M,
}

impl<M: Middleware> Store<M> {
    pub fn new(state: DashboardState, reducer: Reducer, middleware: M) -> Self {
        Self {
            state,
            reducer,
            middleware,
        }
    }

    /// Dispatch an action through middleware and reducer
    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        self.middleware.before(&action);
        let result = (self.reducer)(&mut self.state, action.clone());
        tracing::trace!(
            action = %action.name(),
            changed = result.changed,
            effects = result.effects.len(),
            "action reduced"
        );
        self.middleware.after(&action, result.changed);
        result
    }

    /// Current state, read-only
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }
}
