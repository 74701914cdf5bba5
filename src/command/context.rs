//! Cancellable context for long-running commands

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owns at most one live context
///
/// Contexts are children of a parent token, so cancelling the parent (for
/// example on CTRL+C) also ends the current one.
#[derive(Debug, Default)]
pub struct ContextManager {
    parent: CancellationToken,
    current: Option<CancellationToken>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager whose contexts end when `parent` is cancelled
    pub fn with_parent(parent: CancellationToken) -> Self {
        Self {
            parent,
            current: None,
        }
    }

    /// Cancel the current context, if any, and start a new one
    pub fn new_context(&mut self) -> CancellationToken {
        self.cancel();
        let ctx = self.parent.child_token();
        self.current = Some(ctx.clone());
        ctx
    }

    /// Cancel the current context; does nothing if there is none
    pub fn cancel(&mut self) {
        if let Some(ctx) = self.current.take() {
            debug!("Cancelling command context");
            ctx.cancel();
        }
    }

    /// True while a context is held and not cancelled
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|ctx| !ctx.is_cancelled())
    }
}
