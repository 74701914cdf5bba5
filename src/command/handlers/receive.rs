//! Receive-mode handlers

use crate::command::App;
use crate::error::Result;
use mihome_shared::ReceiveMode;
use tracing::info;

/// Listen in `mode` until the context is cancelled
///
/// Starting a receive cancels any receive still running on this app.
pub async fn receive(app: &mut App, mode: ReceiveMode) -> Result<()> {
    let ctx = app.new_context();
    info!("Receiving in {} mode, CTRL+C to stop", mode);
    app.radio().receive(ctx, mode).await
}
