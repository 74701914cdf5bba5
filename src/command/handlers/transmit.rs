//! Socket switching handlers

use crate::command::App;
use crate::error::Result;
use tracing::debug;

/// Switch sockets on; an empty list switches every socket
pub async fn transmit_on(app: &mut App, sockets: &[u32]) -> Result<()> {
    debug!("On: {}", describe(sockets));
    app.radio().on(sockets).await
}

/// Switch sockets off; an empty list switches every socket
pub async fn transmit_off(app: &mut App, sockets: &[u32]) -> Result<()> {
    debug!("Off: {}", describe(sockets));
    app.radio().off(sockets).await
}

fn describe(sockets: &[u32]) -> String {
    if sockets.is_empty() {
        "all sockets".into()
    } else {
        format!("sockets {:?}", sockets)
    }
}
