//! Radio maintenance handlers

use crate::command::App;
use crate::error::Result;

pub async fn reset_radio(app: &mut App) -> Result<()> {
    app.radio().reset_radio().await
}

/// Measure the radio temperature in degrees Celsius
pub async fn measure_temp(app: &mut App) -> Result<f32> {
    app.radio().measure_temperature().await
}
