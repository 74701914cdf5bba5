//! Simulated radio backing the gateway
//!
//! Keeps socket and pin state in memory and makes up sensor packets so
//! clients can be exercised without the radio board.

use mihome_shared::{PinMode, ReceiveMode, SensorEvent};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Number of remote-controlled sockets, numbered from 1
pub const SOCKET_COUNT: u32 = 4;

/// Highest BCM GPIO pin number
pub const MAX_PIN: u32 = 53;

#[derive(Debug)]
struct RadioState {
    sockets: [bool; SOCKET_COUNT as usize],
    pins: HashMap<u32, PinMode>,
    mode: ReceiveMode,
    resets: u32,
    packets: u64,
}

pub struct SimulatedRadio {
    state: RwLock<RadioState>,
}

impl SimulatedRadio {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RadioState {
                sockets: [false; SOCKET_COUNT as usize],
                pins: HashMap::new(),
                mode: ReceiveMode::Monitor,
                resets: 0,
                packets: 0,
            }),
        }
    }

    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.resets += 1;
        state.mode = ReceiveMode::Monitor;
    }

    /// Chip temperature; drifts a little with every reset
    pub async fn temperature(&self) -> f32 {
        let resets = self.state.read().await.resets;
        20.0 + (resets % 5) as f32 * 0.5
    }

    /// Switch sockets; an empty list switches all of them
    ///
    /// Nothing changes unless every socket number is valid.
    pub async fn switch(&self, sockets: &[u32], on: bool) -> Result<(), String> {
        if let Some(bad) = sockets.iter().find(|&&s| s == 0 || s > SOCKET_COUNT) {
            return Err(format!("socket {} out of range 1-{}", bad, SOCKET_COUNT));
        }

        let mut state = self.state.write().await;
        if sockets.is_empty() {
            state.sockets = [on; SOCKET_COUNT as usize];
        } else {
            for &socket in sockets {
                state.sockets[(socket - 1) as usize] = on;
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub async fn socket_states(&self) -> [bool; SOCKET_COUNT as usize] {
        self.state.read().await.sockets
    }

    pub async fn set_pin_mode(&self, pin: u32, mode: PinMode) -> Result<(), String> {
        if pin > MAX_PIN {
            return Err(format!("pin {} out of range 0-{}", pin, MAX_PIN));
        }
        self.state.write().await.pins.insert(pin, mode);
        Ok(())
    }

    #[cfg(test)]
    pub async fn pin_mode(&self, pin: u32) -> Option<PinMode> {
        self.state.read().await.pins.get(&pin).copied()
    }

    /// Switch to `mode` and return the mode now in effect
    ///
    /// `Unspecified` keeps the current mode.
    pub async fn start_receive(&self, mode: ReceiveMode) -> ReceiveMode {
        let mut state = self.state.write().await;
        if mode != ReceiveMode::Unspecified {
            state.mode = mode;
        }
        state.mode
    }

    /// Make up the next received packet
    pub async fn next_packet(&self, mode: ReceiveMode) -> SensorEvent {
        let mut state = self.state.write().await;
        state.packets += 1;
        let n = state.packets;

        let kind = match mode {
            ReceiveMode::Control => "socket",
            _ => "energy",
        };
        SensorEvent {
            mode: mode.into(),
            device: format!("{}-{:04}", kind, n % 3 + 1),
            payload: n.to_be_bytes().to_vec(),
            rssi: Some(-60 - (n % 20) as i32),
        }
    }
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}
