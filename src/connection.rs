//! BLE connection lifecycle.
//!
//! The radio stack owns the real connection; this controller only watches
//! it and decides which branch of the runtime loop runs. Mouse reports are
//! never sent from here.

use crate::error::Error;

/// Where the link is, as seen from the runtime loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Advertising,
    Connected,
}

/// Transitions reported by [`ConnectionController::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionEvent {
    AdvertisingStarted,
    Connected { connections: usize },
    Lost,
}

/// BLE radio/session collaborator.
pub trait BleSession {
    fn start_advertising(&mut self) -> Result<(), Error>;
    fn stop_advertising(&mut self) -> Result<(), Error>;
    fn is_connected(&self) -> bool;
    fn connection_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct ConnectionController {
    state: ConnectionState,
}

impl ConnectionController {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Observe the session and perform at most one transition.
    ///
    /// Disconnected starts advertising; a peer connecting stops it; a lost
    /// link drops back to Disconnected so the next call re-advertises.
    pub fn update<S: BleSession>(&mut self, session: &mut S) -> Result<Option<ConnectionEvent>, Error> {
        let connected = session.is_connected();
        let event = match (self.state, connected) {
            (ConnectionState::Disconnected, false) => {
                session.start_advertising()?;
                self.state = ConnectionState::Advertising;
                Some(ConnectionEvent::AdvertisingStarted)
            }
            (ConnectionState::Disconnected | ConnectionState::Advertising, true) => {
                session.stop_advertising()?;
                self.state = ConnectionState::Connected;
                Some(ConnectionEvent::Connected {
                    connections: session.connection_count(),
                })
            }
            (ConnectionState::Connected, false) => {
                self.state = ConnectionState::Disconnected;
                Some(ConnectionEvent::Lost)
            }
            (ConnectionState::Advertising, false) | (ConnectionState::Connected, true) => None,
        };
        Ok(event)
    }
}
