use std::sync::atomic::{AtomicU8, Ordering};

/// Observable bridge state.
///
/// Moves forward only: `Disconnected -> Subscribed`, and to `Failed` once the
/// broker connection is lost. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BridgeState {
    Disconnected = 0,
    Subscribed = 1,
    Failed = 2,
}

impl BridgeState {
    pub fn as_str(self) -> &'static str {
        match self {
            BridgeState::Disconnected => "disconnected",
            BridgeState::Subscribed => "subscribed",
            BridgeState::Failed => "failed",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => BridgeState::Subscribed,
            2 => BridgeState::Failed,
            _ => BridgeState::Disconnected,
        }
    }
}

#[derive(Debug)]
pub struct BridgeStatus(AtomicU8);

impl Default for BridgeStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(BridgeState::Disconnected as u8))
    }

    pub fn get(&self) -> BridgeState {
        BridgeState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn is_subscribed(&self) -> bool {
        self.get() == BridgeState::Subscribed
    }

    /// Returns false if the bridge was not in `Disconnected`.
    pub fn mark_subscribed(&self) -> bool {
        self.0
            .compare_exchange(
                BridgeState::Disconnected as u8,
                BridgeState::Subscribed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn mark_failed(&self) {
        self.0.store(BridgeState::Failed as u8, Ordering::Release);
    }
}
