//! Negotiation engine: signaling state machine and the session itself

pub mod engine;
mod pairing;
pub mod state;

pub use engine::{Finalization, JsepSession};
pub use state::{next_state, DescriptionSource, SdpType, SignalingState};
