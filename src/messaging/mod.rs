//! # Messaging Module
//!
//! Inbound message envelopes for the orchestrator: fresh onboarding triggers
//! from the ticketing automation and scheduled resume wake-ups. Both arrive
//! over at-least-once channels, so decoding stays tolerant and duplicate
//! handling lives downstream.

pub mod envelope;

pub use envelope::{
    parse_inbound, EnvelopeError, InboundEvent, ResumeEnvelope, TriggerEnvelope,
};
