//! WhatsApp notifier collaborator.
//!
//! Message text comes from `barbearia_core::notify`; a notifier only
//! delivers it. No real WhatsApp client is wired in: with WhatsApp enabled
//! messages are logged, otherwise every send fails.

use barbearia_core::notify::OutboundMessage;
use tracing::{info, warn};

/// Delivers an outbound message. Returns whether it went out.
pub trait Notifier: Send + Sync {
    fn send(&self, message: &OutboundMessage) -> bool;
}

/// Logs each message and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &OutboundMessage) -> bool {
        info!(
            kind = ?message.kind,
            appointment_id = %message.appointment_id,
            to = %message.to,
            body = %message.body,
            "WhatsApp message sent"
        );
        true
    }
}

/// Refuses every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn send(&self, message: &OutboundMessage) -> bool {
        warn!(appointment_id = %message.appointment_id, "WhatsApp disabled, message dropped");
        false
    }
}
