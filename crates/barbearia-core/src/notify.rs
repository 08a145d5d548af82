//! # Outbound Messages
//!
//! Text for the WhatsApp confirmation and reminder hooks. Delivery is the
//! server's business; this module only decides who gets what text.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::appointment::Appointment;
use crate::time::format_hhmm;
use crate::validation::normalize_phone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Confirmation,
    Reminder,
}

/// A message ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub kind: MessageKind,
    pub appointment_id: String,
    /// Recipient phone, digits only.
    pub to: String,
    pub body: String,
}

/// Names the templates need besides the appointment itself.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub shop_name: &'a str,
    pub service_name: &'a str,
    pub professional_name: &'a str,
}

impl OutboundMessage {
    pub fn confirmation(appointment: &Appointment, ctx: MessageContext<'_>) -> Self {
        let body = format!(
            "Olá, {}! Seu agendamento na {} está confirmado.\n\
             Serviço: {}\n\
             Profissional: {}\n\
             Data: {} às {}\n\
             Valor: {}",
            appointment.client_name,
            ctx.shop_name,
            ctx.service_name,
            ctx.professional_name,
            appointment.date.format("%d/%m/%Y"),
            format_hhmm(appointment.time),
            appointment.total_value,
        );
        Self::build(MessageKind::Confirmation, appointment, body)
    }

    pub fn reminder(appointment: &Appointment, ctx: MessageContext<'_>) -> Self {
        let body = format!(
            "Olá, {}! Lembrete: {} com {} em {} às {}. Até logo na {}!",
            appointment.client_name,
            ctx.service_name,
            ctx.professional_name,
            appointment.date.format("%d/%m/%Y"),
            format_hhmm(appointment.time),
            ctx.shop_name,
        );
        Self::build(MessageKind::Reminder, appointment, body)
    }

    fn build(kind: MessageKind, appointment: &Appointment, body: String) -> Self {
        OutboundMessage {
            kind,
            appointment_id: appointment.id.clone(),
            to: normalize_phone(&appointment.client_phone),
            body,
        }
    }
}
