//! Per-message entry point.
//!
//! # Responsibility
//! - Gate messages by sender allow-list and text-only content.
//! - Route report commands; run everything else through the
//!   normalize -> classify -> validate -> resolve -> apply -> format chain.
//! - Send exactly one reply per processed message.
//!
//! # Invariants
//! - Every `EntryError` stops the chain at the stage that raised it and is
//!   converted into a reply; nothing propagates past `handle`.
//! - No in-process state is shared between messages except immutable
//!   config and the transactor's cell locks.

use crate::auth::Authorizer;
use crate::clock::Clock;
use crate::config::{AppConfig, ConfigError};
use crate::error::{EntryError, EntryResult};
use crate::format::{
    format_daily, format_error, format_receipt, format_totals, INTERNAL_ERROR_MESSAGE,
    NON_TEXT_MESSAGE,
};
use crate::model::entry::IncrementReceipt;
use crate::model::message::{ChatId, RawMessage};
use crate::pipeline::{classify, normalize, UnitValidator};
use crate::service::report::ReportService;
use crate::service::resolver::DateRowResolver;
use crate::service::transactor::IncrementTransactor;
use crate::store::TabularStore;
use crate::transport::Transport;
use log::{error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Command replying with today's per-unit tallies.
pub const DAILY_REPORT_COMMAND: &str = "/mostrar_baixes_avui";
/// Command replying with per-unit totals over the whole date range.
pub const TOTALS_REPORT_COMMAND: &str = "/mostrar_baixes_totals";

#[derive(Debug)]
pub enum ReplyKind {
    NonText,
    DailyReport,
    TotalsReport,
    Recorded(IncrementReceipt),
    Failed(EntryError),
    /// Processing aborted unexpectedly; a generic notice was sent instead.
    InternalFailure,
}

#[derive(Debug)]
pub struct Reply {
    pub chat_id: ChatId,
    pub text: String,
    pub kind: ReplyKind,
    /// `false` when the transport refused the reply.
    pub delivered: bool,
}

#[derive(Debug)]
pub enum Outcome {
    /// Sender not on the allow-list; nothing was sent.
    Ignored,
    Replied(Reply),
}

impl Outcome {
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Ignored => None,
            Self::Replied(reply) => Some(reply),
        }
    }
}

pub struct MessageHandler {
    authorizer: Authorizer,
    validator: UnitValidator,
    resolver: DateRowResolver,
    transactor: IncrementTransactor,
    reports: ReportService,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl MessageHandler {
    /// Wires all stages from one immutable config.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn TabularStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let units = config.valid_units()?;
        Ok(Self {
            authorizer: Authorizer::new(config.authorized_users.iter().copied()),
            validator: UnitValidator::new(units.clone()),
            resolver: DateRowResolver::new(store.clone(), config.sheet.clone()),
            transactor: IncrementTransactor::new(
                store.clone(),
                config.sheet.clone(),
                config.serialize_increments,
            ),
            reports: ReportService::new(store, config.sheet.clone(), units),
            transport,
            clock,
        })
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    /// Processes one inbound message and sends at most one reply.
    pub fn handle(&self, message: &RawMessage) -> Outcome {
        let request_id = Uuid::new_v4();
        info!(
            "event=message_received module=handler request_id={request_id} user_id={} chat_id={}",
            message.sender_id.0, message.chat_id.0
        );

        if !self.authorizer.is_allowed(message.sender_id) {
            info!("event=message_ignored module=handler request_id={request_id} reason=unauthorized");
            return Outcome::Ignored;
        }

        let (text, kind) = match message.text.as_deref() {
            None => (NON_TEXT_MESSAGE.to_string(), ReplyKind::NonText),
            Some(text) => self.handle_text(request_id, text),
        };
        self.deliver(request_id, message, text, kind)
    }

    /// Sends the generic failure notice for a message whose processing was
    /// aborted. Unauthorized senders still get nothing.
    pub fn recover(&self, message: &RawMessage) -> Outcome {
        let request_id = Uuid::new_v4();
        if !self.authorizer.is_allowed(message.sender_id) {
            return Outcome::Ignored;
        }
        error!(
            "event=message_recovered module=handler request_id={request_id} chat_id={}",
            message.chat_id.0
        );
        self.deliver(
            request_id,
            message,
            INTERNAL_ERROR_MESSAGE.to_string(),
            ReplyKind::InternalFailure,
        )
    }

    fn deliver(
        &self,
        request_id: Uuid,
        message: &RawMessage,
        text: String,
        kind: ReplyKind,
    ) -> Outcome {
        let delivered = match self.transport.send(message.chat_id, &text) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=reply_send module=handler status=error request_id={request_id} chat_id={} error={err}",
                    message.chat_id.0
                );
                false
            }
        };

        Outcome::Replied(Reply {
            chat_id: message.chat_id,
            text,
            kind,
            delivered,
        })
    }

    fn handle_text(&self, request_id: Uuid, text: &str) -> (String, ReplyKind) {
        match command_name(text) {
            Some(DAILY_REPORT_COMMAND) => {
                info!("event=command module=handler request_id={request_id} command=daily_report");
                return match self.reports.daily(self.clock.today()) {
                    Ok(report) => (format_daily(&report), ReplyKind::DailyReport),
                    Err(err) => self.failure(request_id, err),
                };
            }
            Some(TOTALS_REPORT_COMMAND) => {
                info!("event=command module=handler request_id={request_id} command=totals_report");
                return match self.reports.totals() {
                    Ok(report) => (format_totals(&report), ReplyKind::TotalsReport),
                    Err(err) => self.failure(request_id, err),
                };
            }
            _ => {}
        }

        match self.record_entry(text) {
            Ok(receipt) => {
                info!(
                    "event=entry_recorded module=handler request_id={request_id} cell={} old={} new={}",
                    receipt.cell, receipt.old_value, receipt.new_value
                );
                (format_receipt(&receipt), ReplyKind::Recorded(receipt))
            }
            Err(err) => self.failure(request_id, err),
        }
    }

    /// Runs the six-stage chain for one free-text entry.
    pub fn record_entry(&self, text: &str) -> EntryResult<IncrementReceipt> {
        let normalized = normalize(text);
        let entry = classify(&normalized)?;
        let unit = self.validator.validate(entry.unit)?;
        let row = self.resolver.resolve(unit, self.clock.today())?;
        self.transactor
            .apply(unit, row, entry.quantity, entry.flag)
    }

    fn failure(&self, request_id: Uuid, err: EntryError) -> (String, ReplyKind) {
        match &err {
            EntryError::StoreUnavailable(source) => error!(
                "event=entry_failed module=handler request_id={request_id} error_code={} error={source}",
                err.code()
            ),
            _ => warn!(
                "event=entry_failed module=handler request_id={request_id} error_code={}",
                err.code()
            ),
        }
        (format_error(&err), ReplyKind::Failed(err))
    }
}

/// Returns the command name when the whole message is `/cmd` or
/// `/cmd@botname`. Trailing words make it an ordinary entry.
fn command_name(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') || trimmed.contains(char::is_whitespace) {
        return None;
    }
    trimmed.split('@').next()
}
