use chrono::NaiveDate;
use std::sync::Arc;
use tallybot_core::{
    AppConfig, ChatId, EntryError, FixedClock, MemoryStore, MemoryTransport, MessageHandler,
    Outcome, RawMessage, ReplyKind, UserId,
};

const USER: UserId = UserId(1001);
const CHAT: ChatId = ChatId(-42);

struct Fixture {
    store: Arc<MemoryStore>,
    transport: Arc<MemoryTransport>,
    handler: MessageHandler,
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    for sheet in ["Nau A", "Nau B"] {
        store.put(sheet, "B", 7, "17/10/26");
        store.put(sheet, "B", 8, "18/10/26");
        store.put(sheet, "B", 9, "19/10/26");
    }
    let transport = Arc::new(MemoryTransport::new());
    let config = AppConfig::new(&["A", "B"], &[USER.0]);
    let handler = MessageHandler::new(
        &config,
        store.clone(),
        transport.clone(),
        Arc::new(FixedClock(today())),
    )
    .unwrap();
    Fixture {
        store,
        transport,
        handler,
    }
}

fn send(fixture: &Fixture, text: &str) -> Outcome {
    fixture.handler.handle(&RawMessage::text(USER, CHAT, text))
}

fn reply_kind(outcome: &Outcome) -> &ReplyKind {
    &outcome.reply().expect("a reply should be sent").kind
}

#[test]
fn empty_cell_entry_reports_zero_to_quantity() {
    let fixture = fixture();
    let outcome = send(&fixture, "b12");

    match reply_kind(&outcome) {
        ReplyKind::Recorded(receipt) => {
            assert_eq!(receipt.old_value, 0);
            assert_eq!(receipt.new_value, 12);
            assert_eq!(receipt.cell.to_string(), "'Nau B'!E8");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    let sent = fixture.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, CHAT);
    assert!(sent[0].1.contains("l'antic valor era 0 i el nou valor és 12"));
    assert_eq!(fixture.store.get("Nau B", "E", 8).as_deref(), Some("12"));
}

#[test]
fn flagged_entry_writes_flag_column_only() {
    let fixture = fixture();
    send(&fixture, "12b sac");

    assert_eq!(fixture.store.get("Nau B", "D", 8).as_deref(), Some("12"));
    assert_eq!(fixture.store.get("Nau B", "E", 8), None);
}

#[test]
fn unknown_unit_never_touches_the_store() {
    let fixture = fixture();
    let outcome = send(&fixture, "z3");

    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::UnknownUnit { .. })
    ));
    assert_eq!(fixture.store.read_count(), 0);
    assert_eq!(fixture.store.write_count(), 0);
    assert_eq!(
        fixture.transport.sent()[0].1,
        "La nau Z no està dins del rang de naus vàlides (A, B)."
    );
}

#[test]
fn symbols_stop_at_classification() {
    let fixture = fixture();
    let outcome = send(&fixture, "##");

    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::InvalidCharacters)
    ));
    assert_eq!(fixture.store.read_count(), 0);
}

#[test]
fn zero_quantity_is_rejected() {
    let fixture = fixture();
    let outcome = send(&fixture, "a0");
    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::InvalidQuantity)
    ));
    assert_eq!(fixture.store.read_count(), 0);
}

#[test]
fn non_numeric_cell_is_reported_and_not_overwritten() {
    let fixture = fixture();
    fixture.store.put("Nau A", "E", 8, "n/a");

    let outcome = send(&fixture, "a4");
    match reply_kind(&outcome) {
        ReplyKind::Failed(EntryError::NonNumericCell { cell, raw }) => {
            assert_eq!(cell.to_string(), "'Nau A'!E8");
            assert_eq!(raw, "n/a");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(fixture.store.write_count(), 0);
    assert_eq!(fixture.store.get("Nau A", "E", 8).as_deref(), Some("n/a"));
    assert!(!fixture.transport.sent()[0].1.contains("era 0"));
}

#[test]
fn wrong_shape_gets_one_format_reply() {
    let fixture = fixture();
    let outcome = send(&fixture, "ab 3");
    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::WrongShape)
    ));
    assert_eq!(fixture.transport.sent().len(), 1);
}

#[test]
fn case_and_spacing_variants_hit_the_same_cell() {
    let fixture = fixture();
    for text in ["a5", "A5", "A 5"] {
        send(&fixture, text);
    }
    assert_eq!(fixture.store.get("Nau A", "E", 8).as_deref(), Some("15"));
}

#[test]
fn missing_date_is_repeatable_and_non_fatal() {
    let fixture = fixture();
    let store = Arc::new(MemoryStore::new());
    store.put("Nau A", "B", 7, "01/01/26");
    let config = AppConfig::new(&["A"], &[USER.0]);
    let handler = MessageHandler::new(
        &config,
        store.clone(),
        fixture.transport.clone(),
        Arc::new(FixedClock(today())),
    )
    .unwrap();

    for _ in 0..2 {
        let outcome = handler.handle(&RawMessage::text(USER, CHAT, "a1"));
        match reply_kind(&outcome) {
            ReplyKind::Failed(EntryError::DateNotFound { date }) => assert_eq!(date, "18/10/26"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }
    assert_eq!(store.write_count(), 0);
    assert_eq!(
        fixture.transport.sent()[0].1,
        "La data actual '18/10/26' no s'ha trobat dins de la fulla de càlcul."
    );
}

#[test]
fn store_outage_is_reported_once_without_retry() {
    let fixture = fixture();
    fixture.store.set_unavailable(true);
    let outcome = send(&fixture, "a2");
    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::StoreUnavailable(_))
    ));
    assert_eq!(fixture.transport.sent().len(), 1);
}

#[test]
fn unauthorized_sender_gets_no_reply() {
    let fixture = fixture();
    let outcome = fixture
        .handler
        .handle(&RawMessage::text(UserId(7), CHAT, "a5"));
    assert!(matches!(outcome, Outcome::Ignored));
    assert!(fixture.transport.sent().is_empty());
    assert_eq!(fixture.store.read_count(), 0);
}

#[test]
fn non_text_update_gets_text_only_notice() {
    let fixture = fixture();
    let outcome = fixture.handler.handle(&RawMessage::non_text(USER, CHAT));
    assert!(matches!(reply_kind(&outcome), ReplyKind::NonText));
    assert_eq!(
        fixture.transport.sent()[0].1,
        "Només s'admeten missatges de text."
    );
}

#[test]
fn report_commands_summarize_tallies() {
    let fixture = fixture();
    send(&fixture, "a3");
    send(&fixture, "2a sac");
    fixture.store.put("Nau A", "E", 7, "10");

    let daily = send(&fixture, "/mostrar_baixes_avui");
    assert!(matches!(reply_kind(&daily), ReplyKind::DailyReport));
    let totals = send(&fixture, "/mostrar_baixes_totals");
    assert!(matches!(reply_kind(&totals), ReplyKind::TotalsReport));

    let sent = fixture.transport.sent();
    assert_eq!(
        sent[2].1,
        "Baixes d'avui (18/10/26):\nNau A: 3 baixes, 2 sacrificades\nNau B: 0 baixes, 0 sacrificades"
    );
    assert_eq!(
        sent[3].1,
        "Baixes totals:\nNau A: 13 baixes, 2 sacrificades\nNau B: 0 baixes, 0 sacrificades"
    );
}

#[test]
fn report_command_must_be_the_whole_message() {
    let fixture = fixture();
    let outcome = send(&fixture, "/mostrar_baixes_avui A");
    assert!(matches!(
        reply_kind(&outcome),
        ReplyKind::Failed(EntryError::InvalidCharacters)
    ));

    let suffixed = send(&fixture, " /mostrar_baixes_totals@tally_bot ");
    assert!(matches!(reply_kind(&suffixed), ReplyKind::TotalsReport));
}
