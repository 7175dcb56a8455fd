use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::timeout;
use zikomo::core::AgentConfig;
use zikomo::core::filter::{TranslateError, Translator};
use zikomo::core::transcript::Transcript;
use zikomo::query::QueryRequest;
use zikomo::slots::{Day, SlotBook};
use zikomo::{Session, SessionBuilder};
use zikomo_model::{ModelMessage, ToolCallRequest};
use zikomo_test_model::{PresetEvent, PresetResponse, TestModelProvider};

const GUARD: Duration = Duration::from_secs(5);

fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    })
}

fn booking_script() -> TestModelProvider {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_book",
        "book_appointment",
        json!({ "day": "monday", "time_slot": "14:00" }),
    )]));
    model_provider.add_response(PresetResponse::with_text("Done."));
    model_provider
}

fn successful_bookings(transcript: &Transcript) -> usize {
    transcript
        .tool_results()
        .filter(|result| result.name == "book_appointment")
        .filter(|result| result.is_success())
        .count()
}

#[tokio::test]
async fn test_monday_availability() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_1",
        "check_availability",
        json!({ "day": "Monday" }),
    )]));
    model_provider.add_response(PresetResponse::with_text(
        "On Monday you can come at 09:00, 10:00, 14:00, 15:00 or 16:00.",
    ));

    let session = SessionBuilder::with_model_provider(model_provider.clone())
        .build()
        .unwrap();
    let resp = timeout(
        GUARD,
        session.query(QueryRequest {
            message: "what times are available on Monday?".to_owned(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(resp.error, None);
    let roles: Vec<_> =
        resp.responses.iter().map(|item| item.role.as_str()).collect();
    assert_eq!(roles, ["user", "assistant", "tool", "assistant"]);
    assert_eq!(
        resp.responses[2].content,
        "Available time slots for Monday: 09:00, 10:00, 14:00, 15:00, 16:00"
    );
    assert!(resp.responses[3].content.contains("16:00"));

    // The oracle was offered every tool.
    let requests = model_provider.requests();
    let mut names: Vec<_> =
        requests[0].tools.iter().map(|tool| tool.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        ["book_appointment", "check_availability", "get_weather", "search"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_booking_turns() {
    let session = SessionBuilder::with_model_provider(booking_script())
        .build()
        .unwrap();

    let first = session.send_message("book an appointment for Monday at 14:00");
    let second =
        session.send_message("book an appointment for Monday at 14:00");
    let (first, second) =
        timeout(GUARD, async { tokio::join!(first.finish(), second.finish()) })
            .await
            .unwrap();
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(successful_bookings(&first) + successful_bookings(&second), 1);
    let failed = first
        .tool_results()
        .chain(second.tool_results())
        .find(|result| !result.is_success())
        .unwrap();
    assert!(failed.content().contains("not available"));
    assert!(!session.slot_book().is_open(Day::Monday, "14:00"));
    assert_eq!(session.slot_book().open_slots(Day::Monday).len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_in_one_step() {
    const N: usize = 6;

    let mut model_provider = TestModelProvider::default();
    let calls: Vec<_> = (0..N)
        .map(|idx| {
            tool_call(
                &format!("call_{idx}"),
                "book_appointment",
                json!({ "day": "friday", "time_slot": "16:00" }),
            )
        })
        .collect();
    model_provider.add_response(PresetResponse::with_events(calls));
    model_provider.add_response(PresetResponse::with_text("Booked once."));

    let slot_book = Arc::new(SlotBook::new([(Day::Friday, vec!["16:00"])]));
    let session = SessionBuilder::with_model_provider(model_provider)
        .with_slot_book(Arc::clone(&slot_book))
        .build()
        .unwrap();
    let transcript = timeout(GUARD, session.send_message("book").finish())
        .await
        .unwrap()
        .unwrap();

    let results: Vec<_> = transcript.tool_results().collect();
    assert_eq!(results.len(), N);
    assert_eq!(successful_bookings(&transcript), 1);
    let rejected = results
        .iter()
        .filter(|result| result.content().contains("not available"))
        .count();
    assert_eq!(rejected, N - 1);
    assert!(slot_book.open_slots(Day::Friday).is_empty());
}

#[tokio::test]
async fn test_invalid_day_is_reported_to_the_oracle() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([tool_call(
        "call_1",
        "book_appointment",
        json!({ "day": "saturday", "time_slot": "10:00" }),
    )]));
    model_provider.add_response(PresetResponse::with_text(
        "We are closed on weekends.",
    ));

    let session = SessionBuilder::with_model_provider(model_provider.clone())
        .build()
        .unwrap();
    let transcript = timeout(GUARD, session.send_message("Saturday?").finish())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(transcript.final_answer(), Some("We are closed on weekends."));
    let requests = model_provider.requests();
    match requests[1].messages.last() {
        Some(ModelMessage::Tool(result)) => {
            assert!(result.is_error);
            assert!(result.content.starts_with("Error: Invalid arguments"));
        }
        msg => panic!("unexpected message: {msg:?}"),
    }
}

struct Unreachable;

#[async_trait]
impl Translator for Unreachable {
    async fn translate(
        &self,
        _text: &str,
        _target_language: &str,
    ) -> Result<String, TranslateError> {
        Err(TranslateError::new("connection refused"))
    }
}

#[tokio::test]
async fn test_translation_failure_falls_back() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_text("Ndili bwino"));

    let session: Session = SessionBuilder::with_model_provider(model_provider)
        .with_config(AgentConfig::default().with_target_language("fr"))
        .with_translator(Unreachable)
        .build()
        .unwrap();
    let resp = timeout(
        GUARD,
        session.query(QueryRequest {
            message: "Muli bwanji?".to_owned(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(resp.error, None);
    assert_eq!(resp.responses.last().unwrap().content, "Ndili bwino");
}

#[tokio::test]
async fn test_oracle_failure_in_query() {
    let mut model_provider = TestModelProvider::default();
    model_provider
        .add_response(PresetResponse::with_text("unused").with_failures(0));

    let session = SessionBuilder::with_model_provider(model_provider)
        .build()
        .unwrap();
    let resp = timeout(GUARD, session.query(QueryRequest::default()))
        .await
        .unwrap();

    let roles: Vec<_> =
        resp.responses.iter().map(|item| item.role.as_str()).collect();
    assert_eq!(roles, ["user", "error"]);
    assert_eq!(resp.responses[0].content, "");
    assert!(resp.error.unwrap().starts_with("oracle unavailable"));
}
