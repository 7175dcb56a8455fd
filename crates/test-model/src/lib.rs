//! A local scripted model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use zikomo_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<ModelResponseEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn new(preset: &PresetResponse, delay: Duration) -> Self {
        let mut events: Vec<_> = preset
            .events
            .iter()
            .map(|event| match event {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            })
            .collect();
        let has_tool_call = preset
            .events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        events.push(ModelResponseEvent::Completed(if has_tool_call {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        }));
        Self {
            events,
            event_idx: 0,
            delay,
            sleep: None,
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.event_idx >= this.events.len() {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let event = this.events[this.event_idx].clone();
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Default)]
struct SharedState {
    attempts: HashMap<usize, u64>,
    requests: Vec<ModelRequest>,
}

/// A local scripted model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to a request. The response is selected by the number
/// of assistant messages in the request, so every turn replays the script
/// from the beginning. If there are no enough responses in the script, an
/// error will be returned, unless [`set_repeat_last`] is enabled.
///
/// Clones share the attempt counters and the request log.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
///
/// [`set_repeat_last`]: TestModelProvider::set_repeat_last
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    repeat_last: bool,
    shared: Arc<Mutex<SharedState>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Sets the delay before each event of a response.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Makes the last response of the script answer every further request.
    #[inline]
    pub fn set_repeat_last(&mut self, repeat_last: bool) {
        self.repeat_last = repeat_last;
    }

    /// Returns all requests received so far, including failed ones.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_shared().requests.clone()
    }

    #[inline]
    fn lock_shared(&self) -> std::sync::MutexGuard<'_, SharedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, req: &ModelRequest) -> Result<TestModelResponse, Error> {
        let step_idx = req.assistant_turns();

        let mut shared = self.lock_shared();
        shared.requests.push(req.clone());

        let preset = match self.script.get(step_idx) {
            Some(preset) => preset,
            None if self.repeat_last => match self.script.last() {
                Some(preset) => preset,
                None => {
                    return Err(Error {
                        message: "empty script",
                        kind: ErrorKind::Other,
                    });
                }
            },
            None => {
                return Err(Error {
                    message: "no enough steps",
                    kind: ErrorKind::Other,
                });
            }
        };

        let attempts = shared.attempts.entry(step_idx).or_default();
        *attempts += 1;
        let should_fail = match preset.failures {
            Some(0) => true,
            Some(failures) => *attempts <= failures,
            None => false,
        };
        if should_fail {
            return Err(Error {
                message: "injected failure",
                kind: preset.failure_kind.unwrap_or(ErrorKind::Other),
            });
        }

        Ok(TestModelResponse::new(
            preset,
            self.delay.unwrap_or(Duration::from_millis(1)),
        ))
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.respond(req))
    }
}
