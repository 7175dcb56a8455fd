use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use zikomo_model::{ModelResponse, ModelResponseEvent};

/// A received completion, replayed as response events.
#[derive(Debug)]
pub struct OpenAIResponse {
    events: VecDeque<ModelResponseEvent>,
}

impl OpenAIResponse {
    #[inline]
    pub(crate) fn new(events: VecDeque<ModelResponseEvent>) -> Self {
        Self { events }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    #[inline]
    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }
}
