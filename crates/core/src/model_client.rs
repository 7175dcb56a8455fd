use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;

use backoff::future::retry_notify;
use tokio::time::timeout;
use tracing::Instrument;
use zikomo_model::{
    ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent, ToolCallRequest,
};

use crate::config::RetryPolicy;
use crate::error::OracleError;

type SendRequestResult = Result<OracleReply, OracleError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules, and applies time limits and retries.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the complete reply.
    ///
    /// Each attempt is limited to `limit`. Transient failures are retried
    /// according to `policy`, all other failures are returned immediately.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future abandons the request
    /// in flight.
    pub async fn send_request(
        &self,
        req: ModelRequest,
        limit: Duration,
        policy: RetryPolicy,
    ) -> SendRequestResult {
        let attempt = || {
            let fut = (self.handler_fn)(req.clone());
            async move {
                let result = match timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(OracleError::timed_out(limit)),
                };
                result.map_err(|err| {
                    if err.kind().is_transient() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        };
        retry_notify(policy.backoff(), attempt, |err, after| {
            warn!("oracle request failed, retrying in {after:?}: {err}");
        })
        .await
    }
}

/// A completely received reply from the model client.
#[derive(Clone, Debug, Default)]
pub struct OracleReply {
    /// The text the model produced.
    pub text: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(OracleError::from_provider(err));
        }
    };

    let mut reply = OracleReply::default();

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(OracleError::from_provider(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                reply.text.push_str(&msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                reply.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                if reason == ModelFinishReason::Length {
                    warn!("the reply was cut off by the output limit");
                }
                reply.finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(reply)
}
