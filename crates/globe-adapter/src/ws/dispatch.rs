/*
[INPUT]:  Inbound text frames from the connection task
[OUTPUT]: Handler invocations and error handler callbacks
[POS]:    WebSocket layer - inbound routing
[UPDATE]: When adding frame kinds or changing routing rules
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use super::message::InboundFrame;
use super::registry::SubscriptionRegistry;
use crate::error::GlobeError;

const UNROUTED_LOG_LIMIT: usize = 10;
const UNRECOGNIZED_LOG_LIMIT: usize = 3;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// Single global handler for server error frames and transport faults
pub type ErrorHandler = Arc<dyn Fn(GlobeError) + Send + Sync>;

/// What happened to one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Delivered { key: String },
    Unrouted,
    ServerError,
    Unrecognized,
    Malformed,
}

/// Caps how often a noisy event is logged
#[derive(Debug)]
struct LogSampler {
    count: AtomicUsize,
    limit: usize,
}

impl LogSampler {
    const fn new(limit: usize) -> Self {
        Self {
            count: AtomicUsize::new(0),
            limit,
        }
    }

    /// 1-based sample index while under the limit
    fn sample(&self) -> Option<usize> {
        let count = self.count.fetch_add(1, Ordering::Relaxed);
        (count < self.limit).then_some(count + 1)
    }
}

pub(crate) struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    error_handler: ErrorHandler,
    unrouted_log: LogSampler,
    unrecognized_log: LogSampler,
    parse_fail_log: LogSampler,
}

impl Dispatcher {
    pub(crate) fn new(registry: Arc<SubscriptionRegistry>, error_handler: ErrorHandler) -> Self {
        Self {
            registry,
            error_handler,
            unrouted_log: LogSampler::new(UNROUTED_LOG_LIMIT),
            unrecognized_log: LogSampler::new(UNRECOGNIZED_LOG_LIMIT),
            parse_fail_log: LogSampler::new(PARSE_FAIL_LOG_LIMIT),
        }
    }

    /// Route one frame. Runs to completion before the next frame is read.
    pub(crate) fn dispatch_text(&self, text: &str) -> DispatchOutcome {
        match InboundFrame::parse(text) {
            Ok(InboundFrame::Channel(message)) => {
                match self.registry.resolve(&message.subscription) {
                    Some((key, handler)) => {
                        handler(message);
                        DispatchOutcome::Delivered { key }
                    }
                    None => {
                        if let Some(sample_index) = self.unrouted_log.sample() {
                            debug!(
                                sample_index,
                                sample_limit = UNROUTED_LOG_LIMIT,
                                channel = %message.subscription.channel,
                                instrument = ?message.subscription.instrument,
                                "ws message has no handler"
                            );
                        }
                        DispatchOutcome::Unrouted
                    }
                }
            }
            Ok(InboundFrame::Error(frame)) => {
                (self.error_handler)(GlobeError::Server(frame));
                DispatchOutcome::ServerError
            }
            Ok(InboundFrame::Unrecognized(_)) => {
                if let Some(sample_index) = self.unrecognized_log.sample() {
                    info!(
                        sample_index,
                        sample_limit = UNRECOGNIZED_LOG_LIMIT,
                        bytes = text.len(),
                        "ws message shape unrecognized"
                    );
                    debug!(
                        sample_index,
                        message = %truncate_for_log(text, RAW_LOG_MAX_BYTES),
                        "ws message shape unrecognized"
                    );
                }
                DispatchOutcome::Unrecognized
            }
            Err(err) => {
                if let Some(sample_index) = self.parse_fail_log.sample() {
                    info!(
                        sample_index,
                        sample_limit = PARSE_FAIL_LOG_LIMIT,
                        error = %err,
                        bytes = text.len(),
                        "ws message parse failed"
                    );
                    debug!(
                        sample_index,
                        error = %err,
                        message = %truncate_for_log(text, RAW_LOG_MAX_BYTES),
                        "ws message parse failed"
                    );
                }
                DispatchOutcome::Malformed
            }
        }
    }

    pub(crate) fn report(&self, err: GlobeError) {
        (self.error_handler)(err);
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
