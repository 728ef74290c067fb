//! Tests for the queue consume loop.

use super::*;
use courier_transport::{Delivery, SendReceipt};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Transport double with scripted receive results and recorded calls
struct ScriptedTransport {
    receive_script: Mutex<VecDeque<Result<Option<Delivery>, TransportError>>>,
    receives: Mutex<Vec<Duration>>,
    deletes: Mutex<Vec<(TargetName, ReceiptToken)>>,
    sends: Mutex<Vec<(TargetName, String, String)>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            receive_script: Mutex::new(VecDeque::new()),
            receives: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
        }
    }

    fn script_delivery(self, body: &str) -> (Self, ReceiptToken) {
        let receipt = ReceiptToken::new();
        self.receive_script
            .lock()
            .unwrap()
            .push_back(Ok(Some(Delivery {
                message_id: MessageId::new(),
                body: body.to_string(),
                receipt: receipt.clone(),
                delivery_count: 1,
            })));
        (self, receipt)
    }

    fn script_empty(self) -> Self {
        self.receive_script.lock().unwrap().push_back(Ok(None));
        self
    }

    fn script_receive_error(self) -> Self {
        self.receive_script
            .lock()
            .unwrap()
            .push_back(Err(TransportError::ConnectionFailed {
                message: "connection reset".to_string(),
            }));
        self
    }

    fn recorded_receives(&self) -> Vec<Duration> {
        self.receives.lock().unwrap().clone()
    }

    fn recorded_deletes(&self) -> Vec<(TargetName, ReceiptToken)> {
        self.deletes.lock().unwrap().clone()
    }

    fn recorded_sends(&self) -> Vec<(TargetName, String, String)> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueTransport for ScriptedTransport {
    async fn send(
        &self,
        target: &TargetName,
        body: &str,
        tag: &str,
    ) -> Result<SendReceipt, TransportError> {
        self.sends
            .lock()
            .unwrap()
            .push((target.clone(), body.to_string(), tag.to_string()));

        Ok(SendReceipt {
            message_id: MessageId::new(),
            status_code: 201,
        })
    }

    async fn receive(
        &self,
        _target: &TargetName,
        wait: Duration,
    ) -> Result<Option<Delivery>, TransportError> {
        self.receives.lock().unwrap().push(wait);
        self.receive_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn delete(
        &self,
        target: &TargetName,
        receipt: &ReceiptToken,
    ) -> Result<(), TransportError> {
        self.deletes
            .lock()
            .unwrap()
            .push((target.clone(), receipt.clone()));
        Ok(())
    }
}

/// Handler double recording every envelope it sees
struct RecordingHandler {
    seen: Mutex<Vec<Envelope>>,
    fail: bool,
}

impl RecordingHandler {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn seen(&self) -> Vec<Envelope> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, envelope: Envelope) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(envelope);
        if self.fail {
            anyhow::bail!("business rule rejected the message");
        }
        Ok(())
    }
}

fn queue_name() -> TargetName {
    TargetName::new("orders".to_string()).unwrap()
}

fn encoded_envelope() -> String {
    let mut envelope =
        Envelope::new(json!({"order_id": 42})).with_trace_id("abc-123".to_string());
    envelope.ensure_defaults("billing", "secret");
    envelope.encode().unwrap()
}

// ============================================================================
// Listen Cycle Tests
// ============================================================================

#[tokio::test]
async fn test_listen_dispatches_and_acknowledges() {
    let (transport, receipt) = ScriptedTransport::new().script_delivery(&encoded_envelope());
    let transport = Arc::new(transport);
    let handler = RecordingHandler::succeeding();
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(handler.clone()),
    );

    let outcome = queue.listen().await;

    assert_eq!(outcome, ListenOutcome::Handled);

    let seen = handler.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].trace_id, "abc-123");
    assert_eq!(seen[0].content, json!({"order_id": 42}));

    // Deleted exactly once, with the delivery's own receipt
    let deletes = transport.recorded_deletes();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].0, queue_name());
    assert_eq!(deletes[0].1, receipt);
}

#[tokio::test]
async fn test_listen_keeps_message_on_handler_error() {
    let (transport, _receipt) = ScriptedTransport::new().script_delivery(&encoded_envelope());
    let transport = Arc::new(transport);
    let handler = RecordingHandler::failing();
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(handler.clone()),
    );

    let outcome = queue.listen().await;

    assert_eq!(outcome, ListenOutcome::HandlerFailed);
    assert_eq!(handler.seen().len(), 1);
    assert!(transport.recorded_deletes().is_empty());
}

#[tokio::test]
async fn test_listen_skips_undecodable_body() {
    let (transport, _receipt) = ScriptedTransport::new().script_delivery("not-base64!!");
    let transport = Arc::new(transport);
    let handler = RecordingHandler::succeeding();
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(handler.clone()),
    );

    let outcome = queue.listen().await;

    assert_eq!(outcome, ListenOutcome::DecodeFailed);
    assert!(handler.seen().is_empty());
    assert!(transport.recorded_deletes().is_empty());
}

#[tokio::test]
async fn test_listen_absorbs_receive_error() {
    let transport = Arc::new(ScriptedTransport::new().script_receive_error());
    let handler = RecordingHandler::succeeding();
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(handler.clone()),
    );

    let outcome = queue.listen().await;

    assert_eq!(outcome, ListenOutcome::ReceiveFailed);
    assert!(handler.seen().is_empty());
    assert!(transport.recorded_deletes().is_empty());
}

#[tokio::test]
async fn test_listen_empty_poll_window() {
    let transport = Arc::new(ScriptedTransport::new().script_empty());
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(RecordingHandler::succeeding()),
    );

    assert_eq!(queue.listen().await, ListenOutcome::Empty);
}

#[tokio::test]
async fn test_listen_without_handler_is_inert() {
    let transport = Arc::new(ScriptedTransport::new());
    let queue = Queue::new(queue_name(), transport.clone(), Duration::ZERO, None);

    let outcome = queue.listen().await;

    assert_eq!(outcome, ListenOutcome::Inert);
    assert!(transport.recorded_receives().is_empty());
}

#[tokio::test]
async fn test_listen_applies_default_wait_time() {
    let transport = Arc::new(ScriptedTransport::new().script_empty());
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::ZERO,
        Some(RecordingHandler::succeeding()),
    );

    queue.listen().await;

    assert_eq!(transport.recorded_receives(), vec![DEFAULT_WAIT_TIME]);
}

#[tokio::test]
async fn test_listen_uses_configured_wait_time() {
    let transport = Arc::new(ScriptedTransport::new().script_empty());
    let queue = Queue::new(
        queue_name(),
        transport.clone(),
        Duration::from_secs(5),
        Some(RecordingHandler::succeeding()),
    );

    queue.listen().await;

    assert_eq!(
        transport.recorded_receives(),
        vec![Duration::from_secs(5)]
    );
}

// ============================================================================
// Handler Attachment Tests
// ============================================================================

#[tokio::test]
async fn test_set_handler_enables_consumption() {
    let (transport, _receipt) = ScriptedTransport::new().script_delivery(&encoded_envelope());
    let transport = Arc::new(transport);
    let queue = Queue::new(queue_name(), transport, Duration::ZERO, None);

    assert!(!queue.has_handler());
    assert_eq!(queue.listen().await, ListenOutcome::Inert);

    let handler = RecordingHandler::succeeding();
    queue.set_handler(handler.clone());

    assert!(queue.has_handler());
    assert_eq!(queue.listen().await, ListenOutcome::Handled);
    assert_eq!(handler.seen().len(), 1);
}

#[tokio::test]
async fn test_handler_fn_adapter() {
    let (transport, _receipt) = ScriptedTransport::new().script_delivery(&encoded_envelope());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_handler = seen.clone();

    let queue = Queue::new(
        queue_name(),
        Arc::new(transport),
        Duration::ZERO,
        Some(handler_fn(move |envelope: Envelope| {
            let seen = seen_in_handler.clone();
            async move {
                seen.lock().unwrap().push(envelope.trace_id);
                Ok(())
            }
        })),
    );

    assert_eq!(queue.listen().await, ListenOutcome::Handled);
    assert_eq!(*seen.lock().unwrap(), vec!["abc-123".to_string()]);
}

// ============================================================================
// Produce and Acknowledge Tests
// ============================================================================

#[tokio::test]
async fn test_send_produces_to_own_queue() {
    let transport = Arc::new(ScriptedTransport::new());
    let queue = Queue::new(queue_name(), transport.clone(), Duration::ZERO, None);

    let message_id = queue.send("raw body").await.unwrap();
    assert!(!message_id.as_str().is_empty());

    let sends = transport.recorded_sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].0, queue_name());
    assert_eq!(sends[0].1, "raw body");
    assert_eq!(sends[0].2, "", "queue sends carry no routing tag");
}

#[tokio::test]
async fn test_delete_passes_receipt_through() {
    let transport = Arc::new(ScriptedTransport::new());
    let queue = Queue::new(queue_name(), transport.clone(), Duration::ZERO, None);

    let receipt = ReceiptToken::new();
    queue.delete(&receipt).await.unwrap();

    let deletes = transport.recorded_deletes();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].1, receipt);
}
