//! Client registry for queue and topic endpoints.

use crate::config::CourierConfig;
use crate::queue::{ListenOutcome, MessageHandler, Queue};
use crate::topic::Topic;
use crate::ServiceIdentity;
use courier_transport::{
    connect, ConnectionSettings, QueueTransport, TargetName, TransportError, ValidationError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Construction options for a registered queue
#[derive(Clone, Default)]
pub struct QueueOptions {
    wait_time: Duration,
    handler: Option<Arc<dyn MessageHandler>>,
}

impl QueueOptions {
    /// Create options with no handler and the default wait time
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-poll wait time for receives
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Pre-attach the consumer handler
    pub fn with_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// Registry of queue and topic endpoints bound to one transport connection.
///
/// The client is an explicit value owned by the application's composition
/// root and shared by reference with whatever needs it; "one client per
/// process" is a caller convention, not an enforced constraint. Endpoints
/// are created on first lookup and memoized for the client's lifetime.
pub struct Client {
    transport: RwLock<Arc<dyn QueueTransport>>,
    identity: ServiceIdentity,
    queues: Mutex<HashMap<TargetName, Arc<Queue>>>,
    topics: Mutex<HashMap<TargetName, Arc<Topic>>>,
}

impl Client {
    /// Establish a transport connection and build an empty registry
    pub async fn connect(config: &CourierConfig) -> Result<Self, TransportError> {
        let transport = connect(&config.connection()).await?;
        Ok(Self::with_transport(config.identity(), transport))
    }

    /// Build a client around an existing transport handle.
    ///
    /// This is the injection seam for externally provided drivers and for
    /// tests.
    pub fn with_transport(identity: ServiceIdentity, transport: Arc<dyn QueueTransport>) -> Self {
        Self {
            transport: RwLock::new(transport),
            identity,
            queues: Mutex::new(HashMap::new()),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Re-establish the transport connection with new settings.
    ///
    /// Registries are preserved: endpoints that already exist keep the
    /// connection they were bound to, endpoints created afterwards bind the
    /// new one.
    pub async fn reconnect(&self, settings: &ConnectionSettings) -> Result<(), TransportError> {
        let transport = connect(settings).await?;
        *self.transport.write().expect("transport lock poisoned") = transport;
        Ok(())
    }

    fn current_transport(&self) -> Arc<dyn QueueTransport> {
        self.transport
            .read()
            .expect("transport lock poisoned")
            .clone()
    }

    /// Get or create the topic with the given name.
    ///
    /// # Errors
    ///
    /// Fails only when the name is not a valid target name.
    pub fn get_topic(&self, name: &str) -> Result<Arc<Topic>, ValidationError> {
        let name = TargetName::new(name.to_string())?;

        let mut topics = self.topics.lock().expect("topic registry lock poisoned");
        let topic = topics.entry(name.clone()).or_insert_with(|| {
            Arc::new(Topic::new(
                name,
                self.current_transport(),
                self.identity.clone(),
            ))
        });

        Ok(topic.clone())
    }

    /// Get or create the queue with the given name.
    ///
    /// Created queues start without a handler and with the default wait
    /// time; attach a handler with [`Queue::set_handler`] before starting
    /// consumption.
    ///
    /// # Errors
    ///
    /// Fails only when the name is not a valid target name.
    pub fn get_queue(&self, name: &str) -> Result<Arc<Queue>, ValidationError> {
        let name = TargetName::new(name.to_string())?;

        let mut queues = self.queues.lock().expect("queue registry lock poisoned");
        let queue = queues.entry(name.clone()).or_insert_with(|| {
            Arc::new(Queue::new(
                name,
                self.current_transport(),
                Duration::ZERO,
                None,
            ))
        });

        Ok(queue.clone())
    }

    /// Build a queue from the given options and store it, overwriting any
    /// prior entry of the same name.
    pub fn register_queue(
        &self,
        name: &str,
        options: QueueOptions,
    ) -> Result<Arc<Queue>, ValidationError> {
        let name = TargetName::new(name.to_string())?;

        let queue = Arc::new(Queue::new(
            name.clone(),
            self.current_transport(),
            options.wait_time,
            options.handler,
        ));

        self.queues
            .lock()
            .expect("queue registry lock poisoned")
            .insert(name, queue.clone());

        Ok(queue)
    }

    /// Spawn one listen cycle per handler-bearing queue.
    ///
    /// Queues without a handler are skipped; an empty registry yields no
    /// tasks. Each task performs a single [`Queue::listen`] cycle and the
    /// returned handles resolve to its outcome, so a supervising caller can
    /// reschedule, back off, or ignore them.
    pub fn start_all(&self) -> Vec<JoinHandle<ListenOutcome>> {
        let queues: Vec<Arc<Queue>> = {
            let registry = self.queues.lock().expect("queue registry lock poisoned");
            registry.values().cloned().collect()
        };

        let mut tasks = Vec::new();
        for queue in queues {
            if !queue.has_handler() {
                continue;
            }

            info!(queue_name = %queue.name(), "starting listen task");
            tasks.push(tokio::spawn(async move { queue.listen().await }));
        }

        tasks
    }
}
