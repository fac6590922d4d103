//! PostgreSQL LISTEN/NOTIFY client for TAS-43 task readiness events
//!
//! This module provides a robust PostgreSQL notification listener that handles
//! connection management, automatic reconnection, and event classification using
//! the config-driven approach from events.rs.

use std::collections::HashMap;
use std::sync::Arc;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tasker_shared::{TaskerResult, TaskerError};
use super::events::*;

/// PostgreSQL listener for task readiness notifications
/// 
/// Manages PostgreSQL LISTEN/NOTIFY connections with automatic reconnection,
/// error handling, and config-driven event classification. Provides a unified
/// interface for receiving all types of task readiness events.
pub struct TaskReadinessListener {
    /// Database connection pool
    pool: PgPool,
    /// SQLx PostgreSQL listener (when connected)
    listener: Option<sqlx::postgres::PgListener>,
    /// Event sender channel
    event_sender: mpsc::Sender<TaskReadinessNotification>,
    /// Config-driven event classifier
    event_classifier: ReadinessEventClassifier,
    /// Connection state
    is_connected: bool,
    /// Channels currently being listened to
    listened_channels: HashMap<String, bool>,
}

/// Unified notification enum for all task readiness events
/// 
/// Wraps the classified TaskReadinessEvent with connection error handling.
/// This provides a single channel interface for all event types and errors.
#[derive(Debug, Clone)]
pub enum TaskReadinessNotification {
    /// Classified readiness event using config-driven classification
    Event(TaskReadinessEvent),
    /// Connection error from PostgreSQL listener
    ConnectionError(String),
    /// Listener reconnected successfully
    Reconnected,
}

impl TaskReadinessListener {
    /// Create new task readiness listener with config-driven classification
    /// 
    /// The listener uses the provided event classifier for config-driven event
    /// parsing and classification, following the same patterns as ConfigDrivenMessageEvent.
    pub async fn new(
        pool: PgPool,
        event_sender: mpsc::Sender<TaskReadinessNotification>,
        notification_config: TaskReadinessNotificationConfig,
    ) -> TaskerResult<Self> {
        Ok(Self {
            pool,
            listener: None,
            event_sender,
            event_classifier: ReadinessEventClassifier::new(notification_config),
            is_connected: false,
            listened_channels: HashMap::new(),
        })
    }

    /// Create listener with default notification configuration
    pub async fn new_with_defaults(
        pool: PgPool,
        event_sender: mpsc::Sender<TaskReadinessNotification>,
    ) -> TaskerResult<Self> {
        Self::new(pool, event_sender, TaskReadinessNotificationConfig::default()).await
    }

    /// Connect to PostgreSQL and start listening to global channels
    /// 
    /// Establishes the PostgreSQL LISTEN connection and subscribes to the core
    /// global channels (task_ready, task_state_change, namespace_created).
    /// Individual namespaces can be added later with listen_for_namespace().
    pub async fn connect(&mut self) -> TaskerResult<()> {
        info!("Connecting task readiness listener to PostgreSQL");

        let mut listener = sqlx::postgres::PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| TaskerError::DatabaseError(format!("Failed to connect listener: {}", e)))?;

        // Listen to global channels configured via the classifier
        let global_channels = self.event_classifier.get_global_channels();
        
        for channel in global_channels {
            listener.listen(&channel).await.map_err(|e| {
                TaskerError::DatabaseError(format!("Failed to listen to {}: {}", channel, e))
            })?;
            
            self.listened_channels.insert(channel.clone(), true);
            debug!("Now listening to global channel: {}", channel);
        }

        self.listener = Some(listener);
        self.is_connected = true;

        info!("Task readiness listener connected successfully");
        Ok(())
    }

    /// Listen for specific namespace events
    /// 
    /// Adds namespace-specific channels (task_ready.namespace, task_state_change.namespace)
    /// to the listener. This enables namespace-specific event filtering and processing.
    pub async fn listen_for_namespace(&mut self, namespace: &str) -> TaskerResult<()> {
        if let Some(ref mut listener) = self.listener {
            let namespace_channels = self.event_classifier.get_namespace_channels(namespace);
            
            for channel in namespace_channels {
                if !self.listened_channels.contains_key(&channel) {
                    listener.listen(&channel).await.map_err(|e| {
                        TaskerError::DatabaseError(format!("Failed to listen to {}: {}", channel, e))
                    })?;
                    
                    self.listened_channels.insert(channel.clone(), true);
                    debug!("Now listening for namespace channel: {}", channel);
                }
            }
            
            info!("Added namespace listening: {}", namespace);
        } else {
            return Err(TaskerError::ValidationError(
                "Cannot add namespace: listener not connected".to_string(),
            ));
        }
        
        Ok(())
    }

    /// Stop listening for specific namespace events
    /// 
    /// Removes namespace-specific channels from the listener. Note that SQLx doesn't
    /// provide an "unlisten" method, so this just tracks that we're no longer interested
    /// in events from this namespace.
    pub async fn stop_listening_for_namespace(&mut self, namespace: &str) -> TaskerResult<()> {
        let namespace_channels = self.event_classifier.get_namespace_channels(namespace);
        
        for channel in namespace_channels {
            self.listened_channels.remove(&channel);
            debug!("Stopped tracking namespace channel: {}", channel);
        }
        
        info!("Stopped namespace listening: {}", namespace);
        Ok(())
    }

    /// Start listening loop with automatic reconnection
    /// 
    /// This is the main event loop that receives PostgreSQL notifications and
    /// sends classified events via the event channel. It handles connection errors
    /// with automatic reconnection attempts.
    pub async fn start_listening(&mut self) -> TaskerResult<()> {
        if !self.is_connected {
            return Err(TaskerError::ValidationError(
                "Listener not connected".to_string(),
            ));
        }

        let listener = self.listener.as_mut().unwrap();
        let event_sender = self.event_sender.clone();
        let event_classifier = self.event_classifier.clone();

        info!("Starting task readiness notification listening loop");

        loop {
            match listener.recv().await {
                Ok(notification) => {
                    debug!(
                        "Received PostgreSQL notification on channel: {}",
                        notification.channel()
                    );

                    let event = Self::parse_notification_static(&event_classifier, notification).await;
                    if let Err(e) = event_sender.send(event).await {
                        error!("Failed to send task readiness event: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    error!("PostgreSQL listener error: {}", e);
                    
                    // Send connection error event
                    let error_event = TaskReadinessNotification::ConnectionError(format!("{}", e));
                    if event_sender.send(error_event).await.is_err() {
                        error!("Failed to send connection error event");
                        break;
                    }

                    // SQLx will attempt auto-reconnect on next recv()
                    // Send reconnected event if successful
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    
                    // Test if we're reconnected by trying to receive again
                    match listener.recv().await {
                        Ok(notification) => {
                            info!("PostgreSQL listener reconnected successfully");
                            let reconnect_event = TaskReadinessNotification::Reconnected;
                            if event_sender.send(reconnect_event).await.is_err() {
                                break;
                            }
                            
                            // Process the notification we just received
                            let event = Self::parse_notification_static(&event_classifier, notification).await;
                            if event_sender.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            // Still having connection issues, continue loop to retry
                            continue;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse PostgreSQL notification into classified event using config-driven classification
    /// 
    /// Uses the ReadinessEventClassifier to parse the notification channel and payload
    /// into typed events, following the same pattern as ConfigDrivenMessageEvent::classify
    /// from event_driven_coordinator.rs.
    async fn parse_notification_static(
        event_classifier: &ReadinessEventClassifier,
        notification: sqlx::postgres::PgNotification,
    ) -> TaskReadinessNotification {
        let channel = notification.channel();
        let payload = notification.payload();

        debug!("Parsing notification from channel {}: {}", channel, payload);

        // Use config-driven classification (no hardcoded string matching)
        // This follows the same exhaustive enum matching pattern as ConfigDrivenMessageEvent
        let classified_event = event_classifier.classify(channel, payload);
        
        debug!(
            channel = channel,
            event_type = ?classified_event,
            "Classified readiness notification using config-driven enum-based dispatching"
        );

        TaskReadinessNotification::Event(classified_event)
    }

    async fn parse_notification(
        &self,
        notification: sqlx::postgres::PgNotification,
    ) -> TaskReadinessNotification {
        Self::parse_notification_static(&self.event_classifier, notification).await
    }

    /// Disconnect listener gracefully
    /// 
    /// Closes the PostgreSQL LISTEN connection and cleans up resources.
    /// The listener can be reconnected later with connect().
    pub async fn disconnect(&mut self) -> TaskerResult<()> {
        if let Some(listener) = self.listener.take() {
            // SQLx listener doesn't have explicit disconnect, dropping closes connection
            drop(listener);
        }
        
        self.is_connected = false;
        self.listened_channels.clear();
        info!("Task readiness listener disconnected");
        Ok(())
    }

    /// Check if listener is connected
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Get list of channels currently being listened to
    pub fn get_listened_channels(&self) -> Vec<String> {
        self.listened_channels.keys().cloned().collect()
    }

    /// Get the event classifier configuration
    pub fn get_classifier_config(&self) -> &TaskReadinessNotificationConfig {
        self.event_classifier.config()
    }

    /// Get statistics about the listener
    pub fn get_listener_stats(&self) -> TaskReadinessListenerStats {
        TaskReadinessListenerStats {
            is_connected: self.is_connected,
            channels_count: self.listened_channels.len(),
            listened_channels: self.get_listened_channels(),
        }
    }
}

/// Statistics for task readiness listener
#[derive(Debug, Clone)]
pub struct TaskReadinessListenerStats {
    /// Whether the listener is currently connected
    pub is_connected: bool,
    /// Number of channels being listened to
    pub channels_count: usize,
    /// List of channels being listened to
    pub listened_channels: Vec<String>,
}
