use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, Transport};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::Connection;

use super::message::TelemetryMessage;
use super::window::MessageWindow;

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;

/// Everything the worker needs to open one broker session, lifted out of a
/// connection record.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSessionConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub qos_level: u8,
    pub keep_alive_secs: u64,
    pub credentials: Option<(String, String)>,
}

impl BrokerSessionConfig {
    /// Builds the session config, or `None` when the record is missing the
    /// broker host or the topic to subscribe to.
    pub fn from_connection(connection: &Connection) -> Option<Self> {
        let host = connection.connection_url.clone()?;
        let topic = connection.subscribe_topic.clone()?;
        let credentials = if connection.authenticated_broker.unwrap_or(false) {
            Some((
                connection.username.clone().unwrap_or_default(),
                connection.password.clone().unwrap_or_default(),
            ))
        } else {
            None
        };
        Some(Self {
            host,
            port: connection.port.unwrap_or(DEFAULT_PORT),
            topic,
            qos_level: connection.qos.unwrap_or(0),
            keep_alive_secs: connection.keep_alive.unwrap_or(DEFAULT_KEEP_ALIVE_SECS),
            credentials,
        })
    }

    /// The broker is reached over a WebSocket upgrade at a fixed path.
    pub fn broker_url(&self) -> String {
        format!("ws://{}:{}/mqtt", self.host, self.port)
    }

    pub fn qos(&self) -> QoS {
        match self.qos_level {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }

    fn mqtt_options(&self) -> MqttOptions {
        // Fresh random client id per attempt; collisions are accepted.
        let client_id = format!("iotview-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let mut options = MqttOptions::new(client_id, self.broker_url(), self.port);
        options.set_transport(Transport::Ws);
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs.max(5)));
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

#[derive(Debug)]
pub enum BrokerCommand {
    Connect(Box<BrokerSessionConfig>),
    Disconnect,
}

/// Tagged events out of the broker worker, consumed by the one
/// state-machine handler on the UI side.
#[derive(Debug)]
pub enum BrokerEvent {
    Connected,
    ConnectFailed(String),
    MessageReceived { topic: String, payload: Vec<u8> },
    Lost(String),
}

/// Connection lifecycle as the viewer sees it. A lost connection displays
/// the same as a disconnected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// UI-side handle for one broker session and its message window.
///
/// This is the single writer to the window: all ingestion happens in
/// [`ViewerSession::poll`], called from the frame loop, so no locking is
/// needed. Dropping the handle disconnects an open session exactly once.
pub struct ViewerSession {
    state: ViewerState,
    commands: mpsc::Sender<BrokerCommand>,
    events: mpsc::Receiver<BrokerEvent>,
    window: MessageWindow,
    messages_received: usize,
    payloads_dropped: usize,
    last_error: Option<String>,
}

impl ViewerSession {
    /// Spawns a dedicated worker task and returns the handle wired to it.
    pub fn spawn() -> Self {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(256);
        tokio::spawn(run_worker(command_rx, event_tx));
        Self::with_channels(command_tx, event_rx)
    }

    /// Wires the handle to caller-provided channels (worker-less in tests).
    pub fn with_channels(
        commands: mpsc::Sender<BrokerCommand>,
        events: mpsc::Receiver<BrokerEvent>,
    ) -> Self {
        Self {
            state: ViewerState::Disconnected,
            commands,
            events,
            window: MessageWindow::new(),
            messages_received: 0,
            payloads_dropped: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn window(&self) -> &MessageWindow {
        &self.window
    }

    pub fn messages_received(&self) -> usize {
        self.messages_received
    }

    pub fn payloads_dropped(&self) -> usize {
        self.payloads_dropped
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a session. Ignored unless currently disconnected; the UI also
    /// disables the action, this guard is just the backstop.
    pub fn connect(&mut self, config: BrokerSessionConfig) {
        if self.state != ViewerState::Disconnected {
            return;
        }
        self.last_error = None;
        match self.commands.try_send(BrokerCommand::Connect(Box::new(config))) {
            Ok(()) => self.state = ViewerState::Connecting,
            Err(e) => {
                warn!("Could not start broker session: {}", e);
                self.last_error = Some("Could not start broker session".to_string());
            }
        }
    }

    /// Idempotent: only sends when the session reports itself open, so
    /// calling this when already disconnected is a no-op.
    pub fn disconnect(&mut self) {
        if self.state == ViewerState::Disconnected {
            return;
        }
        self.state = ViewerState::Disconnected;
        if let Err(e) = self.commands.try_send(BrokerCommand::Disconnect) {
            debug!("Disconnect not delivered: {}", e);
        }
    }

    /// Drains pending broker events: state transitions and message
    /// ingestion (decode, stamp, prepend, truncate). Malformed payloads are
    /// logged and dropped without ever touching the window.
    pub fn poll(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                BrokerEvent::Connected => {
                    info!("Broker session connected");
                    self.state = ViewerState::Connected;
                }
                BrokerEvent::ConnectFailed(reason) => {
                    warn!("Broker connect failed: {}", reason);
                    self.state = ViewerState::Disconnected;
                    self.last_error = Some(reason);
                }
                BrokerEvent::Lost(reason) => {
                    warn!("Broker connection lost: {}", reason);
                    self.state = ViewerState::Disconnected;
                    self.last_error = Some(reason);
                }
                BrokerEvent::MessageReceived { topic, payload } => {
                    match TelemetryMessage::decode(&payload) {
                        Ok(message) => {
                            self.messages_received += 1;
                            self.window.push(message);
                        }
                        Err(e) => {
                            debug!("Dropping undecodable payload on '{}': {}", topic, e);
                            self.payloads_dropped += 1;
                        }
                    }
                }
            }
        }
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Worker task: waits for a connect command, runs that session to
/// completion, then waits for the next one. Ends when the handle is gone.
async fn run_worker(
    mut commands: mpsc::Receiver<BrokerCommand>,
    events: mpsc::Sender<BrokerEvent>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            BrokerCommand::Connect(config) => {
                run_session(*config, &mut commands, &events).await;
            }
            // No session open, nothing to do.
            BrokerCommand::Disconnect => {}
        }
    }
    debug!("Broker worker finished");
}

/// One session from connect attempt to termination. There is no retry and
/// no backoff: any failure ends the session and the user reconnects
/// manually.
async fn run_session(
    config: BrokerSessionConfig,
    commands: &mut mpsc::Receiver<BrokerCommand>,
    events: &mpsc::Sender<BrokerEvent>,
) {
    info!("Opening broker session to {}", config.broker_url());
    let (client, mut eventloop) = AsyncClient::new(config.mqtt_options(), 64);
    let mut connected = false;

    loop {
        tokio::select! {
            polled = eventloop.poll() => match polled {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    match client.subscribe(config.topic.as_str(), config.qos()).await {
                        Ok(()) => {
                            info!("Subscribed to '{}' at QoS {}", config.topic, config.qos_level);
                            connected = true;
                            if events.send(BrokerEvent::Connected).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = events.send(BrokerEvent::ConnectFailed(e.to_string())).await;
                            return;
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let event = BrokerEvent::MessageReceived {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                    };
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let event = if connected {
                        BrokerEvent::Lost(e.to_string())
                    } else {
                        BrokerEvent::ConnectFailed(e.to_string())
                    };
                    let _ = events.send(event).await;
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(BrokerCommand::Disconnect) | None => {
                    if connected {
                        let _ = client.disconnect().await;
                        // One more poll flushes the outgoing disconnect.
                        let _ = eventloop.poll().await;
                    }
                    return;
                }
                Some(BrokerCommand::Connect(_)) => {
                    warn!("Session already open, ignoring connect");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (
        ViewerSession,
        mpsc::Receiver<BrokerCommand>,
        mpsc::Sender<BrokerEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(64);
        (
            ViewerSession::with_channels(command_tx, event_rx),
            command_rx,
            event_tx,
        )
    }

    fn config() -> BrokerSessionConfig {
        BrokerSessionConfig {
            host: "broker.local".to_string(),
            port: 9001,
            topic: "sensors/greenhouse".to_string(),
            qos_level: 1,
            keep_alive_secs: 30,
            credentials: None,
        }
    }

    fn connect_and_ack(
        viewer: &mut ViewerSession,
        commands: &mut mpsc::Receiver<BrokerCommand>,
        events: &mpsc::Sender<BrokerEvent>,
    ) {
        viewer.connect(config());
        assert!(matches!(
            commands.try_recv(),
            Ok(BrokerCommand::Connect(_))
        ));
        events
            .try_send(BrokerEvent::Connected)
            .expect("event channel has room");
        viewer.poll();
        assert_eq!(viewer.state(), ViewerState::Connected);
    }

    #[test]
    fn disconnect_when_already_disconnected_is_a_no_op() {
        let (mut viewer, mut commands, _events) = session();
        viewer.disconnect();
        viewer.disconnect();
        assert!(commands.try_recv().is_err());
        assert_eq!(viewer.state(), ViewerState::Disconnected);
    }

    #[test]
    fn teardown_while_connected_disconnects_exactly_once() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        drop(viewer);

        assert!(matches!(commands.try_recv(), Ok(BrokerCommand::Disconnect)));
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn explicit_disconnect_then_teardown_sends_only_one_disconnect() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        viewer.disconnect();
        drop(viewer);

        assert!(matches!(commands.try_recv(), Ok(BrokerCommand::Disconnect)));
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn teardown_while_disconnected_sends_nothing() {
        let (viewer, mut commands, _events) = session();
        drop(viewer);
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn connect_while_connected_is_ignored() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        viewer.connect(config());
        assert!(commands.try_recv().is_err());
        assert_eq!(viewer.state(), ViewerState::Connected);
    }

    #[test]
    fn malformed_payload_never_reaches_the_window() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        events
            .try_send(BrokerEvent::MessageReceived {
                topic: "sensors/greenhouse".to_string(),
                payload: b"{broken".to_vec(),
            })
            .expect("event channel has room");
        viewer.poll();

        assert!(viewer.window().is_empty());
        assert_eq!(viewer.payloads_dropped(), 1);
        assert_eq!(viewer.messages_received(), 0);
        assert_eq!(viewer.state(), ViewerState::Connected);
    }

    #[test]
    fn valid_payloads_are_ingested_newest_first() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        for seq in 1..=3 {
            events
                .try_send(BrokerEvent::MessageReceived {
                    topic: "sensors/greenhouse".to_string(),
                    payload: format!("{{\"seq\": {seq}}}").into_bytes(),
                })
                .expect("event channel has room");
        }
        viewer.poll();

        assert_eq!(viewer.messages_received(), 3);
        let first = viewer.window().iter().next().expect("window is non-empty");
        assert_eq!(first.display("seq"), "3");
    }

    #[test]
    fn connect_failure_returns_to_disconnected_with_a_reason() {
        let (mut viewer, mut commands, events) = session();
        viewer.connect(config());
        assert!(matches!(commands.try_recv(), Ok(BrokerCommand::Connect(_))));

        events
            .try_send(BrokerEvent::ConnectFailed("connection refused".to_string()))
            .expect("event channel has room");
        viewer.poll();

        assert_eq!(viewer.state(), ViewerState::Disconnected);
        assert_eq!(viewer.last_error(), Some("connection refused"));
    }

    #[test]
    fn lost_connection_displays_as_disconnected() {
        let (mut viewer, mut commands, events) = session();
        connect_and_ack(&mut viewer, &mut commands, &events);

        events
            .try_send(BrokerEvent::Lost("keep-alive timeout".to_string()))
            .expect("event channel has room");
        viewer.poll();

        assert_eq!(viewer.state(), ViewerState::Disconnected);
        assert_eq!(viewer.last_error(), Some("keep-alive timeout"));
    }

    #[test]
    fn session_config_requires_host_and_topic() {
        let mut connection = Connection {
            connection_id: "c-1".to_string(),
            connection_name: "Greenhouse".to_string(),
            ..Connection::default()
        };
        assert!(BrokerSessionConfig::from_connection(&connection).is_none());

        connection.connection_url = Some("broker.local".to_string());
        assert!(BrokerSessionConfig::from_connection(&connection).is_none());

        connection.subscribe_topic = Some("sensors/#".to_string());
        let config =
            BrokerSessionConfig::from_connection(&connection).expect("config should build");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.qos_level, 0);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn credentials_only_for_authenticated_brokers() {
        let connection = Connection {
            connection_id: "c-1".to_string(),
            connection_name: "Greenhouse".to_string(),
            connection_url: Some("broker.local".to_string()),
            subscribe_topic: Some("sensors/#".to_string()),
            authenticated_broker: Some(true),
            username: Some("sensor".to_string()),
            password: Some("hunter2".to_string()),
            ..Connection::default()
        };
        let config =
            BrokerSessionConfig::from_connection(&connection).expect("config should build");
        assert_eq!(
            config.credentials,
            Some(("sensor".to_string(), "hunter2".to_string()))
        );
    }

    #[test]
    fn websocket_url_has_the_fixed_path() {
        assert_eq!(config().broker_url(), "ws://broker.local:9001/mqtt");
    }

    #[test]
    fn qos_levels_map_through() {
        let mut c = config();
        c.qos_level = 0;
        assert_eq!(c.qos(), QoS::AtMostOnce);
        c.qos_level = 1;
        assert_eq!(c.qos(), QoS::AtLeastOnce);
        c.qos_level = 2;
        assert_eq!(c.qos(), QoS::ExactlyOnce);
    }
}
