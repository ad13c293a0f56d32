//! Connection manager and update dispatch.
//!
//! This module owns the TCP session with the processor: one reader task and
//! one writer task per live connection, a FIFO command queue drained with a
//! fixed inter-command gap, reconnect scheduling after transient failures, a
//! periodic keep-alive power poll, and the post-power-on information
//! refresh. Decoded frames are republished as [`AvpEvent`]s on the client's
//! event channel.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::codec::AsciiCodec;
use crate::command::Command;
use crate::error::{AvpError, Result};
use crate::parser::{parse_frame, Decoded, ZoneState};
use crate::types::{Channel, ConnectionStatus, OfflineReason, Property, Update, Value, Zone};

/// Default control port of the device.
pub const DEFAULT_PORT: u16 = 14999;

/// Default delay before retrying a failed connection, in minutes.
pub const DEFAULT_RECONNECT_INTERVAL_MINUTES: u64 = 2;

/// Default gap between consecutive commands on the wire, in milliseconds.
pub const DEFAULT_COMMAND_DELAY_MS: u64 = 100;

/// Delay before the first keep-alive power poll after going online.
pub const POLL_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Cadence of the keep-alive power poll.
pub const POLL_PERIOD: Duration = Duration::from_secs(60);

/// How long to let input-name replies land before querying the active input.
pub const ACTIVE_INPUT_QUERY_DELAY: Duration = Duration::from_secs(2);

/// Lowest settable volume in dB.
pub const VOLUME_DB_MIN: i32 = -90;

/// Highest settable volume in dB.
pub const VOLUME_DB_MAX: i32 = 10;

/// Highest selectable input number.
pub const MAX_INPUT: u32 = 30;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Device host name or address
    pub host: String,
    /// Device TCP port
    pub port: u16,
    /// Delay before retrying after a transient connection failure
    pub reconnect_interval: Duration,
    /// Minimum gap between consecutive commands on the wire
    pub command_delay: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Create a new configuration for the given host with default settings.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            reconnect_interval: Duration::from_secs(DEFAULT_RECONNECT_INTERVAL_MINUTES * 60),
            command_delay: Duration::from_millis(DEFAULT_COMMAND_DELAY_MS),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the reconnect interval.
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set the inter-command delay.
    pub fn command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Events emitted by the client.
///
/// This channel is the host-facing seam: connectivity transitions plus
/// decoded updates, in frame-arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvpEvent {
    /// Connectivity status transition
    Status(ConnectionStatus),
    /// Decoded state or property update
    Update(Update),
}

/// Unbounded FIFO command queue shared between intent callers and the
/// writer task. Failed writes are restored at the front so no command is
/// lost or reordered across a reconnect.
#[derive(Default)]
struct CommandQueue {
    items: Mutex<VecDeque<Command>>,
    notify: Notify,
}

impl CommandQueue {
    fn push(&self, cmd: Command) {
        self.items.lock().unwrap().push_back(cmd);
        self.notify.notify_one();
    }

    fn push_front(&self, cmd: Command) {
        self.items.lock().unwrap().push_front(cmd);
        self.notify.notify_one();
    }

    async fn pop(&self) -> Command {
        loop {
            // Register interest before checking, so a push between the
            // check and the await still wakes us.
            let notified = self.notify.notified();
            if let Some(cmd) = self.items.lock().unwrap().pop_front() {
                return cmd;
            }
            notified.await;
        }
    }
}

/// Session-scoped decode state: input name maps (first reply wins) and the
/// previous power flags used for edge detection.
#[derive(Default)]
struct Session {
    short_names: HashMap<String, String>,
    long_names: HashMap<String, String>,
    power: [bool; Zone::ALL.len()],
}

/// One live connection: the cancellation token shared by its reader and
/// writer tasks, and the task handles themselves.
struct Connection {
    cancel: CancellationToken,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Tear the connection down: cancel both loops, then reap them. Each
    /// step is independent so one stuck task cannot leak the other.
    async fn shutdown(self) {
        self.cancel.cancel();
        self.reader.abort();
        self.writer.abort();
        let _ = self.reader.await;
        let _ = self.writer.await;
    }
}

#[derive(Default)]
struct Scheduled {
    poll: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

struct Inner {
    config: ClientConfig,
    event_tx: mpsc::Sender<AvpEvent>,
    queue: CommandQueue,
    /// Connect and disconnect are mutually exclusive through this lock.
    conn: tokio::sync::Mutex<Option<Connection>>,
    session: Mutex<Session>,
    scheduled: Mutex<Scheduled>,
    disposed: AtomicBool,
    /// Cancelled on dispose; gates every deferred sleep and reconnect.
    disposal: CancellationToken,
}

/// Asynchronous control client for one device.
///
/// Maintains a persistent TCP session, delivers enqueued [`Command`]s to
/// the wire strictly in FIFO order with a fixed inter-command gap, parses
/// inbound frames inline on the reader task, and republishes decoded values
/// on the event channel obtained from [`subscribe`](AvpClient::subscribe).
pub struct AvpClient {
    inner: Arc<Inner>,
    event_rx: Option<mpsc::Receiver<AvpEvent>>,
}

impl AvpClient {
    /// Create a new client. No I/O happens until [`connect`](Self::connect).
    pub fn new(config: ClientConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(100);
        Self {
            inner: Arc::new(Inner {
                config,
                event_tx,
                queue: CommandQueue::default(),
                conn: tokio::sync::Mutex::new(None),
                session: Mutex::new(Session::default()),
                scheduled: Mutex::new(Scheduled::default()),
                disposed: AtomicBool::new(false),
                disposal: CancellationToken::new(),
            }),
            event_rx: Some(event_rx),
        }
    }

    /// Subscribe to events.
    ///
    /// This can only be called once. Returns `None` if already subscribed.
    pub fn subscribe(&mut self) -> Option<mpsc::Receiver<AvpEvent>> {
        self.event_rx.take()
    }

    /// Open the session: resolve and connect, spawn the reader and writer
    /// loops, and arm the keep-alive poll.
    ///
    /// Configuration problems (empty host, port 0, failed resolution) are
    /// reported as a configuration-error status and not retried; transient
    /// I/O failures are reported as a communication-error status and
    /// retried after the configured reconnect interval.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Close the session. Idempotent and safe to call from any state.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    /// Terminal teardown: cancels pending reconnects and deferred queries,
    /// disconnects, and refuses all further operations.
    pub async fn dispose(&self) {
        self.inner.dispose().await;
    }

    /// Turn a zone on or off.
    pub fn set_power(&self, zone: Zone, on: bool) -> Result<()> {
        self.send(if on {
            Command::power_on(zone)
        } else {
            Command::power_off(zone)
        })
    }

    /// Set a zone's volume in dB.
    pub fn set_volume(&self, zone: Zone, db: i32) -> Result<()> {
        if !(VOLUME_DB_MIN..=VOLUME_DB_MAX).contains(&db) {
            return Err(AvpError::invalid_parameter(format!(
                "volume {db} dB outside {VOLUME_DB_MIN}..={VOLUME_DB_MAX}"
            )));
        }
        self.send(Command::volume_set(zone, db))
    }

    /// Raise a zone's volume by `step` dB.
    pub fn volume_up(&self, zone: Zone, step: u32) -> Result<()> {
        Self::check_step(step)?;
        self.send(Command::volume_up(zone, step))
    }

    /// Lower a zone's volume by `step` dB.
    pub fn volume_down(&self, zone: Zone, step: u32) -> Result<()> {
        Self::check_step(step)?;
        self.send(Command::volume_down(zone, step))
    }

    /// Mute or unmute a zone.
    pub fn set_mute(&self, zone: Zone, on: bool) -> Result<()> {
        self.send(if on {
            Command::mute_on(zone)
        } else {
            Command::mute_off(zone)
        })
    }

    /// Select a zone's active input.
    pub fn select_input(&self, zone: Zone, input: u32) -> Result<()> {
        if !(1..=MAX_INPUT).contains(&input) {
            return Err(AvpError::invalid_parameter(format!(
                "input {input} outside 1..={MAX_INPUT}"
            )));
        }
        self.send(Command::input_select(zone, input))
    }

    /// Ask the device to report the current state of a zone channel; the
    /// decoded value arrives on the event channel.
    pub fn refresh(&self, zone: Zone, channel: Channel) -> Result<()> {
        self.send(match channel {
            Channel::Power => Command::power_query(zone),
            Channel::VolumeDb => Command::volume_query(zone),
            Channel::Mute => Command::mute_query(zone),
            Channel::ActiveInput
            | Channel::ActiveInputShortName
            | Channel::ActiveInputLongName => Command::input_query(zone),
        })
    }

    fn check_step(step: u32) -> Result<()> {
        if !(1..=99).contains(&step) {
            return Err(AvpError::invalid_parameter(format!(
                "volume step {step} outside 1..=99"
            )));
        }
        Ok(())
    }

    fn send(&self, cmd: Command) -> Result<()> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(AvpError::Disposed);
        }
        self.inner.queue.push(cmd);
        Ok(())
    }
}

impl Inner {
    async fn emit(&self, event: AvpEvent) {
        let _ = self.event_tx.send(event).await;
    }

    async fn emit_status(&self, status: ConnectionStatus) {
        self.emit(AvpEvent::Status(status)).await;
    }

    async fn publish(&self, update: Update) {
        self.emit(AvpEvent::Update(update)).await;
    }

    /// Non-blocking status emission for teardown paths.
    fn emit_status_now(&self, status: ConnectionStatus) {
        let _ = self.event_tx.try_send(AvpEvent::Status(status));
    }

    async fn connect(self: &Arc<Self>) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(AvpError::Disposed);
        }
        let mut conn = self.conn.lock().await;
        if let Some(stale) = conn.take() {
            stale.shutdown().await;
        }

        self.emit_status(ConnectionStatus::Connecting).await;

        if self.config.host.trim().is_empty() || self.config.port == 0 {
            return Err(self
                .configuration_failure("host and port must be configured")
                .await);
        }
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let resolved = match lookup_host(&addr).await {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                return Err(self
                    .configuration_failure(format!("cannot resolve {addr}: {e}"))
                    .await);
            }
        };
        let Some(sock_addr) = resolved else {
            return Err(self
                .configuration_failure(format!("{addr} resolves to no address"))
                .await);
        };

        let stream = match timeout(self.config.connect_timeout, TcpStream::connect(sock_addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.communication_failure(&e.to_string()).await;
                return Err(e.into());
            }
            Err(_) => {
                self.communication_failure("connection timeout").await;
                return Err(AvpError::ConnectionTimeout);
            }
        };
        if self.disposed.load(Ordering::SeqCst) {
            return Err(AvpError::Disposed);
        }
        stream.set_nodelay(true).ok();
        debug!(addr = %sock_addr, "connected");

        let (read_half, write_half) = stream.into_split();
        let cancel = CancellationToken::new();
        let reader = tokio::spawn(reader_loop(self.clone(), read_half, cancel.clone()));
        let writer = tokio::spawn(writer_loop(self.clone(), write_half, cancel.clone()));
        *conn = Some(Connection {
            cancel,
            reader,
            writer,
        });
        drop(conn);

        self.emit_status(ConnectionStatus::Online).await;
        self.arm_poll();
        Ok(())
    }

    /// Report a configuration error; no retry is scheduled.
    async fn configuration_failure(&self, msg: impl Into<String>) -> AvpError {
        let msg = msg.into();
        warn!(error = %msg, "configuration error");
        self.emit_status(ConnectionStatus::Offline(OfflineReason::ConfigurationError(
            msg.clone(),
        )))
        .await;
        AvpError::Configuration(msg)
    }

    /// Report a communication error and schedule a delayed reconnect.
    async fn communication_failure(self: &Arc<Self>, msg: &str) {
        warn!(error = %msg, "communication error");
        self.emit_status(ConnectionStatus::Offline(OfflineReason::CommunicationError(
            msg.to_string(),
        )))
        .await;
        self.spawn_reconnect(self.config.reconnect_interval);
    }

    async fn disconnect(&self) {
        {
            let mut scheduled = self.scheduled.lock().unwrap();
            if let Some(poll) = scheduled.poll.take() {
                poll.abort();
            }
            if let Some(reconnect) = scheduled.reconnect.take() {
                reconnect.abort();
            }
        }
        let mut conn = self.conn.lock().await;
        if let Some(connection) = conn.take() {
            debug!("disconnecting");
            connection.shutdown().await;
        }
    }

    async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.disposal.cancel();
        self.disconnect().await;
        *self.session.lock().unwrap() = Session::default();
        self.emit_status_now(ConnectionStatus::Offline(OfflineReason::None));
    }

    /// Schedule one reconnect (full disconnect, then connect) after `delay`.
    /// While sleeping, the task is cancellable through `disconnect()`; once
    /// it starts reconnecting it detaches and runs to completion, guarded
    /// by the disposal token.
    fn spawn_reconnect(self: &Arc<Self>, delay: Duration) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let mut scheduled = self.scheduled.lock().unwrap();
        if scheduled
            .reconnect
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            trace!("reconnect already pending");
            return;
        }
        let inner = self.clone();
        scheduled.reconnect = Some(tokio::spawn(async move {
            tokio::select! {
                _ = inner.disposal.cancelled() => return,
                _ = sleep(delay) => {}
            }
            // Detach so the disconnect below cannot abort this very task.
            inner.scheduled.lock().unwrap().reconnect.take();
            inner.disconnect().await;
            if let Err(e) = inner.connect().await {
                debug!(error = %e, "reconnect attempt failed");
            }
        }));
    }

    /// Arm the recurring keep-alive poll, unless already armed.
    fn arm_poll(self: &Arc<Self>) {
        let mut scheduled = self.scheduled.lock().unwrap();
        if scheduled
            .poll
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            return;
        }
        let inner = self.clone();
        scheduled.poll = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + POLL_INITIAL_DELAY, POLL_PERIOD);
            loop {
                tokio::select! {
                    _ = inner.disposal.cancelled() => return,
                    _ = ticker.tick() => inner.poll(),
                }
            }
        }));
    }

    /// Keep-alive heartbeat: query power for every zone. Also detects
    /// power changes made at the device itself.
    fn poll(&self) {
        trace!("polling zone power state");
        for zone in Zone::ALL {
            self.queue.push(Command::power_query(zone));
        }
    }

    /// Dispatch one decoded frame: publish events, track power edges,
    /// maintain the input name maps, and fan out metadata queries.
    async fn handle_decoded(self: &Arc<Self>, decoded: Decoded) {
        match decoded {
            Decoded::ZoneState { zone, state } => match state {
                ZoneState::Power(on) => {
                    self.check_power_status_change(zone, on);
                    self.publish(Update::state(zone, Channel::Power, Value::Switch(on)))
                        .await;
                }
                ZoneState::Volume(db) => {
                    self.publish(Update::state(zone, Channel::VolumeDb, Value::Decibel(db)))
                        .await;
                }
                ZoneState::Mute(on) => {
                    self.publish(Update::state(zone, Channel::Mute, Value::Switch(on)))
                        .await;
                }
                ZoneState::ActiveInput(input) => {
                    self.publish(Update::state(zone, Channel::ActiveInput, Value::Number(input)))
                        .await;
                    let key = format!("{input:02}");
                    let (short, long) = {
                        let session = self.session.lock().unwrap();
                        (
                            session.short_names.get(&key).cloned(),
                            session.long_names.get(&key).cloned(),
                        )
                    };
                    if let Some(name) = short {
                        self.publish(Update::state(
                            zone,
                            Channel::ActiveInputShortName,
                            Value::Text(name),
                        ))
                        .await;
                    }
                    if let Some(name) = long {
                        self.publish(Update::state(
                            zone,
                            Channel::ActiveInputLongName,
                            Value::Text(name),
                        ))
                        .await;
                    }
                }
            },
            Decoded::Info { property, value } => {
                self.publish(Update::Property { property, value }).await;
            }
            Decoded::InputCount { count, value } => {
                self.publish(Update::property(Property::NumAvailableInputs, value))
                    .await;
                self.query_input_names(count);
            }
            Decoded::InputShortName { index, name } => {
                // First reply wins for the lifetime of the session.
                self.session
                    .lock()
                    .unwrap()
                    .short_names
                    .entry(index)
                    .or_insert(name);
            }
            Decoded::InputLongName { index, name } => {
                self.session
                    .lock()
                    .unwrap()
                    .long_names
                    .entry(index)
                    .or_insert(name);
            }
            Decoded::DeviceError(text) => {
                warn!(error = %text, "device reported an error");
            }
        }
    }

    /// Queue short and long name queries for every available input. The
    /// count comes off the wire, so anything beyond the selectable input
    /// range is clamped to keep the fan-out bounded.
    fn query_input_names(&self, count: u32) {
        if count > MAX_INPUT {
            warn!(count, max = MAX_INPUT, "implausible input count, clamping fan-out");
        }
        let count = count.min(MAX_INPUT);
        debug!(count, "querying input names");
        for input in 1..=count {
            self.queue.push(Command::input_short_name_query(input));
            self.queue.push(Command::input_long_name_query(input));
        }
    }

    /// Track a zone's power flag and, on a false-to-true edge only,
    /// schedule the information refresh for that zone. The flag itself is
    /// updated on every report regardless of direction.
    fn check_power_status_change(self: &Arc<Self>, zone: Zone, on: bool) {
        let was_on = {
            let mut session = self.session.lock().unwrap();
            std::mem::replace(&mut session.power[zone.index()], on)
        };
        if on && !was_on {
            debug!(%zone, "power-on edge, scheduling information refresh");
            let inner = self.clone();
            tokio::spawn(async move {
                inner.refresh_device_info(zone).await;
            });
        }
    }

    /// Post-power-on cascade: input count, device identification, volume
    /// and mute for the zone; then, once the name replies have had time to
    /// populate the maps, the active input. The delayed active-input query
    /// dies with the connection it was scheduled on.
    async fn refresh_device_info(&self, zone: Zone) {
        self.queue.push(Command::input_count_query());
        self.queue.push(Command::model_query());
        self.queue.push(Command::region_query());
        self.queue.push(Command::software_version_query());
        self.queue.push(Command::software_build_date_query());
        self.queue.push(Command::hardware_version_query());
        self.queue.push(Command::mac_address_query());
        self.queue.push(Command::volume_query(zone));
        self.queue.push(Command::mute_query(zone));

        let cancel = {
            let conn = self.conn.lock().await;
            match conn.as_ref() {
                Some(connection) => connection.cancel.clone(),
                None => return,
            }
        };
        tokio::select! {
            _ = self.disposal.cancelled() => return,
            _ = cancel.cancelled() => return,
            _ = sleep(ACTIVE_INPUT_QUERY_DELAY) => {}
        }
        self.queue.push(Command::input_query(zone));
    }
}

/// Reader loop: byte stream to frames to parser to dispatch, strictly in
/// arrival order. Read failures surface a status only; recovery belongs to
/// the writer and poll path.
async fn reader_loop(inner: Arc<Inner>, read_half: OwnedReadHalf, cancel: CancellationToken) {
    let mut frames = FramedRead::new(read_half, AsciiCodec::new());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("reader loop cancelled");
                inner.emit_status_now(ConnectionStatus::Offline(OfflineReason::Interrupted));
                return;
            }
            next = frames.next() => match next {
                Some(Ok(frame)) => {
                    trace!(frame = frame.trim_end(), "frame received");
                    if let Some(decoded) = parse_frame(&frame) {
                        inner.handle_decoded(decoded).await;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "read failed");
                    inner
                        .emit_status(ConnectionStatus::Offline(
                            OfflineReason::CommunicationError(e.to_string()),
                        ))
                        .await;
                    return;
                }
                None => {
                    warn!("connection closed by device");
                    inner
                        .emit_status(ConnectionStatus::Offline(
                            OfflineReason::CommunicationError(
                                "connection closed by device".to_string(),
                            ),
                        ))
                        .await;
                    return;
                }
            }
        }
    }
}

/// Writer loop: drain the command queue in FIFO order with the configured
/// gap between commands. A failed write restores the command to the front
/// of the queue and triggers one full reconnect; the next writer picks the
/// restored command up first.
async fn writer_loop(inner: Arc<Inner>, write_half: OwnedWriteHalf, cancel: CancellationToken) {
    let mut sink = FramedWrite::new(write_half, AsciiCodec::new());
    loop {
        let cmd = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("writer loop cancelled");
                inner.emit_status_now(ConnectionStatus::Offline(OfflineReason::Interrupted));
                return;
            }
            cmd = inner.queue.pop() => cmd,
        };
        trace!(command = %cmd, "sending command");
        if let Err(e) = sink.send(cmd.clone()).await {
            warn!(error = %e, command = %cmd, "write failed, re-queueing and reconnecting");
            inner.queue.push_front(cmd);
            inner
                .emit_status(ConnectionStatus::Offline(OfflineReason::CommunicationError(
                    e.to_string(),
                )))
                .await;
            inner.spawn_reconnect(Duration::ZERO);
            return;
        }
        // Throttle the device's receive buffer between commands.
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("writer loop cancelled");
                inner.emit_status_now(ConnectionStatus::Offline(OfflineReason::Interrupted));
                return;
            }
            _ = sleep(inner.config.command_delay) => {}
        }
    }
}
