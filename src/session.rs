use tokio::sync::mpsc;

use crate::{
    define_event_multiplexer, ChannelAdapter, ChannelMode, CommandChannel, CommandError,
    ConfigError, ConnectionLifecycle, ConnectionState, ImageSaved, IndiEvent, JobPhase,
    JobPhaseInference, LifecycleUpdate, LinkError, PhaseUpdate, PollDisposition, PollResult,
    PresentationSink, PropertyTree, PushEvent, Reconciler, SessionConfig, SinkUpdate,
    SnapshotSource, StatusMessage, TreeChange, UpstreamLink,
};

/// Asks the server to (re)send every property definition.
pub const GET_PROPERTIES: &str = r#"<getProperties version="1.7"/>"#;

/// User level requests fed into a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionControl {
    Connect(String),
    Disconnect,
    /// Send `getProperties` and start live refresh.
    Refresh,
    StopRefresh,
    SendCommand(String),
    RestartJob,
    Shutdown,
}

define_event_multiplexer! {
    #[derive(Debug)]
    pub enum SessionInput {
        Push(PushEvent) => push,
        Poll(PollResult) => poll,
        ImageSaved(ImageSaved) => image_saved,
        Control(SessionControl) => control,
    }
}

/// Everything that lives for one connection to an INDI server: the mirrored
/// tree, the job phase memory and the polling timer.
///
/// Handlers take `&mut self` and run one at a time, so the tree is only ever
/// touched by one of them. Disconnecting resets everything derived from the
/// link.
pub struct ConnectionSession<S, K> {
    config: SessionConfig,
    lifecycle: ConnectionLifecycle,
    tree: PropertyTree,
    reconciler: Reconciler,
    job: JobPhaseInference,
    channel: ChannelAdapter<S>,
    sink: K,
    polling_reported: bool,
    last_saved_path: Option<String>,
}

impl<S, K> ConnectionSession<S, K>
where
    S: SnapshotSource + Clone,
    K: PresentationSink,
{
    /// Returns the session and the receiver its poll results arrive on.
    pub fn new(
        config: SessionConfig,
        source: S,
        sink: K,
    ) -> Result<(Self, mpsc::Receiver<PollResult>), ConfigError> {
        let job = JobPhaseInference::new(&config.camera)?;
        let (channel, poll_rx) = ChannelAdapter::new(
            source,
            config.poll_interval_duration(),
            config.channel_size,
        );
        Ok((
            Self {
                config,
                lifecycle: ConnectionLifecycle::new(),
                tree: PropertyTree::new(),
                reconciler: Reconciler::new(),
                job,
                channel,
                sink,
                polling_reported: false,
                last_saved_path: None,
            },
            poll_rx,
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tree(&self) -> &PropertyTree {
        &self.tree
    }

    pub fn phase(&self) -> &JobPhase {
        self.job.phase()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    pub fn mode(&self) -> ChannelMode {
        self.channel.mode()
    }

    pub fn is_polling(&self) -> bool {
        self.channel.is_polling()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn mark_connected(&mut self) {
        if let LifecycleUpdate::Changed { to, .. } = self.lifecycle.mark_connected() {
            self.sink.publish(SinkUpdate::Connection(to));
        }
    }

    /// Tears down everything derived from the link, whatever the previous state was.
    pub fn mark_disconnected(&mut self) {
        if let LifecycleUpdate::Changed { to, .. } = self.lifecycle.mark_disconnected() {
            self.sink.publish(SinkUpdate::Connection(to));
        }
        self.channel.stop_polling();
        self.report_polling();
        let had_content = !self.tree.is_empty();
        self.tree.clear();
        if had_content {
            self.sink.publish(SinkUpdate::Tree(TreeChange::Cleared));
        }
        self.last_saved_path = None;
        let update = self.job.reset();
        self.publish_phase(update);
    }

    pub fn handle_push_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::Connected => self.mark_connected(),
            PushEvent::Disconnected => {
                log::info!("INDI server disconnected.");
                self.mark_disconnected();
            }
            PushEvent::Error(err) => {
                log::warn!("Push channel failed: {}", err);
                self.sink.publish(SinkUpdate::Status(StatusMessage::error(err)));
                self.mark_disconnected();
            }
            PushEvent::Message(event) => self.apply_event(event),
        }
    }

    /// Reconciles one event into the tree, notifies the sink about every change
    /// and recomputes the job phase when a camera device actually changed.
    /// Snapshots always recompute.
    pub fn apply_event(&mut self, event: IndiEvent) {
        if !self.lifecycle.is_connected() {
            log::debug!("Not connected, dropping event {:?}", event);
            return;
        }
        let is_snapshot = matches!(event, IndiEvent::Snapshot(_));
        let changes = self.reconciler.handle_event(event, &mut self.tree);
        let recompute = is_snapshot
            || changes
                .iter()
                .any(|c| c.device().is_some_and(|d| self.job.affects(d)));
        for change in changes {
            self.sink.publish(SinkUpdate::Tree(change));
        }
        if recompute {
            let update = self.job.recompute(&self.tree);
            self.publish_phase(update);
        }
    }

    pub fn handle_poll_result(&mut self, result: PollResult) {
        let disposition = self.channel.classify(result);
        self.report_polling();
        match disposition {
            PollDisposition::Apply(snapshot) => {
                if !self.lifecycle.is_connected() {
                    log::debug!("Not connected, dropping poll snapshot");
                    return;
                }
                let saved = snapshot.last_saved_image_path;
                self.apply_event(IndiEvent::Snapshot(snapshot.devices));
                if let Some(path) = saved {
                    if self.last_saved_path.as_deref() != Some(path.as_str()) {
                        self.handle_image_saved(ImageSaved::new(path));
                    }
                }
            }
            PollDisposition::LinkDown => {
                log::warn!("Poll reports the INDI link as down");
                self.mark_disconnected();
            }
            PollDisposition::Failed(err) => {
                log::error!("Failed to fetch device data: {}", err);
                self.sink
                    .publish(SinkUpdate::Status(StatusMessage::error(err.to_string())));
                self.mark_disconnected();
            }
        }
    }

    pub fn handle_image_saved(&mut self, saved: ImageSaved) {
        if !self.lifecycle.is_connected() {
            log::debug!("Not connected, ignoring saved image {}", saved.path);
            return;
        }
        log::info!("Image saved: {}", saved.path);
        self.last_saved_path = Some(saved.path.clone());
        let update = self.job.image_saved(saved.path);
        self.publish_phase(update);
    }

    /// Clears a sticky `Saved` phase so the next exposure shows up.
    pub fn restart_job(&mut self) {
        let update = self.job.restart(&self.tree);
        self.publish_phase(update);
    }

    /// Starts live refresh. Only one timer ever runs; polling a dead link is refused.
    pub fn start_polling(&mut self) -> bool {
        if !self.lifecycle.is_connected() {
            log::debug!("Not connected, not starting polling");
            return false;
        }
        let started = self.channel.start_polling();
        self.report_polling();
        started
    }

    pub fn stop_polling(&mut self) -> bool {
        let stopped = self.channel.stop_polling();
        self.report_polling();
        stopped
    }

    /// Pulls one snapshot right away, outside the timer.
    pub async fn poll_now(&mut self) {
        let result = self.channel.poll_once().await;
        self.handle_poll_result(result);
    }

    pub async fn refresh<C: CommandChannel>(&mut self, commands: &C) {
        let _ = self.send_command(commands, GET_PROPERTIES).await;
        self.start_polling();
    }

    pub fn stop_refresh(&mut self) {
        if self.stop_polling() {
            self.sink.publish(SinkUpdate::Status(StatusMessage::success(
                "Live refresh stopped by user.",
            )));
        }
    }

    /// Sends an opaque payload upstream. The outcome is reported to the sink;
    /// the tree is never touched.
    pub async fn send_command<C: CommandChannel>(
        &mut self,
        commands: &C,
        payload: &str,
    ) -> Result<(), CommandError> {
        let result = if !self.lifecycle.is_connected() {
            Err(CommandError::NotConnected)
        } else if payload.trim().is_empty() {
            Err(CommandError::EmptyCommand)
        } else {
            commands.send_command(payload).await
        };
        match &result {
            Ok(()) => self.sink.publish(SinkUpdate::Status(StatusMessage::success(
                "Command sent successfully",
            ))),
            Err(err) => {
                log::warn!("{}", err);
                self.sink
                    .publish(SinkUpdate::Status(StatusMessage::error(err.to_string())));
            }
        }
        result
    }

    pub async fn connect<L: UpstreamLink>(&mut self, link: &L, host: &str) -> Result<(), LinkError> {
        let host = host.trim();
        let result = if host.is_empty() {
            Err(LinkError::MissingHost)
        } else {
            link.connect(host).await
        };
        match result {
            Ok(status) => {
                self.mark_connected();
                self.sink
                    .publish(SinkUpdate::Status(StatusMessage::success(status.message(host))));
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to connect to {}: {}", host, err);
                self.sink
                    .publish(SinkUpdate::Status(StatusMessage::error(err.to_string())));
                self.mark_disconnected();
                Err(err)
            }
        }
    }

    pub async fn disconnect<L: UpstreamLink>(&mut self, link: &L) -> Result<(), LinkError> {
        let result = link.disconnect().await;
        match &result {
            Ok(()) => self
                .sink
                .publish(SinkUpdate::Status(StatusMessage::success("Disconnected"))),
            Err(err) => self
                .sink
                .publish(SinkUpdate::Status(StatusMessage::error(err.to_string()))),
        }
        self.mark_disconnected();
        result
    }

    /// Handles one input. Returns false once the session should stop.
    pub async fn handle_input<L>(&mut self, input: SessionInput, link: &L) -> bool
    where
        L: UpstreamLink + CommandChannel,
    {
        match input {
            SessionInput::Push(event) => self.handle_push_event(event),
            SessionInput::Poll(result) => self.handle_poll_result(result),
            SessionInput::ImageSaved(saved) => self.handle_image_saved(saved),
            SessionInput::Control(control) => match control {
                SessionControl::Connect(host) => {
                    let _ = self.connect(link, &host).await;
                }
                SessionControl::Disconnect => {
                    let _ = self.disconnect(link).await;
                }
                SessionControl::Refresh => self.refresh(link).await,
                SessionControl::StopRefresh => self.stop_refresh(),
                SessionControl::SendCommand(payload) => {
                    let _ = self.send_command(link, &payload).await;
                }
                SessionControl::RestartJob => self.restart_job(),
                SessionControl::Shutdown => return false,
            },
            SessionInput::Timeout => {}
            SessionInput::None => return false,
        }
        true
    }

    /// Runs the handler loop until a `Shutdown` control arrives, then tears the session down.
    pub async fn run<L>(&mut self, inputs: &mut SessionInputMultiPlexer, link: &L)
    where
        L: UpstreamLink + CommandChannel,
    {
        loop {
            // deserialized configs skip the builder clamp
            let input = inputs.next(self.config.event_timeout.max(1)).await;
            if !self.handle_input(input, link).await {
                break;
            }
        }
        log::trace!("Exiting session loop...");
        self.mark_disconnected();
    }

    /// Tells the sink when live refresh started or ended, including when the
    /// timer stopped itself on a dead link.
    fn report_polling(&mut self) {
        let active = self.channel.is_polling();
        if active != self.polling_reported {
            self.polling_reported = active;
            self.sink.publish(SinkUpdate::Polling(active));
        }
    }

    fn publish_phase(&mut self, update: PhaseUpdate) {
        if let PhaseUpdate::Changed { to, .. } = update {
            self.sink.publish(SinkUpdate::Phase(to));
        }
    }
}
