//! One prompt/answer cycle: open the stream, type it out, wind down.
//!
//! Ingestion and rendering run as two futures joined on the caller's task,
//! sharing nothing but the [`CharQueue`]. When ingestion ends (sentinel,
//! EOF, error or stop) the session settles briefly, waits a bounded time
//! for the queue to drain, then stops the renderer and waits for its
//! current character to finish.

use std::future::Future;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::client::{ChatClient, ChatRequest};
use crate::config::Config;
use crate::display::DisplaySurface;
use crate::error::SessionError;
use crate::pager::{Pager, RenderStats};
use crate::queue::CharQueue;
use crate::shutdown::{ShutdownCoordinator, ShutdownHandle};
use crate::source::{ByteSource, VecSource};
use crate::stream::{report_connection_error, EndReason, IngestReport, Orchestrator};

/// Summary of a session that did not fail on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub ended_by: EndReason,
    pub fragments: u64,
    pub chars_enqueued: u64,
    /// Characters lost to queue overflow.
    pub chars_evicted: u64,
    pub parse_errors: u64,
    pub render: RenderStats,
}

/// Owns the panel across prompts and runs one session at a time.
pub struct Session<S> {
    config: Config,
    pager: Pager<S>,
    stop: ShutdownCoordinator,
    client: Option<ChatClient>,
}

impl<S: DisplaySurface> Session<S> {
    pub fn new(config: Config, surface: S) -> Self {
        let pager = Pager::from_config(surface, &config.display);
        Self {
            config,
            pager,
            stop: ShutdownCoordinator::new(),
            client: None,
        }
    }

    pub fn pager(&self) -> &Pager<S> {
        &self.pager
    }

    /// Handle for raising the stop signal while a session is running.
    pub fn stop_handle(&self) -> ShutdownHandle {
        self.stop.handle()
    }

    /// Stop ingestion; the running session drains and returns.
    ///
    /// The signal is sticky: later sessions end immediately as `Stopped`.
    pub fn shutdown(&self) {
        self.stop.signal();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_shutting_down()
    }

    /// Blank the panel, e.g. before a new prompt.
    pub fn clear_display(&mut self) {
        self.pager.clear();
    }

    /// Ask `prompt` and render the streamed answer.
    ///
    /// Network failures are rendered as a message on the panel and then
    /// returned once the session has wound down.
    pub async fn start_session(&mut self, prompt: &str) -> Result<SessionOutcome, SessionError> {
        let request = ChatRequest::for_prompt(&self.config, prompt);
        let stop = self.stop.handle();

        let client = match self.client.take() {
            Some(client) => Ok(client),
            None => ChatClient::new(&self.config),
        };

        match client {
            Ok(client) => {
                let open = client.open(&request);
                let result = run_pipeline(&self.config, &mut self.pager, &stop, open).await;
                self.client = Some(client);
                result
            }
            Err(err) => {
                let open = std::future::ready(Err::<VecSource, _>(err));
                run_pipeline(&self.config, &mut self.pager, &stop, open).await
            }
        }
    }

    /// Render an already open byte source through the same pipeline.
    pub async fn run_source<B: ByteSource>(
        &mut self,
        source: B,
    ) -> Result<SessionOutcome, SessionError> {
        let stop = self.stop.handle();
        let open = std::future::ready(Ok(source));
        run_pipeline(&self.config, &mut self.pager, &stop, open).await
    }
}

async fn run_pipeline<S, B, F>(
    config: &Config,
    pager: &mut Pager<S>,
    stop: &ShutdownHandle,
    open: F,
) -> Result<SessionOutcome, SessionError>
where
    S: DisplaySurface,
    B: ByteSource,
    F: Future<Output = Result<B, SessionError>>,
{
    let span = tracing::info_span!("session", id = %Uuid::new_v4());

    async move {
        let queue = CharQueue::with_policy(config.stream.queue_capacity, config.stream.overflow);
        let renderer = ShutdownCoordinator::new();
        let renderer_stop = renderer.handle();
        pager.reset();
        tracing::info!(
            capacity = queue.capacity(),
            policy = ?queue.policy(),
            "session started"
        );

        let ingestion = async {
            let result = ingest(config, &queue, stop, open).await;
            wind_down(config, &queue, stop, &renderer).await;
            result
        };

        let (result, render) = tokio::join!(ingestion, pager.run(&queue, &renderer_stop));

        let chars_evicted = queue.evicted();
        tracing::info!(
            drawn = render.drawn,
            skipped = render.skipped,
            pages = render.pages,
            evicted = chars_evicted,
            "session finished"
        );

        match result {
            Ok(report) => Ok(SessionOutcome {
                ended_by: report.ended_by,
                fragments: report.fragments,
                chars_enqueued: report.chars_enqueued,
                chars_evicted,
                parse_errors: report.parse_errors,
                render,
            }),
            Err(err) => {
                tracing::error!(error_type = err.error_type(), error = %err, "session failed");
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

async fn ingest<B, F>(
    config: &Config,
    queue: &CharQueue,
    stop: &ShutdownHandle,
    open: F,
) -> Result<IngestReport, SessionError>
where
    B: ByteSource,
    F: Future<Output = Result<B, SessionError>>,
{
    let opened = tokio::select! {
        biased;
        _ = stop.wait() => None,
        opened = open => Some(opened),
    };

    let mut source = match opened {
        Some(Ok(source)) => source,
        Some(Err(err)) => {
            report_connection_error(queue);
            return Err(err);
        }
        None => {
            tracing::info!("stopped before the stream opened");
            return Ok(IngestReport::empty(EndReason::Stopped));
        }
    };

    Orchestrator::new(config.stream.read_chunk_size)
        .run(&mut source, queue, stop)
        .await
}

async fn wind_down(
    config: &Config,
    queue: &CharQueue,
    stop: &ShutdownHandle,
    renderer: &ShutdownCoordinator,
) {
    if !stop.is_shutting_down() {
        tracing::debug!(settle_ms = config.stream.settle_ms, "settling");
        tokio::time::sleep(Duration::from_millis(config.stream.settle_ms)).await;
    }

    let poll = Duration::from_millis(config.display.drain_poll_ms.max(1));
    let timeout = Duration::from_millis(config.display.drain_timeout_ms);
    if !queue.wait_until_empty(poll, timeout).await {
        tracing::warn!(remaining = queue.len(), "drain timed out, dropping the rest");
    }

    tracing::debug!("stopping renderer");
    renderer.signal();
}
