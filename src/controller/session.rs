//! Asynchronous driver of a viewer.
//!
//! A [`ViewerSession`] runs each load of a [`ViewerController`] as its own
//! `tokio` task: the bytes are fetched from a [`VolumeSource`] and decoded on
//! the blocking thread pool, and the outcome comes back over a channel. The
//! controller itself is only ever touched by the session's owner, so no
//! locking is involved. Superseded loads are aborted, and their results
//! discarded should they arrive anyway.
//!
//! [`ViewerSession`]: struct.ViewerSession.html
//! [`ViewerController`]: ../struct.ViewerController.html
//! [`VolumeSource`]: ../../source/trait.VolumeSource.html

use super::{Channel, ChannelState, LoadTicket, ViewerController};
use crate::config::{SamplingParams, ViewerOptions};
use crate::error::{NiftiError, Result};
use crate::source::VolumeSource;
use crate::volume::Volume;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
struct Completion {
    channel: Channel,
    generation: u64,
    result: Result<Volume>,
}

/// A spawned load and the generation it delivers.
#[derive(Debug)]
struct Task {
    generation: u64,
    handle: JoinHandle<()>,
}

/// A viewer whose loads run in the background.
///
/// Must be used from within a `tokio` runtime.
///
/// # Example
///
/// ```no_run
/// use niiview::{FileSource, ViewerOptions, ViewerSession};
///
/// # async fn run() {
/// let source = FileSource::new()
///     .with_background("mni_2mm.nii.gz")
///     .with_overlay("emotion", "emotion.nii.gz");
/// let mut session = ViewerSession::new(source, &ViewerOptions::new().query("emotion"));
/// session.start();
/// session.settle().await;
/// let frame = session.controller().frame();
/// # }
/// ```
#[derive(Debug)]
pub struct ViewerSession<S> {
    controller: ViewerController,
    initial_query: Option<String>,
    source: Arc<S>,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    background_task: Option<Task>,
    overlay_task: Option<Task>,
}

impl<S: VolumeSource> ViewerSession<S> {
    /// Create a session. Nothing is fetched until [`start`](#method.start).
    pub fn new(source: S, options: &ViewerOptions) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        ViewerSession {
            controller: ViewerController::new(options),
            initial_query: options.get_query().map(str::to_string),
            source: Arc::new(source),
            sender,
            receiver,
            background_task: None,
            overlay_task: None,
        }
    }

    /// Start loading the background, and the overlay of the initial query.
    pub fn start(&mut self) {
        let ticket = self.controller.request_background();
        self.spawn(ticket);
        if let Some(query) = self.initial_query.take() {
            self.set_query(Some(query));
        }
    }

    /// Load the background again.
    pub fn reload_background(&mut self) {
        let ticket = self.controller.request_background();
        self.spawn(ticket);
    }

    /// Change the overlay query, fetching the new overlay if needed.
    pub fn set_query<Q: Into<String>>(&mut self, query: Option<Q>) {
        let ticket = self.controller.set_query(query);
        self.follow_overlay(ticket);
    }

    /// Change the overlay sampling parameters, fetching the new overlay if
    /// needed.
    pub fn set_sampling(&mut self, sampling: SamplingParams) {
        let ticket = self.controller.set_sampling(sampling);
        self.follow_overlay(ticket);
    }

    fn follow_overlay(&mut self, ticket: Option<LoadTicket>) {
        match ticket {
            Some(ticket) => self.spawn(ticket),
            None if self.controller.query().is_none() => {
                if let Some(task) = self.overlay_task.take() {
                    task.handle.abort();
                }
            }
            None => {}
        }
    }

    fn spawn(&mut self, ticket: LoadTicket) {
        let channel = ticket.channel();
        let generation = ticket.generation();
        let fetch = self.source.fetch(ticket.request());
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            let result = match fetch.await {
                Ok(bytes) => tokio::task::spawn_blocking(move || Volume::from_bytes(&bytes))
                    .await
                    .unwrap_or_else(|e| Err(NiftiError::Io(io::Error::new(io::ErrorKind::Other, e)))),
                Err(e) => Err(e),
            };
            // the session may be gone
            let _ = sender.send(Completion {
                channel,
                generation,
                result,
            });
        });
        let previous = self.task_mut(channel).replace(Task {
            generation,
            handle: task,
        });
        if let Some(previous) = previous {
            debug!(?channel, generation = previous.generation, "aborting superseded load");
            previous.handle.abort();
        }
    }

    fn task_mut(&mut self, channel: Channel) -> &mut Option<Task> {
        match channel {
            Channel::Background => &mut self.background_task,
            Channel::Overlay => &mut self.overlay_task,
        }
    }

    /// Whether the current load of a channel runs as one of this session's
    /// tasks.
    fn in_flight(&self, channel: Channel) -> bool {
        let task = match channel {
            Channel::Background => &self.background_task,
            Channel::Overlay => &self.overlay_task,
        };
        *self.controller.state(channel) == ChannelState::Loading
            && task
                .as_ref()
                .map_or(false, |t| t.generation == self.controller.generation(channel))
    }

    fn apply(&mut self, completion: Completion) -> bool {
        let Completion {
            channel,
            generation,
            result,
        } = completion;
        let task = self.task_mut(channel);
        if task.as_ref().map_or(false, |t| t.generation == generation) {
            *task = None;
        }
        self.controller.complete(channel, generation, result)
    }

    /// Wait for the next load to finish and apply it. Returns whether the
    /// result was current.
    pub async fn next_completion(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(completion) => self.apply(completion),
            // unreachable while the session holds a sender
            None => false,
        }
    }

    /// Apply every load which already finished, without waiting. Returns
    /// the number of results applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until no load spawned by this session is in flight.
    ///
    /// A load started on the controller directly, through
    /// [`controller_mut`](#method.controller_mut), has no task behind it:
    /// its channel stays loading and is not waited for.
    pub async fn settle(&mut self) {
        while self.in_flight(Channel::Background) || self.in_flight(Channel::Overlay) {
            let _ = self.next_completion().await;
        }
    }

    /// The viewer state.
    pub fn controller(&self) -> &ViewerController {
        &self.controller
    }

    /// Mutable access to the viewer state, for navigation and compositing
    /// settings.
    ///
    /// Loads must go through the session. The session does not fetch
    /// anything for tickets requested here, so their channel stays loading
    /// until the ticket is completed by hand.
    pub fn controller_mut(&mut self) -> &mut ViewerController {
        &mut self.controller
    }

    /// The volume source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(feature = "http")]
impl ViewerSession<crate::source::HttpSource> {
    /// Download address of the current overlay, if there is a query.
    pub fn overlay_url(&self) -> Option<reqwest::Url> {
        let request = self.controller.overlay_request()?;
        self.source.url_for(&request).ok()
    }
}

impl<S> Drop for ViewerSession<S> {
    fn drop(&mut self) {
        for task in self.background_task.iter().chain(self.overlay_task.iter()) {
            task.handle.abort();
        }
    }
}
