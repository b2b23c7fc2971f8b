/// Per-client playback sessions
///
/// Every client id owns one `PlaybackSession` driven by its own task. HTTP
/// handlers never touch a session directly: they send a command over the
/// session's channel and wait for the reply, so commands and transport
/// events for one client are applied strictly in arrival order.
use crate::error::{Result, ServerError};
use cadence_core::{
    storage::SnapshotStore,
    types::{Track, TrackId},
    Library,
};
use cadence_playback::{
    NullOutput, PlaybackConfig, PlaybackSession, QueueTrack, SessionEvent, SessionStatus,
    TransportEvent,
};
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Instant,
};
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};

const COMMAND_BUFFER: usize = 64;
const MAX_CLIENT_ID_LEN: usize = 128;

/// A state change requested by a client
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    Status,
    LoadQueue {
        track_ids: Vec<TrackId>,
        start_index: usize,
        shuffled: bool,
    },
    Play {
        track_id: TrackId,
        context: Option<Vec<TrackId>>,
    },
    Resume,
    Pause,
    Next,
    Previous,
    ToggleShuffle,
    CycleRepeat,
    Seek(f64),
    SetVolume(f32),
    Transport(TransportEvent),
}

impl PlayerAction {
    fn mutates(&self) -> bool {
        !matches!(self, Self::Status)
    }
}

/// Session state after a command, plus what changed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub status: SessionStatus,
    pub events: Vec<SessionEvent>,

    /// Set for transport events: `false` means stale and ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

enum Command {
    Apply {
        action: PlayerAction,
        reply: oneshot::Sender<Result<PlayerResponse>>,
    },
    Recent {
        limit: usize,
        reply: oneshot::Sender<Result<Vec<Track>>>,
    },
    Close {
        reply: oneshot::Sender<Result<()>>,
    },
}

struct SessionHandle {
    sender: mpsc::Sender<Command>,
    last_used: Instant,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    live: HashMap<String, SessionHandle>,

    /// Evicted actors that may still be draining queued commands
    retired: HashMap<String, JoinHandle<()>>,
}

/// Registry of live client sessions
pub struct SessionHost {
    sessions: Mutex<Registry>,
    library: Library,
    snapshots: Arc<dyn SnapshotStore>,
    config: PlaybackConfig,
    limit: usize,
}

impl SessionHost {
    pub fn new(
        library: Library,
        snapshots: Arc<dyn SnapshotStore>,
        config: PlaybackConfig,
        limit: usize,
    ) -> Self {
        Self {
            sessions: Mutex::new(Registry::default()),
            library,
            snapshots,
            config,
            limit: limit.max(1),
        }
    }

    /// Apply `action` to the session for `client_id`, starting it if needed
    pub async fn apply(&self, client_id: &str, action: PlayerAction) -> Result<PlayerResponse> {
        self.request(client_id, |reply| Command::Apply {
            action: action.clone(),
            reply,
        })
        .await
    }

    /// Up to `limit` recently played tracks, most recent first
    pub async fn recent(&self, client_id: &str, limit: usize) -> Result<Vec<Track>> {
        self.request(client_id, |reply| Command::Recent { limit, reply })
            .await
    }

    /// Tear the session down and forget its snapshot
    pub async fn close(&self, client_id: &str) -> Result<()> {
        let result = self
            .request(client_id, |reply| Command::Close { reply })
            .await;
        self.sessions.lock().await.live.remove(client_id);
        result
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.live.len()
    }

    async fn request<T, F>(&self, client_id: &str, make: F) -> Result<T>
    where
        F: Fn(oneshot::Sender<Result<T>>) -> Command,
    {
        validate_client_id(client_id)?;

        // A session whose task has exited gets one fresh start
        for _ in 0..2 {
            let sender = self.sender(client_id).await;
            let (reply_tx, reply_rx) = oneshot::channel();
            if sender.send(make(reply_tx)).await.is_err() {
                self.forget(client_id, &sender).await;
                continue;
            }
            return match reply_rx.await {
                Ok(result) => result,
                Err(_) => Err(ServerError::Internal(format!(
                    "Session {client_id} stopped before replying"
                ))),
            };
        }

        Err(ServerError::Internal(format!(
            "Session {client_id} is unavailable"
        )))
    }

    async fn sender(&self, client_id: &str) -> mpsc::Sender<Command> {
        let mut registry = self.sessions.lock().await;

        if let Some(handle) = registry.live.get_mut(client_id) {
            if !handle.sender.is_closed() {
                handle.last_used = Instant::now();
                return handle.sender.clone();
            }
        }

        registry.live.retain(|_, handle| !handle.sender.is_closed());
        registry.retired.retain(|_, task| !task.is_finished());
        while registry.live.len() >= self.limit {
            // State is persisted after every command, so eviction loses nothing
            let Some(oldest) = registry
                .live
                .iter()
                .min_by_key(|(_, handle)| handle.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            tracing::debug!(client_id = %oldest, "Evicting idle session");
            if let Some(handle) = registry.live.remove(&oldest) {
                registry.retired.insert(oldest, handle.task);
            }
        }

        // A replacement restores only after its predecessor's last write
        let predecessor = registry.retired.remove(client_id);

        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let actor = SessionActor {
            client_id: client_id.to_string(),
            session: PlaybackSession::new(self.config.clone(), Box::new(NullOutput::new())),
            library: self.library.clone(),
            snapshots: Arc::clone(&self.snapshots),
            restored: false,
        };
        let task = tokio::spawn(actor.run(predecessor, receiver));
        tracing::debug!(client_id = %client_id, "Started session");

        registry.live.insert(
            client_id.to_string(),
            SessionHandle {
                sender: sender.clone(),
                last_used: Instant::now(),
                task,
            },
        );
        sender
    }

    async fn forget(&self, client_id: &str, sender: &mpsc::Sender<Command>) {
        let mut registry = self.sessions.lock().await;
        if registry
            .live
            .get(client_id)
            .is_some_and(|handle| handle.sender.same_channel(sender))
        {
            registry.live.remove(client_id);
        }
    }
}

fn validate_client_id(client_id: &str) -> Result<()> {
    let valid = !client_id.is_empty()
        && client_id.len() <= MAX_CLIENT_ID_LEN
        && client_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ServerError::BadRequest("Invalid client id".to_string()))
    }
}

/// Owns one session; runs until closed or every sender is dropped
struct SessionActor {
    client_id: String,
    session: PlaybackSession,
    library: Library,
    snapshots: Arc<dyn SnapshotStore>,

    /// Persisted state is only overwritten once it has been loaded
    restored: bool,
}

impl SessionActor {
    async fn run(
        mut self,
        predecessor: Option<JoinHandle<()>>,
        mut commands: mpsc::Receiver<Command>,
    ) {
        if let Some(task) = predecessor {
            if let Err(e) = task.await {
                tracing::warn!(client_id = %self.client_id, "Evicted session ended abnormally: {}", e);
            }
        }
        match self.restore().await {
            Ok(()) => self.restored = true,
            Err(e) => {
                tracing::warn!(client_id = %self.client_id, "Failed to restore session: {}", e);
            }
        }

        while let Some(command) = commands.recv().await {
            match command {
                Command::Apply { action, reply } => {
                    let result = self.apply(action).await;
                    let _ = reply.send(result);
                }
                Command::Recent { limit, reply } => {
                    let _ = reply.send(self.recent(limit).await);
                }
                Command::Close { reply } => {
                    let _ = reply.send(self.close().await);
                    break;
                }
            }
        }

        tracing::debug!(client_id = %self.client_id, "Session stopped");
    }

    /// Rebuild from the persisted snapshot; never starts playback
    async fn restore(&mut self) -> Result<()> {
        let recent = self.snapshots.load_recent(&self.client_id).await?;
        self.session.restore_recent(recent);

        if let Some(snapshot) = self.snapshots.load_snapshot(&self.client_id).await? {
            let mut ids = snapshot.queue_track_ids.clone();
            ids.extend(snapshot.natural_track_ids.iter().cloned());
            ids.sort();
            ids.dedup();

            let tracks: HashMap<TrackId, QueueTrack> = self
                .library
                .catalog()
                .get_tracks(&ids)
                .await?
                .iter()
                .map(|t| (t.id.clone(), QueueTrack::from(t)))
                .collect();

            self.session
                .restore_snapshot(&snapshot, |id| tracks.get(id).cloned());
            tracing::debug!(
                client_id = %self.client_id,
                queued = self.session.queue().len(),
                "Restored session"
            );
        }

        self.session.drain_events();
        Ok(())
    }

    async fn apply(&mut self, action: PlayerAction) -> Result<PlayerResponse> {
        let persist = action.mutates();
        let mut accepted = None;

        match action {
            PlayerAction::Status => {}
            PlayerAction::LoadQueue {
                track_ids,
                start_index,
                shuffled,
            } => {
                let tracks = self.resolve_all(&track_ids).await?;
                self.session.load_queue(tracks, start_index, shuffled)?;
            }
            PlayerAction::Play { track_id, context } => {
                let track = QueueTrack::from(self.library.get_track(&track_id).await?);
                match context {
                    Some(ids) => {
                        let context = self.resolve_known(&ids).await?;
                        self.session.play_single(track, Some(context))?;
                    }
                    None if !self.session.queue().is_empty() => {
                        self.session.play(track)?;
                    }
                    None => {
                        let catalog: Vec<QueueTrack> = self
                            .library
                            .list_tracks()
                            .await?
                            .iter()
                            .map(QueueTrack::from)
                            .collect();
                        self.session.play_single(track, Some(catalog))?;
                    }
                }
            }
            PlayerAction::Resume => self.session.resume()?,
            PlayerAction::Pause => self.session.pause(),
            PlayerAction::Next => {
                self.session.next()?;
            }
            PlayerAction::Previous => {
                self.session.previous()?;
            }
            PlayerAction::ToggleShuffle => {
                self.session.toggle_shuffle();
            }
            PlayerAction::CycleRepeat => {
                self.session.cycle_repeat();
            }
            PlayerAction::Seek(position) => self.session.seek(position)?,
            PlayerAction::SetVolume(level) => {
                self.session.set_volume(level)?;
            }
            PlayerAction::Transport(event) => {
                accepted = Some(self.session.handle_transport(event)?);
            }
        }

        if persist {
            self.persist().await;
        }

        Ok(PlayerResponse {
            status: self.session.status(),
            events: self.session.drain_events(),
            accepted,
        })
    }

    async fn recent(&mut self, limit: usize) -> Result<Vec<Track>> {
        let ids = self.session.recent().recent_ids(limit).to_vec();
        let mut found: HashMap<TrackId, Track> = self
            .library
            .catalog()
            .get_tracks(&ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        Ok(self
            .session
            .recent()
            .get_recent(limit, |id| found.remove(id)))
    }

    async fn close(&mut self) -> Result<()> {
        self.session.close();
        self.session.drain_events();
        self.snapshots.clear_snapshot(&self.client_id).await?;
        if self.restored {
            self.snapshots
                .save_recent(&self.client_id, self.session.recent().ids())
                .await?;
        }
        tracing::debug!(client_id = %self.client_id, "Closed session");
        Ok(())
    }

    /// Every id must exist; repeated ids keep their positions
    async fn resolve_all(&self, ids: &[TrackId]) -> Result<Vec<QueueTrack>> {
        let tracks = self.library.resolve_tracks(ids).await?;
        let found: HashSet<&TrackId> = tracks.iter().map(|t| &t.id).collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(cadence_core::CoreError::not_found("Track", missing.as_str()).into());
        }
        Ok(tracks.iter().map(QueueTrack::from).collect())
    }

    /// Unknown ids are dropped
    async fn resolve_known(&self, ids: &[TrackId]) -> Result<Vec<QueueTrack>> {
        Ok(self
            .library
            .resolve_tracks(ids)
            .await?
            .iter()
            .map(QueueTrack::from)
            .collect())
    }

    /// The live session stays authoritative when the store is unavailable
    async fn persist(&self) {
        if !self.restored {
            tracing::warn!(client_id = %self.client_id, "Skipping save until the stored session loads");
            return;
        }
        let saved = match self.session.snapshot() {
            Some(snapshot) => {
                self.snapshots
                    .save_snapshot(&self.client_id, &snapshot)
                    .await
            }
            None => self.snapshots.clear_snapshot(&self.client_id).await,
        };
        if let Err(e) = saved {
            tracing::error!(client_id = %self.client_id, "Failed to save session snapshot: {}", e);
        }

        if let Err(e) = self
            .snapshots
            .save_recent(&self.client_id, self.session.recent().ids())
            .await
        {
            tracing::error!(client_id = %self.client_id, "Failed to save recently played: {}", e);
        }
    }
}
