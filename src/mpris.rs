//! MPRIS control surface over D-Bus.
//!
//! Interface methods never touch the coordinator: they send a [`ControlCmd`]
//! to the runtime, which owns the coordinator. Property reads come straight
//! from the shared [`SessionView`].

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::app::{SessionState, SessionView};
use crate::audio::PlaybackStatus;
use crate::library::Folder;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.cadenza";
const TRACK_PREFIX: &str = "/org/mpris/MediaPlayer2/track/";
const PLAYLIST_PREFIX: &str = "/org/mpris/MediaPlayer2/playlist/";
const NOTIFY_TICK: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds, may be negative.
    SeekBy(i64),
    SetPosition(Duration),
    SetVolume(f64),
    /// Step the volume by the configured `volume_step`.
    VolumeUp,
    VolumeDown,
    SetShuffle(bool),
    /// Index into the library's folder list.
    ActivateFolder(usize),
    ShowFolders,
    /// Forget the persisted folder and track index.
    ForgetFolder,
    ClearError,
}

/// Handle kept by the runtime to tell D-Bus clients that state changed.
pub struct MprisHandle {
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn notify_changed(&self) {
        let _ = self.notify.send(());
    }
}

pub fn playback_status_name(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "Playing",
        PlaybackStatus::Paused => "Paused",
        PlaybackStatus::Idle | PlaybackStatus::Stopped | PlaybackStatus::Error => "Stopped",
    }
}

fn object_path(path: String) -> OwnedObjectPath {
    OwnedObjectPath::try_from(path)
        .unwrap_or_else(|_| ObjectPath::from_static_str_unchecked("/").into())
}

pub fn track_path(index: usize) -> OwnedObjectPath {
    object_path(format!("{TRACK_PREFIX}{index}"))
}

pub fn playlist_path(index: usize) -> OwnedObjectPath {
    object_path(format!("{PLAYLIST_PREFIX}{index}"))
}

fn playlist_index(id: &str) -> Option<usize> {
    id.strip_prefix(PLAYLIST_PREFIX)?.parse().ok()
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

fn file_url(path: &std::path::Path) -> String {
    format!("file://{}", path.display())
}

fn insert<'a>(map: &mut HashMap<String, OwnedValue>, key: &str, value: impl Into<Value<'a>>) {
    if let Ok(v) = OwnedValue::try_from(value.into()) {
        map.insert(key.to_string(), v);
    }
}

/// MPRIS metadata for the current track; empty when nothing is selected.
pub fn metadata_for(state: &SessionState) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let (Some(index), Some(track)) = (state.current_index, state.current_track()) else {
        return map;
    };

    insert(&mut map, "mpris:trackid", track_path(index));
    insert(&mut map, "xesam:title", track.display_name.clone());
    if !track.artist.is_empty() {
        insert(&mut map, "xesam:artist", vec![track.artist.clone()]);
    }
    if !track.album.is_empty() {
        insert(&mut map, "xesam:album", track.album.clone());
    }
    insert(&mut map, "xesam:url", file_url(&track.path));
    let length = if state.duration.is_zero() {
        track.duration
    } else {
        state.duration
    };
    if !length.is_zero() {
        insert(&mut map, "mpris:length", micros(length));
    }
    if let Some(art) = &track.album_art {
        insert(&mut map, "mpris:artUrl", file_url(art));
    }
    map
}

/// `(id, name, icon)` triples for the folder list, as the Playlists interface wants them.
pub fn folder_playlists(folders: &[Folder]) -> Vec<(OwnedObjectPath, String, String)> {
    folders
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let icon = f.album_art.as_deref().map(file_url).unwrap_or_default();
            (playlist_path(i), f.display_name.clone(), icon)
        })
        .collect()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Headless: nothing to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "cadenza"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/flac", "audio/wav", "audio/ogg", "audio/opus", "audio/mp4"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    view: SessionView,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(offset));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.view.read(|s| s.current_index.map(track_path));
        if position < 0 || current.as_ref().map(|p| p.as_str()) != Some(track_id.as_str()) {
            return;
        }
        self.send(ControlCmd::SetPosition(Duration::from_micros(
            position.unsigned_abs(),
        )));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.view.read(|s| playback_status_name(s.status))
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        self.view.read(metadata_for)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        f64::from(self.view.read(|s| s.volume))
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        self.send(ControlCmd::SetVolume(value));
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.view.read(|s| s.shuffle)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        micros(self.view.read(|s| s.position))
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.view.read(SessionState::has_tracks)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.view.read(SessionState::has_tracks)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.view.read(|s| s.current_index.is_some())
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.view.read(SessionState::has_tracks)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.view.read(SessionState::has_tracks)
    }
}

/// Library folders exposed as playlists; activating one opens the folder.
struct PlaylistsIface {
    tx: Sender<ControlCmd>,
    view: SessionView,
}

#[interface(name = "org.mpris.MediaPlayer2.Playlists")]
impl PlaylistsIface {
    fn activate_playlist(&self, playlist_id: ObjectPath<'_>) {
        if let Some(index) = playlist_index(playlist_id.as_str()) {
            let _ = self.tx.send(ControlCmd::ActivateFolder(index));
        }
    }

    fn get_playlists(
        &self,
        index: u32,
        max_count: u32,
        _order: &str,
        reverse_order: bool,
    ) -> Vec<(OwnedObjectPath, String, String)> {
        let mut all = self.view.read(|s| folder_playlists(&s.folders));
        if reverse_order {
            all.reverse();
        }
        all.into_iter()
            .skip(index as usize)
            .take(max_count as usize)
            .collect()
    }

    #[zbus(property)]
    fn playlist_count(&self) -> u32 {
        self.view
            .read(|s| u32::try_from(s.folders.len()).unwrap_or(u32::MAX))
    }

    #[zbus(property)]
    fn orderings(&self) -> Vec<String> {
        vec!["Alphabetical".to_string()]
    }

    #[zbus(property)]
    fn active_playlist(&self) -> (bool, (OwnedObjectPath, String, String)) {
        self.view.read(|s| {
            let selected = s.selected_folder.as_ref().and_then(|path| {
                s.folders.iter().position(|f| &f.path == path)
            });
            match selected {
                Some(i) => {
                    let mut entry = folder_playlists(&s.folders[i..=i]);
                    let (_, name, icon) = entry.remove(0);
                    (true, (playlist_path(i), name, icon))
                }
                None => (false, (object_path("/".into()), String::new(), String::new())),
            }
        })
    }
}

async fn emit_changes(
    player: &InterfaceRef<PlayerIface>,
    playlists: &InterfaceRef<PlaylistsIface>,
) -> zbus::Result<()> {
    let emitter = player.signal_emitter();
    let iface = player.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.volume_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;

    let emitter = playlists.signal_emitter();
    let iface = playlists.get().await;
    iface.playlist_count_changed(emitter).await?;
    iface.active_playlist_changed(emitter).await
}

async fn serve(tx: Sender<ControlCmd>, view: SessionView, notify: Receiver<()>) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(
            OBJECT_PATH,
            PlayerIface {
                tx: tx.clone(),
                view: view.clone(),
            },
        )
        .await?;
    object_server
        .at(OBJECT_PATH, PlaylistsIface { tx, view })
        .await?;

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let playlists = object_server
        .interface::<_, PlaylistsIface>(OBJECT_PATH)
        .await?;
    tracing::info!(name = BUS_NAME, "MPRIS service registered");

    loop {
        Timer::after(NOTIFY_TICK).await;
        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(mpsc::TryRecvError::Empty) => break,
                // Runtime is gone.
                Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if changed {
            if let Err(e) = emit_changes(&player, &playlists).await {
                tracing::debug!("MPRIS change signal failed: {e}");
            }
        }
    }
}

/// Register the MPRIS interfaces on the session bus from a background thread.
/// Failure to reach the bus is logged; the player keeps running without it.
pub fn spawn_mpris(tx: Sender<ControlCmd>, view: SessionView) -> MprisHandle {
    let (notify, notify_rx) = mpsc::channel::<()>();

    let spawned = std::thread::Builder::new()
        .name("cadenza-mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, view, notify_rx)) {
                tracing::warn!("MPRIS unavailable: {e}");
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("failed to spawn MPRIS thread: {e}");
    }

    MprisHandle { notify }
}

#[cfg(test)]
mod tests;
