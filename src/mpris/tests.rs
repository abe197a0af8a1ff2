use super::*;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crate::test_support::track;

fn playing_state() -> SessionState {
    let mut first = track("/tmp/music/a/01.mp3");
    first.artist = "Test Artist".to_string();
    first.album = "Test Album".to_string();
    first.album_art = Some(PathBuf::from("/tmp/music/a/cover.jpg"));
    let second = track("/tmp/music/a/02.mp3");

    SessionState {
        tracks: vec![first, second],
        current_index: Some(0),
        status: PlaybackStatus::Playing,
        position: Duration::from_secs(3),
        duration: Duration::from_micros(1_234_567),
        selected_folder: Some(PathBuf::from("/tmp/music/a")),
        folders: vec![
            Folder {
                path: PathBuf::from("/tmp/music/a"),
                display_name: "a".into(),
                track_count: 2,
                album_art: Some(PathBuf::from("/tmp/music/a/cover.jpg")),
            },
            Folder {
                path: PathBuf::from("/tmp/music/b"),
                display_name: "b".into(),
                track_count: 4,
                album_art: None,
            },
        ],
        ..SessionState::default()
    }
}

fn player(state: SessionState) -> (PlayerIface, mpsc::Receiver<ControlCmd>) {
    let (tx, rx) = mpsc::channel();
    (
        PlayerIface {
            tx,
            view: SessionView::detached(state),
        },
        rx,
    )
}

#[test]
fn playback_status_maps_to_mpris_names() {
    assert_eq!(playback_status_name(PlaybackStatus::Playing), "Playing");
    assert_eq!(playback_status_name(PlaybackStatus::Paused), "Paused");
    assert_eq!(playback_status_name(PlaybackStatus::Idle), "Stopped");
    assert_eq!(playback_status_name(PlaybackStatus::Stopped), "Stopped");
    assert_eq!(playback_status_name(PlaybackStatus::Error), "Stopped");
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let map = metadata_for(&playing_state());
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
        "mpris:artUrl",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
    let length = i64::try_from(map["mpris:length"].clone()).unwrap();
    assert_eq!(length, 1_234_567);
    let title = String::try_from(map["xesam:title"].clone()).unwrap();
    assert_eq!(title, "01.mp3");
}

#[test]
fn metadata_is_empty_without_current_track() {
    let state = SessionState {
        current_index: None,
        ..playing_state()
    };
    assert!(metadata_for(&state).is_empty());
}

#[test]
fn metadata_skips_unknown_artist_and_album() {
    let state = SessionState {
        current_index: Some(1),
        ..playing_state()
    };
    let map = metadata_for(&state);
    assert!(!map.contains_key("xesam:artist"));
    assert!(!map.contains_key("xesam:album"));
    assert!(!map.contains_key("mpris:artUrl"));
}

#[test]
fn player_methods_only_send_commands() {
    let (iface, rx) = player(playing_state());
    iface.play_pause();
    iface.next();
    iface.previous();
    iface.seek(-5_000_000);
    iface.stop();

    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Next,
            ControlCmd::Prev,
            ControlCmd::SeekBy(-5_000_000),
            ControlCmd::Stop,
        ]
    );
}

#[test]
fn property_setters_forward_to_runtime() {
    let (mut iface, rx) = player(playing_state());
    iface.set_volume(0.25);
    iface.set_shuffle(true);
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![ControlCmd::SetVolume(0.25), ControlCmd::SetShuffle(true)]
    );
    assert_eq!(iface.playback_status(), "Playing");
    assert_eq!(iface.position(), 3_000_000);
    assert!((iface.volume() - 0.5).abs() < 1e-6);
}

#[test]
fn set_position_requires_the_current_track_id() {
    let (iface, rx) = player(playing_state());
    iface.set_position(track_path(1).into_inner(), 1_000);
    iface.set_position(track_path(0).into_inner(), -1);
    iface.set_position(track_path(0).into_inner(), 2_000_000);

    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![ControlCmd::SetPosition(Duration::from_secs(2))]
    );
}

#[test]
fn folders_are_exposed_as_playlists() {
    let (tx, rx) = mpsc::channel();
    let iface = PlaylistsIface {
        tx,
        view: SessionView::detached(playing_state()),
    };

    assert_eq!(iface.playlist_count(), 2);
    let all = iface.get_playlists(0, 10, "Alphabetical", false);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].1, "a");
    assert_eq!(all[0].2, "file:///tmp/music/a/cover.jpg");
    assert_eq!(all[1].2, "");

    let page = iface.get_playlists(1, 1, "Alphabetical", false);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].1, "b");
    let reversed = iface.get_playlists(0, 1, "Alphabetical", true);
    assert_eq!(reversed[0].1, "b");

    let (active, (path, name, _)) = iface.active_playlist();
    assert!(active);
    assert_eq!(path, playlist_path(0));
    assert_eq!(name, "a");

    iface.activate_playlist(playlist_path(1).into_inner());
    iface.activate_playlist(track_path(1).into_inner());
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![ControlCmd::ActivateFolder(1)]
    );
}

#[test]
fn no_active_playlist_without_selection() {
    let (tx, _rx) = mpsc::channel();
    let iface = PlaylistsIface {
        tx,
        view: SessionView::detached(SessionState::default()),
    };
    let (active, (path, _, _)) = iface.active_playlist();
    assert!(!active);
    assert_eq!(path.as_str(), "/");
    assert_eq!(iface.playlist_count(), 0);
}
