use super::*;
use crate::config::TrackDisplayField;
use crate::test_support::track;
use std::path::{Path, PathBuf};

#[test]
fn grouping_splits_tracks_by_parent_directory() {
    let tracks = vec![
        track("/b/3.mp3"),
        track("/a/2.mp3"),
        track("/a/1.mp3"),
    ];

    let snapshot = group_tracks(tracks);

    assert_eq!(snapshot.folders.len(), 2);
    assert_eq!(snapshot.folders[0].path, PathBuf::from("/a"));
    assert_eq!(snapshot.folders[0].display_name, "a");
    assert_eq!(snapshot.folders[0].track_count, 2);
    assert_eq!(snapshot.folders[1].path, PathBuf::from("/b"));
    assert_eq!(snapshot.folders[1].track_count, 1);

    let a = tracks_for_folder(Path::new("/a"), &snapshot);
    let names: Vec<&str> = a.iter().map(|t| t.display_name.as_str()).collect();
    assert_eq!(names, vec!["1.mp3", "2.mp3"]);
}

#[test]
fn grouping_keeps_every_track_exactly_once() {
    let paths = [
        "/m/x/a.mp3",
        "/m/x/b.mp3",
        "/m/y/c.mp3",
        "/m/a.mp3",
        "/m/y/z/d.mp3",
    ];
    let snapshot = group_tracks(paths.iter().map(|p| track(p)).collect());

    assert_eq!(snapshot.track_count(), paths.len());
    for folder in &snapshot.folders {
        assert_eq!(folder.track_count, snapshot.tracks_by_folder[&folder.path].len());
    }
    let mut seen: Vec<PathBuf> = snapshot
        .tracks_by_folder
        .values()
        .flatten()
        .map(|t| t.path.clone())
        .collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), paths.len());
}

#[test]
fn folders_sort_case_insensitively_by_display_name() {
    let snapshot = group_tracks(vec![
        track("/lib/beta/1.mp3"),
        track("/lib/Alpha/1.mp3"),
        track("/lib/Gamma/1.mp3"),
    ]);
    let names: Vec<&str> = snapshot
        .folders
        .iter()
        .map(|f| f.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "beta", "Gamma"]);
}

#[test]
fn folder_display_name_falls_back_to_full_path() {
    assert_eq!(Folder::display_name_for(Path::new("/music/Live")), "Live");
    assert_eq!(Folder::display_name_for(Path::new("/")), "/");
    assert_eq!(Folder::display_name_for(Path::new("")), "");
}

#[test]
fn folder_art_comes_from_first_track_that_has_one() {
    let mut with_art = track("/a/2.mp3");
    with_art.album_art = Some(PathBuf::from("/a/cover.jpg"));
    let snapshot = group_tracks(vec![track("/a/1.mp3"), with_art]);

    assert_eq!(
        snapshot.folders[0].album_art,
        Some(PathBuf::from("/a/cover.jpg"))
    );
}

#[test]
fn tracks_for_unknown_folder_is_empty() {
    let snapshot = group_tracks(vec![track("/a/1.mp3")]);
    assert!(tracks_for_folder(Path::new("/missing"), &snapshot).is_empty());
    assert!(snapshot.folder(Path::new("/missing")).is_none());
}

#[test]
fn tracks_for_folder_sorts_ignoring_case() {
    let snapshot = group_tracks(vec![
        track("/a/b.mp3"),
        track("/a/C.mp3"),
        track("/a/A.mp3"),
    ]);
    let names: Vec<String> = snapshot
        .tracks_for_folder(Path::new("/a"))
        .into_iter()
        .map(|t| t.display_name)
        .collect();
    assert_eq!(names, vec!["A.mp3", "b.mp3", "C.mp3"]);
}

#[test]
fn display_from_fields_joins_present_fields() {
    let p = Path::new("/tmp/Song.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];

    assert_eq!(
        display_from_fields(p, Some("Song"), Some("  Artist  "), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(p, Some("Song"), Some(""), None, &fields, " - "),
        "Song"
    );
    // Nothing usable: fall back to the file name.
    assert_eq!(
        display_from_fields(p, None, None, None, &fields, " - "),
        "Song.mp3"
    );
    assert_eq!(
        display_from_fields(p, None, None, None, &[TrackDisplayField::Stem], " - "),
        "Song"
    );
}

#[test]
fn mime_type_is_guessed_from_extension() {
    assert_eq!(mime_type_for(Path::new("a.FLAC")), "audio/flac");
    assert_eq!(mime_type_for(Path::new("a.m4a")), "audio/mp4");
    assert_eq!(mime_type_for(Path::new("a.xyz")), "audio/*");
}
