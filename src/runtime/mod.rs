use std::sync::mpsc;

use crate::app::PlaybackCoordinator;
use crate::audio::{BackendEvent, BackendRouter, LocalEngine};
use crate::cast::CastSignal;
use crate::library::{FsLibrary, LibraryError};
use crate::mpris::ControlCmd;

mod event_loop;
mod input;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let root = startup::library_root(&settings);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let (backend_tx, backend_rx) = mpsc::channel::<BackendEvent>();
    let (library_tx, library_rx) = mpsc::channel::<startup::LoadResult>();

    // No cast receiver is wired into the binary, so the signal never flips and
    // the router stays on the local engine.
    let local = LocalEngine::spawn(&settings.audio, backend_tx);
    let router = BackendRouter::new(Box::new(local), CastSignal::new());
    let store = startup::open_session_store(&settings);
    let mut coordinator = PlaybackCoordinator::new(router, store, &settings.playback);

    let mpris = crate::mpris::spawn_mpris(control_tx.clone(), coordinator.view());
    input::spawn_stdin_commands(control_tx.clone());
    eprintln!("{}", input::HELP);

    coordinator.begin_load();
    if let Err(e) = startup::spawn_library_load(
        FsLibrary::new(root, settings.library.clone()),
        library_tx,
    ) {
        coordinator.finish_load(Err(LibraryError::Io(e)));
    }

    let inbox = event_loop::Inbox {
        control: control_rx,
        backend: backend_rx,
        library: library_rx,
    };
    let result = event_loop::run(&mut coordinator, &mpris, &inbox);

    coordinator.dispose();
    result
}
