//! Line commands on stdin, for driving the player without a D-Bus client.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use crate::mpris::ControlCmd;

pub const HELP: &str = "commands: play | pause | toggle | stop | next | prev | \
seek <±secs> | vol <0-100> | vol+ | vol- | shuffle on|off | folders | folder <n> | \
forget | clear | quit";

/// Map one input line to a command. Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<ControlCmd> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let arg = words.next();

    let cmd = match (verb.as_str(), arg) {
        ("play", None) => ControlCmd::Play,
        ("pause", None) => ControlCmd::Pause,
        ("toggle" | "p", None) => ControlCmd::PlayPause,
        ("stop", None) => ControlCmd::Stop,
        ("next" | "n", None) => ControlCmd::Next,
        ("prev" | "previous", None) => ControlCmd::Prev,
        ("quit" | "q", None) => ControlCmd::Quit,
        ("folders", None) => ControlCmd::ShowFolders,
        ("forget", None) => ControlCmd::ForgetFolder,
        ("clear", None) => ControlCmd::ClearError,
        ("vol+" | "+", None) => ControlCmd::VolumeUp,
        ("vol-" | "-", None) => ControlCmd::VolumeDown,
        ("folder", Some(n)) => ControlCmd::ActivateFolder(n.parse().ok()?),
        ("seek", Some(secs)) => {
            let secs: f64 = secs.parse().ok()?;
            if !secs.is_finite() {
                return None;
            }
            ControlCmd::SeekBy((secs * 1_000_000.0) as i64)
        }
        ("vol" | "volume", Some(pct)) => {
            let pct: f64 = pct.parse().ok()?;
            ControlCmd::SetVolume(pct / 100.0)
        }
        ("shuffle", Some("on")) => ControlCmd::SetShuffle(true),
        ("shuffle", Some("off")) => ControlCmd::SetShuffle(false),
        _ => return None,
    };
    Some(cmd)
}

/// Forward stdin commands to `tx` until stdin closes or the runtime is gone.
pub fn spawn_stdin_commands(tx: Sender<ControlCmd>) {
    let spawned = thread::Builder::new()
        .name("cadenza-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    None => eprintln!("{HELP}"),
                }
            }
            tracing::debug!("stdin closed");
        });
    if let Err(e) = spawned {
        tracing::warn!("stdin commands unavailable: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_words() {
        assert_eq!(parse_command("play"), Some(ControlCmd::Play));
        assert_eq!(parse_command("  P "), Some(ControlCmd::PlayPause));
        assert_eq!(parse_command("next"), Some(ControlCmd::Next));
        assert_eq!(parse_command("previous"), Some(ControlCmd::Prev));
        assert_eq!(parse_command("q"), Some(ControlCmd::Quit));
        assert_eq!(parse_command("folders"), Some(ControlCmd::ShowFolders));
    }

    #[test]
    fn parses_volume_steps_and_housekeeping() {
        assert_eq!(parse_command("vol+"), Some(ControlCmd::VolumeUp));
        assert_eq!(parse_command("-"), Some(ControlCmd::VolumeDown));
        assert_eq!(parse_command("VOL-"), Some(ControlCmd::VolumeDown));
        assert_eq!(parse_command("forget"), Some(ControlCmd::ForgetFolder));
        assert_eq!(parse_command("clear"), Some(ControlCmd::ClearError));
        assert_eq!(parse_command("vol+ 3"), None);
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(parse_command("folder 2"), Some(ControlCmd::ActivateFolder(2)));
        assert_eq!(parse_command("seek -2.5"), Some(ControlCmd::SeekBy(-2_500_000)));
        assert_eq!(parse_command("vol 40"), Some(ControlCmd::SetVolume(0.4)));
        assert_eq!(parse_command("shuffle on"), Some(ControlCmd::SetShuffle(true)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("folder"), None);
        assert_eq!(parse_command("folder x"), None);
        assert_eq!(parse_command("seek nan"), None);
        assert_eq!(parse_command("shuffle maybe"), None);
        assert_eq!(parse_command("play now"), None);
    }
}
