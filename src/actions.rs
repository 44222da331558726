//! Side effects triggered by commands
//!
//! Every operation reports success as a `bool`; failures are logged here and
//! turned into a spoken apology by the caller.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::intent::{App, PowerAction};
use crate::{Error, Result};

/// External actions the assistant can perform
pub trait Actions {
    /// Open a URL (or URI such as `spotify:`) with the system handler
    fn open_url(&self, url: &str) -> bool;

    /// Launch a desktop application
    fn launch(&self, app: App) -> bool;

    /// Open a file or directory with the system handler
    fn open_path(&self, path: &Path) -> bool;

    /// Shut down or restart the machine
    fn power(&self, action: PowerAction) -> bool;
}

/// The user's music directory, if the platform defines one
#[must_use]
pub fn music_dir() -> Option<PathBuf> {
    directories::UserDirs::new().and_then(|d| d.audio_dir().map(Path::to_path_buf))
}

/// Performs actions on the local machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemActions;

impl SystemActions {
    fn opener() -> (&'static str, &'static [&'static str]) {
        match std::env::consts::OS {
            "windows" => ("cmd", &["/C", "start", ""]),
            "macos" => ("open", &[]),
            _ => ("xdg-open", &[]),
        }
    }

    fn open(target: &str) -> Result<()> {
        let (program, args) = Self::opener();
        spawn(program, args.iter().copied().chain([target]))
    }

    fn power_command(action: PowerAction) -> (&'static str, &'static [&'static str]) {
        match (std::env::consts::OS, action) {
            ("windows", PowerAction::Shutdown) => ("shutdown", &["/s", "/t", "10"]),
            ("windows", PowerAction::Restart) => ("shutdown", &["/r", "/t", "10"]),
            ("macos", PowerAction::Shutdown) => (
                "osascript",
                &["-e", "tell app \"System Events\" to shut down"],
            ),
            ("macos", PowerAction::Restart) => {
                ("osascript", &["-e", "tell app \"System Events\" to restart"])
            }
            (_, PowerAction::Shutdown) => ("shutdown", &["-h", "now"]),
            (_, PowerAction::Restart) => ("shutdown", &["-r", "now"]),
        }
    }
}

/// Spawn a detached process, discarding its output
fn spawn<'a>(program: &str, args: impl IntoIterator<Item = &'a str>) -> Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::Action(format!("failed to run {program}: {e}")))?;
    Ok(())
}

fn report(what: &str, target: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => {
            tracing::info!(what, target, "action started");
            true
        }
        Err(e) => {
            tracing::warn!(what, target, error = %e, "action failed");
            false
        }
    }
}

impl Actions for SystemActions {
    fn open_url(&self, url: &str) -> bool {
        report("open_url", url, Self::open(url))
    }

    fn launch(&self, app: App) -> bool {
        let found = app
            .candidates()
            .iter()
            .find(|bin| which::which(bin).is_ok());

        let result = found.map_or_else(
            || Err(Error::Action(format!("no executable found for {app:?}"))),
            |bin| spawn(bin, []),
        );

        report("launch", app.label(), result)
    }

    fn open_path(&self, path: &Path) -> bool {
        let target = path.to_string_lossy();
        report("open_path", &target, Self::open(&target))
    }

    fn power(&self, action: PowerAction) -> bool {
        let (program, args) = Self::power_command(action);
        report("power", action.verb(), spawn(program, args.iter().copied()))
    }
}

/// Logs actions without performing them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunActions;

impl Actions for DryRunActions {
    fn open_url(&self, url: &str) -> bool {
        tracing::info!(url, "dry run: open url");
        true
    }

    fn launch(&self, app: App) -> bool {
        tracing::info!(app = app.label(), "dry run: launch");
        true
    }

    fn open_path(&self, path: &Path) -> bool {
        tracing::info!(path = %path.display(), "dry run: open path");
        true
    }

    fn power(&self, action: PowerAction) -> bool {
        tracing::info!(action = action.verb(), "dry run: power");
        true
    }
}
