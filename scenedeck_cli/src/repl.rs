//! Line commands read from stdin on a blocking thread.

use crate::sink::write_panel;
use anyhow::{anyhow, bail, Result};
use scenedeck_core::{
    ClearConfirmed, Command, Confirm, ConnectionSettings, ControllerHandle, Dirty, PanelView,
    RemovalConfirmed,
};
use std::io::{self, BufRead, Write};
use tokio::sync::oneshot;

const HELP: &str = "\
commands:
  connect [host [port [password]]]   save and connect, or reconnect
  disconnect
  stream | record | replay
  scene <name>                       switch program scene
  mute <input>                       toggle one input
  mute-all                           toggle every input
  sound <n>                          play soundboard entry n
  add-sound <name> [@icon]
  remove-sound <n>
  clear-sounds
  move <from> <to>                   reorder scenes
  lock | unlock
  show
  quit";

/// Reads one answer per prompt from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn request<T>(
    handle: &ControllerHandle,
    make: impl FnOnce(oneshot::Sender<T>) -> Command,
) -> Result<T> {
    let (reply, rx) = oneshot::channel();
    handle.blocking_send(make(reply))?;
    rx.blocking_recv()
        .map_err(|_| anyhow!("controller stopped"))
}

fn snapshot(handle: &ControllerHandle) -> Result<PanelView> {
    request(handle, |reply| Command::Snapshot { reply })
}

fn index_arg(arg: Option<&str>) -> Result<usize> {
    let raw = arg.ok_or_else(|| anyhow!("missing position"))?;
    raw.parse()
        .map_err(|_| anyhow!("`{raw}` is not a position"))
}

pub fn run(handle: ControllerHandle) -> Result<()> {
    println!("type `help` for commands");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match execute(&handle, line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("! {e}"),
        }
    }
    let _ = handle.blocking_send(Command::Shutdown);
    Ok(())
}

/// Returns `false` when the session should end.
fn execute(handle: &ControllerHandle, line: &str) -> Result<bool> {
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();

    let command = match word {
        "help" => {
            println!("{HELP}");
            return Ok(true);
        }
        "quit" | "exit" => return Ok(false),
        "show" => {
            let view = snapshot(handle)?;
            write_panel(&mut io::stdout().lock(), &view, Dirty::ALL)?;
            return Ok(true);
        }
        "connect" => match args.next() {
            Some(host) => Command::Connect(ConnectionSettings::new(
                host,
                args.next().unwrap_or_default(),
                args.next().unwrap_or_default(),
            )),
            None => Command::Reconnect,
        },
        "disconnect" => Command::Disconnect,
        "stream" => Command::ToggleStream,
        "record" => Command::ToggleRecord,
        "replay" => Command::SaveReplay,
        "scene" if !rest.is_empty() => Command::SetScene(rest.to_string()),
        "mute" if !rest.is_empty() => Command::ToggleInputMute(rest.to_string()),
        "mute-all" => Command::ToggleGlobalMute,
        "sound" => Command::TriggerSound(index_arg(args.next())?),
        "add-sound" => {
            let (name, icon) = match rest.rsplit_once(" @") {
                Some((name, icon)) => (name.to_string(), icon.to_string()),
                None => (rest.to_string(), String::new()),
            };
            let sound = request(handle, |reply| Command::AddSound { name, icon, reply })??;
            println!("added {} [{}]", sound.name, sound.icon);
            return Ok(true);
        }
        "remove-sound" => {
            let index = index_arg(args.next())?;
            let view = snapshot(handle)?;
            let entry = view
                .soundboard
                .get(index)
                .ok_or_else(|| anyhow!("no sound at position {index}"))?;
            let Some(confirmed) = RemovalConfirmed::ask(&mut StdinConfirm, index, &entry.name)
            else {
                return Ok(true);
            };
            let removed = request(handle, |reply| Command::RemoveSound { confirmed, reply })??;
            println!("removed {}", removed.name);
            return Ok(true);
        }
        "clear-sounds" => {
            let Some(confirmed) = ClearConfirmed::ask(&mut StdinConfirm) else {
                return Ok(true);
            };
            let count = request(handle, |reply| Command::ClearSounds { confirmed, reply })??;
            println!("removed {count} sound(s)");
            return Ok(true);
        }
        "move" => {
            let from = index_arg(args.next())?;
            let to = index_arg(args.next())?;
            request(handle, |reply| Command::MoveScene { from, to, reply })??;
            return Ok(true);
        }
        "lock" | "unlock" => {
            let locked = word == "lock";
            request(handle, |reply| Command::SetLayoutLock { locked, reply })??;
            return Ok(true);
        }
        other => bail!("unknown command `{other}`, try `help`"),
    };
    handle.blocking_send(command)?;
    Ok(true)
}
