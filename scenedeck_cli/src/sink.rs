use scenedeck_core::render::{ReplayIndicator, SystemButtons};
use scenedeck_core::{Dirty, Notice, PanelView, RenderSink};
use std::io::{self, Write};

/// Prints the sections that changed, one line each.
pub struct TerminalSink {
    out: io::Stdout,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl RenderSink for TerminalSink {
    fn render(&mut self, view: &PanelView, dirty: Dirty) {
        let mut out = self.out.lock();
        let _ = write_panel(&mut out, view, dirty);
        let _ = out.flush();
    }

    fn notify(&mut self, notice: Notice) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "! {}", describe(&notice));
    }
}

pub fn write_panel(out: &mut impl Write, view: &PanelView, dirty: Dirty) -> io::Result<()> {
    if dirty.status {
        writeln!(out, "[{}]", view.status_text())?;
    }
    if dirty.timer {
        writeln!(out, "timer  {}", view.timer)?;
    }
    if dirty.system {
        writeln!(out, "system {}", system_line(&view.system))?;
    }
    if dirty.scenes {
        let lock = if view.layout_locked { " (locked)" } else { "" };
        let scenes: Vec<String> = view
            .scenes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mark = if s.active {
                    "*"
                } else if s.pending {
                    "~"
                } else {
                    ""
                };
                format!("{i}:{}{mark}", s.name)
            })
            .collect();
        writeln!(out, "scenes{lock} {}", scenes.join("  "))?;
    }
    if dirty.mixer {
        let mixer: Vec<String> = view
            .mixer
            .iter()
            .map(|m| {
                let muted = if m.muted { "!" } else { "" };
                format!("[{}]{}{muted}", m.glyph, m.name)
            })
            .collect();
        writeln!(out, "mixer  {}", mixer.join("  "))?;
    }
    if dirty.soundboard {
        let sounds: Vec<String> = view
            .soundboard
            .iter()
            .map(|s| format!("{}:[{}]{}", s.index, s.icon, s.name))
            .collect();
        writeln!(out, "sounds {}", sounds.join("  "))?;
    }
    Ok(())
}

fn system_line(system: &SystemButtons) -> String {
    let pending = |p: bool| if p { "..." } else { "" };
    let replay = match system.replay {
        ReplayIndicator::Idle => "replay",
        ReplayIndicator::Pending => "replay...",
        ReplayIndicator::Saved => "replay saved",
        ReplayIndicator::Failed => "replay failed",
    };
    format!(
        "[{}]stream{}  [{}]record{}  {replay}  [{}]{}{}",
        system.stream.stream_icon(),
        pending(system.stream.pending),
        system.record.record_icon(),
        pending(system.record.pending),
        system.master_mute.icon(),
        system.master_mute.label(),
        pending(system.master_mute.pending),
    )
}

fn describe(notice: &Notice) -> String {
    match notice {
        Notice::ConnectFailed(reason) => format!("connect failed: {reason}"),
        Notice::CommandFailed { action, error } => format!("{action} failed: {error}"),
        Notice::SoundFailed { name, error } => format!("could not play {name}: {error}"),
        Notice::ReplayFailed(error) => {
            format!("replay not saved ({error}); is the replay buffer running?")
        }
        Notice::MutePartial {
            failed,
            target_muted,
        } => {
            let verb = if *target_muted { "mute" } else { "unmute" };
            format!("could not {verb}: {}", failed.join(", "))
        }
        Notice::Invalid(msg) => msg.clone(),
    }
}
