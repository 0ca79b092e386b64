mod repl;
mod sink;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scenedeck_core::prefs::FileBackend;
use scenedeck_core::reconcile::move_item;
use scenedeck_core::{
    ClearConfirmed, ConnectionSettings, Controller, DeckConfig, PreferenceStore,
    RemovalConfirmed, Soundboard, WsConnector,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenedeck", about = "Remote control panel for an OBS WebSocket endpoint")]
struct Args {
    /// Preferences file. Defaults to the per-user config directory.
    #[arg(long, env = "SCENEDECK_PREFS", value_name = "PATH", global = true)]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(clap::Args, Debug, Default)]
struct EndpointArgs {
    #[arg(long, env = "SCENEDECK_HOST")]
    host: Option<String>,

    #[arg(long, env = "SCENEDECK_PORT")]
    port: Option<String>,

    #[arg(long, env = "SCENEDECK_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Connect and drive the panel from stdin.
    Run {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
    /// Show or change the saved connection settings.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
    /// Edit the soundboard offline.
    Sounds {
        #[command(subcommand)]
        action: SoundsCmd,
    },
    /// Show or edit the saved scene order.
    Scenes {
        #[command(subcommand)]
        action: ScenesCmd,
    },
    /// Lock or unlock the scene layout.
    Lock { state: LockState },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    Show,
    Set {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

#[derive(Subcommand, Debug)]
enum SoundsCmd {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        icon: String,
    },
    Remove {
        index: usize,
    },
    Clear,
}

#[derive(Subcommand, Debug)]
enum ScenesCmd {
    /// Print the saved order.
    Order,
    /// Move a saved entry from one position to another.
    Move { from: usize, to: usize },
    /// Forget the saved order.
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LockState {
    On,
    Off,
}

impl EndpointArgs {
    fn any(&self) -> bool {
        self.host.is_some() || self.port.is_some() || self.password.is_some()
    }
}

fn open_prefs(path: Option<PathBuf>) -> Result<PreferenceStore> {
    let path = match path {
        Some(p) => p,
        None => FileBackend::default_path()?,
    };
    PreferenceStore::open_file(&path)
        .with_context(|| format!("failed to open preferences at {}", path.display()))
}

/// Flags override the saved values field by field.
fn merge_settings(prefs: &PreferenceStore, endpoint: EndpointArgs) -> Option<ConnectionSettings> {
    let saved = prefs.connection_settings();
    let host = endpoint
        .host
        .or_else(|| saved.as_ref().map(|s| s.host.clone()))?;
    let port = endpoint
        .port
        .or_else(|| saved.as_ref().map(|s| s.port.clone()))
        .unwrap_or_default();
    let password = endpoint
        .password
        .or_else(|| saved.as_ref().map(|s| s.password.to_string()))
        .unwrap_or_default();
    Some(ConnectionSettings::new(host, port, password))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scenedeck=info,scenedeck_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut prefs = open_prefs(args.prefs)?;

    match args.command {
        Cmd::Run { endpoint } => run(prefs, endpoint).await,
        Cmd::Config { action } => config(&mut prefs, action),
        Cmd::Sounds { action } => sounds(&mut prefs, action),
        Cmd::Scenes { action } => scenes(&mut prefs, action),
        Cmd::Lock { state } => {
            prefs.set_layout_locked(matches!(state, LockState::On))?;
            Ok(())
        }
    }
}

async fn run(prefs: PreferenceStore, endpoint: EndpointArgs) -> Result<()> {
    let explicit = endpoint.any();
    let settings = merge_settings(&prefs, endpoint);
    if settings.is_none() {
        eprintln!("no host configured; use `connect <host> [port] [password]`");
    }

    let config = DeckConfig::default();
    let connector = Arc::new(WsConnector::new(config.clone()));
    let controller = Controller::new(config, prefs, connector, Box::new(sink::TerminalSink::new()));
    let (handle, task) = controller.spawn();

    // a saved host auto-connects; flags mean save and connect
    if let (true, Some(settings)) = (explicit, settings) {
        handle.connect(settings).await?;
    }

    let repl_handle = handle.clone();
    tokio::task::spawn_blocking(move || repl::run(repl_handle))
        .await
        .map_err(|e| anyhow!("input thread failed: {e}"))??;

    let _ = handle.shutdown().await;
    let _ = task.await;
    Ok(())
}

fn config(prefs: &mut PreferenceStore, action: ConfigCmd) -> Result<()> {
    match action {
        ConfigCmd::Show => match prefs.connection_settings() {
            Some(s) => {
                let port = if s.port.is_empty() { "(default)" } else { s.port.as_str() };
                let password = if s.password().is_some() { "set" } else { "none" };
                println!("host     {}\nport     {port}\npassword {password}", s.host);
            }
            None => println!("no host configured"),
        },
        ConfigCmd::Set { endpoint } => {
            let settings = merge_settings(prefs, endpoint)
                .ok_or_else(|| anyhow!("--host is required when nothing is saved"))?;
            settings.endpoint()?;
            prefs.set_connection_settings(&settings)?;
            println!("saved {}", settings.host);
        }
    }
    Ok(())
}

fn sounds(prefs: &mut PreferenceStore, action: SoundsCmd) -> Result<()> {
    let mut board = Soundboard::load(prefs);
    match action {
        SoundsCmd::List => {
            for (i, sound) in board.entries().iter().enumerate() {
                println!("{i}: [{}] {}", sound.icon, sound.name);
            }
        }
        SoundsCmd::Add { name, icon } => {
            let sound = board.add(prefs, &name, &icon)?;
            println!("added {} [{}]", sound.name, sound.icon);
        }
        SoundsCmd::Remove { index } => {
            let name = board
                .get(index)
                .map(|s| s.name.clone())
                .ok_or_else(|| anyhow!("no sound at position {index}"))?;
            if let Some(confirmed) = RemovalConfirmed::ask(&mut repl::StdinConfirm, index, &name) {
                board.remove(prefs, confirmed)?;
                println!("removed {name}");
            }
        }
        SoundsCmd::Clear => {
            if let Some(confirmed) = ClearConfirmed::ask(&mut repl::StdinConfirm) {
                let count = board.clear(prefs, confirmed)?;
                println!("removed {count} sound(s)");
            }
        }
    }
    Ok(())
}

fn scenes(prefs: &mut PreferenceStore, action: ScenesCmd) -> Result<()> {
    let saved = prefs.scene_order().unwrap_or_default();
    match action {
        ScenesCmd::Order => {
            if saved.is_empty() {
                println!("no saved order; scenes appear in remote order");
            }
            for (i, name) in saved.iter().enumerate() {
                println!("{i}: {name}");
            }
        }
        ScenesCmd::Move { from, to } => {
            if prefs.layout_locked() {
                return Err(anyhow!("layout is locked; run `scenedeck lock off` first"));
            }
            // offline there are no remote scenes to anchor against
            let moved = move_item(&saved, from, to)?;
            prefs.set_scene_order(&moved)?;
            println!("{}", moved.join(", "));
        }
        ScenesCmd::Reset => prefs.clear(scenedeck_core::prefs::KEY_SCENE_ORDER)?,
    }
    Ok(())
}
