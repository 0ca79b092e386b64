pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod mock_obs;
pub mod mute;
pub mod prefs;
pub mod reconcile;
pub mod remote;
pub mod render;
pub mod session;
pub mod soundboard;
pub mod timer;

pub use cache::{Activity, AudioInput, AudioKind, InputIcon, RemoteStateCache, Scene};
pub use config::{ConnectionSettings, DeckConfig};
pub use connection::{ConnectionManager, ConnectionState, Epoch};
pub use controller::{Command, ControlError, Controller, ControllerHandle};
pub use error::{ConnectError, RequestError};
pub use prefs::{PrefsError, PreferenceStore};
pub use remote::{Connector, ObsRemote, WsConnector};
pub use render::{Dirty, Notice, PanelView, RenderSink};
pub use session::{Session, SessionSignal};
pub use soundboard::{ClearConfirmed, Confirm, CustomSound, RemovalConfirmed, Soundboard, SoundboardError};
