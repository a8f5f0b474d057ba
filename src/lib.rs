pub mod api;
pub mod audio;
pub mod error;
pub mod helpers;
pub mod player;
pub mod settings;
pub mod theme;
pub mod tui;

pub use api::{Episode, EpisodeApi, PodcastrClient};
pub use error::{ApiError, AudioError};
pub use player::{PlayerState, PlayerView};
pub use tui::TuiApp;
