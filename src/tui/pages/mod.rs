pub mod episode;
pub mod home;
pub mod player;

pub use episode::EpisodePage;
pub use home::HomePage;
pub use player::PlayerPanel;

/// What a page asks the shell to do after handling a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    None,
    OpenEpisode(String),
    Back,
}
