pub mod state;
pub mod view;

pub use state::PlayerState;
pub use view::PlayerView;
