pub mod client;
pub mod models;
pub mod episodes;

pub use client::{EpisodeApi, PodcastrClient};
pub use models::*;
pub use episodes::*;
