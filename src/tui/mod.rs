pub mod app;
pub mod pages;

pub use app::TuiApp;
pub use pages::*;
