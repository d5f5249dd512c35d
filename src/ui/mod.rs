pub mod app;
pub use app::App;

mod controller;

pub mod devices;
pub use devices::DevicesWidget;

pub mod log_view;
pub use log_view::LogWidget;

#[cfg(feature = "save")]
mod save;

pub mod settings;
pub use settings::Settings;
