pub mod log_sink;
pub use log_sink::LogSink;

pub mod midi;

pub mod relay;

pub mod session;
pub use session::Session;

mod ui;

const APP_NAME: &str = "MIDI Tap";
const CLIENT_NAME: &str = "midi-tap";

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(|cc| Box::new(ui::App::new(CLIENT_NAME, cc))),
    );
}
