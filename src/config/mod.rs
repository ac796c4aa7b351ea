pub mod settings;

pub use settings::{AppConfig, CalendarConfig, DisplayConfig};
