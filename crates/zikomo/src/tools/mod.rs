//! The tools the assistant can use.

mod availability;
mod search;
mod weather;

pub use availability::{BookAppointmentTool, CheckAvailabilityTool};
pub use search::SearchTool;
pub use weather::{City, WeatherTool};
