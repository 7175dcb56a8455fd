use std::sync::Arc;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use zikomo_core::tool::{Effect, Error as ToolError, Tool, ToolOutput};

use crate::slots::{Day, SlotBook};

#[derive(Deserialize, JsonSchema)]
pub struct CheckAvailabilityParameters {
    #[schemars(description = "The day to check.")]
    day: Day,
    #[schemars(description = "A specific time to check, formatted as HH:MM.")]
    time_slot: Option<String>,
}

/// A tool for listing open appointment slots.
pub struct CheckAvailabilityTool {
    book: Arc<SlotBook>,
    parameter_schema: Value,
}

impl CheckAvailabilityTool {
    /// Creates a new tool reading from `book`.
    #[inline]
    pub fn new(book: Arc<SlotBook>) -> Self {
        Self {
            book,
            parameter_schema: schema_for!(CheckAvailabilityParameters)
                .to_value(),
        }
    }
}

impl Tool for CheckAvailabilityTool {
    type Input = CheckAvailabilityParameters;

    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        r#"
Checks availability for a specific day (Monday to Friday), and optionally a specific time slot.
Without a time slot, all open slots of the day are listed."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: CheckAvailabilityParameters,
    ) -> impl Future<Output = ToolOutput> + Send + 'static {
        let book = Arc::clone(&self.book);
        async move {
            let CheckAvailabilityParameters { day, time_slot } = input;
            let answer = match time_slot.as_deref().map(str::trim) {
                Some(slot) if book.is_open(day, slot) => {
                    format!("The time slot {slot} is available on {day}!")
                }
                Some(slot) => format!(
                    "The time slot {slot} is not available on {day}. \
                     Available slots are: {}",
                    book.open_slots(day).join(", ")
                ),
                None => format!(
                    "Available time slots for {day}: {}",
                    book.open_slots(day).join(", ")
                ),
            };
            Ok(answer)
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct BookAppointmentParameters {
    #[schemars(description = "The day to book.")]
    day: Day,
    #[schemars(description = "The time to book, formatted as HH:MM.")]
    time_slot: String,
}

/// A tool for booking an appointment slot.
pub struct BookAppointmentTool {
    book: Arc<SlotBook>,
    parameter_schema: Value,
}

impl BookAppointmentTool {
    /// Creates a new tool claiming slots from `book`.
    #[inline]
    pub fn new(book: Arc<SlotBook>) -> Self {
        Self {
            book,
            parameter_schema: schema_for!(BookAppointmentParameters)
                .to_value(),
        }
    }
}

impl Tool for BookAppointmentTool {
    type Input = BookAppointmentParameters;

    fn name(&self) -> &str {
        "book_appointment"
    }

    fn description(&self) -> &str {
        "Books an appointment for a specific day (Monday to Friday) and time \
         slot."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn effect(&self) -> Effect {
        Effect::Mutating
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: BookAppointmentParameters,
    ) -> impl Future<Output = ToolOutput> + Send + 'static {
        let book = Arc::clone(&self.book);
        async move {
            let BookAppointmentParameters { day, time_slot } = input;
            let time_slot = time_slot.trim();
            if !book.claim(day, time_slot) {
                return Err(ToolError::execution_error().with_reason(format!(
                    "Time slot {time_slot} is not available on {day}."
                )));
            }
            info!("booked {day} {time_slot}");
            Ok(format!(
                "Successfully booked appointment for {day} at {time_slot}!"
            ))
        }
    }
}
