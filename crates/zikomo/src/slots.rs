//! The appointment book shared by the scheduling tools.

use std::fmt::{self, Display};

use schemars::JsonSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use zikomo_core::resource::SharedResource;

/// A working day.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All working days, in order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    const NAMES: &[&str] =
        &["monday", "tuesday", "wednesday", "thursday", "friday"];

    /// Looks up a day by its name, ignoring case.
    pub fn from_name(name: &str) -> Option<Day> {
        match name.trim().to_ascii_lowercase().as_str() {
            "monday" => Some(Day::Monday),
            "tuesday" => Some(Day::Tuesday),
            "wednesday" => Some(Day::Wednesday),
            "thursday" => Some(Day::Thursday),
            "friday" => Some(Day::Friday),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Day::from_name(&name)
            .ok_or_else(|| de::Error::unknown_variant(&name, Day::NAMES))
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        };
        f.write_str(name)
    }
}

/// Open appointment slots, one list of `HH:MM` times per day.
///
/// Each day is locked on its own, so bookings on different days never wait
/// for each other and a slot can only be claimed once.
#[derive(Debug)]
pub struct SlotBook {
    days: SharedResource<Day, Vec<String>>,
}

impl SlotBook {
    /// Creates a book with the given open slots.
    ///
    /// Days without an entry have no open slot.
    pub fn new<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = (Day, Vec<S>)>,
        S: Into<String>,
    {
        let mut days: Vec<(Day, Vec<String>)> =
            Day::ALL.iter().map(|day| (*day, vec![])).collect();
        for (day, times) in slots {
            if let Some((_, open)) = days.iter_mut().find(|(d, _)| *d == day) {
                open.extend(times.into_iter().map(Into::into));
            }
        }
        Self {
            days: SharedResource::new(days),
        }
    }

    /// Returns the open slots of a day, in order.
    pub fn open_slots(&self, day: Day) -> Vec<String> {
        self.days.read(&day, Clone::clone).unwrap_or_default()
    }

    /// Returns `true` if the slot is open.
    pub fn is_open(&self, day: Day, time_slot: &str) -> bool {
        self.days
            .read(&day, |open| open.iter().any(|t| t == time_slot))
            .unwrap_or(false)
    }

    /// Claims a slot, returning `false` if it's not open.
    pub fn claim(&self, day: Day, time_slot: &str) -> bool {
        self.days
            .update(&day, |open| {
                let Some(idx) = open.iter().position(|t| t == time_slot) else {
                    return false;
                };
                open.remove(idx);
                true
            })
            .unwrap_or(false)
    }
}

impl Default for SlotBook {
    /// The weekly schedule the assistant starts with.
    fn default() -> Self {
        Self::new([
            (Day::Monday, vec!["09:00", "10:00", "14:00", "15:00", "16:00"]),
            (Day::Tuesday, vec!["09:00", "11:00", "13:00", "15:00"]),
            (Day::Wednesday, vec!["10:00", "11:00", "14:00", "16:00"]),
            (Day::Thursday, vec!["09:00", "10:00", "13:00", "15:00"]),
            (Day::Friday, vec!["09:00", "11:00", "14:00", "16:00"]),
        ])
    }
}
