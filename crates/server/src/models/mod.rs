//! Domain models for the habit tracker server.

pub mod habit;

pub use habit::{Habit, HabitQuery, HabitUpdate, NewHabit, utc_day_bounds};
