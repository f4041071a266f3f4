pub mod user_events;

pub use user_events::{EventError, EventOutcome, UserEvent, UserEventService};
