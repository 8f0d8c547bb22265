//! # Calbridge Core Library
//!
//! Value codecs and record plumbing for bridging a device calendar store to a
//! host runtime.
//!
//! ## Features
//!
//! - **Recurrence codec**: `FREQ=...;INTERVAL=...;UNTIL=...|COUNT=...` wire
//!   strings to and from a structured [`recurrence::RecurrenceRule`], with
//!   occurrence expansion through the `rrule` crate
//! - **Timestamp codec**: the canonical `YYYY-MM-DDTHH:mm:ss.SSSZ` UTC format
//!   and the compact `UNTIL` format
//! - **Platform enums**: string values and the integer constants the calendar
//!   provider stores
//! - **Row serialization**: lenient conversion of store rows into records
//! - **Calendar service**: event, reminder, attendee and calendar operations
//!   over any [`store::RowStore`]
//!
//! ## Core Modules
//!
//! - [`datetime`]: Canonical and compact timestamp codecs
//! - [`recurrence`]: Recurrence rule codec and expansion
//! - [`enums`]: Platform enumerations
//! - [`models`]: Bridge-facing records
//! - [`row`]: Row access and row-to-record conversion
//! - [`store`]: Row store trait and in-memory implementation
//! - [`service`]: Calendar operations
//! - [`location`]: Location accuracy mapping
//! - [`timezone`]: Timezone validation and detection
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use calbridge_core::{
//!     models::{CalendarRecord, EventRecord, Source},
//!     recurrence::{Frequency, RecurrenceRule, RecurrenceRuleRecord},
//!     service::CalendarService,
//!     store::InMemoryStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = CalendarService::new(InMemoryStore::new());
//!
//!     let calendar_id = service
//!         .create_calendar(&CalendarRecord {
//!             title: Some("Personal".to_string()),
//!             name: Some("personal".to_string()),
//!             color: Some("#3366CC".to_string()),
//!             source: Some(Source {
//!                 name: Some("me".to_string()),
//!                 is_local_account: true,
//!                 ..Default::default()
//!             }),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(2).count(5);
//!     let event_id = service
//!         .save_event(&EventRecord {
//!             calendar_id: Some(calendar_id.to_string()),
//!             title: Some("Planning".to_string()),
//!             start_date: Some("2025-01-01T09:00:00.000Z".into()),
//!             end_date: Some("2025-01-01T10:00:00.000Z".into()),
//!             recurrence_rule: Some(RecurrenceRuleRecord::from(rule)),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("Created event {}", event_id);
//!     Ok(())
//! }
//! ```

pub mod datetime;
pub mod enums;
pub mod error;
pub mod location;
pub mod models;
pub mod recurrence;
pub mod row;
pub mod service;
pub mod store;
pub mod timezone;
