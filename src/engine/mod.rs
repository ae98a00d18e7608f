//! Contribution tally & streak engine.
//!
//! The engine doesn't talk to the network or the mail server. It gets contribution data from a
//! [ContributionSource](crate::source::ContributionSource) and turns it into a
//! [summary::DaySummary]:
//!   - [events] buckets typed contribution events into the target day.
//!   - [calendar] derives today's count and the streak from an activity calendar.
//!   - [ledger] keeps a persisted streak for when no calendar is available.
//!   - [strategy] picks between the last two.

pub mod calendar;
pub mod events;
pub mod ledger;
pub mod strategy;
pub mod summary;
