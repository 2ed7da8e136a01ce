//! End-to-end behavior of the recurrence engine through its public API.

mod combination;
mod helpers;
mod interchange;
mod rule_cases;
mod search;
