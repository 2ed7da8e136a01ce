pub mod description;
pub mod ical;
