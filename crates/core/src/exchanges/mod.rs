//! Exchanges module - venue identity and holiday rules.

mod exchange_model;
mod holiday_rules;

pub use exchange_model::Exchange;
pub use holiday_rules::{
    easter_sunday, rule_holidays, HolidayCalendarSpec, HolidayEntry, HolidayOverrides,
    HolidaySection,
};
