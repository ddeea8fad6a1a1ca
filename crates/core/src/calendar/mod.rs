//! Calendar module - per-exchange trading-day classification and day counts.

mod calendar_index;
mod calendar_model;
mod calendar_service;
mod calendar_traits;


pub use calendar_index::CalendarIndex;
pub use calendar_model::{classify_days, CalendarHorizon, TradingCalendarDay, WEEKEND_LABEL};
pub use calendar_service::TradingCalendarService;
pub use calendar_traits::{CalendarRepositoryTrait, TradingCalendarServiceTrait};
