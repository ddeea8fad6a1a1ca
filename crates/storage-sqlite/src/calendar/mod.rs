//! SQLite storage implementation for trading calendars.

mod model;
mod repository;

pub use model::TradingCalendarDayDB;
pub use repository::CalendarRepository;
