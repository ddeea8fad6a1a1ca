/// Instrument family carried by every contract in this system
pub const COPPER_FAMILY: &str = "COPPER";

/// Vendor yellow key appended to every futures ticker
pub const COMDTY_YELLOW_KEY: &str = "Comdty";

/// First calendar year built when nothing else is configured
pub const DEFAULT_CALENDAR_START_YEAR: i32 = 1990;

/// Years past today the trading calendar must cover
pub const DEFAULT_HORIZON_YEARS: u32 = 40;

/// Trading days before last-tradeable-date at which a roll is due
pub const DEFAULT_ROLL_OFFSET_DAYS: u32 = 5;

/// Contract months enumerated ahead of the as-of date during reference refresh
pub const DEFAULT_REFERENCE_MONTHS_AHEAD: u32 = 40;

/// Tickers per reference-data request
pub const REFERENCE_BATCH_SIZE: usize = 100;
