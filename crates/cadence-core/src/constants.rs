/// Product name shared across crates
pub const PRODUCT_NAME: &str = "cadence";
pub const PRODUCT_VERSION: &str = "1.0";

/// Default `PRODID` written into exported calendars.
pub const DEFAULT_PRODID: &str =
    const_str::concat!("-//", PRODUCT_NAME, "//NONSGML v", PRODUCT_VERSION, "//EN");

/// Vendor prefix for extension properties written by the codec.
pub const X_PROPERTY_PREFIX: &str = "X-CADENCE";
/// Marks the block that carries set-level include/exclude dates.
pub const X_ROLE_PROPERTY: &str = const_str::concat!(X_PROPERTY_PREFIX, "-ROLE");

/// Default search window: five years.
pub const DEFAULT_WINDOW_DAYS: u32 = 365 * 5;
/// Default number of window doublings before a search gives up.
pub const DEFAULT_WINDOW_MULTIPLE: u32 = 4;

pub const DEFAULT_TIMEZONE: &str = "UTC";
