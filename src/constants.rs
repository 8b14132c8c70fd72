//! Application-wide constants: configuration defaults, validation limits,
//! protocol parameters and control-loop timing.

// # Configuration Defaults

pub const DEFAULT_USE_SUNSET: bool = true;
pub const DEFAULT_START_HOUR: u32 = 19;
pub const DEFAULT_START_MINUTE: u32 = 0;
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_ON_PERCENT: u32 = 80;
pub const DEFAULT_MAX_JITTER_MINUTES: u32 = 10;
pub const DEFAULT_MIN_SEQUENCES: u32 = 1;
pub const DEFAULT_MAX_SEQUENCES: u32 = 3;
pub const DEFAULT_LATITUDE: f64 = 51.5;
pub const DEFAULT_LONGITUDE: f64 = -0.126;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 0;
pub const DEFAULT_DST_REGION: &str = "EU";
pub const DEFAULT_NTP_SERVER: &str = "pool.ntp.org";
pub const DEFAULT_DISPLAY_TIMEOUT_MINUTES: u32 = 1;
pub const DEFAULT_OUTLET_NAME: &str = "lamp";
pub const DEFAULT_OUTLET_ADDRESS: &str = "192.168.1.100";

/// Region tag that disables daylight-saving adjustment entirely.
pub const DST_REGION_NONE: &str = "none";

// # Validation Limits

pub const MINIMUM_START_HOUR: u32 = 0;
pub const MAXIMUM_START_HOUR: u32 = 23;
pub const MINIMUM_START_MINUTE: u32 = 0;
pub const MAXIMUM_START_MINUTE: u32 = 59;
pub const MINIMUM_DURATION_MINUTES: u32 = 1;
pub const MAXIMUM_DURATION_MINUTES: u32 = 720;
pub const MINIMUM_ON_PERCENT: u32 = 1;
pub const MAXIMUM_ON_PERCENT: u32 = 99;
pub const MINIMUM_JITTER_MINUTES: u32 = 0;
pub const MAXIMUM_JITTER_MINUTES: u32 = 59;
pub const MINIMUM_SEQUENCES: u32 = 1;
pub const MAXIMUM_SEQUENCES: u32 = 10;
pub const MINIMUM_UTC_OFFSET_HOURS: i32 = -12;
pub const MAXIMUM_UTC_OFFSET_HOURS: i32 = 14;
pub const MAXIMUM_DISPLAY_TIMEOUT_MINUTES: u32 = 1440;
pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// # Solar Calculation

/// Latitude clamp keeping the hour-angle formula away from the poles.
pub const LATITUDE_LIMIT: f64 = 89.8;
/// Sun's centre below the geometric horizon at sunset (refraction + semi-diameter).
pub const SUNSET_DEPRESSION_DEGREES: f64 = 0.833;

// # Timing

pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Poll interval reported when the event queue is empty.
pub const EMPTY_QUEUE_POLL_MS: u64 = 1000;
/// Upper bound on a single control-loop sleep so signals and reloads stay responsive.
pub const MAX_LOOP_SLEEP_MS: u64 = 1000;
/// Clock resync interval (one hour) measured on the millisecond tick counter.
pub const CLOCK_RESYNC_INTERVAL_MS: u32 = 3_600_000;
/// Wait after a failed clock sync before trying again.
pub const CLOCK_RETRY_BACKOFF_MS: u32 = 60_000;

// # Network Time

pub const NTP_PORT: u16 = 123;
pub const NTP_PACKET_SIZE: usize = 48;
/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
pub const NTP_UNIX_EPOCH_DELTA: i64 = 2_208_988_800;
pub const NTP_TIMEOUT_MS: u64 = 2000;
pub const NTP_ATTEMPTS: u32 = 2;
pub const NTP_RETRY_DELAY_MS: u64 = 2000;

// # Outlet Transports

pub const KASA_PORT: u16 = 9999;
/// Initial key of the rolling XOR cipher used by Kasa devices.
pub const KASA_CIPHER_KEY: u8 = 171;
pub const KASA_TIMEOUT_MS: u64 = 2000;
pub const KASA_BUFFER_SIZE: usize = 2048;
pub const TASMOTA_TIMEOUT_MS: u64 = 3000;

// # Configuration Watching

/// Debounce duration for file change events (in milliseconds).
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;

// # Exit Codes

pub const EXIT_FAILURE: i32 = 1;
