/// Leave entitlement per year used when an organization has not configured its own
pub const DEFAULT_CASUAL_LEAVE_DAYS: u32 = 10;
pub const DEFAULT_SICK_LEAVE_DAYS: u32 = 10;
pub const DEFAULT_ANNUAL_LEAVE_DAYS: u32 = 15;

/// 10_000 basis points = 100%
pub const BASIS_POINTS_SCALE: i64 = 10_000;

/// Highest accepted `base_rate`, in minor units per day, hour or month
pub const MAX_BASE_RATE: i64 = 10_000_000_000;

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Oldest and newest year a payroll period may refer to
pub const PERIOD_YEARS: (i32, i32) = (1970, 9999);

/// Upper bound on one webhook delivery, including connecting
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;
