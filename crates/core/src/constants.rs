use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Portfolio base currency used when neither the event nor the holding names one
pub const DEFAULT_BASE_CURRENCY: &str = "BRL";

/// Share of a jcp distribution left after the flat 15% withholding approximation
pub const JCP_NET_FACTOR: Decimal = dec!(0.85);

/// Number of calendar months in the trailing insight window
pub const INSIGHT_WINDOW_MONTHS: u32 = 12;

/// Months after the reference month scanned for upcoming payments
pub const INSIGHT_FORWARD_MONTHS: u32 = 12;

/// Events rendered per calendar cell before the cell needs expanding
pub const DEFAULT_CELL_PREVIEW_LIMIT: usize = 3;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision for yield percentages
pub const YIELD_DECIMAL_PRECISION: u32 = 4;
