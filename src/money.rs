//! Money Module
//!
//! Amount entry and display for the transfer flow. All conversions between
//! what the user types and the `Decimal` carried through the flow MUST go
//! through this module.
//!
//! ## Entry model
//! The amount field is cents-based: every keystroke is reduced to its digits
//! and the digit string is read as an integer number of cents. Typing
//! `1`, `5`, `0`, `0`, `0`, `0` shows `RM1500.00`.
//!
//! ```rust
//! use peer_transfer::money::AmountInput;
//!
//! let mut input = AmountInput::default();
//! input.apply("150000").unwrap();
//! assert_eq!(input.display(), "RM1500.00");
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Currency prefix used for every displayed amount
pub const CURRENCY_PREFIX: &str = "RM";

/// Display decimals for the currency
pub const CURRENCY_DECIMALS: u32 = 2;

/// Largest amount a single transfer may carry (999,999.99)
pub const MAX_TRANSFER_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

// ============================================================================
// Error Types
// ============================================================================

/// Amount entry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount cannot exceed RM999,999.99")]
    AmountTooLarge,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Keystrokes → Decimal
// ============================================================================

/// Interpret raw field text as a cents-based amount
///
/// Every non-digit character is discarded (so the previously displayed
/// `RM` prefix and the decimal point do not interfere), and the remaining
/// digits are read as cents. An empty digit string is zero.
///
/// # Errors
/// * `AmountTooLarge` - value above [`MAX_TRANSFER_AMOUNT`], including digit
///   strings too long to fit a `u64`
pub fn parse_cents_input(text: &str) -> Result<Decimal, MoneyError> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(Decimal::new(0, CURRENCY_DECIMALS));
    }

    // Anything that overflows u64 is far beyond the cap anyway
    let cents: u64 = digits.parse().map_err(|_| MoneyError::AmountTooLarge)?;
    let cents = i64::try_from(cents).map_err(|_| MoneyError::AmountTooLarge)?;

    let value = Decimal::new(cents, CURRENCY_DECIMALS);
    if value > MAX_TRANSFER_AMOUNT {
        return Err(MoneyError::AmountTooLarge);
    }

    Ok(value)
}

/// Validate a transfer amount coming from outside the entry field
/// (navigation payloads, API callers).
pub fn validate_transfer_amount(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }
    if amount.normalize().scale() > CURRENCY_DECIMALS {
        return Err(MoneyError::InvalidFormat(format!(
            "more than {} decimal places",
            CURRENCY_DECIMALS
        )));
    }
    if amount > MAX_TRANSFER_AMOUNT {
        return Err(MoneyError::AmountTooLarge);
    }
    Ok(amount)
}

// ============================================================================
// Amount Input State
// ============================================================================

/// State of the amount entry field
///
/// A rejected keystroke leaves the last accepted value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountInput {
    value: Decimal,
}

impl Default for AmountInput {
    fn default() -> Self {
        Self {
            value: Decimal::new(0, CURRENCY_DECIMALS),
        }
    }
}

impl AmountInput {
    /// Apply the field's new text. Returns the accepted value.
    pub fn apply(&mut self, text: &str) -> Result<Decimal, MoneyError> {
        let value = parse_cents_input(text)?;
        self.value = value;
        Ok(value)
    }

    /// Last accepted value (always two decimals)
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Text shown in the field: `RM1500.00`, or empty for zero
    pub fn display(&self) -> String {
        if self.value.is_zero() {
            String::new()
        } else {
            format!("{}{:.2}", CURRENCY_PREFIX, self.value)
        }
    }

    pub fn clear(&mut self) {
        self.value = Decimal::new(0, CURRENCY_DECIMALS);
    }
}

// ============================================================================
// Format: Decimal → Display
// ============================================================================

/// Format an amount for display with thousands separators
///
/// # Example
/// ```rust
/// use peer_transfer::money::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Decimal::new(500000, 2)), "RM5,000.00");
/// ```
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(CURRENCY_DECIMALS);
    let plain = format!("{:.2}", rounded.abs());
    let (whole, frac) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}.{}", sign, CURRENCY_PREFIX, grouped, frac)
}
