//! # Money Module
//!
//! Provides the `Money` type used by [`PriceRange`](crate::types::PriceRange).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A strip of Napa priced ৳1.20 per tablet, × 10 tablets:                │
//! │    1.2 * 10 = 12.000000000000002  ❌ WRONG!                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer poisha (1 taka = 100 poisha)                     │
//! │    120 * 10 = 1200 poisha = ৳12.00  ✅                                  │
//! │                                                                         │
//! │  The bundled catalog, the wire rows (price_min / price_max) and the    │
//! │  canonical store all carry minor units. Only the UI formats taka.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medi_core::money::Money;
//!
//! let per_tablet = Money::from_minor(120); // ৳1.20
//! assert_eq!(per_tablet.to_string(), "৳1.20");
//! assert!(Money::zero() < per_tablet);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (poisha).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values are representable so validation can
///   reject them explicitly instead of silently wrapping
/// - **Transparent serde**: serializes as a bare integer, which is exactly
///   what the bundled JSON and the wire rows contain
/// - **Ord**: price ranges compare `min <= max` directly
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (poisha).
    ///
    /// ## Example
    /// ```rust
    /// use medi_core::money::Money;
    ///
    /// let price = Money::from_minor(1250); // ৳12.50
    /// assert_eq!(price.minor(), 1250);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units (taka and poisha).
    ///
    /// ## Example
    /// ```rust
    /// use medi_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(12, 50).minor(), 1250);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (taka) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// Display shows taka with two decimal places, e.g. `৳12.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-৳{}.{:02}", self.major().abs(), self.minor_part())
        } else {
            write!(f, "৳{}.{:02}", self.major(), self.minor_part())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
