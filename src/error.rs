//! Error types for the BME680 driver.

use thiserror_no_std::Error;

/// Failures of the fixed-point compensation formulas.
///
/// Both variants mean the calibration or the sample is corrupt; the caller
/// should drop the sample and read again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompensationError {
    /// The pressure divisor derived from `t_fine` and `par_p1` is zero or negative.
    #[error("pressure divisor is not positive")]
    InvalidPressureDivisor,
    /// The gas resistance divisor evaluated to zero.
    #[error("gas resistance divisor is zero")]
    GasDivisorZero,
}

/// Errors that can occur during communication or configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bme680Error<E> {
    /// Register transport error.
    #[error("register transfer failed")]
    Bus(E),
    /// The reset register did not read back as zero after a soft reset.
    #[error("soft reset did not complete")]
    ResetFailed,
    /// The chip id register does not hold `0x61`.
    #[error("unexpected chip id {0:#04x}")]
    WrongChipId(u8),
    /// Sensor measurement timed out.
    #[error("measurement timed out")]
    Timeout,
    /// The raw sample could not be compensated.
    #[error("compensation failed: {0}")]
    Compensation(#[from] CompensationError),
}

/// Result type alias for BME680 operations.
pub type Result<T, E> = core::result::Result<T, Bme680Error<E>>;
