//! Startup precondition: factory oscillator calibration must be present

/// Value read back from erased flash
pub const ERASED: u8 = 0xFF;

/// Factory DCO calibration pair
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Basic clock control (range select)
    pub bcs: u8,
    /// DCO step and modulation
    pub dco: u8,
}

/// Unrecoverable startup failures
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// Calibration constants were erased; the clock cannot be trusted
    MissingCalibration { bcs: u8, dco: u8 },
}

#[cfg(feature = "std")]
impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FatalError::MissingCalibration { bcs, dco } => {
                write!(f, "Calibration constants missing (bcs={:#04x}, dco={:#04x})", bcs, dco)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FatalError {}

/// Where the calibration constants live
pub trait CalibrationSource {
    fn read(&mut self) -> Calibration;
}

/// Oscillator that accepts a calibration pair
pub trait ClockControl {
    fn apply(&mut self, calibration: Calibration);
}

/// Reject erased constants
pub fn check_calibration(raw: Calibration) -> Result<Calibration, FatalError> {
    if raw.bcs == ERASED || raw.dco == ERASED {
        return Err(FatalError::MissingCalibration {
            bcs: raw.bcs,
            dco: raw.dco,
        });
    }
    Ok(raw)
}

/// Check the calibration, then program the oscillator with it
///
/// Nothing is written to the clock when the check fails.
pub fn bring_up<S, C>(source: &mut S, clock: &mut C) -> Result<Calibration, FatalError>
where
    S: CalibrationSource,
    C: ClockControl,
{
    let calibration = check_calibration(source.read())?;
    clock.apply(calibration);
    info!("Clock calibrated: bcs={} dco={}", calibration.bcs, calibration.dco);
    Ok(calibration)
}
