//! Input edge handling: advance the relay pattern and pulse the indicator

use core::time::Duration;

use crate::controller::DataRegister;
use crate::hal::{duration_us, EdgeInput, HalError, IndicatorOutput, SerialEngine};
use crate::types::DataByte;

/// Handler for the edge-triggered input
///
/// While it runs, both the serial-engine interrupt and its own edge
/// interrupt are masked. Edges that arrive in that window are dropped
/// because the edge flag is cleared unconditionally on the way out.
#[derive(Copy, Clone, Debug)]
pub struct InputEventHandler {
    pulse: Duration,
}

impl InputEventHandler {
    pub const fn new(pulse: Duration) -> Self {
        Self { pulse }
    }

    pub fn pulse(&self) -> Duration {
        self.pulse
    }

    /// Mask both interrupt sources, advance the data register and drive
    /// the indicator low
    pub fn begin<E, X, L>(
        &self,
        data: &DataRegister,
        engine: &mut E,
        edge: &mut X,
        indicator: &mut L,
    ) -> Result<DataByte, HalError>
    where
        E: SerialEngine,
        X: EdgeInput,
        L: IndicatorOutput,
    {
        engine.set_interrupt_enabled(false).map_err(Into::into)?;
        edge.set_interrupt_enabled(false).map_err(Into::into)?;

        let value = data.advance();
        debug!("Relay pattern -> {}", value);

        indicator.set_level(false).map_err(Into::into)?;
        Ok(value)
    }

    /// End the pulse and unmask in reverse order
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned.
    pub fn finish<E, X, L>(&self, engine: &mut E, edge: &mut X, indicator: &mut L) -> Result<(), HalError>
    where
        E: SerialEngine,
        X: EdgeInput,
        L: IndicatorOutput,
    {
        let level = indicator.set_level(true).map_err(Into::into);
        let unmasked = edge.set_interrupt_enabled(true).map_err(Into::into);
        let cleared = edge.clear_pending().map_err(Into::into);
        let resumed = engine.set_interrupt_enabled(true).map_err(Into::into);
        level.and(unmasked).and(cleared).and(resumed)
    }

    /// Handle one edge, blocking for the pulse
    pub fn handle<E, X, L, D>(
        &self,
        data: &DataRegister,
        engine: &mut E,
        edge: &mut X,
        indicator: &mut L,
        delay: &mut D,
    ) -> Result<DataByte, HalError>
    where
        E: SerialEngine,
        X: EdgeInput,
        L: IndicatorOutput,
        D: embedded_hal::delay::DelayNs,
    {
        let begun = self.begin(data, engine, edge, indicator);
        if begun.is_ok() {
            delay.delay_us(duration_us(self.pulse));
        }
        // Unmask even when `begin` stopped halfway
        let finished = self.finish(engine, edge, indicator);
        let value = begun?;
        finished?;
        Ok(value)
    }

    /// Handle one edge, awaiting the pulse
    #[cfg(feature = "async")]
    pub async fn handle_async<E, X, L, D>(
        &self,
        data: &DataRegister,
        engine: &mut E,
        edge: &mut X,
        indicator: &mut L,
        delay: &mut D,
    ) -> Result<DataByte, HalError>
    where
        E: SerialEngine,
        X: EdgeInput,
        L: IndicatorOutput,
        D: embedded_hal_async::delay::DelayNs,
    {
        let begun = self.begin(data, engine, edge, indicator);
        if begun.is_ok() {
            delay.delay_us(duration_us(self.pulse)).await;
        }
        let finished = self.finish(engine, edge, indicator);
        let value = begun?;
        finished?;
        Ok(value)
    }
}
