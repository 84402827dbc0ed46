use std::ops::{BitAnd, Shl};

use num_traits::Unsigned;

use crate::{
    circuit::ComponentId,
    circuit_builder::{Connector, SharedBuilder},
    circuit_sim::{RunReport, SimulationEngine},
    error::{EngineError, ModelError},
    event::Observer,
};

/// A group of single-bit sources or sinks read and written as one unsigned value.
/// Bit `i` of the value maps to component `i`.
pub struct Word<const BITS: usize>(pub [ComponentId; BITS]);

impl<const BITS: usize> Word<BITS> {
    /// Creates `BITS` new sources.
    pub fn sources(builder: &SharedBuilder) -> Result<(Self, Vec<Connector>), ModelError> {
        let mut contents = [ComponentId::default(); BITS];
        let mut connectors = Vec::with_capacity(BITS);
        for slot in contents.iter_mut() {
            let connector = Connector::source(builder)?;
            *slot = connector.component;
            connectors.push(connector);
        }
        Ok((Word(contents), connectors))
    }

    /// Terminates each connector in a sink.
    pub fn sinks(connectors: &[Connector]) -> Result<Self, ModelError> {
        let mut contents = [ComponentId::default(); BITS];
        for (slot, connector) in contents.iter_mut().zip(connectors) {
            *slot = connector.sink()?;
        }
        Ok(Word(contents))
    }

    /// Reads sinks by their observed value and everything else by its output.
    /// Values not simulated yet read as zero.
    pub fn read<T, O>(&self, engine: &SimulationEngine<O>) -> T
    where
        T: Unsigned + Shl<usize, Output = T>,
        O: Observer,
    {
        let mut sum = T::zero();
        for (bit, id) in self.0.iter().cloned().enumerate() {
            let active = engine
                .sink_value(id)
                .or_else(|| engine.output_state(id))
                .unwrap_or(false);
            if active {
                sum = sum + (T::one() << bit);
            }
        }
        sum
    }

    /// Stages every bit of `val` on the sources without draining.
    pub fn stage<T, O>(&self, engine: &mut SimulationEngine<O>, val: T) -> Result<(), EngineError>
    where
        T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
        O: Observer,
    {
        for (bit, id) in self.0.iter().cloned().enumerate() {
            let bit_val = (val & (T::one() << bit)) != T::zero();
            engine.stage_source(id, bit_val)?;
        }
        Ok(())
    }

    pub fn set<T, O>(&self, engine: &mut SimulationEngine<O>, val: T) -> Result<RunReport, EngineError>
    where
        T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
        O: Observer,
    {
        self.stage(engine, val)?;
        Ok(engine.drain())
    }
}
