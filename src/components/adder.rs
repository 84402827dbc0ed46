use crate::{
    circuit::ComponentId,
    circuit_builder::{ops::*, Connector, SharedBuilder},
    error::ModelError,
};

use super::word::Word;

struct Adder {
    sum: Connector,
    cout: Connector,
}

// Three-input XOR gives the sum bit directly; the carry is a majority vote.
fn adder(a: Connector, b: Connector, cin: Connector) -> Result<Adder, ModelError> {
    let sum = xor!(a, b, cin)?;
    let cout = or!(and!(a, b)?, and!(a, cin)?, and!(b, cin)?)?;
    Ok(Adder { sum, cout })
}

pub struct RippleCarryAdder<const BITS: usize> {
    pub input_a: Word<BITS>,
    pub input_b: Word<BITS>,
    pub cin: ComponentId,
    pub cout: ComponentId,
    pub sum: Word<BITS>,
}

impl<const BITS: usize> RippleCarryAdder<BITS> {
    pub fn new(builder: &SharedBuilder) -> Result<RippleCarryAdder<BITS>, ModelError> {
        assert!(BITS > 0);

        let cin = Connector::source(builder)?;
        let (input_a, a_bits) = Word::<BITS>::sources(builder)?;
        let (input_b, b_bits) = Word::<BITS>::sources(builder)?;

        let mut rca = Self {
            input_a,
            input_b,
            cin: cin.component,
            cout: Default::default(),
            sum: Word([ComponentId::default(); BITS]),
        };

        let mut carry = cin;
        let mut sums = Vec::with_capacity(BITS);
        for (a, b) in a_bits.into_iter().zip(b_bits) {
            let Adder { sum, cout } = adder(a, b, carry)?;
            sums.push(sum);
            carry = cout;
        }
        rca.sum = Word::sinks(&sums)?;
        rca.cout = carry.sink()?;
        Ok(rca)
    }
}

#[cfg(test)]
mod test {
    use rand::RngCore;

    use crate::{
        circuit_builder::{CircuitBuilder, Connector},
        circuit_sim::{SimulationEngine, Status},
        config::EngineConfig,
    };

    use super::{adder, RippleCarryAdder};

    fn test_adder(a: bool, b: bool, cin: bool) {
        let builder = CircuitBuilder::shared();
        let ca = Connector::source(&builder).unwrap();
        let cb = Connector::source(&builder).unwrap();
        let ccin = Connector::source(&builder).unwrap();
        let (ia, ib, icin) = (ca.component, cb.component, ccin.component);
        let adder = adder(ca, cb, ccin).unwrap();
        let sum = adder.sum.sink().unwrap();
        let cout = adder.cout.sink().unwrap();

        let mut engine = SimulationEngine::new(CircuitBuilder::finish(&builder));
        engine.stage_source(ia, a).unwrap();
        engine.stage_source(ib, b).unwrap();
        engine.stage_source(icin, cin).unwrap();
        assert_eq!(engine.drain().status, Status::Stable);

        assert_eq!(engine.sink_value(sum), Some(a ^ b ^ cin));
        assert_eq!(
            engine.sink_value(cout),
            Some((a && b) || (a && cin) || (b && cin))
        );
    }

    #[test]
    fn adder_tests() {
        test_adder(false, false, false);
        test_adder(true, false, false);
        test_adder(false, true, false);
        test_adder(true, true, false);
        test_adder(false, false, true);
        test_adder(true, false, true);
        test_adder(false, true, true);
        test_adder(true, true, true);
    }

    fn test_rca_add<const BITS: usize>(
        engine: &mut SimulationEngine,
        rca: &RippleCarryAdder<BITS>,
        a: u64,
        b: u64,
    ) {
        let overflow = 1 << BITS;
        assert!(a < overflow && b < overflow);

        rca.input_a.stage(engine, a).unwrap();
        rca.input_b.stage(engine, b).unwrap();
        assert_eq!(engine.drain().status, Status::Stable);

        let expected_sum = a + b;
        let (expected_sum, expected_cout) = if expected_sum < overflow {
            (expected_sum, false)
        } else {
            (expected_sum - overflow, true)
        };

        let sum: u64 = rca.sum.read(engine);
        let cout = engine.sink_value(rca.cout);

        assert_eq!(sum, expected_sum, "{a} + {b} = {expected_sum}");
        assert_eq!(
            cout,
            Some(expected_cout),
            "{a} + {b} with {BITS} bits has cout: {expected_cout}"
        );
    }

    #[test]
    fn rca_tests() {
        let builder = CircuitBuilder::shared();
        let rca = RippleCarryAdder::<16>::new(&builder).unwrap();
        // worst-case glitching grows with wires times carry depth, above the default cap at 16 bits
        let config = EngineConfig::with_max_steps(100_000).unwrap();
        let mut engine = SimulationEngine::with_config(CircuitBuilder::finish(&builder), config);
        assert_eq!(engine.run_to_completion().status, Status::Stable);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let a = rng.next_u32() as u16;
            let b = rng.next_u32() as u16;
            test_rca_add(&mut engine, &rca, a as u64, b as u64);
        }
        test_rca_add(&mut engine, &rca, 0xffff, 1);
    }
}
