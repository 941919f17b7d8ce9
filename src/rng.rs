use crate::types::CoinSide;
use rand::rngs::StdRng;
use rand::Rng;

/// Source of randomness for the simulator and the shootout resolver.
///
/// Everything random in the crate goes through these two draws, so tests can
/// substitute a scripted sequence and force exact branches.
pub trait RandomSource {
    /// Uniform value in [0, 1)
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in [0, upper); `upper` must be non-zero
    fn next_below(&mut self, upper: u32) -> u32;

    /// Fair coin: heads when the unit draw falls below one half
    fn flip_coin(&mut self) -> CoinSide {
        if self.next_unit() < 0.5 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn next_below(&mut self, upper: u32) -> u32 {
        self.gen_range(0..upper)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn next_below(&mut self, upper: u32) -> u32 {
        (**self).next_below(upper)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_std_rng_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u));
            assert!(rng.next_below(4) < 4);
        }
    }

    #[test]
    fn test_flip_coin_is_roughly_fair() {
        let mut rng = StdRng::seed_from_u64(7);
        let heads = (0..10_000)
            .filter(|_| rng.flip_coin() == CoinSide::Heads)
            .count();
        assert!((4_700..=5_300).contains(&heads), "heads = {}", heads);
    }

    #[test]
    fn test_scripted_coins() {
        let mut source = scripted::ScriptedSource::coins(&[CoinSide::Tails, CoinSide::Heads]);
        assert_eq!(source.flip_coin(), CoinSide::Tails);
        assert_eq!(source.flip_coin(), CoinSide::Heads);
        assert_eq!(source.units_left(), 0);
        assert_eq!(source.next_below(9), 0);
    }
}
