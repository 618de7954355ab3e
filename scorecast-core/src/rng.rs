//! Deterministic random sources for Monte Carlo simulation.
//!
//! Two generator algorithms are provided behind one `RandomSource` trait:
//! a Lehmer LCG (modulus 2^31-1, multiplier 16807) and mulberry32. Both are
//! deterministic per seed. A master seed is expanded into per-subject
//! sub-seeds via BLAKE3 hashing, independently of thread scheduling order,
//! so batch results are identical regardless of thread count.

use serde::{Deserialize, Serialize};

/// Modulus of the Lehmer generator: 2^31 - 1 (a Mersenne prime).
pub const LCG_MODULUS: u64 = 2_147_483_647;

const LCG_MULTIPLIER: u64 = 16_807;

/// A seeded stream of pseudo-random draws.
///
/// Implementations must be deterministic per seed and own all of their
/// state; two sources with different seeds never interfere.
pub trait RandomSource {
    /// Next uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Next standard-normal draw via the Box-Muller cosine transform.
    ///
    /// The first uniform sample is re-drawn if it is exactly zero, since
    /// `ln(0)` is undefined.
    fn next_normal(&mut self) -> f64 {
        let mut u1 = self.next_uniform();
        while u1 == 0.0 {
            u1 = self.next_uniform();
        }
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

// ─── Generators ──────────────────────────────────────────────────────

/// Lehmer (Park-Miller) multiplicative LCG: `state = state * 16807 mod 2^31-1`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create an LCG from a seed.
    ///
    /// The seed is reduced into `[1, 2^31-2]`; a zero state would map to
    /// zero forever under multiplication.
    pub fn new(seed: u64) -> Self {
        let mut state = seed % LCG_MODULUS;
        if state == 0 {
            state = 1;
        }
        Self { state }
    }
}

impl RandomSource for Lcg {
    fn next_uniform(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// mulberry32 over wrapping u32 arithmetic.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed as u32 }
    }
}

impl RandomSource for Mulberry32 {
    fn next_uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        (z ^ (z >> 14)) as f64 / 4_294_967_296.0
    }
}

/// Which generator algorithm a simulation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneratorKind {
    #[default]
    Lcg,
    Mulberry32,
}

impl GeneratorKind {
    /// Create a seeded source of this kind.
    pub fn source(self, seed: u64) -> Box<dyn RandomSource> {
        match self {
            GeneratorKind::Lcg => Box::new(Lcg::new(seed)),
            GeneratorKind::Mulberry32 => Box::new(Mulberry32::new(seed)),
        }
    }
}

// ─── Seed hierarchy ──────────────────────────────────────────────────

/// Deterministic sub-seed derivation.
///
/// The master seed is expanded into per-label sub-seeds using BLAKE3.
/// Because derivation is hash-based (not order-dependent), the same master
/// seed produces identical sub-seeds regardless of the order in which
/// subjects are processed.
#[derive(Debug, Clone)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a label (typically a subject name).
    pub fn sub_seed(&self, label: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Create a seeded source of the given kind for a label.
    pub fn source_for(&self, kind: GeneratorKind, label: &str) -> Box<dyn RandomSource> {
        kind.source(self.sub_seed(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Uniform draws ──

    #[test]
    fn lcg_is_deterministic() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_uniform(), b.next_uniform());
        }
    }

    #[test]
    fn lcg_seeds_diverge() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(43);
        let draws_a: Vec<f64> = (0..8).map(|_| a.next_uniform()).collect();
        let draws_b: Vec<f64> = (0..8).map(|_| b.next_uniform()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn lcg_zero_seed_does_not_stick() {
        let mut rng = Lcg::new(0);
        let first = rng.next_uniform();
        let second = rng.next_uniform();
        assert!(first > 0.0);
        assert_ne!(first, second);
    }

    #[test]
    fn lcg_known_sequence() {
        // Park-Miller minimal standard from state 1: 16807, 282475249, ...
        let mut rng = Lcg::new(1);
        let first = rng.next_uniform();
        assert!((first - 16_807.0 / LCG_MODULUS as f64).abs() < 1e-15);
        let second = rng.next_uniform();
        assert!((second - 282_475_249.0 / LCG_MODULUS as f64).abs() < 1e-15);
    }

    #[test]
    fn mulberry32_is_deterministic() {
        let mut a = Mulberry32::new(1234);
        let mut b = Mulberry32::new(1234);
        for _ in 0..100 {
            assert_eq!(a.next_uniform(), b.next_uniform());
        }
    }

    #[test]
    fn uniform_draws_stay_in_unit_interval() {
        let mut lcg = Lcg::new(7);
        let mut mb = Mulberry32::new(7);
        for _ in 0..10_000 {
            let u = lcg.next_uniform();
            assert!((0.0..1.0).contains(&u), "lcg out of range: {u}");
            let v = mb.next_uniform();
            assert!((0.0..1.0).contains(&v), "mulberry32 out of range: {v}");
        }
    }

    // ── Normal draws ──

    #[test]
    fn normal_draws_have_plausible_moments() {
        let mut rng = Lcg::new(42);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| rng.next_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean too far from 0: {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance too far from 1: {var}");
    }

    #[test]
    fn normal_draws_deterministic_across_generators() {
        for kind in [GeneratorKind::Lcg, GeneratorKind::Mulberry32] {
            let mut a = kind.source(99);
            let mut b = kind.source(99);
            for _ in 0..50 {
                assert_eq!(a.next_normal(), b.next_normal());
            }
        }
    }

    // ── Seed hierarchy ──

    #[test]
    fn sub_seeds_are_deterministic() {
        let hierarchy = SeedHierarchy::new(42);
        assert_eq!(hierarchy.sub_seed("algebra"), hierarchy.sub_seed("algebra"));
    }

    #[test]
    fn different_labels_different_seeds() {
        let hierarchy = SeedHierarchy::new(42);
        assert_ne!(hierarchy.sub_seed("algebra"), hierarchy.sub_seed("biology"));
    }

    #[test]
    fn derivation_order_independent() {
        let hierarchy = SeedHierarchy::new(42);

        let algebra_first = hierarchy.sub_seed("algebra");
        let biology_second = hierarchy.sub_seed("biology");

        let biology_first = hierarchy.sub_seed("biology");
        let algebra_second = hierarchy.sub_seed("algebra");

        assert_eq!(algebra_first, algebra_second);
        assert_eq!(biology_first, biology_second);
    }

    #[test]
    fn different_master_seeds_different_output() {
        let h1 = SeedHierarchy::new(42);
        let h2 = SeedHierarchy::new(43);
        assert_ne!(h1.sub_seed("algebra"), h2.sub_seed("algebra"));
    }
}
