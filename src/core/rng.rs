/// Seeded randomness: a pure function from seed material to draws.
///
/// There is no generator state: every draw is derived from a string key,
/// so the same key yields the same draw in any process, on any thread.
/// The hash is FNV-1a 64 followed by the MurmurHash3 `fmix64` finalizer;
/// the finalizer spreads single-character key differences across the high
/// bits that the unit-interval mapping reads.

use rand::Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 2^53: the number of distinct `f64` values in `[0, 1)` at full precision.
const UNIT_SCALE: f64 = (1u64 << 53) as f64;

/// FNV-1a 64-bit hash of the UTF-8 bytes of `input`.
pub fn fnv1a_64(input: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// MurmurHash3 64-bit finalizer.
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// The stable 64-bit hash used for every draw.
pub fn seed_hash(material: &str) -> u64 {
    fmix64(fnv1a_64(material))
}

/// A uniform draw in `[0, 1)` derived from `material`.
pub fn derive_unit(material: &str) -> f64 {
    (seed_hash(material) >> 11) as f64 / UNIT_SCALE
}

/// A uniform index in `[0, n)` derived from `material`. `None` when `n == 0`.
pub fn derive_index(material: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let scaled = (derive_unit(material) * n as f64) as usize;
    Some(scaled.min(n - 1))
}

/// A fresh seed string from OS entropy, for callers that supply none.
pub fn entropy_seed() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

/// Seed material for one variation: `"{seed}-variation-{index}"`.
///
/// All keys for draws inside the variation are built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationSeed(String);

impl VariationSeed {
    pub fn new(seed: &str, variation_index: usize) -> Self {
        Self(format!("{}-variation-{}", seed, variation_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key for the `occurrence`-th use of `name` in this variation.
    pub fn variable_key(&self, name: &str, occurrence: usize) -> String {
        format!("{}-{}-{}", self.0, name, occurrence)
    }

    /// Key for the `occurrence`-th walk of option group `group_index`.
    pub fn option_key(&self, group_index: usize, occurrence: usize) -> String {
        format!("{}-option-{}-{}", self.0, group_index, occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a_64(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a_64("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn derive_is_pure() {
        let a = derive_unit("abc-variation-0-color-0");
        let b = derive_unit("abc-variation-0-color-0");
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn unit_range() {
        for i in 0..10_000 {
            let u = derive_unit(&format!("range-{}", i));
            assert!((0.0..1.0).contains(&u), "draw {} out of range: {}", i, u);
        }
    }

    #[test]
    fn adjacent_keys_spread() {
        // Keys differing only in their last character must not cluster.
        let draws: Vec<f64> = (0..10)
            .map(|i| derive_unit(&format!("seed-variation-{}", i)))
            .collect();
        let min = draws.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = draws.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(max - min > 0.3, "draws clustered: {:?}", draws);
    }

    #[test]
    fn index_bounds() {
        assert_eq!(derive_index("x", 0), None);
        assert_eq!(derive_index("x", 1), Some(0));
        let mut seen = [false; 4];
        for i in 0..200 {
            let idx = derive_index(&format!("idx-{}", i), 4).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s), "not every index drawn: {:?}", seen);
    }

    #[test]
    fn key_construction() {
        let seed = VariationSeed::new("abc", 1);
        assert_eq!(seed.as_str(), "abc-variation-1");
        assert_eq!(seed.variable_key("color", 0), "abc-variation-1-color-0");
        assert_eq!(seed.option_key(2, 3), "abc-variation-1-option-2-3");
    }

    #[test]
    fn entropy_seeds_differ() {
        assert_ne!(entropy_seed(), entropy_seed());
    }
}
