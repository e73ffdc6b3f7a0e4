pub mod pose;

/**
 * Stateless 64 bit mixer (splitmix64 finalizer). Used to derive uncorrelated per sample seeds.
 */
pub fn mix_seed(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
