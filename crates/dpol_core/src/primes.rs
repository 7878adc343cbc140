//! Prime moduli for X-adic lifting
//!
//! The lifting radix X must be prime (the inverse oracle works over Z/XZ)
//! and must not divide det(A). Large 31-bit primes make the latter
//! overwhelmingly likely while keeping every oracle product inside u64.

/// Prime generator for lifting moduli
pub struct PrimeGenerator;

impl PrimeGenerator {
    /// Generate `count` 31-bit primes, descending from 2^31
    pub fn generate_31bit_primes(count: usize) -> Vec<u32> {
        let mut primes = Vec::with_capacity(count);
        let mut candidate = (1u32 << 31) - 1;

        while primes.len() < count && candidate > 2 {
            if Self::is_prime_u32(candidate) {
                primes.push(candidate);
            }
            candidate -= 2;
        }

        primes
    }

    /// Simple primality test for 32-bit integers
    pub fn is_prime_u32(n: u32) -> bool {
        if n < 2 {
            return false;
        }
        if n < 4 {
            return true;
        }
        if n % 2 == 0 {
            return false;
        }

        let n64 = n as u64;
        let mut i = 3u64;
        while i * i <= n64 {
            if n64 % i == 0 {
                return false;
            }
            i += 2;
        }
        true
    }
}
