//! The generator behind the `Rand` instruction. It is the sample `rand()` from POSIX, so a
//! fresh generator replays the same sequence every run and every dispatch strategy sees
//! identical "random" values.

use rand_core::{impls, Error, RngCore, SeedableRng};

/// Largest value `next_u32` returns.
pub const RAND_MAX: u32 = 32767;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CRand {
  next: u32
}

impl CRand {
  pub fn new(seed: u32) -> CRand {
    CRand{ next: seed }
  }
}

impl Default for CRand {
  // C's `rand()` behaves as if seeded with 1.
  fn default() -> Self {
    CRand::new(1)
  }
}

impl RngCore for CRand {
  fn next_u32(&mut self) -> u32 {
    self.next = self.next.wrapping_mul(1103515245).wrapping_add(12345);
    (self.next / 65536) % (RAND_MAX + 1)
  }

  fn next_u64(&mut self) -> u64 {
    impls::next_u64_via_u32(self)
  }

  fn fill_bytes(&mut self, dest: &mut [u8]) {
    impls::fill_bytes_via_next(self, dest)
  }

  fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
    self.fill_bytes(dest);
    Ok(())
  }
}

impl SeedableRng for CRand {
  type Seed = [u8; 4];

  fn from_seed(seed: Self::Seed) -> Self {
    CRand::new(u32::from_le_bytes(seed))
  }
}
