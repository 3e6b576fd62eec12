use std::time::SystemTime;

use log::info;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;

/// Deterministic random source shared by the builders, the animator and the
/// firework manager. Seed it explicitly for reproducible runs.
pub type SceneRng = Pcg64Mcg;

pub fn time_seed() -> u64 {
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    info!("Seeded RNG with {}", seed);
    seed
}

/// Splits an independent child stream off `rng`.
pub fn fork(rng: &mut SceneRng) -> SceneRng {
    SceneRng::seed_from_u64(rng.gen())
}
