//! Shared buffers and helpers for the scenarios and benchmarks.

use conservation_runtime::{
    BoundaryRegion, ConservationApi, ConservationRuntime, Projection, ProjectionKind, Shard,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// `len` bytes of `i mod 256`.
pub fn ramp(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// Random bytes, with the last byte adjusted so the buffer is conserved.
pub fn conserved_random(len: usize, rng: &mut impl Rng) -> Vec<u8> {
    let mut data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    if let Some(last) = data.last_mut() {
        *last = 0;
    }
    let residue = conservation_runtime::residue_of(&data);
    if let Some(last) = data.last_mut() {
        *last = (96 - residue) % 96;
    }
    data
}

/// Extract `parts` gap-free shards covering all of `data`.
pub fn split(
    runtime: &ConservationRuntime,
    data: &[u8],
    parts: usize,
) -> anyhow::Result<Vec<Shard>> {
    let projection: Projection<'_> = runtime.create_projection(ProjectionKind::Linear, data)?;
    let regions = BoundaryRegion::partition(data.len(), parts)?;
    let shards = regions
        .iter()
        .map(|region| runtime.extract(&projection, region))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(shards)
}

/// Feed `shards` into a fresh context in the given order and finalize.
pub fn merge(
    runtime: &ConservationRuntime,
    shards: Vec<Shard>,
) -> anyhow::Result<Vec<u8>> {
    let mut ctx = runtime.begin_reconstruction(shards.len() as u32)?;
    for shard in shards {
        ctx.add_shard(shard)?;
    }
    Ok(ctx.finalize(ProjectionKind::Linear)?.into_bytes())
}

/// Shuffle shards into a random arrival order.
pub fn shuffled(mut shards: Vec<Shard>, rng: &mut impl Rng) -> Vec<Shard> {
    shards.shuffle(rng);
    shards
}
