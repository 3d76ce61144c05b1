//! Position animations fed to entities as producers.

use std::time::Duration;

use futures::stream::{self, Stream};
use nacht_scene::Vec3;

/// Endless staircase walk: each step advances `x` then `y` by `step`,
/// pausing `interval` before every position.
pub fn staircase(step: f64, interval: Duration) -> impl Stream<Item = Vec3> + Send + 'static {
    stream::unfold((0u64, [0.0, 0.0, 0.0]), move |(n, mut position)| async move {
        tokio::time::sleep(interval).await;
        position[(n % 2) as usize] += step;
        Some((position, (n + 1, position)))
    })
}
