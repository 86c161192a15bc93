//! C4: Adaptive Resource Controller.
//!
//! Chooses a buffer size and FD budget for one refinement round from a
//! memory cap, the round's group size, and configured buffer bounds.

#[derive(Debug, Clone, Copy)]
pub struct ResourceBounds {
    pub max_memory: u64,
    pub max_buffer_size: usize,
    pub min_buffer_size: usize,
    pub max_open_files_hard: usize,
}

impl Default for ResourceBounds {
    fn default() -> Self {
        ResourceBounds {
            max_memory: 256 * 1024 * 1024,
            max_buffer_size: 1024 * 1024,
            min_buffer_size: 4096,
            max_open_files_hard: 64,
        }
    }
}

/// Snaps `x` to the nearest power of two, rounding ties up. Picking a
/// power-of-two buffer size keeps allocations predictable across rounds
/// rather than tightly optimal.
pub fn pow2_near(x: u64) -> u64 {
    if x <= 1 {
        return 1;
    }
    let lower = 1u64 << (63 - x.leading_zeros());
    let upper = lower.checked_shl(1).unwrap_or(lower);
    if upper - x <= x - lower {
        upper
    } else {
        lower
    }
}

/// Buffer size and FD budget for a round comparing `group_size` streams.
pub struct RoundPlan {
    pub buffer_size: usize,
    pub max_open_files: usize,
}

impl ResourceBounds {
    /// `is_first_read` forces `min_buffer_size`, keeping first-read
    /// latency low since most buckets resolve on the first block.
    pub fn plan_round(&self, group_size: usize, is_first_read: bool) -> RoundPlan {
        let buffer_size = if is_first_read {
            self.min_buffer_size
        } else {
            let g = group_size.max(1) as u64;
            let target = self.max_memory / g;
            let snapped = pow2_near(target.max(1));
            (snapped as usize).clamp(self.min_buffer_size, self.max_buffer_size)
        };

        let max_open_files = ((self.max_memory / buffer_size as u64) as usize)
            .max(1)
            .min(self.max_open_files_hard);

        RoundPlan { buffer_size, max_open_files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_near_snaps_correctly() {
        assert_eq!(pow2_near(1), 1);
        assert_eq!(pow2_near(3), 4);
        assert_eq!(pow2_near(5), 4);
        assert_eq!(pow2_near(6), 8);
        assert_eq!(pow2_near(1024), 1024);
    }

    #[test]
    fn first_read_uses_minimum_buffer() {
        let bounds = ResourceBounds::default();
        let plan = bounds.plan_round(500, true);
        assert_eq!(plan.buffer_size, bounds.min_buffer_size);
    }

    #[test]
    fn large_group_shrinks_buffer() {
        let bounds = ResourceBounds::default();
        let small_group = bounds.plan_round(2, false);
        let large_group = bounds.plan_round(10_000, false);
        assert!(large_group.buffer_size <= small_group.buffer_size);
    }

    #[test]
    fn memory_bound_respected() {
        let bounds = ResourceBounds::default();
        for g in [1usize, 2, 10, 1000, 100_000] {
            let plan = bounds.plan_round(g, false);
            assert!((g as u64) * (plan.buffer_size as u64) <= bounds.max_memory * 2);
        }
    }
}
