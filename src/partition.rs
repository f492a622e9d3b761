//! Splits the requested page span into contiguous per-worker sub-ranges.

/// One worker's share of the requested page range.
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    pub index: usize,
    /// Token embedded in the worker's output file names so that partitions
    /// sharing an output directory cannot pick up each other's files.
    pub run_id: String,
    /// First page of the sub-range, inclusive.
    pub first: u32,
    /// Last page of the sub-range, inclusive.
    pub last: u32,
}

/// Divides `[first, last]` into at most `thread_count` contiguous,
/// non-overlapping sub-ranges in ascending page order. The worker count is
/// clamped to `[1, page count]` and any remainder pages go to the earliest
/// partitions, so partition sizes never differ by more than one.
pub(crate) fn partition_range(first: u32, last: u32, thread_count: usize) -> Vec<Partition> {
    debug_assert!(first <= last);
    let page_count = (last - first + 1) as usize;
    let workers = thread_count.clamp(1, page_count);
    let base = page_count / workers;
    let remainder = page_count % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut current = first;
    for index in 0..workers {
        let size = base + usize::from(index < remainder);
        let last_page = current + size as u32 - 1;
        partitions.push(Partition {
            index,
            run_id: run_id(),
            first: current,
            last: last_page,
        });
        current = last_page + 1;
    }
    partitions
}

fn run_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(partitions: &[Partition]) -> Vec<u32> {
        partitions.iter().map(|p| p.last - p.first + 1).collect()
    }

    #[test]
    fn covers_the_range_without_gaps_or_overlap() {
        for (first, last, threads) in [(1, 1, 1), (1, 10, 3), (3, 17, 4), (5, 5, 8), (1, 100, 7)] {
            let partitions = partition_range(first, last, threads);
            assert_eq!(partitions[0].first, first);
            assert_eq!(partitions.last().unwrap().last, last);
            for (index, partition) in partitions.iter().enumerate() {
                assert_eq!(partition.index, index);
                assert!(partition.first <= partition.last);
            }
            for pair in partitions.windows(2) {
                assert_eq!(pair[1].first, pair[0].last + 1);
            }
            assert_eq!(sizes(&partitions).iter().sum::<u32>(), last - first + 1);
        }
    }

    #[test]
    fn clamps_the_worker_count_to_the_page_count() {
        assert_eq!(partition_range(1, 3, 16).len(), 3);
        assert_eq!(partition_range(1, 3, 0).len(), 1);
        assert_eq!(partition_range(7, 7, 4).len(), 1);
    }

    #[test]
    fn earliest_partitions_take_the_remainder() {
        assert_eq!(sizes(&partition_range(1, 10, 3)), vec![4, 3, 3]);
        assert_eq!(sizes(&partition_range(1, 7, 4)), vec![2, 2, 2, 1]);
    }

    #[test]
    fn run_ids_are_unique_per_partition() {
        let partitions = partition_range(1, 50, 50);
        let mut ids: Vec<_> = partitions.iter().map(|p| p.run_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
