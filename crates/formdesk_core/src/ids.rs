use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;

/// Hands out task ids derived from the creation time in milliseconds.
///
/// Two tasks created in the same millisecond (or across a clock step
/// backwards) still get distinct, strictly increasing ids.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    last: AtomicI64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the generator so new ids sort after ids already on disk.
    pub fn starting_after(last_id: i64) -> Self {
        Self {
            last: AtomicI64::new(last_id),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next_id_at(now_millis())
    }

    fn next_id_at(&self, candidate: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(current.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::TaskIdGenerator;
    use std::sync::Arc;

    #[test]
    fn ids_follow_the_clock() {
        let ids = TaskIdGenerator::new();
        assert_eq!(ids.next_id_at(1_700_000_000_000), 1_700_000_000_000);
        assert_eq!(ids.next_id_at(1_700_000_000_500), 1_700_000_000_500);
    }

    #[test]
    fn same_millisecond_still_increases() {
        let ids = TaskIdGenerator::new();
        let first = ids.next_id_at(1_000);
        let second = ids.next_id_at(1_000);
        let third = ids.next_id_at(999);
        assert_eq!((first, second, third), (1_000, 1_001, 1_002));
    }

    #[test]
    fn seeded_generator_skips_existing_ids() {
        let ids = TaskIdGenerator::starting_after(i64::MAX - 1);
        assert_eq!(ids.next_id(), i64::MAX);
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let ids = Arc::new(TaskIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
