use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh entity id: the current clock in milliseconds plus a random
/// offset, kept strictly increasing within the process and skipping any value
/// `taken` reports as used by the owning collection.
pub fn next_id(taken: impl Fn(u64) -> bool) -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut candidate = now + rand::thread_rng().gen_range(0..1000);
    loop {
        let last = LAST_ID.load(Ordering::SeqCst);
        if candidate <= last {
            candidate = last + 1;
        }
        if taken(candidate) {
            candidate += 1;
            continue;
        }
        if LAST_ID
            .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return candidate;
        }
    }
}

/// Module ids keep the `mod_` string shape of stored documents.
pub fn next_module_id(taken: impl Fn(&str) -> bool) -> String {
    let mut suffix = rand::thread_rng().gen_range(0..1000);
    loop {
        let candidate = format!("mod_{}{}", Utc::now().timestamp_millis(), suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_and_skip_taken() {
        let first = next_id(|_| false);
        let second = next_id(|id| id == first + 1);
        assert!(second > first);
        assert_ne!(second, first + 1);
    }

    #[test]
    fn module_ids_avoid_collisions() {
        let first = next_module_id(|_| false);
        let second = next_module_id(|id| id == first);
        assert!(second.starts_with("mod_"));
        assert_ne!(first, second);
    }
}
