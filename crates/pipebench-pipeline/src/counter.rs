//! Single-writer completion counter.
//!
//! The recorder half lives on the connection task and is the only writer; it
//! publishes each new value with a release store, so no read-modify-write is
//! needed per completion. Reader halves load with acquire ordering from any
//! thread. The value sits alone in a 128-byte aligned slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[repr(align(128))]
#[derive(Debug, Default)]
struct PaddedCounter {
    value: AtomicU64,
}

/// Create a linked recorder/reader pair starting at zero.
pub fn completion_counter() -> (CompletionRecorder, CompletionReader) {
    let shared = Arc::new(PaddedCounter::default());
    (
        CompletionRecorder {
            shared: Arc::clone(&shared),
            local: 0,
        },
        CompletionReader { shared },
    )
}

/// The only writer of a completion counter. Not `Clone`.
#[derive(Debug)]
pub struct CompletionRecorder {
    shared: Arc<PaddedCounter>,
    local: u64,
}

impl CompletionRecorder {
    /// Record one completed round trip.
    pub fn increment(&mut self) {
        self.local += 1;
        self.shared.value.store(self.local, Ordering::Release);
    }

    /// The value most recently published by this recorder.
    pub fn get(&self) -> u64 {
        self.local
    }

    /// A new reader observing this counter.
    pub fn reader(&self) -> CompletionReader {
        CompletionReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A read-only handle on a completion counter.
#[derive(Debug, Clone)]
pub struct CompletionReader {
    shared: Arc<PaddedCounter>,
}

impl CompletionReader {
    pub fn get(&self) -> u64 {
        self.shared.value.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_slot_is_cache_line_isolated() {
        assert_eq!(std::mem::align_of::<PaddedCounter>(), 128);
        assert_eq!(std::mem::size_of::<PaddedCounter>(), 128);
    }

    #[test]
    fn reader_sees_recorded_completions() {
        let (mut recorder, reader) = completion_counter();
        assert_eq!(reader.get(), 0);

        for _ in 0..5 {
            recorder.increment();
        }

        assert_eq!(recorder.get(), 5);
        assert_eq!(reader.get(), 5);
        assert_eq!(recorder.reader().get(), 5);
    }

    #[test]
    fn cross_thread_reads_are_monotonic() {
        let (mut recorder, reader) = completion_counter();

        let observer = std::thread::spawn(move || {
            let mut last = 0;
            while last < 100_000 {
                let now = reader.get();
                assert!(now >= last, "counter went backwards: {now} < {last}");
                last = now;
            }
            last
        });

        for _ in 0..100_000 {
            recorder.increment();
        }

        assert_eq!(observer.join().unwrap(), 100_000);
    }
}
