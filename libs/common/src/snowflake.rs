use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch offset: 2025-01-01T00:00:00Z, in ms since the Unix epoch.
const CHAT_EPOCH_MS: u64 = 1_735_689_600_000;

const WORKER_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// 64-bit time-ordered message ID generator.
///
/// An ID packs, high to low: 42 bits of milliseconds since the chat
/// epoch, a 10-bit worker ID, and a 12-bit per-millisecond sequence.
/// IDs from one generator are strictly increasing, so sorting by ID is
/// sorting by creation time.
pub struct SnowflakeGenerator {
    worker_id: u64,
    clock: Mutex<Clock>,
}

struct Clock {
    last_ms: u64,
    sequence: u64,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Self {
        assert!(
            (worker_id as u64) < (1 << WORKER_BITS),
            "worker_id must fit in {WORKER_BITS} bits"
        );
        Self {
            worker_id: worker_id as u64,
            clock: Mutex::new(Clock {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    pub fn generate(&self) -> i64 {
        let mut clock = self.clock.lock().unwrap();
        let mut now_ms = current_ms();

        if now_ms < clock.last_ms {
            panic!(
                "clock moved backwards: last_ms={}, now_ms={}",
                clock.last_ms, now_ms
            );
        }

        if now_ms == clock.last_ms {
            clock.sequence = (clock.sequence + 1) & SEQUENCE_MASK;
            if clock.sequence == 0 {
                // 4096 IDs already minted this millisecond; wait for
                // the next one.
                while now_ms == clock.last_ms {
                    now_ms = current_ms();
                }
            }
        } else {
            clock.sequence = 0;
        }
        clock.last_ms = now_ms;

        let ts = now_ms - CHAT_EPOCH_MS;
        ((ts << (WORKER_BITS + SEQUENCE_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | clock.sequence) as i64
    }
}

/// Recover the creation time (ms since the Unix epoch) from an ID.
pub fn snowflake_timestamp_ms(id: i64) -> u64 {
    ((id as u64) >> (WORKER_BITS + SEQUENCE_BITS)) + CHAT_EPOCH_MS
}

fn current_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before Unix epoch")
        .as_millis() as u64
}
