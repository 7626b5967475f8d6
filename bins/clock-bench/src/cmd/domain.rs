use clock_api::ClockRecord;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════
//  Clock generation
// ═══════════════════════════════════════════════════════════════

pub const CLIENT_ID_MIN: u64 = 10_000;
pub const CLIENT_ID_MAX: u64 = 99_999;

pub fn device_id(i: usize) -> String {
    format!("GT-{i}")
}

/// `total` fresh clocks `GT-0..GT-{total-1}`, random client ids in
/// `[10000, 99999)` and a new group id each.
pub fn generate_clocks(total: usize, rng: &mut Rng) -> Vec<ClockRecord> {
    (0..total)
        .map(|i| {
            let client_id = rng.next_range(CLIENT_ID_MIN, CLIENT_ID_MAX) as i32;
            ClockRecord::new(device_id(i), client_id, rng.next_uuid())
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════
//  RNG (xorshift64)
// ═══════════════════════════════════════════════════════════════

pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: i64) -> Self {
        let state = if seed == 0 {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
                | 1 // ensure non-zero
        } else {
            seed as u64
        };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    pub fn next_intn(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Uniform in `[lo, hi)`.
    pub fn next_range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo)
    }

    /// Random (version 4) UUID.
    pub fn next_uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}
