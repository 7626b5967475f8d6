use std::time::{Duration, Instant};

use clock_api::util::deadline_ms;
use clock_api::{ClockRecord, RecordStore, TypedCache};

use super::config::{Effective, Layout};
use super::domain::{Rng, device_id, generate_clocks};
use super::error::BenchError;
use super::report::{Phase, PhaseTiming, ReportSink};
use super::store::open_store;

// ═══════════════════════════════════════════════════════════════
//  Target: one layout bound to its store
// ═══════════════════════════════════════════════════════════════

pub enum Target {
    PerRecord(RecordStore),
    Partitioned { cache: TypedCache, key: String },
}

impl Target {
    pub fn layout(&self) -> Layout {
        match self {
            Target::PerRecord(_) => Layout::PerRecord,
            Target::Partitioned { .. } => Layout::Partitioned,
        }
    }

    pub async fn flush(&self) -> Result<(), BenchError> {
        match self {
            Target::PerRecord(records) => records.flush().await?,
            Target::Partitioned { cache, .. } => cache.flush().await?,
        }
        Ok(())
    }

    /// Write every clock. Per-record keys get the TTL on write; the
    /// partition key gets its deadline refreshed after the bulk write.
    pub async fn store_all(&self, clocks: &[ClockRecord], ttl: Option<Duration>) -> Result<(), BenchError> {
        match self {
            Target::PerRecord(records) => {
                for clock in clocks {
                    records.store(&clock.device_id, clock, ttl).await?;
                }
            }
            Target::Partitioned { cache, key } => {
                cache
                    .hash_set_all(key, clocks.iter().map(|c| (c.device_id.as_str(), c)), None)
                    .await?;
                if let Some(ttl) = ttl {
                    if !cache.expire_at(key, deadline_ms(ttl)).await? {
                        tracing::warn!(key = %key, "expire: partition key missing after write");
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn load_one(&self, id: &str) -> Result<Option<ClockRecord>, BenchError> {
        let clock = match self {
            Target::PerRecord(records) => records.load(id).await?,
            Target::Partitioned { cache, key } => cache.hash_get(key, id).await?,
        };
        Ok(clock)
    }

    /// The whole partition; `None` for the per-record layout, which has
    /// no single key to read back.
    pub async fn load_all(&self) -> Result<Option<Vec<ClockRecord>>, BenchError> {
        match self {
            Target::PerRecord(_) => Ok(None),
            Target::Partitioned { cache, key } => {
                let all = cache.hash_get_all::<ClockRecord>(key).await?;
                Ok(Some(all.into_iter().map(|(_, clock)| clock).collect()))
            }
        }
    }
}

pub async fn open_target(args: &Effective, layout: Layout) -> Result<Target, BenchError> {
    let prefix = &args.store.key_prefix;
    let target = match layout {
        Layout::PerRecord => {
            let store = open_store(&args.store, args.per_record.database).await?;
            Target::PerRecord(RecordStore::new(store, format!("{prefix}{}", args.per_record.key_prefix)))
        }
        Layout::Partitioned => {
            let store = open_store(&args.store, args.partitioned.database).await?;
            Target::Partitioned {
                cache: TypedCache::new(store).with_key_prefix(prefix.as_str()),
                key: args.partitioned.key.clone(),
            }
        }
    };
    Ok(target)
}

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

pub async fn run(args: &Effective, report: &mut dyn ReportSink) -> Result<(), BenchError> {
    let mut targets = Vec::with_capacity(args.layouts.len());
    for &layout in &args.layouts {
        let target = open_target(args, layout).await?;
        target.flush().await?;
        targets.push(target);
    }

    let mut rng = Rng::new(args.seed);
    run_batches(args, &targets, &mut rng, report).await
}

pub async fn run_batches(
    args: &Effective,
    targets: &[Target],
    rng: &mut Rng,
    report: &mut dyn ReportSink,
) -> Result<(), BenchError> {
    tracing::info!(
        total = args.total,
        batches = args.batches,
        lookups = args.lookups,
        layouts = targets.len(),
        "benchmark starting"
    );
    for batch in 1..=args.batches {
        report.batch_started(batch)?;
        for target in targets {
            run_layout(args, batch, target, rng, report).await?;
        }
    }
    report.finish()?;
    Ok(())
}

async fn run_layout(
    args: &Effective,
    batch: u32,
    target: &Target,
    rng: &mut Rng,
    report: &mut dyn ReportSink,
) -> Result<(), BenchError> {
    let layout = target.layout();
    let timing = |phase, items, misses, elapsed| PhaseTiming { batch, layout, phase, items, misses, elapsed };

    // store: generation is part of the measured phase
    let start = Instant::now();
    let clocks = generate_clocks(args.total, rng);
    target.store_all(&clocks, args.ttl).await?;
    report.phase(&timing(Phase::Store, clocks.len(), 0, start.elapsed()))?;

    let start = Instant::now();
    let mut misses = 0;
    for _ in 0..args.lookups {
        let id = device_id(rng.next_intn(args.total));
        if target.load_one(&id).await?.is_none() {
            misses += 1;
            tracing::warn!(layout = %layout, id = %id, "not found");
        }
    }
    report.phase(&timing(Phase::LookupSingle, args.lookups, misses, start.elapsed()))?;

    let start = Instant::now();
    if let Some(all) = target.load_all().await? {
        report.phase(&timing(Phase::LookupAll, all.len(), 0, start.elapsed()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::config::{Backend, PartitionedSection, PerRecordSection, StoreSection};
    use crate::cmd::report::{BrokenPipe, ConsoleReport, RecordingReport};
    use clock_api::HashStore;
    use std::sync::Arc;
    use storage_memory::MemoryStore;
    use uuid::Uuid;

    fn effective(total: usize, batches: u32, lookups: usize) -> Effective {
        Effective {
            total,
            batches,
            lookups,
            seed: 1234,
            ttl: None,
            layouts: vec![Layout::Partitioned, Layout::PerRecord],
            store: StoreSection { backend: Backend::Memory, ..StoreSection::default() },
            per_record: PerRecordSection::default(),
            partitioned: PartitionedSection::default(),
        }
    }

    #[tokio::test]
    async fn runs_all_phases_for_every_batch() {
        let args = effective(200, 2, 25);
        let mut report = RecordingReport::default();
        run(&args, &mut report).await.unwrap();

        assert_eq!(report.batches, vec![1, 2]);
        assert!(report.finished);
        // partitioned: store, single, all; per-record: store, single
        assert_eq!(report.timings.len(), 10);

        let phases: Vec<(Layout, Phase)> = report.timings[..5].iter().map(|t| (t.layout, t.phase)).collect();
        assert_eq!(
            phases,
            vec![
                (Layout::Partitioned, Phase::Store),
                (Layout::Partitioned, Phase::LookupSingle),
                (Layout::Partitioned, Phase::LookupAll),
                (Layout::PerRecord, Phase::Store),
                (Layout::PerRecord, Phase::LookupSingle),
            ]
        );
        for t in &report.timings {
            assert_eq!(t.misses, 0);
            match t.phase {
                Phase::Store | Phase::LookupAll => assert_eq!(t.items, 200),
                Phase::LookupSingle => assert_eq!(t.items, 25),
            }
        }
        assert_eq!(report.timings[9].batch, 2);
    }

    #[tokio::test]
    async fn per_record_layout_round_trips_through_codec() {
        let store = Arc::new(MemoryStore::default());
        let target = Target::PerRecord(RecordStore::new(store.clone(), "clock:"));
        let clock = ClockRecord::new("GT-42", 54321, Uuid::from_u128(42));

        target.store_all(std::slice::from_ref(&clock), None).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(target.load_one("GT-42").await.unwrap(), Some(clock));
        assert_eq!(target.load_one("GT-43").await.unwrap(), None);
        assert_eq!(target.load_all().await.unwrap(), None);
    }

    #[tokio::test]
    async fn partitioned_layout_uses_one_key_and_ttl() {
        let store = Arc::new(MemoryStore::default());
        let target = Target::Partitioned {
            cache: TypedCache::new(store.clone()).with_key_prefix("bench:"),
            key: "clocksPartition1".into(),
        };
        let mut rng = Rng::new(5);
        let clocks = generate_clocks(50, &mut rng);

        target.store_all(&clocks, Some(Duration::from_secs(60))).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get_hash("bench:clocksPartition1").await.unwrap().len(), 50);
        assert_eq!(target.load_one("GT-7").await.unwrap().as_ref(), Some(&clocks[7]));

        let mut all = target.load_all().await.unwrap().unwrap();
        all.sort_by_key(|c| c.device_id[3..].parse::<usize>().unwrap());
        assert_eq!(all, clocks);
    }

    #[tokio::test]
    async fn expired_records_read_as_missing() {
        let args = Effective { ttl: Some(Duration::from_secs(60)), ..effective(10, 1, 5) };
        let store = Arc::new(MemoryStore::default());
        let targets = vec![Target::PerRecord(RecordStore::new(store.clone(), "clock:"))];
        let mut rng = Rng::new(9);
        let mut report = RecordingReport::default();

        run_batches(&args, &targets, &mut rng, &mut report).await.unwrap();
        assert_eq!(report.timings[1].misses, 0);

        // push every deadline into the past, then look up again
        for i in 0..10 {
            store.expire(&format!("clock:GT-{i}"), clock_api::now_ms() - 1).await.unwrap();
        }
        assert_eq!(targets[0].load_one("GT-3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_record_aborts_run() {
        let store = Arc::new(MemoryStore::default());
        store
            .set_hash("clock:GT-0", &[clock_api::HashEntry::new("ClientId", "not-a-number")], None)
            .await
            .unwrap();
        let target = Target::PerRecord(RecordStore::new(store, "clock:"));

        let err = target.load_one("GT-0").await.unwrap_err();
        assert!(matches!(err, BenchError::Store(ref e) if e.kind() == clock_api::ErrorKind::Format));
    }

    #[tokio::test]
    async fn report_write_failure_aborts_run() {
        let args = effective(10, 3, 2);
        let mut report = ConsoleReport::new(BrokenPipe);

        let err = run(&args, &mut report).await.unwrap_err();
        assert!(matches!(err, BenchError::Report(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }
}
