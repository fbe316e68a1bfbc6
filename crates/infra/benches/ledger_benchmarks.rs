use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use gudang_catalog::ItemId;
use gudang_core::AggregateId;
use gudang_events::{EventEnvelope, InMemoryEventBus};
use gudang_infra::balance::balance_as_of;
use gudang_infra::command_dispatcher::CommandDispatcher;
use gudang_infra::event_store::InMemoryEventStore;
use gudang_ledger::{LedgerCommand, MovementDirection, RecordMovement, StockLedger};

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

fn setup() -> (CommandDispatcher<Arc<InMemoryEventStore>, Bus>, Arc<InMemoryEventStore>) {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    (CommandDispatcher::new(store.clone(), bus), store)
}

fn record_cmd(item_id: ItemId, direction: MovementDirection, quantity: u64) -> LedgerCommand {
    LedgerCommand::RecordMovement(RecordMovement {
        item_id,
        direction,
        quantity,
        actor: None,
        occurred_at: Utc::now(),
    })
}

fn dispatch(
    dispatcher: &CommandDispatcher<Arc<InMemoryEventStore>, Bus>,
    item_id: ItemId,
    direction: MovementDirection,
    quantity: u64,
) {
    dispatcher
        .dispatch(
            item_id.0,
            "ledger.stock",
            record_cmd(item_id, direction, quantity),
            |id| StockLedger::empty(ItemId::new(id)),
        )
        .unwrap();
}

fn bench_record_movement_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_movement_latency");

    // First movement on a fresh stream (no history to replay).
    group.bench_function("receive_fresh_stream", |b| {
        let (dispatcher, _store) = setup();
        b.iter(|| {
            let item_id = ItemId::new(AggregateId::new());
            dispatch(&dispatcher, item_id, MovementDirection::In, black_box(10));
        });
    });

    // Movement against a stream with history: rehydration dominates.
    for history in [100u64, 1000] {
        group.bench_with_input(
            BenchmarkId::new("receive_with_history", history),
            &history,
            |b, &history| {
                let (dispatcher, _store) = setup();
                let item_id = ItemId::new(AggregateId::new());
                for _ in 0..history {
                    dispatch(&dispatcher, item_id, MovementDirection::In, 10);
                }
                b.iter(|| {
                    dispatch(&dispatcher, item_id, MovementDirection::In, black_box(1));
                });
            },
        );
    }

    group.finish();
}

fn bench_balance_as_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_as_of");

    for history in [100u64, 1000] {
        let (dispatcher, store) = setup();
        let item_id = ItemId::new(AggregateId::new());
        for _ in 0..history {
            dispatch(&dispatcher, item_id, MovementDirection::In, 10);
        }
        let cutoff = Utc::now();

        group.throughput(Throughput::Elements(history));
        group.bench_with_input(BenchmarkId::from_parameter(history), &history, |b, _| {
            b.iter(|| balance_as_of(&store, black_box(item_id), cutoff).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record_movement_latency, bench_balance_as_of);
criterion_main!(benches);
