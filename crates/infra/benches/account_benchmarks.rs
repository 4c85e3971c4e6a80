use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use uuid::Uuid;

use bankes_accounts::{
    AccountCreated, AccountEvent, AccountId, BalanceUpdated, BankAccount, Currency,
    validate_open_account, validate_update_balance,
};
use bankes_core::{Aggregate, ExpectedVersion};
use bankes_infra::entity::ACCOUNT_AGGREGATE_TYPE;
use bankes_infra::event_store::{EventStore, InMemoryEventStore, UncommittedEvent};
use bankes_infra::{AccountRouter, Bank};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn history(account_id: AccountId, updates: usize) -> Vec<AccountEvent> {
    let mut events = Vec::with_capacity(updates + 1);
    events.push(AccountEvent::AccountCreated(AccountCreated {
        account: bankes_accounts::Account {
            id: account_id,
            owner: "bench".to_string(),
            currency: Currency::parse("USD").unwrap(),
            balance: Decimal::ZERO,
        },
        occurred_at: Utc::now(),
    }));
    for _ in 0..updates {
        events.push(AccountEvent::BalanceUpdated(BalanceUpdated {
            account_id,
            amount: Decimal::new(125, 2),
            occurred_at: Utc::now(),
        }));
    }
    events
}

async fn bank_with_account(store: Arc<InMemoryEventStore>) -> (Bank, AccountId) {
    let bank = AccountRouter::start(store, Duration::from_secs(5)).await.unwrap();
    let open = validate_open_account("bench", "USD", Decimal::from(1_000_000)).unwrap();
    let id = bank.create_account(open).await.unwrap();
    (bank, id)
}

fn bench_command_latency(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("command_latency");

    let (bank, id) = rt.block_on(bank_with_account(Arc::new(InMemoryEventStore::new())));
    let bank = &bank;

    group.bench_function("update_balance", |b| {
        b.to_async(&rt).iter(|| async move {
            let command = validate_update_balance(id, "USD", Decimal::new(-1, 2), Utc::now()).unwrap();
            black_box(bank.update_balance(command).await.unwrap())
        })
    });

    group.bench_function("get_account", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(bank.get_account(id).await.unwrap()) })
    });

    group.bench_function("create_account", |b| {
        b.to_async(&rt).iter(|| async move {
            let open = validate_open_account("bench", "USD", Decimal::ZERO).unwrap();
            black_box(bank.create_account(open).await.unwrap())
        })
    });

    group.finish();
}

fn bench_append_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("event_append_throughput");

    for batch_size in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, &size| {
            let store = &InMemoryEventStore::new();
            b.to_async(&rt).iter(|| async move {
                let account_id = AccountId::generate();
                let batch = history(account_id, size - 1)
                    .iter()
                    .map(|ev| {
                        UncommittedEvent::from_typed(
                            account_id.aggregate_id(),
                            ACCOUNT_AGGREGATE_TYPE,
                            Uuid::now_v7(),
                            ev,
                        )
                        .unwrap()
                    })
                    .collect::<Vec<_>>();
                black_box(store.append(batch, ExpectedVersion::Exact(0)).await.unwrap())
            })
        });
    }

    group.finish();
}

fn bench_replay_speed(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("replay_speed");

    for event_count in [10usize, 100, 1000, 10000] {
        let account_id = AccountId::generate();
        let events = history(account_id, event_count - 1);

        group.throughput(Throughput::Elements(event_count as u64));
        group.bench_with_input(BenchmarkId::new("fold", event_count), &events, |b, events| {
            b.iter(|| black_box(BankAccount::empty(account_id).replay(events)))
        });

        let store = Arc::new(InMemoryEventStore::new());
        let batch = events
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(account_id.aggregate_id(), ACCOUNT_AGGREGATE_TYPE, Uuid::now_v7(), ev)
                    .unwrap()
            })
            .collect::<Vec<_>>();
        rt.block_on(store.append(batch, ExpectedVersion::Exact(0))).unwrap();

        group.bench_with_input(BenchmarkId::new("load_and_recover", event_count), &store, |b, store| {
            b.to_async(&rt).iter(|| {
                let store = Arc::clone(store);
                async move {
                    let entity = bankes_infra::entity::AccountEntity::recover(account_id, store)
                        .await
                        .unwrap();
                    black_box(entity.account().clone())
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_command_latency, bench_append_throughput, bench_replay_speed);
criterion_main!(benches);
