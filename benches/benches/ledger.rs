use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use locktide_core::{curve, CurveConfig, EmissionLedger, LockLedger, MemoryToken};
use locktide_types::{Address, TOKEN, WEEK, YEAR};

const ADMIN: Address = Address::repeat_byte(0xad);
const CUSTODY: Address = Address::repeat_byte(0xcc);
const MINTER: Address = Address::repeat_byte(0xee);
const TREASURY: Address = Address::repeat_byte(0x77);

fn holder(i: u64) -> Address {
    Address::from_bytes([(i % 16 + 1) as u8; 20])
}

fn populated_ledger(locks: u64) -> (LockLedger, MemoryToken) {
    let config = CurveConfig::default();
    let mut ledger = LockLedger::new(config.locking, ADMIN).unwrap();
    let mut token = MemoryToken::new(CUSTODY, MINTER);
    for i in 0..locks {
        let owner = holder(i);
        token.credit(owner, 100 * TOKEN);
        ledger
            .lock(&mut token, owner, holder(i + 1), 100 * TOKEN, 1 + i % 104, i % 104, 0)
            .unwrap();
    }
    (ledger, token)
}

fn bench_weight(c: &mut Criterion) {
    let params = CurveConfig::default().locking;
    let mut group = c.benchmark_group("curve");

    group.bench_function("voting_weight", |b| {
        b.iter(|| curve::voting_weight(&params, black_box(1000 * TOKEN), black_box(7), black_box(10)))
    });

    group.finish();
}

fn bench_locking(c: &mut Criterion) {
    let mut group = c.benchmark_group("locking");
    let (ledger, _) = populated_ledger(1000);
    let now = 20 * WEEK;

    group.bench_function("voting_power_of_1k_locks", |b| {
        b.iter(|| ledger.voting_power_of(black_box(&holder(3)), now).unwrap())
    });

    group.bench_function("total_voting_power_1k_locks", |b| {
        b.iter(|| ledger.total_voting_power(black_box(now)).unwrap())
    });

    group.bench_function("withdraw_all", |b| {
        b.iter_batched(
            || populated_ledger(256),
            |(mut ledger, mut token)| black_box(ledger.withdraw_all(&mut token, holder(0), 60 * WEEK)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission");

    group.bench_function("weekly_release_40y", |b| {
        b.iter_batched(
            || {
                let config = CurveConfig::default();
                let ledger = EmissionLedger::new(config.emission, ADMIN, MINTER, TREASURY).unwrap();
                (ledger, MemoryToken::new(CUSTODY, MINTER))
            },
            |(mut ledger, mut token)| {
                let mut now = 0;
                while now <= 40 * YEAR {
                    now += WEEK;
                    ledger.emit_tokens(&mut token, now).unwrap();
                }
                black_box(ledger.total_emitted())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_weight, bench_locking, bench_emission);
criterion_main!(benches);
