use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use txpool_transactions::TxParseContext;

// A mainnet-shaped legacy transfer and a dynamic-fee transaction carrying a
// one-tuple access list, both syntactically valid.
const LEGACY: &str = "f86780862d79883d2000825208945df9b87991262f6ba471f09758cde1c0fc1de734827a69801ca088ff6cf0fefd94db46111149ae4bfc179e9b94721fffd821d38d16464b3f71d0a045e0aff800961cfce805daef7016b9b675c137a6a41a548f7b60a3484c06a33a";

fn dynamic_fee_payload() -> Vec<u8> {
    let mut inner = rlp::RlpStream::new_list(12);
    inner.append(&1u64); // chain id
    inner.append(&42u64); // nonce
    inner.append(&2_000_000_000u64); // tip
    inner.append(&3_000_000_000u64); // fee cap
    inner.append(&30_000u64); // gas
    inner.append(&vec![0x33u8; 20]); // to
    inner.append(&1_000_000_000u64); // value
    inner.append(&vec![0xcau8; 64]); // data
    inner.begin_list(1);
    inner.begin_list(2);
    inner.append(&vec![0x44u8; 20]);
    inner.begin_list(2);
    inner.append(&vec![0x55u8; 32]);
    inner.append(&vec![0x66u8; 32]);
    inner.append(&1u64); // parity
    inner.append(&vec![0x77u8; 32]); // r
    inner.append(&vec![0x88u8; 32]); // s
    let mut typed = vec![0x02];
    typed.extend_from_slice(&inner.out());
    let mut outer = rlp::RlpStream::new();
    outer.append(&typed);
    outer.out().to_vec()
}

fn parse_benchmark(c: &mut Criterion) {
    let legacy = hex::decode(LEGACY).unwrap();
    let dynamic_fee = dynamic_fee_payload();
    let mut ctx = TxParseContext::new();

    let mut group = c.benchmark_group("parse_transaction");
    group.throughput(Throughput::Bytes(legacy.len() as u64));
    group.bench_function("legacy", |b| {
        b.iter(|| ctx.parse_transaction(&legacy, 0).unwrap())
    });
    group.throughput(Throughput::Bytes(dynamic_fee.len() as u64));
    group.bench_function("dynamic_fee", |b| {
        b.iter(|| ctx.parse_transaction(&dynamic_fee, 0).unwrap())
    });
    group.finish();
}

criterion_group!(benches, parse_benchmark);
criterion_main!(benches);
