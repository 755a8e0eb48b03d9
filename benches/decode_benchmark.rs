use armgpuinfo::mappings::ModelDatabase;
use armgpuinfo::props::{decode, encode_property, PropertyId, RawProperties, ValueWidth};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn property_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    encode_property(&mut buf, PropertyId::ProductId.code(), ValueWidth::U32, 0xb862);
    encode_property(&mut buf, PropertyId::L2Log2CacheSize.code(), ValueWidth::U8, 19);
    encode_property(&mut buf, PropertyId::L2NumL2Slices.code(), ValueWidth::U8, 4);
    encode_property(&mut buf, PropertyId::RawL2Features.code(), ValueWidth::U32, 0x0813_0206);
    encode_property(&mut buf, PropertyId::RawCoreFeatures.code(), ValueWidth::U32, 0x1);
    encode_property(&mut buf, PropertyId::RawThreadFeatures.code(), ValueWidth::U32, 0x0a04_0400);
    // unknown ids a real driver interleaves with the interesting ones
    for code in 100..140 {
        encode_property(&mut buf, code, ValueWidth::U64, u64::from(code));
    }
    encode_property(&mut buf, PropertyId::CoherencyNumGroups.code(), ValueWidth::U8, 1);
    encode_property(&mut buf, PropertyId::CoherencyGroup0.code(), ValueWidth::U64, 0x3FF);
    buf
}

pub fn bench_decode(c: &mut Criterion) {
    let stream = property_stream();
    c.bench_function("decode_property_stream", |b| {
        b.iter(|| decode(black_box(&stream)))
    });
    c.bench_function("aggregate_raw_properties", |b| {
        b.iter(|| decode(black_box(&stream)).and_then(|fields| RawProperties::from_fields(&fields)))
    });
}

pub fn bench_resolve(c: &mut Criterion) {
    let db = ModelDatabase::builtin();
    c.bench_function("resolve_last_table_entry", |b| {
        b.iter(|| db.resolve(black_box(0xe003), black_box(1), 0, 0))
    });
    c.bench_function("resolve_unknown", |b| {
        b.iter(|| db.resolve(black_box(0xFFFF), black_box(4), 0, 0))
    });
}

criterion_group!(benches, bench_decode, bench_resolve);
criterion_main!(benches);
