use criterion::{criterion_group, criterion_main, Criterion};
use nmea_parser::{field, RmcParser};
use std::hint::black_box;

const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

fn bench_parse(c: &mut Criterion) {
    let lenient = RmcParser::new();
    let strict = RmcParser::new().with_checksum_verification(true);

    c.bench_function("rmc_parse", |b| b.iter(|| lenient.parse(black_box(RMC))));
    c.bench_function("rmc_parse_checksum", |b| b.iter(|| strict.parse(black_box(RMC))));
    c.bench_function("gga_reject", |b| b.iter(|| lenient.parse(black_box(GGA))));
    c.bench_function("field_extract", |b| b.iter(|| field(black_box(RMC), 9)));
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
