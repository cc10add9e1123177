//! Criterion benchmarks for the volume codecs

use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use voxelio::{
    decode_mhd, decode_nrrd, encode_mhd, encode_nrrd, MhdEncodeOptions, NrrdEncodeOptions,
    PixelType, Volume,
};

fn bench_volume() -> Volume {
    let mut vol = Volume::new([64, 64, 64], PixelType::U16).unwrap();
    for (i, b) in vol.data.iter_mut().enumerate() {
        *b = (i % 256) as u8;
    }
    vol
}

fn bench_nrrd(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.nrrd");
    let vol = bench_volume();
    encode_nrrd(&path, &vol, &NrrdEncodeOptions::default()).unwrap();

    c.bench_function("nrrd_decode_64cube_u16", |b| {
        b.iter(|| decode_nrrd(&path).unwrap())
    });
    c.bench_function("nrrd_encode_64cube_u16", |b| {
        b.iter(|| encode_nrrd(&path, &vol, &NrrdEncodeOptions::default()).unwrap())
    });
}

fn bench_mhd(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.mha");
    let vol = bench_volume();
    encode_mhd(&path, &vol, &MhdEncodeOptions::default()).unwrap();

    c.bench_function("mhd_decode_64cube_u16", |b| {
        b.iter(|| decode_mhd(&path).unwrap())
    });
    c.bench_function("mhd_encode_64cube_u16", |b| {
        b.iter(|| encode_mhd(&path, &vol, &MhdEncodeOptions::default()).unwrap())
    });
}

criterion_group!(benches, bench_nrrd, bench_mhd);
criterion_main!(benches);
