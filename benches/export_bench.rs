use criterion::{black_box, criterion_group, criterion_main, Criterion};
use domsnap::{data_uri, Bitmap, ImageFormat};

fn bench_data_uri(c: &mut Criterion) {
    let bitmap = Bitmap {
        width: 256,
        height: 128,
        data: vec![0xAB; 64 * 1024],
        format: ImageFormat::Png,
    };

    c.bench_function("data_uri_64k", |b| b.iter(|| data_uri(black_box(&bitmap))));
}

// Benchmarks the prototype capture pipeline when the `dom` feature is enabled.
#[cfg(feature = "dom")]
fn bench_prototype_capture(c: &mut Criterion) {
    use domsnap::dom::{layout, paint};

    let text =
        "Watched 42 shows across 310 episodes in 2024, averaging five hours of airtime a week";

    c.bench_function("layout_paint_encode", |b| {
        b.iter(|| {
            let tl = layout::layout_text(black_box(text), 512);
            let commands = paint::paint_layout(&tl);
            let rgba = paint::rasterize(&commands, tl.rect.width, tl.rect.height);
            paint::encode_png(tl.rect.width, tl.rect.height, &rgba).unwrap()
        })
    });
}

#[cfg(not(feature = "dom"))]
fn bench_prototype_capture(_c: &mut Criterion) {}

criterion_group!(benches, bench_data_uri, bench_prototype_capture);
criterion_main!(benches);
