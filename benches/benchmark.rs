use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, RgbImage};
use imgfit::engine::execute;
use imgfit::plan::{plan, ResizeAction};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("plan cover 1600x900 -> 300x300", |b| {
        b.iter(|| {
            plan(
                black_box((1600, 900)),
                black_box((300, 300)),
                ResizeAction::Always,
                true,
                true,
            )
            .unwrap()
        })
    });

    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let cover = plan((256, 256), (64, 64), ResizeAction::Always, true, true).unwrap();
    c.bench_function("execute cover 256x256 -> 64x64", |b| {
        b.iter(|| execute(black_box(img.clone()), &cover).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
