//! Benchmarks for bind elision in the render state cache

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sparkle_assets::{AssetKind, AssetMetadata, NormalizedPayload};
use sparkle_core::{PixelFormat, ShaderStage};
use sparkle_render::{BindingSlot, GpuHandle, RenderConfig, RenderContext};
use sparkle_test_utils::{
    BindTarget, BufferDesc, DriverId, DriverResult, GraphicsDriver, SamplerParams, TextureDesc,
};

/// Accepts everything and records nothing, so only cache overhead is measured.
struct NullDriver {
    next_id: AtomicU32,
}

impl NullDriver {
    fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1),
        }
    }

    fn allocate(&self) -> DriverResult<DriverId> {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(DriverId::new(raw).unwrap())
    }
}

impl GraphicsDriver for NullDriver {
    fn max_texture_units(&self) -> u32 {
        16
    }

    fn create_texture(&self, _desc: &TextureDesc) -> DriverResult<DriverId> {
        self.allocate()
    }

    fn upload_texture(&self, _texture: DriverId, _desc: &TextureDesc, _pixels: &[u8]) -> DriverResult<()> {
        Ok(())
    }

    fn set_texture_params(&self, _texture: DriverId, _params: &SamplerParams) -> DriverResult<()> {
        Ok(())
    }

    fn destroy_texture(&self, _texture: DriverId) {}

    fn create_buffer(&self, _desc: &BufferDesc) -> DriverResult<DriverId> {
        self.allocate()
    }

    fn upload_buffer(&self, _buffer: DriverId, _offset: u64, _data: &[u8]) -> DriverResult<()> {
        Ok(())
    }

    fn destroy_buffer(&self, _buffer: DriverId) {}

    fn create_shader(&self, _stage: ShaderStage) -> DriverResult<DriverId> {
        self.allocate()
    }

    fn compile_shader(&self, _shader: DriverId, _source: &str) -> DriverResult<()> {
        Ok(())
    }

    fn destroy_shader(&self, _shader: DriverId) {}

    fn create_program(&self) -> DriverResult<DriverId> {
        self.allocate()
    }

    fn link_program(&self, _program: DriverId, _shaders: &[DriverId]) -> DriverResult<()> {
        Ok(())
    }

    fn destroy_program(&self, _program: DriverId) {}

    fn bind(&self, target: BindTarget, object: Option<DriverId>) {
        black_box((target, object));
    }
}

fn textures(ctx: &RenderContext, count: usize) -> Vec<GpuHandle> {
    (0..count)
        .map(|i| {
            let payload = NormalizedPayload::new(
                AssetMetadata::Image {
                    width: 1,
                    height: 1,
                    format: PixelFormat::Rgba8,
                },
                (i as u32).to_le_bytes().to_vec(),
            );
            ctx.acquire_raw(AssetKind::Image, &payload).unwrap()
        })
        .collect()
}

fn bench_repeated_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_cache_repeated_bind");
    let mut ctx = RenderContext::new(Arc::new(NullDriver::new()), RenderConfig::default());
    let handles = textures(&ctx, 1);
    let slot = BindingSlot::texture(0);

    group.throughput(Throughput::Elements(1));
    group.bench_function("elided", |b| {
        b.iter(|| ctx.bind(black_box(slot), &handles[0]).unwrap());
    });

    group.finish();
}

fn bench_alternating_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_cache_alternating_bind");

    for count in [2, 8, 64] {
        let mut ctx = RenderContext::new(Arc::new(NullDriver::new()), RenderConfig::default());
        let handles = textures(&ctx, count);
        let slot = BindingSlot::texture(0);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                for handle in &handles {
                    ctx.bind(slot, handle).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_bind_texture_lru(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_cache_bind_texture");

    for count in [8, 32] {
        let mut ctx = RenderContext::new(Arc::new(NullDriver::new()), RenderConfig::default());
        let handles = textures(&ctx, count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                for handle in &handles {
                    black_box(ctx.bind_texture(handle).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_repeated_bind,
    bench_alternating_bind,
    bench_bind_texture_lru
);
criterion_main!(benches);
