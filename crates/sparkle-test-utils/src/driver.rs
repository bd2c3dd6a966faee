//! The graphics driver surface consumed by the render side.
//!
//! The trait mirrors a GL-style stateful API: objects are named by integer
//! ids, creation is split into allocate/upload/configure steps, and binding
//! mutates global context state. Implementations are only ever driven from
//! the render thread, but must be `Send + Sync` so owners can share them.

use sparkle_core::ShaderStage;

use crate::driver_types::*;

/// Trait abstracting graphics-API object creation and binding.
///
/// Methods take `&self` so implementations can be shared behind an `Arc`;
/// mock implementations use interior mutability to record calls.
///
/// # Example
///
/// ```rust,no_run
/// use sparkle_test_utils::{BufferDesc, BufferUsage, GraphicsDriver};
///
/// fn upload(driver: &dyn GraphicsDriver, bytes: &[u8]) {
///     let desc = BufferDesc {
///         size: bytes.len() as u64,
///         usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
///     };
///     if let Ok(buffer) = driver.create_buffer(&desc) {
///         let _ = driver.upload_buffer(buffer, 0, bytes);
///     }
/// }
/// ```
pub trait GraphicsDriver: Send + Sync {
    /// Number of texture units available for simultaneous binding.
    fn max_texture_units(&self) -> u32;

    // Textures

    fn create_texture(&self, desc: &TextureDesc) -> DriverResult<DriverId>;

    /// Upload the full image. `pixels.len()` equals `desc.byte_size()`.
    fn upload_texture(&self, texture: DriverId, desc: &TextureDesc, pixels: &[u8]) -> DriverResult<()>;

    fn set_texture_params(&self, texture: DriverId, params: &SamplerParams) -> DriverResult<()>;

    fn destroy_texture(&self, texture: DriverId);

    // Buffers

    fn create_buffer(&self, desc: &BufferDesc) -> DriverResult<DriverId>;

    fn upload_buffer(&self, buffer: DriverId, offset: u64, data: &[u8]) -> DriverResult<()>;

    fn destroy_buffer(&self, buffer: DriverId);

    // Shaders and programs

    fn create_shader(&self, stage: ShaderStage) -> DriverResult<DriverId>;

    /// Compile the source. Fails with [`DriverError::CompileFailed`] carrying the info log.
    fn compile_shader(&self, shader: DriverId, source: &str) -> DriverResult<()>;

    fn destroy_shader(&self, shader: DriverId);

    fn create_program(&self) -> DriverResult<DriverId>;

    /// Attach and link. Fails with [`DriverError::LinkFailed`] carrying the info log.
    fn link_program(&self, program: DriverId, shaders: &[DriverId]) -> DriverResult<()>;

    fn destroy_program(&self, program: DriverId);

    // State

    /// Bind `object` to `target`, or clear the binding with `None`.
    fn bind(&self, target: BindTarget, object: Option<DriverId>);
}
