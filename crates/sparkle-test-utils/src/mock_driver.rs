//! Recording implementation of [`GraphicsDriver`] for tests.
//!
//! The mock allocates ids, tracks which objects are alive and what is bound,
//! and records every call so tests can assert on exact driver traffic.

use parking_lot::Mutex;
use sparkle_core::ShaderStage;
use sparkle_core::alloc::HashMap;

use crate::driver::GraphicsDriver;
use crate::driver_types::*;

/// Records a driver call for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CreateTexture {
        id: DriverId,
        width: u32,
        height: u32,
        format: sparkle_core::PixelFormat,
    },
    UploadTexture {
        id: DriverId,
        bytes: usize,
    },
    SetTextureParams {
        id: DriverId,
        params: SamplerParams,
    },
    DestroyTexture {
        id: DriverId,
    },
    CreateBuffer {
        id: DriverId,
        size: u64,
        usage: BufferUsage,
    },
    UploadBuffer {
        id: DriverId,
        offset: u64,
        bytes: usize,
    },
    DestroyBuffer {
        id: DriverId,
    },
    CreateShader {
        id: DriverId,
        stage: ShaderStage,
    },
    CompileShader {
        id: DriverId,
    },
    DestroyShader {
        id: DriverId,
    },
    CreateProgram {
        id: DriverId,
    },
    LinkProgram {
        id: DriverId,
        shaders: Vec<DriverId>,
    },
    DestroyProgram {
        id: DriverId,
    },
    Bind {
        target: BindTarget,
        object: Option<DriverId>,
    },
}

/// A fallible driver entry point that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateTexture,
    UploadTexture,
    SetTextureParams,
    CreateBuffer,
    UploadBuffer,
    CreateShader,
    CompileShader,
    CreateProgram,
    LinkProgram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockObject {
    Texture,
    Buffer,
    Shader { stage: ShaderStage, compiled: bool },
    Program { linked: bool },
}

struct MockState {
    next_id: u32,
    live: HashMap<DriverId, MockObject>,
    bound: HashMap<BindTarget, DriverId>,
    injected: Vec<(FailPoint, DriverError)>,
    context_lost: bool,
    invalid_destroys: usize,
}

/// Mock implementation of [`GraphicsDriver`].
///
/// Shader sources containing a `#error` directive fail to compile, mirroring
/// what a GLSL compiler does. Linking requires every attached shader to be
/// compiled and the stages to form a complete pipeline.
///
/// # Example
///
/// ```rust
/// use sparkle_test_utils::{BufferDesc, BufferUsage, GraphicsDriver, MockDriver};
///
/// let mock = MockDriver::new();
/// let buffer = mock
///     .create_buffer(&BufferDesc { size: 64, usage: BufferUsage::VERTEX })
///     .unwrap();
/// mock.upload_buffer(buffer, 0, &[0u8; 64]).unwrap();
///
/// assert_eq!(mock.count_buffer_creates(), 1);
/// assert_eq!(mock.count_uploads(), 1);
/// ```
pub struct MockDriver {
    calls: Mutex<Vec<DriverCall>>,
    state: Mutex<MockState>,
    texture_units: u32,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_texture_units(16)
    }

    pub fn with_texture_units(texture_units: u32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(MockState {
                next_id: 1,
                live: HashMap::new(),
                bound: HashMap::new(),
                injected: Vec::new(),
                context_lost: false,
                invalid_destroys: 0,
            }),
            texture_units,
        }
    }

    /// Make the next call through `point` fail with `error`.
    pub fn fail_next(&self, point: FailPoint, error: DriverError) {
        self.state.lock().injected.push((point, error));
    }

    /// Drop every object and fail all fallible calls until [`restore_context`](Self::restore_context).
    pub fn lose_context(&self) {
        let mut state = self.state.lock();
        state.context_lost = true;
        state.live.clear();
        state.bound.clear();
    }

    pub fn restore_context(&self) {
        self.state.lock().context_lost = false;
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CreateTexture { .. }))
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CreateBuffer { .. }))
    }

    pub fn count_shader_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CreateShader { .. }))
    }

    pub fn count_shader_compiles(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CompileShader { .. }))
    }

    pub fn count_program_links(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::LinkProgram { .. }))
    }

    /// Count texture and buffer uploads.
    pub fn count_uploads(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                DriverCall::UploadTexture { .. } | DriverCall::UploadBuffer { .. }
            )
        })
    }

    pub fn count_destroys(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                DriverCall::DestroyTexture { .. }
                    | DriverCall::DestroyBuffer { .. }
                    | DriverCall::DestroyShader { .. }
                    | DriverCall::DestroyProgram { .. }
            )
        })
    }

    pub fn count_binds(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Bind { .. }))
    }

    /// Number of objects created and not yet destroyed.
    pub fn live_object_count(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn is_live(&self, id: DriverId) -> bool {
        self.state.lock().live.contains_key(&id)
    }

    /// What the driver currently has bound at `target`.
    pub fn bound(&self, target: BindTarget) -> Option<DriverId> {
        self.state.lock().bound.get(&target).copied()
    }

    /// Destroy calls naming an object that was not alive (double free).
    pub fn invalid_destroys(&self) -> usize {
        self.state.lock().invalid_destroys
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }

    fn check(state: &mut MockState, point: FailPoint) -> DriverResult<()> {
        if state.context_lost {
            return Err(DriverError::ContextLost);
        }
        if let Some(pos) = state.injected.iter().position(|(p, _)| *p == point) {
            let (_, error) = state.injected.remove(pos);
            return Err(error);
        }
        Ok(())
    }

    fn allocate(&self, point: FailPoint, object: MockObject) -> DriverResult<DriverId> {
        let mut state = self.state.lock();
        Self::check(&mut state, point)?;
        let id = DriverId::new(state.next_id).ok_or_else(|| DriverError::Other {
            message: "driver ids exhausted".to_string(),
        })?;
        state.next_id += 1;
        state.live.insert(id, object);
        Ok(id)
    }

    fn expect_live(state: &MockState, id: DriverId, pred: impl Fn(&MockObject) -> bool) -> DriverResult<()> {
        match state.live.get(&id) {
            Some(object) if pred(object) => Ok(()),
            _ => Err(DriverError::InvalidObject { id }),
        }
    }

    fn destroy(&self, id: DriverId, pred: impl Fn(&MockObject) -> bool) {
        let mut state = self.state.lock();
        if state.context_lost {
            return;
        }
        match state.live.get(&id) {
            Some(object) if pred(object) => {
                state.live.remove(&id);
                state.bound.retain(|_, bound| *bound != id);
            }
            _ => state.invalid_destroys += 1,
        }
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_log(source: &str) -> Option<String> {
    source.lines().enumerate().find_map(|(line, text)| {
        let text = text.trim_start();
        text.strip_prefix("#error")
            .map(|msg| format!("ERROR: 0:{}: '#error' : {}", line + 1, msg.trim()))
    })
}

fn link_log(stages: &[ShaderStage]) -> Option<String> {
    let has = |stage| stages.contains(&stage);
    if stages.is_empty() {
        return Some("no shaders attached".to_string());
    }
    if has(ShaderStage::Compute) {
        if stages.len() > 1 {
            return Some("compute shaders cannot be linked with graphics stages".to_string());
        }
        return None;
    }
    if !has(ShaderStage::Vertex) {
        return Some("missing vertex shader".to_string());
    }
    if !has(ShaderStage::Fragment) {
        return Some("missing fragment shader".to_string());
    }
    None
}

impl GraphicsDriver for MockDriver {
    fn max_texture_units(&self) -> u32 {
        self.texture_units
    }

    fn create_texture(&self, desc: &TextureDesc) -> DriverResult<DriverId> {
        let id = self.allocate(FailPoint::CreateTexture, MockObject::Texture)?;
        self.record(DriverCall::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        Ok(id)
    }

    fn upload_texture(&self, texture: DriverId, desc: &TextureDesc, pixels: &[u8]) -> DriverResult<()> {
        self.record(DriverCall::UploadTexture {
            id: texture,
            bytes: pixels.len(),
        });
        let mut state = self.state.lock();
        Self::check(&mut state, FailPoint::UploadTexture)?;
        Self::expect_live(&state, texture, |o| matches!(o, MockObject::Texture))?;
        if pixels.len() as u64 != desc.byte_size() {
            return Err(DriverError::Other {
                message: format!(
                    "texture upload of {} bytes does not match {}x{} {:?}",
                    pixels.len(),
                    desc.width,
                    desc.height,
                    desc.format
                ),
            });
        }
        Ok(())
    }

    fn set_texture_params(&self, texture: DriverId, params: &SamplerParams) -> DriverResult<()> {
        self.record(DriverCall::SetTextureParams {
            id: texture,
            params: *params,
        });
        let mut state = self.state.lock();
        Self::check(&mut state, FailPoint::SetTextureParams)?;
        Self::expect_live(&state, texture, |o| matches!(o, MockObject::Texture))
    }

    fn destroy_texture(&self, texture: DriverId) {
        self.record(DriverCall::DestroyTexture { id: texture });
        self.destroy(texture, |o| matches!(o, MockObject::Texture));
    }

    fn create_buffer(&self, desc: &BufferDesc) -> DriverResult<DriverId> {
        let id = self.allocate(FailPoint::CreateBuffer, MockObject::Buffer)?;
        self.record(DriverCall::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        });
        Ok(id)
    }

    fn upload_buffer(&self, buffer: DriverId, offset: u64, data: &[u8]) -> DriverResult<()> {
        self.record(DriverCall::UploadBuffer {
            id: buffer,
            offset,
            bytes: data.len(),
        });
        let mut state = self.state.lock();
        Self::check(&mut state, FailPoint::UploadBuffer)?;
        Self::expect_live(&state, buffer, |o| matches!(o, MockObject::Buffer))
    }

    fn destroy_buffer(&self, buffer: DriverId) {
        self.record(DriverCall::DestroyBuffer { id: buffer });
        self.destroy(buffer, |o| matches!(o, MockObject::Buffer));
    }

    fn create_shader(&self, stage: ShaderStage) -> DriverResult<DriverId> {
        let id = self.allocate(
            FailPoint::CreateShader,
            MockObject::Shader {
                stage,
                compiled: false,
            },
        )?;
        self.record(DriverCall::CreateShader { id, stage });
        Ok(id)
    }

    fn compile_shader(&self, shader: DriverId, source: &str) -> DriverResult<()> {
        self.record(DriverCall::CompileShader { id: shader });
        let mut state = self.state.lock();
        Self::check(&mut state, FailPoint::CompileShader)?;
        Self::expect_live(&state, shader, |o| matches!(o, MockObject::Shader { .. }))?;
        if let Some(log) = compile_log(source) {
            return Err(DriverError::CompileFailed { log });
        }
        if let Some(MockObject::Shader { compiled, .. }) = state.live.get_mut(&shader) {
            *compiled = true;
        }
        Ok(())
    }

    fn destroy_shader(&self, shader: DriverId) {
        self.record(DriverCall::DestroyShader { id: shader });
        self.destroy(shader, |o| matches!(o, MockObject::Shader { .. }));
    }

    fn create_program(&self) -> DriverResult<DriverId> {
        let id = self.allocate(FailPoint::CreateProgram, MockObject::Program { linked: false })?;
        self.record(DriverCall::CreateProgram { id });
        Ok(id)
    }

    fn link_program(&self, program: DriverId, shaders: &[DriverId]) -> DriverResult<()> {
        self.record(DriverCall::LinkProgram {
            id: program,
            shaders: shaders.to_vec(),
        });
        let mut state = self.state.lock();
        Self::check(&mut state, FailPoint::LinkProgram)?;
        Self::expect_live(&state, program, |o| matches!(o, MockObject::Program { .. }))?;

        let mut stages = Vec::with_capacity(shaders.len());
        for shader in shaders {
            match state.live.get(shader) {
                Some(MockObject::Shader {
                    stage,
                    compiled: true,
                }) => stages.push(*stage),
                Some(MockObject::Shader { .. }) => {
                    return Err(DriverError::LinkFailed {
                        log: format!("shader {} is not compiled", shader),
                    });
                }
                _ => return Err(DriverError::InvalidObject { id: *shader }),
            }
        }
        if let Some(log) = link_log(&stages) {
            return Err(DriverError::LinkFailed { log });
        }
        if let Some(MockObject::Program { linked }) = state.live.get_mut(&program) {
            *linked = true;
        }
        Ok(())
    }

    fn destroy_program(&self, program: DriverId) {
        self.record(DriverCall::DestroyProgram { id: program });
        self.destroy(program, |o| matches!(o, MockObject::Program { .. }));
    }

    fn bind(&self, target: BindTarget, object: Option<DriverId>) {
        self.record(DriverCall::Bind { target, object });
        let mut state = self.state.lock();
        if state.context_lost {
            return;
        }
        match object {
            Some(id) => {
                state.bound.insert(target, id);
            }
            None => {
                state.bound.remove(&target);
            }
        }
    }
}
