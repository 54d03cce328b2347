/// Render context: owns the framebuffer and every piece of bound state
/// (camera, uniforms, textures) for one render invocation.
///
/// Lifecycle: Created -> Configured -> Rendering -> Finalized. Bindings can
/// only change before rendering starts; `begin_render` resolves the
/// string-keyed uniform table into typed [`Bindings`] exactly once, so a
/// missing uniform or texture fails the pass before any pixel is written.
use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use super::framebuffer::Framebuffer;
use super::texture::Texture;
use crate::camera::Camera;
use crate::error::{RenderError, Result};

/// Name of the model-view-projection uniform
pub const MVP_UNIFORM: &str = "MVP";
/// Slot of the diffuse texture
pub const DIFFUSE_SLOT: usize = 0;
pub const MAX_TEXTURE_SLOTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Created,
    Configured,
    Rendering,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    fn kind(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Uniforms resolved once before rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub mvp: Mat4,
}

/// Read-only state handed to both pipelines for the duration of a pass
#[derive(Clone, Copy)]
pub struct Bindings<'a> {
    pub camera: &'a dyn Camera,
    pub uniforms: Uniforms,
    pub diffuse: &'a dyn Texture,
}

/// Everything a pipeline needs for one pass: shared bindings plus
/// exclusive access to the framebuffer.
pub struct RenderTarget<'a> {
    pub bindings: Bindings<'a>,
    pub framebuffer: &'a mut Framebuffer,
}

pub struct RenderContext {
    camera: Arc<dyn Camera>,
    framebuffer: Framebuffer,
    uniforms: HashMap<String, UniformValue>,
    textures: [Option<Arc<dyn Texture>>; MAX_TEXTURE_SLOTS],
    state: ContextState,
}

impl RenderContext {
    /// New context with a framebuffer sized to the camera's resolution.
    pub fn new(camera: Arc<dyn Camera>) -> Result<Self> {
        let (width, height) = camera.resolution();
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroResolution { width, height });
        }
        Ok(Self {
            camera,
            framebuffer: Framebuffer::new(width, height),
            uniforms: HashMap::new(),
            textures: Default::default(),
            state: ContextState::Created,
        })
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        self.state
    }

    #[inline]
    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    #[inline]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    fn configure(&mut self) -> Result<()> {
        match self.state {
            ContextState::Created | ContextState::Configured => {
                self.state = ContextState::Configured;
                Ok(())
            }
            from => Err(RenderError::InvalidState {
                from,
                to: ContextState::Configured,
            }),
        }
    }

    /// Clear the framebuffer before rendering starts.
    pub fn clear(&mut self, clear_color: u32) -> Result<()> {
        self.configure()?;
        self.framebuffer.clear(clear_color);
        Ok(())
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.configure()?;
        self.uniforms.insert(name.to_owned(), value.into());
        Ok(())
    }

    pub fn bind_texture(&mut self, slot: usize, texture: Arc<dyn Texture>) -> Result<()> {
        if slot >= MAX_TEXTURE_SLOTS {
            return Err(RenderError::TextureSlotOutOfRange {
                slot,
                max: MAX_TEXTURE_SLOTS,
            });
        }
        self.configure()?;
        self.textures[slot] = Some(texture);
        Ok(())
    }

    /// Look up a matrix uniform. Never defaults: an unbound name is an error.
    pub fn uniform(&self, name: &str) -> Result<Mat4> {
        match self.uniforms.get(name) {
            Some(UniformValue::Mat4(m)) => Ok(*m),
            Some(other) => Err(RenderError::UniformType {
                name: name.to_owned(),
                expected: "mat4",
                found: other.kind(),
            }),
            None => Err(RenderError::UnboundUniform(name.to_owned())),
        }
    }

    /// Raw uniform value of any type.
    pub fn uniform_value(&self, name: &str) -> Result<UniformValue> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnboundUniform(name.to_owned()))
    }

    pub fn texture(&self, slot: usize) -> Result<Arc<dyn Texture>> {
        self.textures
            .get(slot)
            .and_then(|t| t.clone())
            .ok_or(RenderError::UnboundTexture(slot))
    }

    /// Check that the MVP uniform and the diffuse texture are bound, without
    /// changing state.
    pub fn validate_bindings(&self) -> Result<()> {
        self.uniform(MVP_UNIFORM)?;
        self.texture(DIFFUSE_SLOT)?;
        Ok(())
    }

    /// Resolve bindings and enter the Rendering state.
    ///
    /// May be called again while Rendering (one call per pipeline); fails
    /// after `finalize`, or if the MVP or the diffuse texture is unbound.
    pub fn begin_render(&mut self) -> Result<RenderTarget<'_>> {
        match self.state {
            ContextState::Finalized => {
                return Err(RenderError::InvalidState {
                    from: ContextState::Finalized,
                    to: ContextState::Rendering,
                })
            }
            ContextState::Created | ContextState::Configured | ContextState::Rendering => {}
        }

        let uniforms = Uniforms {
            mvp: self.uniform(MVP_UNIFORM)?,
        };
        let diffuse = self.textures[DIFFUSE_SLOT]
            .as_deref()
            .ok_or(RenderError::UnboundTexture(DIFFUSE_SLOT))?;

        if self.state != ContextState::Rendering {
            log::debug!(
                "render context entering Rendering ({}x{})",
                self.framebuffer.width,
                self.framebuffer.height
            );
        }
        self.state = ContextState::Rendering;

        Ok(RenderTarget {
            bindings: Bindings {
                camera: self.camera.as_ref(),
                uniforms,
                diffuse,
            },
            framebuffer: &mut self.framebuffer,
        })
    }

    /// Freeze the context; the framebuffer is read-only from here on.
    pub fn finalize(&mut self) -> Result<&Framebuffer> {
        if self.state != ContextState::Rendering {
            return Err(RenderError::InvalidState {
                from: self.state,
                to: ContextState::Finalized,
            });
        }
        self.state = ContextState::Finalized;
        Ok(&self.framebuffer)
    }

    /// Take the finished framebuffer out of a finalized context.
    pub fn into_framebuffer(self) -> Result<Framebuffer> {
        if self.state != ContextState::Finalized {
            return Err(RenderError::InvalidState {
                from: self.state,
                to: ContextState::Finalized,
            });
        }
        Ok(self.framebuffer)
    }
}
