pub mod error;
pub mod framebuffer;
pub mod generation;
pub mod sampler;
pub mod scheduler;

pub use error::RenderError;
pub use framebuffer::Framebuffer;
pub use generation::{FrameGate, RenderTicket};
pub use scheduler::{render_frame, PixelFill, ROWS_PER_YIELD};

use crate::color::SchemeRegistry;
use crate::fractal::EscapeRequest;
use crate::gpu::GpuRenderer;

/// Point d'entrée de la vue : validation, choix GPU/CPU, rendu.
pub struct Renderer {
    registry: SchemeRegistry,
    gpu: Option<GpuRenderer>,
    gate: FrameGate,
}

impl Renderer {
    /// `use_gpu = false` force le chemin CPU sans sonder l'adaptateur.
    pub fn new(use_gpu: bool) -> Self {
        let gpu = if use_gpu { GpuRenderer::new() } else { None };
        Self::with_parts(SchemeRegistry::builtin(), gpu)
    }

    pub fn cpu_only() -> Self {
        Self::with_parts(SchemeRegistry::builtin(), None)
    }

    pub fn with_parts(registry: SchemeRegistry, gpu: Option<GpuRenderer>) -> Self {
        Self {
            registry,
            gpu,
            gate: FrameGate::new(),
        }
    }

    pub fn gpu_available(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn gpu_adapter(&self) -> Option<&str> {
        self.gpu.as_ref().map(|g| g.adapter_name())
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemeRegistry {
        &mut self.registry
    }

    /// Compteur de générations, à cloner côté vue.
    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Valide la requête sans rien calculer.
    pub fn validate(&self, request: &EscapeRequest) -> Result<(), RenderError> {
        request.validate()?;
        self.registry.resolve(&request.color_scheme)?;
        Ok(())
    }

    /// Rend une image complète.
    ///
    /// Le GPU est essayé d'abord ; la progression saute alors directement à
    /// 100. Sinon le remplissage CPU publie sa progression toutes les
    /// `ROWS_PER_YIELD` lignes.
    pub async fn render<P>(&mut self, request: &EscapeRequest, mut on_progress: P) -> Result<Framebuffer, RenderError>
    where
        P: FnMut(f64),
    {
        self.validate(request)?;
        let scheme = self.registry.resolve(&request.color_scheme)?;

        if let Some(gpu) = self.gpu.as_mut() {
            if let Some(frame) = gpu.try_render(request, scheme) {
                on_progress(100.0);
                return Ok(frame);
            }
        }

        render_frame(request, scheme, on_progress).await
    }

    /// Comme [`Renderer::render`], mais estampillé par le [`FrameGate`] :
    /// renvoie `Ok(None)` si un rendu plus récent a été demandé entre-temps.
    /// Le remplissage CPU s'arrête dès la suspension suivante.
    pub async fn render_latest<P>(
        &mut self,
        request: &EscapeRequest,
        mut on_progress: P,
    ) -> Result<Option<Framebuffer>, RenderError>
    where
        P: FnMut(f64),
    {
        let ticket = self.gate.begin();
        self.validate(request)?;
        let scheme = self.registry.resolve(&request.color_scheme)?;

        if let Some(gpu) = self.gpu.as_mut() {
            if let Some(frame) = gpu.try_render(request, scheme) {
                on_progress(100.0);
                return Ok(self.gate.commit(ticket, frame));
            }
        }

        let mut fill = PixelFill::new(request, scheme)?;
        let gate = &self.gate;
        let complete = scheduler::drive(&mut fill, &mut on_progress, || gate.is_current(ticket)).await;
        if !complete {
            return Ok(None);
        }
        Ok(self.gate.commit(ticket, fill.finish()))
    }

    /// Libère le GPU s'il est présent.
    pub fn shutdown(mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.teardown();
        }
    }
}
