use crate::color::ColorScheme;
use crate::fractal::EscapeRequest;
use crate::render::Framebuffer;

/// Compilé sans la feature `gpu` : aucune instance possible.
pub enum GpuRenderer {}

impl GpuRenderer {
    pub fn new() -> Option<Self> {
        log::debug!("support GPU absent de cette compilation");
        None
    }

    pub fn adapter_name(&self) -> &str {
        match *self {}
    }

    pub fn try_render(&mut self, _request: &EscapeRequest, _scheme: &ColorScheme) -> Option<Framebuffer> {
        match *self {}
    }

    pub fn teardown(self) {
        match self {}
    }
}
