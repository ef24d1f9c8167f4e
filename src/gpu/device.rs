use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::color::{ColorScheme, GpuScheme};
use crate::fractal::EscapeRequest;
use crate::gpu::{gpu_eligibility, GpuFallback};
use crate::render::Framebuffer;

const WORKGROUP_SIZE: u32 = 16;

/// Miroir exact de `Params` dans escape_time.wgsl (80 octets).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct GpuParams {
    center: [f32; 2],
    scale: f32,
    max_iterations: u32,
    size: [u32; 2],
    family: u32,
    scheme: u32,
    constant: [f32; 2],
    cycle: f32,
    hue_shift: f32,
    saturation: f32,
    lightness: f32,
    _pad: [f32; 2],
    phase: [f32; 4],
}

impl GpuParams {
    fn from_request(request: &EscapeRequest, scheme: GpuScheme) -> Self {
        let vp = &request.viewport;
        let p = &request.scheme_params;
        let (c_re, c_im) = request.kernel_constant().unwrap_or((0.0, 0.0));
        Self {
            center: [vp.center_x as f32, vp.center_y as f32],
            scale: vp.scale() as f32,
            max_iterations: request.max_iterations,
            size: [vp.width, vp.height],
            family: request.family.shader_index(),
            scheme: scheme.shader_index(),
            constant: [c_re as f32, c_im as f32],
            cycle: p.cycle as f32,
            hue_shift: p.hue_shift as f32,
            saturation: p.saturation as f32,
            lightness: p.lightness as f32,
            _pad: [0.0; 2],
            phase: [p.phase[0] as f32, p.phase[1] as f32, p.phase[2] as f32, 0.0],
        }
    }
}

/// Le tampon de sortie doit tenir dans une liaison storage et dans un buffer.
fn check_output_size(bytes: u64, limits: &wgpu::Limits) -> Result<(), GpuFallback> {
    if bytes > u64::from(limits.max_storage_buffer_binding_size) || bytes > limits.max_buffer_size {
        return Err(GpuFallback::FrameTooLarge);
    }
    Ok(())
}

/// Tampons de sortie réutilisés tant que la taille d'image ne change pas.
struct OutputBuffers {
    size: u64,
    storage: wgpu::Buffer,
    readback: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    output: Option<OutputBuffers>,
    adapter_name: String,
}

impl GpuRenderer {
    /// Initialise l'adaptateur, compile le shader et alloue le tampon de
    /// paramètres. `None` si aucun GPU n'est utilisable.
    pub fn new() -> Option<Self> {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            let Some(adapter) = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
            else {
                log::warn!("GPU indisponible: aucun adaptateur");
                return None;
            };
            let adapter_name = adapter.get_info().name;

            let (device, queue) = match adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("fractscope-device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::default(),
                    },
                    None,
                )
                .await
            {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("GPU indisponible ({adapter_name}): {e}");
                    return None;
                }
            };
            device.on_uncaptured_error(Box::new(|e| log::error!("erreur wgpu: {e}")));

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("escape-time-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(std::mem::size_of::<GpuParams>() as u64),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("escape-time-pipeline-layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            // Une erreur de compilation désactive le GPU au lieu de paniquer.
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("escape-time"),
                source: wgpu::ShaderSource::Wgsl(include_str!("escape_time.wgsl").into()),
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("escape-time-pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "main",
            });
            if let Some(e) = device.pop_error_scope().await {
                log::warn!("GPU indisponible: échec de compilation du shader: {e}");
                device.destroy();
                return None;
            }

            let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("escape-time-params"),
                size: std::mem::size_of::<GpuParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            log::info!("GPU prêt: {adapter_name}");
            Some(Self {
                device,
                queue,
                pipeline,
                bind_group_layout,
                params_buffer,
                output: None,
                adapter_name,
            })
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Rendu complet en une passe, ou `None` si la requête n'est pas éligible,
    /// dépasse les limites du périphérique ou si wgpu signale une erreur.
    pub fn try_render(&mut self, request: &EscapeRequest, scheme: &ColorScheme) -> Option<Framebuffer> {
        let output_size = request.viewport.pixel_count() as u64 * std::mem::size_of::<u32>() as u64;
        let eligible = gpu_eligibility(request, scheme)
            .and_then(|s| check_output_size(output_size, &self.device.limits()).map(|()| s));
        let gpu_scheme = match eligible {
            Ok(s) => s,
            Err(reason) => {
                log::debug!("rendu CPU: {reason}");
                return None;
            }
        };

        let width = request.viewport.width;
        let height = request.viewport.height;
        let params = GpuParams::from_request(request, gpu_scheme);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        // Allocation et dispatch sous une portée d'erreur : toute erreur de
        // validation renvoie au CPU au lieu d'une image vide.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.ensure_output(output_size);
        if let Some(output) = self.output.as_ref() {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("escape-time-encoder"),
                });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("escape-time-pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &output.bind_group, &[]);
                let dispatch_x = (width + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
                let dispatch_y = (height + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
                pass.dispatch_workgroups(dispatch_x, dispatch_y, 1);
            }
            encoder.copy_buffer_to_buffer(&output.storage, 0, &output.readback, 0, output_size);
            self.queue.submit(Some(encoder.finish()));
        }
        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            log::warn!("rendu GPU abandonné: {e}");
            self.output = None;
            return None;
        }
        let output = self.output.as_ref()?;

        let buffer_slice = output.readback.slice(..output_size);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = sender.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("relecture GPU impossible: {e}");
                return None;
            }
            Err(_) => {
                log::warn!("relecture GPU interrompue");
                return None;
            }
        }

        let data = buffer_slice.get_mapped_range();
        let packed: &[u32] = bytemuck::cast_slice(&data);
        let rgb: Vec<u8> = packed
            .iter()
            .flat_map(|&p| [(p & 0xff) as u8, ((p >> 8) & 0xff) as u8, ((p >> 16) & 0xff) as u8])
            .collect();
        drop(data);
        output.readback.unmap();

        log::debug!(
            "rendu GPU {}x{} ({} itérations)",
            width,
            height,
            request.max_iterations
        );
        Framebuffer::from_rgb(width, height, rgb)
    }

    fn ensure_output(&mut self, size: u64) {
        if self.output.as_ref().is_some_and(|o| o.size == size) {
            return;
        }
        if let Some(old) = self.output.take() {
            old.storage.destroy();
            old.readback.destroy();
        }

        let storage = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape-time-output"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape-time-readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("escape-time-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: storage.as_entire_binding(),
                },
            ],
        });
        self.output = Some(OutputBuffers {
            size,
            storage,
            readback,
            bind_group,
        });
    }

    /// Libère explicitement les ressources GPU.
    pub fn teardown(mut self) {
        if let Some(output) = self.output.take() {
            output.storage.destroy();
            output.readback.destroy();
        }
        self.params_buffer.destroy();
        self.device.destroy();
        log::debug!("GPU libéré: {}", self.adapter_name);
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::color::{SchemeParams, SchemeRegistry};
    use crate::fractal::{FractalFamily, ViewportSpec};
    use crate::render::render_frame;

    fn mandelbrot(width: u32, height: u32, max_iterations: u32) -> EscapeRequest {
        EscapeRequest {
            family: FractalFamily::Mandelbrot,
            viewport: ViewportSpec::new(width, height, -0.5, 0.0, 1.0),
            max_iterations,
            family_constant: Complex64::new(0.0, 0.0),
            color_scheme: "default".to_string(),
            scheme_params: SchemeParams::default(),
        }
    }

    #[test]
    fn params_match_shader_layout() {
        assert_eq!(std::mem::size_of::<GpuParams>(), 80);
        assert_eq!(std::mem::size_of::<GpuParams>() % 16, 0);
    }

    #[test]
    fn params_carry_julia_constant_only_for_julia() {
        let mut request = EscapeRequest {
            family: FractalFamily::Julia,
            viewport: ViewportSpec::new(640, 480, 0.25, -0.5, 2.0),
            max_iterations: 300,
            family_constant: Complex64::new(-0.8, 0.156),
            color_scheme: "cosine".to_string(),
            scheme_params: SchemeParams::default(),
        };
        let p = GpuParams::from_request(&request, GpuScheme::Cosine);
        assert_eq!(p.family, 1);
        assert_eq!(p.scheme, 1);
        assert_eq!(p.constant, [-0.8f32, 0.156f32]);
        assert_eq!(p.size, [640, 480]);
        assert_eq!(p.center, [0.25, -0.5]);

        request.family = FractalFamily::BurningShip;
        let p = GpuParams::from_request(&request, GpuScheme::Hsl);
        assert_eq!(p.family, 2);
        assert_eq!(p.constant, [0.0, 0.0]);
    }

    #[test]
    fn oversized_frames_are_refused() {
        let limits = wgpu::Limits::default();
        assert_eq!(check_output_size(1920 * 1080 * 4, &limits), Ok(()));
        assert_eq!(
            check_output_size(6000 * 6000 * 4, &limits),
            Err(GpuFallback::FrameTooLarge)
        );
        let max = u64::from(limits.max_storage_buffer_binding_size);
        assert_eq!(check_output_size(max, &limits), Ok(()));
        assert_eq!(check_output_size(max + 4, &limits), Err(GpuFallback::FrameTooLarge));
    }

    #[test_log::test]
    fn shader_matches_cpu_render() {
        let Some(mut gpu) = GpuRenderer::new() else {
            log::warn!("aucun adaptateur GPU, comparaison ignorée");
            return;
        };
        let registry = SchemeRegistry::builtin();
        for id in ["default", "cosine", "hsl"] {
            let scheme = registry.resolve(id).unwrap();
            let request = EscapeRequest {
                color_scheme: id.to_string(),
                ..mandelbrot(64, 48, 100)
            };
            let gpu_frame = gpu.try_render(&request, scheme).expect("requête éligible au GPU");
            let cpu_frame = pollster::block_on(render_frame(&request, scheme, |_| {})).unwrap();
            assert_eq!(gpu_frame.pixels.len(), cpu_frame.pixels.len());

            // f32 contre f64 : seuls quelques pixels au bord de l'ensemble
            // peuvent changer de nombre d'itérations.
            let diverging = gpu_frame
                .pixels
                .chunks_exact(3)
                .zip(cpu_frame.pixels.chunks_exact(3))
                .filter(|(g, c)| g.iter().zip(c.iter()).any(|(a, b)| a.abs_diff(*b) > 4))
                .count();
            assert!(
                diverging <= request.viewport.pixel_count() / 50,
                "{id}: {diverging} pixels divergent"
            );
        }
        gpu.teardown();
    }

    #[test_log::test]
    fn output_buffers_follow_frame_size() {
        let Some(mut gpu) = GpuRenderer::new() else {
            log::warn!("aucun adaptateur GPU, test ignoré");
            return;
        };
        let registry = SchemeRegistry::builtin();
        let scheme = registry.resolve("default").unwrap();
        let buffers = |gpu: &GpuRenderer| gpu.output.as_ref().map(|o| (o.size, o.storage.global_id()));

        assert!(gpu.try_render(&mandelbrot(32, 32, 50), scheme).is_some());
        let first = buffers(&gpu);
        assert_eq!(first.map(|(size, _)| size), Some(32 * 32 * 4));
        assert!(gpu.try_render(&mandelbrot(32, 32, 80), scheme).is_some());
        assert_eq!(buffers(&gpu), first);

        let frame = gpu.try_render(&mandelbrot(40, 24, 50), scheme).unwrap();
        assert_eq!((frame.width, frame.height), (40, 24));
        let resized = buffers(&gpu);
        assert_eq!(resized.map(|(size, _)| size), Some(40 * 24 * 4));
        assert_ne!(resized, first);

        // Trop grand pour une liaison storage : le CPU prend le relais.
        assert!(gpu.try_render(&mandelbrot(6000, 6000, 20), scheme).is_none());
        gpu.teardown();
    }
}
