//! Render-target textures backing pooled and host images.

/// A render-target texture and its default view.
///
/// Used to decouple texture creation from any windowing or GUI framework.
/// The texture is created with `RENDER_ATTACHMENT | TEXTURE_BINDING | COPY_SRC`
/// usage flags, making it suitable for off-screen rendering followed by
/// read-back or compositing.
pub struct RenderTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a new render-target texture with the given dimensions and format.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}

/// Approximate memory footprint of a `width` x `height` target.
#[must_use]
pub fn target_bytes(width: u32, height: u32, format: wgpu::TextureFormat) -> u64 {
    let texel = u64::from(format.block_copy_size(None).unwrap_or(4));
    u64::from(width) * u64::from(height) * texel
}
