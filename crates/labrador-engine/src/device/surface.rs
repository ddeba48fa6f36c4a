pub(super) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;

    if prefer_srgb {
        let srgb = caps.formats.iter().copied().find(|f| f.is_srgb());
        return Some(srgb.unwrap_or(first));
    }

    Some(first)
}

pub(super) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    #[test]
    fn prefers_srgb_when_asked() {
        let c = caps(vec![
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ]);
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn no_formats_means_no_surface() {
        assert_eq!(choose_surface_format(&caps(vec![]), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let c = caps(vec![wgpu::TextureFormat::Rgba8Unorm]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
    }
}
