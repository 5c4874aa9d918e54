use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage, ShaderType,
};

use crate::error::RetroError;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with `#import` support.
///
/// Pre-loads all shared WGSL modules at construction time. Consuming shaders use
/// `#import retro::module_name` to pull in shared code. The composer produces
/// `naga::Module` IR directly, skipping WGSL re-parse at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

/// Shared modules in dependency order.
const MODULES: &[ModuleDef] = &[ModuleDef {
    source: include_str!("../../assets/shaders/modules/fullscreen.wgsl"),
    file_path: "modules/fullscreen.wgsl",
}];

/// Source of the retro program.
pub const RETRO_SHADER: &str = include_str!("../../assets/shaders/screen/retro.wgsl");

/// Source of the viewer's test card and present shaders.
pub const PRESENT_SHADER: &str = include_str!("../../assets/shaders/screen/present.wgsl");

impl ShaderComposer {
    /// Create a composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// Returns [`RetroError::ShaderCompose`] if a shared module fails to parse.
    pub fn new() -> Result<Self, RetroError> {
        let mut composer = Composer::default();

        for m in MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    RetroError::ShaderCompose(format!(
                        "failed to register shader module '{}': {e:?}",
                        m.file_path
                    ))
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose a shader source string (which may contain `#import` directives)
    /// into a `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Errors
    ///
    /// Returns [`RetroError::ShaderCompose`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
    ) -> Result<wgpu::ShaderModule, RetroError> {
        let naga_module = self.compose_naga(source, file_path)?;

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader source into a `naga::Module` without creating a wgpu shader module.
    /// Useful for testing shader composition without a GPU device.
    ///
    /// # Errors
    ///
    /// Returns [`RetroError::ShaderCompose`] if composition fails.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, RetroError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| {
                RetroError::ShaderCompose(format!("failed to compose shader '{file_path}': {e}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::postprocess::retro::Technique;

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|ep| ep.name.as_str()).collect()
    }

    #[test]
    fn test_all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for (source, file_path) in [(RETRO_SHADER, "retro.wgsl"), (PRESENT_SHADER, "present.wgsl")] {
            let _ = composer
                .compose_naga(source, file_path)
                .unwrap_or_else(|e| panic!("Shader '{file_path}' failed to compose: {e}"));
        }
    }

    #[test]
    fn retro_program_exposes_every_technique() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer.compose_naga(RETRO_SHADER, "retro.wgsl").unwrap();
        let names = entry_points(&module);
        assert!(names.contains(&"vs_main"));
        for technique in Technique::ALL {
            assert!(
                names.contains(&technique.entry_point()),
                "missing {}",
                technique.entry_point()
            );
        }
    }

    #[test]
    fn uniform_block_matches_host_layout() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer.compose_naga(RETRO_SHADER, "retro.wgsl").unwrap();
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("RetroUniforms"))
            .unwrap();
        let naga::TypeInner::Struct { members, span } = &ty.inner else {
            panic!("RetroUniforms is not a struct");
        };
        assert_eq!(
            *span as usize,
            size_of::<crate::renderer::postprocess::retro::RetroUniforms>()
        );
        assert_eq!(members.len(), 18);
        assert_eq!(members[16].name.as_deref(), Some("texel_size"));
        assert_eq!(members[16].offset, 64);
    }

    #[test]
    fn broken_source_reports_an_error() {
        let mut composer = ShaderComposer::new().unwrap();
        let err = composer
            .compose_naga("fn broken( {", "broken.wgsl")
            .unwrap_err();
        assert!(matches!(err, RetroError::ShaderCompose(_)));
    }
}
