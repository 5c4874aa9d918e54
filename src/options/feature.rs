use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where in the host frame the retro pass is inserted.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPoint {
    /// After opaque geometry, before transparent geometry.
    BeforeTransparents,
    /// After scene geometry, before the host's own post-processing.
    #[default]
    BeforePostProcessing,
    /// After the host's post-processing stack.
    AfterPostProcessing,
    /// Last, right before presentation.
    AfterRendering,
}

/// Host-facing settings of the retro render feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Feature", inline)]
#[serde(default)]
pub struct FeatureOptions {
    /// Frame position of the pass.
    pub injection_point: InjectionPoint,
    /// Label of the outer profiling scope.
    #[schemars(skip)]
    pub name: String,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            injection_point: InjectionPoint::default(),
            name: "Retro".to_owned(),
        }
    }
}
