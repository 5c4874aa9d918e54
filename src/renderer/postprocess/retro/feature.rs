use super::pass::{Execution, RetroPass};
use super::recorder::CommandRecorder;
use crate::effect::ParameterSource;
use crate::options::{FeatureOptions, InjectionPoint};
use crate::renderer::postprocess::target::TargetPool;

/// Kind of camera the host is rendering for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKind {
    /// The player-facing game view; the only kind the effect renders for.
    Game,
    /// Editor scene view.
    SceneView,
    /// Asset preview thumbnails.
    Preview,
    /// Reflection probes and other offscreen captures.
    Reflection,
    /// UI-only overlays.
    Overlay,
}

/// Host-facing wrapper around [`RetroPass`].
///
/// Decides per frame whether the pass runs: a program must exist, the
/// parameter source must yield an enabled set, and the camera must be the
/// game view. Frame-local errors are logged and swallowed so the image
/// passes through unmodified.
pub struct RetroFeature<P> {
    options: FeatureOptions,
    pass: Option<RetroPass<P>>,
    queued: bool,
    skipped: u32,
    last_skip: Option<String>,
}

impl<P> RetroFeature<P> {
    /// Build the feature. Without a program it stays inactive for its whole
    /// lifetime.
    pub fn create(options: FeatureOptions, program: Option<P>) -> Self {
        let pass = match program {
            Some(program) => {
                log::info!(
                    "{}: program ready, injected {:?}",
                    options.name,
                    options.injection_point
                );
                Some(RetroPass::new(options.name.clone(), program))
            }
            None => {
                log::warn!(
                    "{}: no shader program assigned, feature inactive",
                    options.name
                );
                None
            }
        };
        Self {
            options,
            pass,
            queued: false,
            skipped: 0,
            last_skip: None,
        }
    }

    /// Where the host should run [`execute`](Self::execute).
    #[must_use]
    pub fn injection_point(&self) -> InjectionPoint {
        self.options.injection_point
    }

    /// Whether a program is available.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pass.as_ref().is_some_and(RetroPass::is_ready)
    }

    /// Whether the pass is queued for the current frame.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Consecutive frames skipped by frame-local errors.
    #[must_use]
    pub fn skipped_frames(&self) -> u32 {
        self.skipped
    }

    /// The wrapped pass, if a program was supplied.
    #[must_use]
    pub fn pass(&self) -> Option<&RetroPass<P>> {
        self.pass.as_ref()
    }

    /// Set the clock for animated techniques.
    pub fn set_time(&mut self, seconds: f32) {
        if let Some(pass) = self.pass.as_mut() {
            pass.set_time(seconds);
        }
    }

    /// Per-frame gate. Binds the parameters and queues the pass when the
    /// effect should render for this camera. Returns whether it was queued.
    pub fn add_render_passes(
        &mut self,
        source: &(impl ParameterSource + ?Sized),
        camera: CameraKind,
    ) -> bool {
        self.queued = false;
        let Some(pass) = self.pass.as_mut().filter(|p| p.is_ready()) else {
            return false;
        };
        let Some(params) = source.retro().filter(|p| p.is_active()) else {
            return false;
        };
        if camera != CameraKind::Game {
            return false;
        }
        pass.setup(params);
        self.queued = true;
        true
    }

    /// Run the queued pass once, then clear the queue flag.
    ///
    /// Returns `None` when nothing was queued or the frame was skipped.
    pub fn execute<C>(
        &mut self,
        cmd: &mut C,
        width: u32,
        height: u32,
    ) -> Option<Execution>
    where
        C: CommandRecorder<Program = P> + TargetPool,
    {
        if !std::mem::take(&mut self.queued) {
            return None;
        }
        let pass = self.pass.as_mut()?;
        match pass.execute(cmd, width, height) {
            Ok(execution) => {
                if self.skipped > 0 {
                    log::info!(
                        "{}: resumed after {} skipped frames",
                        self.options.name,
                        self.skipped
                    );
                    self.skipped = 0;
                    self.last_skip = None;
                }
                Some(execution)
            }
            Err(e) if e.is_frame_local() => {
                self.skipped += 1;
                // Warn once per distinct cause, not every frame.
                let cause = e.to_string();
                if self.last_skip.as_deref() != Some(cause.as_str()) {
                    log::warn!("{}: frame skipped: {cause}", self.options.name);
                    self.last_skip = Some(cause);
                }
                None
            }
            Err(e) => {
                log::error!("{}: {e}", self.options.name);
                None
            }
        }
    }

    /// Release the program.
    pub fn dispose(&mut self) {
        self.queued = false;
        if let Some(pass) = self.pass.as_mut() {
            pass.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{RecordingBackend, TestProgram};
    use super::*;
    use crate::effect::{Knob, RetroParameters};

    fn enabled() -> RetroParameters {
        RetroParameters::default()
            .enabled(true)
            .with(Knob::BleedRadius, 0.5)
    }

    fn feature() -> RetroFeature<TestProgram> {
        RetroFeature::create(FeatureOptions::default(), Some(TestProgram))
    }

    #[test]
    fn missing_program_keeps_feature_inactive() {
        let mut feature: RetroFeature<TestProgram> =
            RetroFeature::create(FeatureOptions::default(), None);
        assert!(!feature.is_active());
        assert!(!feature.add_render_passes(&enabled(), CameraKind::Game));
        let mut backend = RecordingBackend::default();
        assert!(feature.execute(&mut backend, 1920, 1080).is_none());
        assert!(backend.events.is_empty());
    }

    #[test]
    fn only_game_cameras_are_queued() {
        let mut feature = feature();
        for camera in [
            CameraKind::SceneView,
            CameraKind::Preview,
            CameraKind::Reflection,
            CameraKind::Overlay,
        ] {
            assert!(!feature.add_render_passes(&enabled(), camera));
        }
        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(feature.is_queued());
    }

    #[test]
    fn disabled_or_absent_parameters_skip() {
        let mut feature = feature();
        let disabled = enabled().enabled(false);
        assert!(!feature.add_render_passes(&disabled, CameraKind::Game));
        let absent: Option<RetroParameters> = None;
        assert!(!feature.add_render_passes(&absent, CameraKind::Game));
    }

    #[test]
    fn queued_pass_runs_once() {
        let mut feature = feature();
        let mut backend = RecordingBackend::default();
        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(matches!(
            feature.execute(&mut backend, 1280, 720),
            Some(Execution::Rendered(_))
        ));
        let events = backend.events.len();
        assert!(feature.execute(&mut backend, 1280, 720).is_none());
        assert_eq!(backend.events.len(), events);
    }

    #[test]
    fn frame_errors_pass_the_image_through() {
        let mut feature = feature();
        let mut backend = RecordingBackend::default();
        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(feature.execute(&mut backend, 3, 3).is_none());
        assert!(backend.events.is_empty());

        // The next frame starts clean
        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(feature.execute(&mut backend, 1280, 720).is_some());
        assert_eq!(backend.acquires(), backend.releases());
    }

    #[test]
    fn repeated_skips_are_counted_and_reported_once() {
        let mut feature = feature();
        let mut backend = RecordingBackend::default();
        for _ in 0..3 {
            assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
            assert!(feature.execute(&mut backend, 3, 3).is_none());
        }
        assert_eq!(feature.skipped_frames(), 3);
        let first = feature.last_skip.clone();
        assert!(first.as_deref().is_some_and(|m| m.contains("3x3")));

        // Same cause keeps the same report; a new size is a new cause
        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(feature.execute(&mut backend, 2, 2).is_none());
        assert_ne!(feature.last_skip, first);
        assert_eq!(feature.skipped_frames(), 4);

        assert!(feature.add_render_passes(&enabled(), CameraKind::Game));
        assert!(feature.execute(&mut backend, 640, 480).is_some());
        assert_eq!(feature.skipped_frames(), 0);
        assert!(feature.last_skip.is_none());
    }

    #[test]
    fn dispose_deactivates() {
        let mut feature = feature();
        feature.dispose();
        assert!(!feature.is_active());
        assert!(!feature.add_render_passes(&enabled(), CameraKind::Game));
        assert_eq!(
            feature.injection_point(),
            InjectionPoint::BeforePostProcessing
        );
    }
}
