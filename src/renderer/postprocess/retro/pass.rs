use super::plan::FramePlan;
use super::pyramid::BlurPyramid;
use super::recorder::{
    scoped, Blit, CommandRecorder, CompositeInputs, TextureSlot,
};
use super::smear::{smear_keys, SMEAR_TAPS};
use super::technique::Technique;
use super::uniforms::{Binding, RetroUniforms};
use crate::effect::{Knob, RetroParameters};
use crate::error::RetroError;
use crate::renderer::postprocess::target::{
    FrameLease, TargetDesc, TargetHandle, TargetKey, TargetPool,
};

/// What one [`RetroPass::execute`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// No program: nothing was recorded and no target was touched.
    Skipped,
    /// The full pass was recorded.
    Rendered(FrameStats),
}

/// Bookkeeping of one recorded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Pyramid depth `N` used this frame.
    pub depth: usize,
    /// Draws recorded.
    pub blits: usize,
    /// Targets acquired (and released) this frame.
    pub targets: usize,
}

/// The retro CRT pass: blur pyramid → smear → composite, in place on the
/// host's color image.
///
/// Holds the program, the parameter block written by [`setup`](Self::setup)
/// and the pyramid key arena. Everything else is frame-scoped: every target
/// is acquired and released inside [`execute`](Self::execute).
pub struct RetroPass<P> {
    name: String,
    program: Option<P>,
    uniforms: RetroUniforms,
    bleed_radius: f32,
    pyramid: BlurPyramid,
}

impl<P> RetroPass<P> {
    /// Create a pass drawing with `program`. `name` labels the outer
    /// profiling scope.
    pub fn new(name: impl Into<String>, program: P) -> Self {
        Self {
            name: name.into(),
            program: Some(program),
            uniforms: RetroUniforms::default(),
            bleed_radius: 0.0,
            pyramid: BlurPyramid::default(),
        }
    }

    /// Bind this frame's parameter values. Idempotent; overwrites the
    /// previous frame's bindings and keeps no reference to `params`.
    pub fn setup(&mut self, params: &RetroParameters) {
        self.uniforms.bind_parameters(params);
        self.bleed_radius = params.get(Knob::BleedRadius);
    }

    /// Set the clock driving tape noise and scanline scrolling.
    pub fn set_time(&mut self, seconds: f32) {
        self.uniforms.set(Binding::Time, seconds);
    }

    /// Parameter block as of the last [`setup`](Self::setup).
    #[must_use]
    pub fn uniforms(&self) -> &RetroUniforms {
        &self.uniforms
    }

    /// Pyramid key arena.
    #[must_use]
    pub fn pyramid(&self) -> &BlurPyramid {
        &self.pyramid
    }

    /// The program, unless disposed.
    #[must_use]
    pub fn program(&self) -> Option<&P> {
        self.program.as_ref()
    }

    /// Whether [`execute`](Self::execute) will record anything.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.program.is_some()
    }

    /// Drop the program. Safe to call at any time and more than once;
    /// later [`execute`](Self::execute) calls are no-ops.
    pub fn dispose(&mut self) {
        if self.program.take().is_some() {
            log::debug!("{}: program released", self.name);
        }
    }

    /// Record the full pass for a `width` x `height` source image.
    ///
    /// Every target acquired here is released before returning, whether
    /// the recording succeeded or not.
    ///
    /// # Errors
    ///
    /// [`RetroError::DegenerateResolution`] before any target is touched
    /// when a level would be zero-sized; otherwise the first pool or
    /// recorder error.
    pub fn execute<C>(
        &mut self,
        cmd: &mut C,
        width: u32,
        height: u32,
    ) -> Result<Execution, RetroError>
    where
        C: CommandRecorder<Program = P> + TargetPool,
    {
        let Some(program) = self.program.as_ref() else {
            return Ok(Execution::Skipped);
        };

        let plan = FramePlan::new(width, height, self.bleed_radius)?;
        if self.pyramid.ensure_depth(plan.depth()) {
            log::debug!(
                "{}: blur pyramid resized to {} levels",
                self.name,
                plan.depth()
            );
        }

        let mut frame = FrameRecording {
            program,
            plan: &plan,
            keys: self.pyramid.keys(),
            base: &self.uniforms,
            lease: FrameLease::new(),
            blits: 0,
            acquired: 0,
        };

        let result = scoped(cmd, &self.name, |cmd| frame.record(cmd));
        let released = frame.lease.release_all(cmd);
        debug_assert_eq!(released, frame.acquired);

        result.map(|()| {
            Execution::Rendered(FrameStats {
                depth: plan.depth(),
                blits: frame.blits,
                targets: frame.acquired,
            })
        })
    }
}

/// Per-frame recording state.
struct FrameRecording<'a, P> {
    program: &'a P,
    plan: &'a FramePlan,
    keys: &'a [TargetKey],
    base: &'a RetroUniforms,
    lease: FrameLease,
    blits: usize,
    acquired: usize,
}

impl<P> FrameRecording<'_, P> {
    fn record<C>(&mut self, cmd: &mut C) -> Result<(), RetroError>
    where
        C: CommandRecorder<Program = P> + TargetPool,
    {
        let levels = scoped(cmd, "Blur", |cmd| self.blur(cmd))?;
        let smear = scoped(cmd, "Smear", |cmd| self.smear(cmd, &levels))?;
        scoped(cmd, "Composite", |cmd| self.composite(cmd, &levels, smear))
    }

    fn acquire<C>(
        &mut self,
        cmd: &mut C,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError>
    where
        C: TargetPool,
    {
        let handle = self.lease.acquire(cmd, key, desc)?;
        self.acquired += 1;
        Ok(handle)
    }

    fn draw<C>(&mut self, cmd: &mut C, blit: &Blit) -> Result<(), RetroError>
    where
        C: CommandRecorder<Program = P>,
    {
        log::trace!(
            "{:?}: {:?} -> {:?}",
            blit.technique,
            blit.source,
            blit.dest
        );
        cmd.blit(self.program, blit)?;
        self.blits += 1;
        Ok(())
    }

    /// Downsample chain, then the upsample loop. Returns the level handles.
    fn blur<C>(&mut self, cmd: &mut C) -> Result<Vec<TargetHandle>, RetroError>
    where
        C: CommandRecorder<Program = P> + TargetPool,
    {
        let plan = self.plan;
        let keys = self.keys;
        let mut levels: Vec<TargetHandle> = Vec::with_capacity(plan.depth());

        for (&key, extent) in keys.iter().zip(&plan.levels) {
            let handle = self.acquire(
                cmd,
                key,
                &TargetDesc::scratch(extent.width, extent.height),
            )?;
            let (technique, source, texel_size) = match levels.last() {
                None => (
                    Technique::BleedDownsample,
                    TextureSlot::Source,
                    plan.screen.texel_size(),
                ),
                Some(prev) => (
                    Technique::BlurDownsample,
                    TextureSlot::Target(*prev),
                    prev.texel_size(),
                ),
            };
            self.draw(
                cmd,
                &Blit {
                    technique,
                    source,
                    dest: TextureSlot::Target(handle),
                    uniforms: self.base.with_extents(texel_size, handle.size()),
                    inputs: None,
                },
            )?;
            levels.push(handle);
        }

        for step in plan.upsample_steps() {
            let from = levels[step.from];
            let to = levels[step.to];
            self.draw(
                cmd,
                &Blit {
                    technique: Technique::UpsampleBlend,
                    source: TextureSlot::Target(from),
                    dest: TextureSlot::Target(to),
                    uniforms: self
                        .base
                        .with(Binding::UpsampleFactor, step.weight)
                        .with_extents(from.texel_size(), to.size()),
                    inputs: None,
                },
            )?;
        }

        Ok(levels)
    }

    /// Two smear taps from level 1 into the ping-pong buffers. Returns the
    /// buffer holding the result.
    fn smear<C>(
        &mut self,
        cmd: &mut C,
        levels: &[TargetHandle],
    ) -> Result<TargetHandle, RetroError>
    where
        C: CommandRecorder<Program = P> + TargetPool,
    {
        let extent = self.plan.smear;
        let desc = TargetDesc::scratch(extent.width, extent.height);
        let [key_a, key_b] = smear_keys();
        let a = self.acquire(cmd, key_a, &desc)?;
        let b = self.acquire(cmd, key_b, &desc)?;

        let mut input = levels[1];
        for (tap, output) in SMEAR_TAPS.iter().zip([a, b]) {
            self.draw(
                cmd,
                &Blit {
                    technique: Technique::SmearAccumulate,
                    source: TextureSlot::Target(input),
                    dest: TextureSlot::Target(output),
                    uniforms: self
                        .base
                        .with(Binding::SmearOffset, tap.offset)
                        .with(Binding::SmearAttenuation, tap.attenuation)
                        .with_extents(input.texel_size(), output.size()),
                    inputs: None,
                },
            )?;
            input = output;
        }
        Ok(b)
    }

    /// Level 0 plus level 1, level 2 and the smear, written over the source.
    fn composite<C>(
        &mut self,
        cmd: &mut C,
        levels: &[TargetHandle],
        smear: TargetHandle,
    ) -> Result<(), RetroError>
    where
        C: CommandRecorder<Program = P>,
    {
        let main = levels[0];
        self.draw(
            cmd,
            &Blit {
                technique: Technique::Composite,
                source: TextureSlot::Target(main),
                dest: TextureSlot::Source,
                uniforms: self
                    .base
                    .with_extents(main.texel_size(), self.plan.screen.size()),
                inputs: Some(CompositeInputs {
                    slightly_blurred: levels[1],
                    blurred: levels[2],
                    smear,
                }),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::pyramid::level_key;
    use super::super::testing::{Event, RecordingBackend, TestProgram};
    use super::*;

    fn pass_with(params: &RetroParameters) -> RetroPass<TestProgram> {
        let mut pass = RetroPass::new("Retro", TestProgram);
        pass.setup(params);
        pass
    }

    fn full_radius() -> RetroParameters {
        RetroParameters::default()
            .enabled(true)
            .with(Knob::BleedRadius, 1.0)
    }

    #[test]
    fn full_hd_schedule() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        let execution = pass.execute(&mut backend, 1920, 1080).unwrap();

        // 8 downsamples + 5 upsamples + 2 smear + composite
        assert_eq!(
            execution,
            Execution::Rendered(FrameStats {
                depth: 8,
                blits: 16,
                targets: 10,
            })
        );
        let techniques = backend.techniques();
        assert_eq!(techniques[0], Technique::BleedDownsample);
        assert!(techniques[1..8]
            .iter()
            .all(|t| *t == Technique::BlurDownsample));
        assert!(techniques[8..13]
            .iter()
            .all(|t| *t == Technique::UpsampleBlend));
        assert_eq!(
            &techniques[13..],
            &[
                Technique::SmearAccumulate,
                Technique::SmearAccumulate,
                Technique::Composite
            ]
        );

        let upsample_dests: Vec<_> = backend
            .blits()
            .filter(|b| b.technique == Technique::UpsampleBlend)
            .map(|b| RecordingBackend::key_of(b.dest))
            .collect();
        let expected: Vec<_> =
            (2..=6).rev().map(|i| Some(level_key(i))).collect();
        assert_eq!(upsample_dests, expected);
    }

    #[test]
    fn acquires_match_releases() {
        for (w, h, radius) in
            [(1920, 1080, 1.0), (640, 480, 0.0), (7680, 4320, 0.3), (64, 64, 1.0)]
        {
            let params = full_radius().with(Knob::BleedRadius, radius);
            let mut pass = pass_with(&params);
            let mut backend = RecordingBackend::default();
            let _ = pass.execute(&mut backend, w, h).unwrap();
            assert_eq!(backend.acquires(), backend.releases(), "{w}x{h}");
            assert!(backend.live().is_empty());
        }
    }

    #[test]
    fn every_draw_follows_its_inputs() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        let _ = pass.execute(&mut backend, 1280, 720).unwrap();
        backend.assert_reads_follow_writes();
    }

    #[test]
    fn composite_reads_untouched_fine_levels() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        let _ = pass.execute(&mut backend, 1920, 1080).unwrap();

        let snapshot = backend.writes_at_composite().unwrap();
        // Levels 0 and 1 only saw their downsample
        assert_eq!(snapshot.get(&level_key(0)), Some(&1));
        assert_eq!(snapshot.get(&level_key(1)), Some(&1));
        // Level 2 carries the refined coarse blur from the i = 3 blend
        assert_eq!(snapshot.get(&level_key(2)), Some(&2));
        assert_eq!(
            backend.last_writer(level_key(2)),
            Some(Technique::UpsampleBlend)
        );

        let composite = backend
            .blits()
            .find(|b| b.technique == Technique::Composite)
            .unwrap();
        let inputs = composite.inputs.unwrap();
        assert_eq!(inputs.slightly_blurred.key, level_key(1));
        assert_eq!(inputs.blurred.key, level_key(2));
        assert_eq!(inputs.smear.key, smear_keys()[1]);
        assert_eq!(composite.dest, TextureSlot::Source);
    }

    #[test]
    fn degenerate_resolution_touches_nothing() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        let err = pass.execute(&mut backend, 1920, 2).unwrap_err();
        assert!(matches!(err, RetroError::DegenerateResolution { .. }));
        assert!(backend.events.is_empty());
    }

    #[test]
    fn failing_blit_still_releases_everything() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend {
            fail_on: Some(Technique::SmearAccumulate),
            ..Default::default()
        };
        let err = pass.execute(&mut backend, 1920, 1080).unwrap_err();
        assert!(matches!(err, RetroError::UnknownTarget(_)));
        assert_eq!(backend.acquires(), 10);
        assert_eq!(backend.acquires(), backend.releases());
        assert!(backend.live().is_empty());
        assert!(backend.scopes_balanced());
    }

    #[test]
    fn failing_acquire_still_releases_everything() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend {
            exhaust_on: Some(smear_keys()[1]),
            ..Default::default()
        };
        let err = pass.execute(&mut backend, 1920, 1080).unwrap_err();
        assert!(matches!(err, RetroError::PoolExhausted { .. }));
        // 8 levels + the first smear buffer
        assert_eq!(backend.acquires(), 9);
        assert_eq!(backend.releases(), 9);
        assert!(backend.scopes_balanced());
    }

    #[test]
    fn pyramid_arena_rebuilds_only_when_depth_changes() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        for _ in 0..3 {
            let _ = pass.execute(&mut backend, 1920, 1080).unwrap();
        }
        assert_eq!(pass.pyramid().rebuilds(), 1);

        // Same depth, different size: arena kept, targets re-acquired at
        // the new extent.
        let _ = pass.execute(&mut backend, 1600, 900).unwrap();
        assert_eq!(pass.pyramid().rebuilds(), 1);
        assert_eq!(
            backend.last_acquire_of(level_key(0)).map(|d| d.width),
            Some(800)
        );

        pass.setup(&full_radius().with(Knob::BleedRadius, 0.0));
        let _ = pass.execute(&mut backend, 1600, 900).unwrap();
        assert_eq!(pass.pyramid().rebuilds(), 2);
        assert_eq!(pass.pyramid().depth(), 3);
    }

    #[test]
    fn setup_is_idempotent() {
        let params = full_radius()
            .with(Knob::SmearIntensity, 0.4)
            .with(Knob::EdgeDistance, 0.003);

        let mut once = RetroPass::new("Retro", TestProgram);
        once.setup(&params);
        let mut twice = RetroPass::new("Retro", TestProgram);
        twice.setup(&params);
        twice.setup(&params);
        assert_eq!(once.uniforms(), twice.uniforms());

        let mut a = RecordingBackend::default();
        let mut b = RecordingBackend::default();
        let _ = once.execute(&mut a, 1280, 720).unwrap();
        let _ = twice.execute(&mut b, 1280, 720).unwrap();
        assert_eq!(a.events, b.events);
    }

    #[test]
    fn setup_overwrites_previous_frame() {
        let mut pass = pass_with(&full_radius().with(Knob::SmearIntensity, 0.9));
        pass.setup(&full_radius().with(Knob::SmearIntensity, 0.1));
        assert_eq!(pass.uniforms().get(Binding::SmearIntensity), 0.1);
    }

    #[test]
    fn zero_smear_runs_but_contributes_nothing() {
        let mut pass = pass_with(&full_radius().with(Knob::SmearIntensity, 0.0));
        let mut backend = RecordingBackend::default();
        let _ = pass.execute(&mut backend, 1920, 1080).unwrap();

        // Smear buffers still cycle through the pool
        for key in smear_keys() {
            assert!(backend.last_acquire_of(key).is_some());
        }
        assert_eq!(backend.acquires(), backend.releases());

        // ...and the composite weights them by zero
        let composite = backend
            .blits()
            .find(|b| b.technique == Technique::Composite)
            .unwrap();
        assert_eq!(composite.uniforms.get(Binding::SmearIntensity), 0.0);
        assert_eq!(TestProgram::smear_contribution(&composite.uniforms, 1.0), 0.0);
    }

    #[test]
    fn smear_taps_and_upsample_weights_are_per_draw() {
        let mut pass = pass_with(&full_radius().with(Knob::BleedRadius, 0.1));
        let mut backend = RecordingBackend::default();
        let _ = pass.execute(&mut backend, 1920, 1080).unwrap();

        let smear: Vec<_> = backend
            .blits()
            .filter(|b| b.technique == Technique::SmearAccumulate)
            .map(|b| (b.uniforms.smear_offset, b.uniforms.smear_attenuation))
            .collect();
        assert_eq!(
            smear,
            SMEAR_TAPS
                .iter()
                .map(|t| (t.offset, t.attenuation))
                .collect::<Vec<_>>()
        );

        // Non-upsample draws never see an upsample weight
        assert!(backend
            .blits()
            .filter(|b| b.technique != Technique::UpsampleBlend)
            .all(|b| b.uniforms.upsample_factor == 0.0));
    }

    #[test]
    fn disposed_pass_is_a_no_op() {
        let mut pass = pass_with(&full_radius());
        pass.dispose();
        pass.dispose();
        assert!(!pass.is_ready());
        let mut backend = RecordingBackend::default();
        assert_eq!(
            pass.execute(&mut backend, 1920, 1080).unwrap(),
            Execution::Skipped
        );
        assert!(backend.events.is_empty());
    }

    #[test]
    fn dispose_without_execute_is_safe() {
        let mut pass = RetroPass::new("Retro", TestProgram);
        pass.dispose();
        assert!(pass.program().is_none());
    }

    #[test]
    fn scopes_wrap_each_stage() {
        let mut pass = pass_with(&full_radius());
        let mut backend = RecordingBackend::default();
        let _ = pass.execute(&mut backend, 1280, 720).unwrap();
        let scopes: Vec<_> = backend
            .events
            .iter()
            .filter_map(|e| match e {
                Event::BeginScope(label) => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(scopes, vec!["Retro", "Blur", "Smear", "Composite"]);
        assert!(backend.scopes_balanced());
    }
}
