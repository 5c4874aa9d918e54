//! Recording backend for pass-scheduling tests.
//!
//! Implements both the pool and the recorder, logs every call in order and
//! tags each target with how many draws have written it.

use rustc_hash::FxHashMap;

use super::recorder::{Blit, CommandRecorder, TextureSlot};
use super::technique::Technique;
use super::uniforms::RetroUniforms;
use crate::error::RetroError;
use crate::renderer::postprocess::target::{
    TargetDesc, TargetHandle, TargetKey, TargetPool,
};

/// Stand-in program. Its one piece of "shader math" is the composite's
/// smear term, enough to check what a zero intensity contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TestProgram;

impl TestProgram {
    pub(crate) fn smear_contribution(
        uniforms: &RetroUniforms,
        smear_sample: f32,
    ) -> f32 {
        uniforms.smear_intensity * smear_sample
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    BeginScope(String),
    EndScope,
    Acquire(TargetKey, TargetDesc),
    Release(TargetKey),
    Blit(Blit),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub(crate) events: Vec<Event>,
    /// Fail the first blit of this technique.
    pub(crate) fail_on: Option<Technique>,
    /// Refuse to acquire this key.
    pub(crate) exhaust_on: Option<TargetKey>,
    pub(crate) live: Vec<TargetKey>,
    pub(crate) writes: FxHashMap<TargetKey, u32>,
    pub(crate) last_writers: FxHashMap<TargetKey, Technique>,
    pub(crate) composite_snapshot: Option<FxHashMap<TargetKey, u32>>,
}

impl RecordingBackend {
    pub(crate) fn key_of(slot: TextureSlot) -> Option<TargetKey> {
        match slot {
            TextureSlot::Source => None,
            TextureSlot::Target(handle) => Some(handle.key),
        }
    }

    pub(crate) fn blits(&self) -> impl Iterator<Item = &Blit> {
        self.events.iter().filter_map(|e| match e {
            Event::Blit(blit) => Some(blit),
            _ => None,
        })
    }

    pub(crate) fn techniques(&self) -> Vec<Technique> {
        self.blits().map(|b| b.technique).collect()
    }

    pub(crate) fn acquires(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Acquire(..)))
            .count()
    }

    pub(crate) fn releases(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Release(_)))
            .count()
    }

    pub(crate) fn live(&self) -> &[TargetKey] {
        &self.live
    }

    pub(crate) fn last_acquire_of(&self, key: TargetKey) -> Option<TargetDesc> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Acquire(k, desc) if *k == key => Some(*desc),
            _ => None,
        })
    }

    pub(crate) fn writes_at_composite(&self) -> Option<&FxHashMap<TargetKey, u32>> {
        self.composite_snapshot.as_ref()
    }

    pub(crate) fn last_writer(&self, key: TargetKey) -> Option<Technique> {
        self.last_writers.get(&key).copied()
    }

    pub(crate) fn scopes_balanced(&self) -> bool {
        let mut depth = 0i32;
        for event in &self.events {
            match event {
                Event::BeginScope(_) => depth += 1,
                Event::EndScope => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    /// Every pooled input of a draw must have been written by an earlier
    /// draw since it was acquired.
    pub(crate) fn assert_reads_follow_writes(&self) {
        let mut written: Vec<TargetKey> = Vec::new();
        for event in &self.events {
            match event {
                Event::Acquire(key, _) | Event::Release(key) => {
                    written.retain(|k| k != key);
                }
                Event::Blit(blit) => {
                    let mut reads = vec![blit.source];
                    if let Some(inputs) = blit.inputs {
                        reads.extend([
                            TextureSlot::Target(inputs.slightly_blurred),
                            TextureSlot::Target(inputs.blurred),
                            TextureSlot::Target(inputs.smear),
                        ]);
                    }
                    for key in reads.into_iter().filter_map(Self::key_of) {
                        assert!(
                            written.contains(&key),
                            "{:?} read {key} before it was written",
                            blit.technique
                        );
                    }
                    if let Some(key) = Self::key_of(blit.dest) {
                        written.push(key);
                    }
                }
                Event::BeginScope(_) | Event::EndScope => {}
            }
        }
    }

    fn check_live(&self, slot: TextureSlot) -> Result<(), RetroError> {
        match Self::key_of(slot) {
            Some(key) if !self.live.contains(&key) => {
                Err(RetroError::UnknownTarget(key))
            }
            _ => Ok(()),
        }
    }
}

impl TargetPool for RecordingBackend {
    fn acquire(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError> {
        if self.exhaust_on == Some(key) {
            return Err(RetroError::PoolExhausted {
                key,
                width: desc.width,
                height: desc.height,
            });
        }
        if self.live.contains(&key) {
            return Err(RetroError::TargetInUse(key));
        }
        self.live.push(key);
        let _ = self.writes.insert(key, 0);
        let _ = self.last_writers.remove(&key);
        self.events.push(Event::Acquire(key, *desc));
        Ok(TargetHandle {
            key,
            width: desc.width,
            height: desc.height,
        })
    }

    fn release(&mut self, handle: TargetHandle) {
        self.live.retain(|k| *k != handle.key);
        self.events.push(Event::Release(handle.key));
    }
}

impl CommandRecorder for RecordingBackend {
    type Program = TestProgram;

    fn begin_scope(&mut self, label: &str) {
        self.events.push(Event::BeginScope(label.to_owned()));
    }

    fn end_scope(&mut self) {
        self.events.push(Event::EndScope);
    }

    fn blit(
        &mut self,
        _program: &TestProgram,
        blit: &Blit,
    ) -> Result<(), RetroError> {
        if self.fail_on == Some(blit.technique) {
            let key = Self::key_of(blit.dest)
                .unwrap_or_else(|| TargetKey::named("_Source"));
            return Err(RetroError::UnknownTarget(key));
        }
        self.check_live(blit.source)?;
        self.check_live(blit.dest)?;
        if let Some(inputs) = blit.inputs {
            for handle in [inputs.slightly_blurred, inputs.blurred, inputs.smear]
            {
                self.check_live(TextureSlot::Target(handle))?;
            }
        }

        if blit.technique == Technique::Composite {
            self.composite_snapshot = Some(self.writes.clone());
        }
        if let Some(key) = Self::key_of(blit.dest) {
            *self.writes.entry(key).or_insert(0) += 1;
            let _ = self.last_writers.insert(key, blit.technique);
        }
        self.events.push(Event::Blit(*blit));
        Ok(())
    }
}
