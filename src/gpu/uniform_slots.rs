//! Per-draw uniform blocks packed into one long-lived buffer.
//!
//! Every draw of a frame writes its block into the next aligned slot and
//! binds the buffer at that slot's dynamic offset. The buffer outlives the
//! frame and only grows (2x) when a frame needs more slots than it has.

use std::marker::PhantomData;

/// Distance in bytes between consecutive `T` slots under `alignment`.
#[must_use]
pub fn slot_stride<T>(alignment: u32) -> u64 {
    let size = size_of::<T>() as u64;
    let alignment = u64::from(alignment.max(1));
    size.div_ceil(alignment) * alignment
}

/// A growable buffer of aligned `T` uniform slots.
pub struct UniformSlots<T> {
    buffer: wgpu::Buffer,
    label: String,
    stride: u64,
    capacity: u32,
    cursor: u32,
    generation: u64,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformSlots<T> {
    /// Buffer with room for `capacity` slots.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str, capacity: u32) -> Self {
        let stride = slot_stride::<T>(
            device.limits().min_uniform_buffer_offset_alignment,
        );
        let capacity = capacity.max(1);
        Self {
            buffer: create_buffer(device, label, stride, capacity),
            label: label.to_owned(),
            stride,
            capacity,
            cursor: 0,
            generation: 0,
            _marker: PhantomData,
        }
    }

    /// Start writing from the first slot again.
    ///
    /// Writes land before the next queue submission, so slots may only be
    /// reused once the draws that read them have been submitted.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Write `value` into the next free slot and return its dynamic offset.
    ///
    /// A full buffer is replaced by one twice the size; slots written
    /// before that stay valid in the old buffer, which bind groups already
    /// recorded keep alive.
    pub fn push(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        value: &T,
    ) -> u32 {
        if self.cursor == self.capacity {
            self.capacity *= 2;
            self.buffer =
                create_buffer(device, &self.label, self.stride, self.capacity);
            self.generation += 1;
            log::debug!("{}: grew to {} slots", self.label, self.capacity);
        }
        let offset = u64::from(self.cursor) * self.stride;
        queue.write_buffer(&self.buffer, offset, bytemuck::bytes_of(value));
        self.cursor += 1;
        offset as u32
    }

    /// Binding of one slot; pair it with the offset from [`push`](Self::push).
    #[must_use]
    pub fn binding(&self) -> wgpu::BufferBinding<'_> {
        wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(size_of::<T>() as u64),
        }
    }

    /// Bumped whenever the backing buffer is replaced.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Slots available before the next growth.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    stride: u64,
    capacity: u32,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: stride * u64::from(capacity),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
