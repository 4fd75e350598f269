// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Append-only byte buffer with back-patching.

/// Starting capacity. Large enough for a typical kit of short slices.
pub const INITIAL_CAPACITY: usize = 4 * 1024 * 1024;

/// A block whose size field is still a placeholder.
#[derive(Debug)]
#[must_use = "an open block must be closed with OutputBuffer::end_block"]
pub struct OpenBlock {
    start: usize,
    size_slot: usize,
}

/// The in-memory module image.
///
/// Capacity doubles whenever an append would overflow it. Patches only ever
/// overwrite bytes that were already written and never change the length;
/// patching past the end is a bug and panics.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }
}

impl OutputBuffer {
    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> OutputBuffer {
        OutputBuffer {
            data: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Current write position, which is also the length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Doubles capacity until `extra` more bytes fit.
    fn ensure(&mut self, extra: usize) {
        let needed = self.data.len() + extra;
        let mut capacity = self.data.capacity().max(1);
        if needed <= capacity {
            return;
        }
        while needed > capacity {
            capacity *= 2;
        }
        self.data.reserve_exact(capacity - self.data.len());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.ensure(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Appends `count` copies of `value`.
    pub fn write_fill(&mut self, value: u8, count: usize) {
        self.ensure(count);
        self.data.resize(self.data.len() + count, value);
    }

    pub fn write_zeros(&mut self, count: usize) {
        self.write_fill(0, count);
    }

    /// Appends `text` followed by a NUL terminator.
    pub fn write_str(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
        self.write_u8(0);
    }

    /// Appends a four-character block or section tag (no terminator).
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.write_bytes(tag);
    }

    /// Appends `count` zero bytes to be patched later and returns their offset.
    pub fn reserve(&mut self, count: usize) -> usize {
        let offset = self.len();
        self.write_zeros(count);
        offset
    }

    pub fn patch_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Writes a block tag and a size placeholder.
    pub fn begin_block(&mut self, tag: &[u8; 4]) -> OpenBlock {
        let start = self.len();
        self.write_tag(tag);
        let size_slot = self.reserve(4);
        OpenBlock { start, size_slot }
    }

    /// Patches the block's size with its payload length and returns the
    /// offset of its tag.
    pub fn end_block(&mut self, block: OpenBlock) -> usize {
        let payload = self.len() - (block.size_slot + 4);
        self.patch_u32(block.size_slot, payload as u32);
        block.start
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("len", &self.data.len())
            .field("capacity", &self.data.capacity())
            .finish()
    }
}
