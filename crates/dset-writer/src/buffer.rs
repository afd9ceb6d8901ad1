//! Caller-owned output memory and the growable stream over it
//!
//! The caller supplies an [`OutputBuffer`]; the writer only ever asks it to
//! resize. [`BufferBridge`] grants successive regions of that memory,
//! growing it geometrically, and gives the unused tail back at the end so
//! the buffer holds exactly the serialized bytes. The buffer is resized only
//! when a region is granted or the tail is given back.

use crate::{Error, Result};
use postcard::ser_flavors::Flavor;
use tracing::{debug, trace};

/// Smallest region requested from the buffer
pub const MIN_REGION: usize = 1024;

/// Largest single growth step
pub const MAX_GROWTH: usize = i32::MAX as usize;

/// Memory owned by the caller that the writer can resize.
pub trait OutputBuffer {
    /// Resize to exactly `new_size` bytes, keeping the existing prefix.
    ///
    /// Returns the whole buffer, which must be at least `new_size` bytes
    /// long, or `None` if the buffer cannot be resized.
    fn resize(&mut self, new_size: usize) -> Option<&mut [u8]>;

    /// Bytes the buffer can hold without reallocating
    fn capacity(&self) -> usize;
}

impl OutputBuffer for Vec<u8> {
    fn resize(&mut self, new_size: usize) -> Option<&mut [u8]> {
        Vec::resize(self, new_size, 0);
        Some(self.as_mut_slice())
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

/// Output stream over an [`OutputBuffer`].
///
/// `length` is how much of the buffer has been handed out. Existing buffer
/// contents are overwritten from the start.
pub struct BufferBridge<'a, B: ?Sized> {
    buffer: &'a mut B,
    length: usize,
}

impl<'a, B: OutputBuffer + ?Sized> BufferBridge<'a, B> {
    pub fn new(buffer: &'a mut B) -> Self {
        Self { buffer, length: 0 }
    }

    /// Grow the buffer and return the newly granted region.
    ///
    /// Grows to the buffer's capacity when that is larger than what has been
    /// handed out, otherwise doubles, never by more than [`MAX_GROWTH`] in
    /// one step and never to less than [`MIN_REGION`].
    ///
    /// # Errors
    ///
    /// [`Error::Resize`] if the buffer refuses, [`Error::ShortRegion`] if it
    /// grants less than asked for.
    pub fn next_region(&mut self) -> Result<&mut [u8]> {
        let start = self.length;
        let target = self.growth_target();
        let granted = self.grow_to(target)?;
        Ok(&mut granted[start..])
    }

    /// Keep granting regions until at least `needed` bytes are handed out.
    ///
    /// Takes the same growth steps a stream filling `needed` bytes region by
    /// region would, with one resize per step. Returns everything handed out
    /// so far, not just the last region.
    ///
    /// # Errors
    ///
    /// Any error from [`next_region`](Self::next_region).
    pub fn reserve(&mut self, needed: usize) -> Result<&mut [u8]> {
        loop {
            let target = self.growth_target();
            if target >= needed {
                return self.grow_to(target);
            }
            self.grow_to(target)?;
        }
    }

    /// Return the last `count` handed-out bytes to the buffer
    ///
    /// # Errors
    ///
    /// [`Error::BackUp`] if more bytes are returned than were handed out,
    /// [`Error::Resize`] if the buffer refuses to shrink.
    pub fn back_up(&mut self, count: usize) -> Result<()> {
        let Some(length) = self.length.checked_sub(count) else {
            return Err(Error::BackUp {
                count,
                length: self.length,
            });
        };
        self.buffer
            .resize(length)
            .ok_or(Error::Resize { requested: length })?;
        self.length = length;
        trace!("Backed up {} bytes, output is {} bytes", count, length);
        Ok(())
    }

    /// Bytes handed out so far
    pub fn byte_count(&self) -> usize {
        self.length
    }

    fn growth_target(&self) -> usize {
        let capacity = self.buffer.capacity();
        let target = if self.length < capacity {
            capacity
        } else {
            self.length.saturating_mul(2)
        };
        target
            .min(self.length.saturating_add(MAX_GROWTH))
            .max(MIN_REGION)
    }

    /// Resize once to `target` and return the first `target` bytes
    fn grow_to(&mut self, target: usize) -> Result<&mut [u8]> {
        let start = self.length;
        let granted = self
            .buffer
            .resize(target)
            .ok_or(Error::Resize { requested: target })?;
        if granted.len() < target {
            return Err(Error::ShortRegion {
                requested: target,
                granted: granted.len(),
            });
        }

        debug!("Output buffer grown from {} to {} bytes", start, target);
        self.length = target;
        Ok(&mut granted[..target])
    }
}

/// Postcard flavor that only counts the bytes it is given
#[derive(Debug, Default)]
pub struct ByteCounter {
    count: usize,
}

impl Flavor for ByteCounter {
    type Output = usize;

    fn try_push(&mut self, _data: u8) -> postcard::Result<()> {
        self.try_extend(&[0])
    }

    fn try_extend(&mut self, data: &[u8]) -> postcard::Result<()> {
        self.count = self
            .count
            .checked_add(data.len())
            .ok_or(postcard::Error::SerializeBufferFull)?;
        Ok(())
    }

    fn finalize(self) -> postcard::Result<usize> {
        Ok(self.count)
    }
}
