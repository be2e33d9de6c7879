//! Block-rate kernel parameters shared between the control and render domains.
//!
//! The control domain writes through a [`ParamBank`] at any time. The render
//! domain calls [`ParamBank::snapshot()`] once at the start of every block and
//! hands the resulting [`BlockParams`] to the kernel, so each parameter holds
//! one value for the whole block.
//!
//! Values are stored as bit-cast `f32` in an `AtomicU32` (Release on write,
//! Acquire on read). A single parameter can never be torn; no ordering is
//! promised between two different parameters.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::sync::atomic::{AtomicU32, Ordering};

/// Upper bound on the number of parameters a kernel may declare.
pub const MAX_KERNEL_PARAMS: usize = 8;

/// How often the host samples a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRate {
    /// One value per render block.
    Block,
    /// Per-sample automation. The host still snapshots once per block.
    Continuous,
}

/// Registration metadata for one kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParamDescriptor {
    /// Host-facing parameter name, e.g. `"min_threshold"`.
    pub name: &'static str,
    /// Value before the first write.
    pub default: f32,
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
    /// Sampling rate of the parameter.
    pub rate: ParamRate,
}

impl KernelParamDescriptor {
    /// A block-rate parameter spanning the full `f32` range.
    pub const fn block(name: &'static str, default: f32) -> Self {
        Self {
            name,
            default,
            min: f32::MIN,
            max: f32::MAX,
            rate: ParamRate::Block,
        }
    }

    /// Restricts the accepted range.
    pub const fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Returns `true` if the range is ordered, NaN-free and holds the default.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max && self.default >= self.min && self.default <= self.max
    }

    /// Clamps `value` into the descriptor range. Never panics, even for an
    /// invalid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value > self.max {
            self.max
        } else if value < self.min {
            self.min
        } else {
            value
        }
    }
}

/// One lock-free parameter value.
#[derive(Debug)]
pub struct BlockParam {
    value: AtomicU32,
    descriptor: KernelParamDescriptor,
}

impl BlockParam {
    /// Creates a parameter initialised to the descriptor default.
    pub fn new(descriptor: KernelParamDescriptor) -> Self {
        Self {
            value: AtomicU32::new(descriptor.clamp(descriptor.default).to_bits()),
            descriptor,
        }
    }

    /// Writes a value, clamped to the descriptor range. NaN is ignored.
    #[inline]
    pub fn set(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        let clamped = self.descriptor.clamp(value);
        self.value.store(clamped.to_bits(), Ordering::Release);
    }

    /// Reads the most recent value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }

    /// Restores the default value.
    pub fn reset(&self) {
        self.set(self.descriptor.default);
    }

    /// The registration metadata.
    pub fn descriptor(&self) -> &KernelParamDescriptor {
        &self.descriptor
    }
}

/// The parameter set of one kernel instance.
#[derive(Debug)]
pub struct ParamBank {
    params: Vec<BlockParam>,
}

impl ParamBank {
    /// Builds a bank from descriptors. Descriptors past
    /// [`MAX_KERNEL_PARAMS`] are never snapshotted; hosts reject such kernels.
    pub fn new(descriptors: &[KernelParamDescriptor]) -> Self {
        Self {
            params: descriptors.iter().copied().map(BlockParam::new).collect(),
        }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the kernel declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Index of the parameter called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.descriptor.name == name)
    }

    /// The parameter at `index`.
    pub fn get(&self, index: usize) -> Option<&BlockParam> {
        self.params.get(index)
    }

    /// Writes the parameter called `name`. Returns `false` if no such parameter exists.
    pub fn set(&self, name: &str, value: f32) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.params[index].set(value);
                true
            }
            None => false,
        }
    }

    /// Reads the parameter called `name`.
    pub fn value(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|index| self.params[index].get())
    }

    /// Iterates over the parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockParam> {
        self.params.iter()
    }

    /// Copies every current value into `out`. Allocation-free.
    #[inline]
    pub fn snapshot(&self, out: &mut BlockParams) {
        let len = self.params.len().min(MAX_KERNEL_PARAMS);
        for (slot, param) in out.values.iter_mut().zip(&self.params[..len]) {
            *slot = param.get();
        }
        out.len = len;
    }
}

/// Values of a kernel's parameters, fixed for one render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    values: [f32; MAX_KERNEL_PARAMS],
    len: usize,
}

impl BlockParams {
    /// An empty snapshot.
    pub const fn new() -> Self {
        Self {
            values: [0.0; MAX_KERNEL_PARAMS],
            len: 0,
        }
    }

    /// Builds a snapshot directly from values, truncated to [`MAX_KERNEL_PARAMS`].
    pub fn from_values(values: &[f32]) -> Self {
        let mut params = Self::new();
        let len = values.len().min(MAX_KERNEL_PARAMS);
        params.values[..len].copy_from_slice(&values[..len]);
        params.len = len;
        params
    }

    /// The value at `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.as_slice().get(index).copied()
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the snapshot holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The values as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.len]
    }
}

impl Default for BlockParams {
    fn default() -> Self {
        Self::new()
    }
}
