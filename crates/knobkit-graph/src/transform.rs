//! Range-adaptation segments built from constant sources and gain nodes.
//!
//! A segment is a small sub-graph that remaps a signal from one range to
//! another at audio rate, the render-domain twin of
//! [`scale_value()`](knobkit_core::scale_value):
//!
//! | Segment | Topology | Output for `x` in `[in_min, in_max]` |
//! |---------|----------|--------------------------------------|
//! | [`SignalScaler`] | `(x - in_min) / (in_max - in_min) * (out_max - out_min) + out_min` | `[out_min, out_max]` |
//! | [`SignalToRatio`] | `(x - in_min) / (in_max - in_min)` | `[0, 1]` |
//!
//! Offsets are produced by constant sources summed into gain nodes, so the
//! chain only uses the two primitive node kinds. External nodes connect to
//! the segment through its `input()` and `output()` boundary handles.
//!
//! # Ownership
//!
//! A segment owns every node it creates and every connection it makes.
//! Nothing is cleaned up implicitly: call `dispose()` before dropping it.
//! Disposal stops each source, severs each connection in reverse order of
//! creation, then removes the owned nodes. Nodes the segment was handed
//! (such as a diagnostic tap) are referenced, never removed.
//!
//! # Example
//!
//! ```rust
//! use knobkit_graph::{ContextConfig, RenderContext, SignalScaler};
//!
//! let mut ctx = RenderContext::new(ContextConfig::default());
//! let input = ctx.add_input(0);
//! let mut scaler = SignalScaler::new(&mut ctx, 0.0, 10.0, -1.0, 1.0, None).unwrap();
//! ctx.connect(input, scaler.input().unwrap()).unwrap();
//! ctx.connect(scaler.output().unwrap(), ctx.destination()).unwrap();
//!
//! let block = vec![5.0; ctx.block_size()];
//! let mut out = vec![0.0; ctx.block_size()];
//! ctx.render_block(&[block.as_slice()], &mut out);
//! assert!(out.iter().all(|&y| y.abs() < 1e-6));
//!
//! scaler.dispose(&mut ctx).unwrap();
//! assert!(scaler.dispose(&mut ctx).is_err());
//! ```

use crate::context::RenderContext;
use crate::edge::EdgeId;
use crate::error::GraphError;
use crate::node::NodeId;

/// Checks that `[min, max]` can be divided across.
fn check_range(min: f32, max: f32) -> Result<f32, GraphError> {
    let span = max - min;
    if !min.is_finite() || !max.is_finite() || span == 0.0 || !span.is_finite() {
        return Err(knobkit_core::Error::DegenerateRange {
            min: f64::from(min),
            max: f64::from(max),
        }
        .into());
    }
    Ok(span)
}

fn check_finite(min: f32, max: f32) -> Result<(), GraphError> {
    if min.is_finite() && max.is_finite() && (max - min).is_finite() {
        Ok(())
    } else {
        Err(knobkit_core::Error::DegenerateRange {
            min: f64::from(min),
            max: f64::from(max),
        }
        .into())
    }
}

/// Bookkeeping shared by both segment types.
#[derive(Debug)]
struct Segment {
    name: &'static str,
    nodes: Vec<NodeId>,
    sources: Vec<NodeId>,
    edges: Vec<EdgeId>,
    disposed: bool,
}

impl Segment {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            nodes: Vec::new(),
            sources: Vec::new(),
            edges: Vec::new(),
            disposed: false,
        }
    }

    fn gain(&mut self, ctx: &mut RenderContext, gain: f32) -> NodeId {
        let id = ctx.add_gain(gain);
        self.nodes.push(id);
        id
    }

    fn constant(&mut self, ctx: &mut RenderContext, offset: f32) -> Result<NodeId, GraphError> {
        let id = ctx.add_constant_source(offset);
        self.nodes.push(id);
        ctx.start_source(id)?;
        self.sources.push(id);
        Ok(id)
    }

    fn wire(&mut self, ctx: &mut RenderContext, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let edge = ctx.connect(from, to)?;
        self.edges.push(edge);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), GraphError> {
        if self.disposed {
            Err(GraphError::Disposed(self.name))
        } else {
            Ok(())
        }
    }

    /// Undoes a half-built segment after a failed construction step.
    fn roll_back(mut self, ctx: &mut RenderContext, cause: GraphError) -> GraphError {
        tracing::warn!("{} construction failed, rolling back: {cause}", self.name);
        self.teardown(ctx);
        cause
    }

    fn dispose(&mut self, ctx: &mut RenderContext) -> Result<(), GraphError> {
        self.ensure_live()?;
        self.teardown(ctx);
        tracing::debug!(
            "{} disposed ({} nodes, {} connections)",
            self.name,
            self.nodes.len(),
            self.edges.len()
        );
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut RenderContext) {
        self.disposed = true;
        for &source in &self.sources {
            if let Err(e) = ctx.stop_source(source) {
                tracing::debug!("{}: skipping stop of {source}: {e}", self.name);
            }
        }
        for &edge in self.edges.iter().rev() {
            // A removed endpoint takes its edges with it.
            if let Err(e) = ctx.disconnect(edge) {
                tracing::debug!("{}: skipping disconnect of {edge}: {e}", self.name);
            }
        }
        for &node in self.nodes.iter().rev() {
            if let Err(e) = ctx.remove_node(node) {
                tracing::debug!("{}: skipping removal of {node}: {e}", self.name);
            }
        }
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        if !self.disposed {
            tracing::warn!(
                "{} dropped without dispose(); {} nodes stay in the render context",
                self.name,
                self.nodes.len()
            );
        }
    }
}

/// Affine range remap executed in the render domain.
///
/// Topology:
///
/// ```text
/// [-in_min] ──┐
///             ├─> input ─> ×1/(in_max-in_min) ─> ×(out_max-out_min) ─┐
///   (ext) ────┘                                                      ├─> output ─> [tap]
///                                                      [+out_min] ───┘
/// ```
#[derive(Debug)]
pub struct SignalScaler {
    segment: Segment,
    input: NodeId,
    output: NodeId,
    input_range: (f32, f32),
    output_range: (f32, f32),
}

impl SignalScaler {
    /// Builds and starts a scaler in `ctx`.
    ///
    /// # Arguments
    ///
    /// * `input_min`, `input_max` - Range of the incoming signal; must differ
    /// * `output_min`, `output_max` - Range the signal is mapped onto
    /// * `tap` - Optional diagnostic node fed from the output
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for an empty or non-finite range, or the
    /// connection error if `tap` cannot be fed. Nothing is left in the
    /// context on failure.
    pub fn new(
        ctx: &mut RenderContext,
        input_min: f32,
        input_max: f32,
        output_min: f32,
        output_max: f32,
        tap: Option<NodeId>,
    ) -> Result<Self, GraphError> {
        let input_span = check_range(input_min, input_max)?;
        check_finite(output_min, output_max)?;

        let mut segment = Segment::new("signal-scaler");
        match Self::build(ctx, &mut segment, input_min, input_span, output_min, output_max, tap) {
            Ok((input, output)) => {
                tracing::debug!(
                    "signal-scaler built: [{input_min}, {input_max}] -> [{output_min}, {output_max}]"
                );
                Ok(Self {
                    segment,
                    input,
                    output,
                    input_range: (input_min, input_max),
                    output_range: (output_min, output_max),
                })
            }
            Err(e) => Err(segment.roll_back(ctx, e)),
        }
    }

    fn build(
        ctx: &mut RenderContext,
        segment: &mut Segment,
        input_min: f32,
        input_span: f32,
        output_min: f32,
        output_max: f32,
        tap: Option<NodeId>,
    ) -> Result<(NodeId, NodeId), GraphError> {
        let minus_input_min = segment.constant(ctx, -input_min)?;
        let input = segment.gain(ctx, 1.0);
        let divided = segment.gain(ctx, 1.0 / input_span);
        let multiplied = segment.gain(ctx, output_max - output_min);
        let plus_output_min = segment.constant(ctx, output_min)?;
        let output = segment.gain(ctx, 1.0);

        segment.wire(ctx, minus_input_min, input)?;
        segment.wire(ctx, input, divided)?;
        segment.wire(ctx, divided, multiplied)?;
        segment.wire(ctx, multiplied, output)?;
        segment.wire(ctx, plus_output_min, output)?;
        if let Some(tap) = tap {
            segment.wire(ctx, output, tap)?;
        }
        Ok((input, output))
    }

    /// Boundary node external signals connect into.
    pub fn input(&self) -> Result<NodeId, GraphError> {
        self.segment.ensure_live()?;
        Ok(self.input)
    }

    /// Boundary node carrying the remapped signal.
    pub fn output(&self) -> Result<NodeId, GraphError> {
        self.segment.ensure_live()?;
        Ok(self.output)
    }

    /// The `(min, max)` input range.
    pub fn input_range(&self) -> (f32, f32) {
        self.input_range
    }

    /// The `(min, max)` output range.
    pub fn output_range(&self) -> (f32, f32) {
        self.output_range
    }

    /// Whether [`dispose()`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.segment.disposed
    }

    /// Stops the sources, severs every connection made at construction in
    /// reverse order, and removes the owned nodes.
    ///
    /// # Errors
    ///
    /// [`GraphError::Disposed`] on a second call; the context is not touched.
    pub fn dispose(&mut self, ctx: &mut RenderContext) -> Result<(), GraphError> {
        self.segment.dispose(ctx)
    }
}

/// Normalises `[in_min, in_max]` onto `[0, 1]` in the render domain.
///
/// Topology: `[-in_min] ─> input ─> ×1/(in_max-in_min) = output`.
#[derive(Debug)]
pub struct SignalToRatio {
    segment: Segment,
    input: NodeId,
    output: NodeId,
    input_range: (f32, f32),
}

impl SignalToRatio {
    /// Builds and starts a ratio segment in `ctx`.
    ///
    /// # Errors
    ///
    /// Same as [`SignalScaler::new()`].
    pub fn new(
        ctx: &mut RenderContext,
        input_min: f32,
        input_max: f32,
        tap: Option<NodeId>,
    ) -> Result<Self, GraphError> {
        let input_span = check_range(input_min, input_max)?;

        let mut segment = Segment::new("signal-to-ratio");
        let built = (|| {
            let minus_input_min = segment.constant(ctx, -input_min)?;
            let input = segment.gain(ctx, 1.0);
            let output = segment.gain(ctx, 1.0 / input_span);
            segment.wire(ctx, minus_input_min, input)?;
            segment.wire(ctx, input, output)?;
            if let Some(tap) = tap {
                segment.wire(ctx, output, tap)?;
            }
            Ok::<_, GraphError>((input, output))
        })();

        match built {
            Ok((input, output)) => {
                tracing::debug!("signal-to-ratio built: [{input_min}, {input_max}] -> [0, 1]");
                Ok(Self {
                    segment,
                    input,
                    output,
                    input_range: (input_min, input_max),
                })
            }
            Err(e) => Err(segment.roll_back(ctx, e)),
        }
    }

    /// Boundary node external signals connect into.
    pub fn input(&self) -> Result<NodeId, GraphError> {
        self.segment.ensure_live()?;
        Ok(self.input)
    }

    /// Boundary node carrying the `[0, 1]` ratio.
    pub fn output(&self) -> Result<NodeId, GraphError> {
        self.segment.ensure_live()?;
        Ok(self.output)
    }

    /// The `(min, max)` input range.
    pub fn input_range(&self) -> (f32, f32) {
        self.input_range
    }

    /// Whether [`dispose()`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.segment.disposed
    }

    /// Stops the source, severs every connection made at construction in
    /// reverse order, and removes the owned nodes.
    ///
    /// # Errors
    ///
    /// [`GraphError::Disposed`] on a second call.
    pub fn dispose(&mut self, ctx: &mut RenderContext) -> Result<(), GraphError> {
        self.segment.dispose(ctx)
    }
}
