//! Render context: mutation API, cycle detection, and block execution.
//!
//! [`RenderContext`] owns the node graph that widgets wire their signal
//! segments into. It is edited from the control domain (add, remove, connect,
//! disconnect) and rendered from the render domain one block at a time with
//! [`render_block()`](RenderContext::render_block).
//!
//! Every mutation recomputes the topological processing order, so rendering
//! never sorts and never allocates. Node arithmetic parameters (gain, offset,
//! kernel parameters) live in atomics and can be written through their
//! handles without touching the context at all.
//!
//! # Kernel Fault Isolation
//!
//! A kernel that returns an error or panics inside `process` is marked
//! [`KernelState::Faulted`] and its output replaced with silence, for the
//! failing block and every block after it. Sibling nodes keep rendering. The
//! fault is posted as a [`RenderEvent`] for the control domain to pick up.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};
use knobkit_core::{
    BlockParam, BlockParams, Flow, Kernel, MAX_KERNEL_PARAMS, ParamBank,
};

use crate::edge::{Edge, EdgeId};
use crate::error::GraphError;
use crate::event::{ChannelProbe, RenderEvent};
use crate::node::{
    GAIN_DESCRIPTOR, KernelSlot, KernelState, NodeData, NodeId, NodeKind, OFFSET_DESCRIPTOR,
    SourceState,
};
use crate::tap::AnalyserTap;

/// Construction parameters for a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per render block.
    pub block_size: usize,
    /// Capacity of the render-event channel.
    pub event_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 128,
            event_capacity: 256,
        }
    }
}

/// Control-domain handle to a hosted kernel's parameters.
///
/// Writes land at the next block boundary. The handle stays valid after the
/// kernel node is removed; writes then have no audible effect.
#[derive(Debug, Clone)]
pub struct KernelHandle {
    node: NodeId,
    name: &'static str,
    params: Arc<ParamBank>,
}

impl KernelHandle {
    /// The kernel's node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Kernel registration name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Writes a parameter by name. Returns `false` if the kernel has no such parameter.
    pub fn set(&self, param: &str, value: f32) -> bool {
        self.params.set(param, value)
    }

    /// Reads a parameter by name.
    pub fn value(&self, param: &str) -> Option<f32> {
        self.params.value(param)
    }

    /// The underlying parameter bank.
    pub fn params(&self) -> &Arc<ParamBank> {
        &self.params
    }
}

/// Directed acyclic graph of primitive nodes, rendered in fixed-size blocks.
///
/// # Usage
///
/// 1. Create a context with [`new()`](Self::new); it starts with a destination node
/// 2. Add nodes: [`add_input()`](Self::add_input),
///    [`add_constant_source()`](Self::add_constant_source), [`add_gain()`](Self::add_gain),
///    [`add_kernel()`](Self::add_kernel), [`add_analyser()`](Self::add_analyser)
/// 3. Connect nodes: [`connect()`](Self::connect)
/// 4. Render: [`render_block()`](Self::render_block)
pub struct RenderContext {
    config: ContextConfig,
    nodes: Vec<Option<NodeData>>,
    edges: Vec<Option<Edge>>,
    next_node_slot: u32,
    next_edge_slot: u32,
    /// Topological order of live node slots.
    order: Vec<usize>,
    /// Pre-allocated input-summing block.
    mix: Vec<f32>,
    destination: NodeId,
    events_tx: Sender<RenderEvent>,
    events_rx: Receiver<RenderEvent>,
}

impl RenderContext {
    /// Creates a context holding only its destination node.
    pub fn new(config: ContextConfig) -> Self {
        let config = ContextConfig {
            block_size: config.block_size.max(1),
            event_capacity: config.event_capacity.max(1),
            ..config
        };
        let (events_tx, events_rx) = bounded(config.event_capacity);
        let mut ctx = Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            next_node_slot: 0,
            next_edge_slot: 0,
            order: Vec::new(),
            mix: vec![0.0; config.block_size],
            destination: NodeId(0),
            events_tx,
            events_rx,
        };
        ctx.destination = ctx.add_node(NodeKind::Destination);
        tracing::info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "render context created"
        );
        ctx
    }

    /// The configuration this context was created with.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Samples per render block.
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// The destination node; its summed input is the context output.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    // --- Node mutations ---

    /// Adds a node reading channel `channel` of the host input.
    pub fn add_input(&mut self, channel: usize) -> NodeId {
        let id = self.add_node(NodeKind::Input { channel });
        tracing::debug!("graph_add: input node {id} (channel {channel})");
        id
    }

    /// Adds a constant-offset source. It stays silent until
    /// [`start_source()`](Self::start_source).
    pub fn add_constant_source(&mut self, offset: f32) -> NodeId {
        let param = BlockParam::new(OFFSET_DESCRIPTOR);
        param.set(offset);
        let id = self.add_node(NodeKind::ConstantSource {
            offset: Arc::new(param),
            state: SourceState::Idle,
        });
        tracing::debug!("graph_add: constant source {id} (offset {offset})");
        id
    }

    /// Adds a gain multiplier.
    pub fn add_gain(&mut self, gain: f32) -> NodeId {
        let param = BlockParam::new(GAIN_DESCRIPTOR);
        param.set(gain);
        let id = self.add_node(NodeKind::Gain {
            gain: Arc::new(param),
        });
        tracing::debug!("graph_add: gain node {id} (gain {gain})");
        id
    }

    /// Registers a kernel and returns a handle to its parameters.
    ///
    /// Parameters start at their descriptor defaults.
    pub fn add_kernel(&mut self, kernel: Box<dyn Kernel>) -> Result<KernelHandle, GraphError> {
        let name = kernel.name();
        let descriptors = kernel.parameter_descriptors();
        if descriptors.len() > MAX_KERNEL_PARAMS {
            return Err(GraphError::TooManyParameters {
                kernel: name,
                count: descriptors.len(),
                max: MAX_KERNEL_PARAMS,
            });
        }
        if let Some(bad) = descriptors.iter().find(|d| !d.is_valid()) {
            return Err(GraphError::InvalidParameterRange {
                kernel: name,
                param: bad.name,
            });
        }
        let params = Arc::new(ParamBank::new(descriptors));
        let node = self.add_node(NodeKind::Kernel(KernelSlot {
            kernel,
            params: Arc::clone(&params),
            snapshot: BlockParams::new(),
            state: KernelState::Active,
        }));
        tracing::debug!("graph_add: kernel node {node} ('{name}')");
        Ok(KernelHandle { node, name, params })
    }

    /// Adds a pass-through node that copies everything it renders into `tap`.
    pub fn add_analyser(&mut self, tap: Arc<AnalyserTap>) -> NodeId {
        let capacity = tap.capacity();
        let id = self.add_node(NodeKind::Analyser(tap));
        tracing::debug!("graph_add: analyser node {id} (capacity {capacity})");
        id
    }

    /// Removes a node and all its connected edges.
    ///
    /// The destination cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id == self.destination {
            return Err(GraphError::InvalidConnection(
                "the destination cannot be removed".to_string(),
            ));
        }
        let node = self.get_node(id)?;

        let edge_ids: Vec<EdgeId> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();
        for edge_id in edge_ids {
            self.disconnect_internal(edge_id);
        }

        self.nodes[id.0 as usize] = None;
        self.rebuild_order();
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    // --- Sources and parameters ---

    /// Starts a constant source. A source can only be started once.
    pub fn start_source(&mut self, id: NodeId) -> Result<(), GraphError> {
        let state = self.source_state_mut(id)?;
        match *state {
            SourceState::Idle => {
                *state = SourceState::Running;
                tracing::debug!("source_start: {id}");
                Ok(())
            }
            SourceState::Running => Err(GraphError::InvalidSourceState {
                node: id,
                reason: "already started",
            }),
            SourceState::Stopped => Err(GraphError::InvalidSourceState {
                node: id,
                reason: "stopped sources cannot be restarted",
            }),
        }
    }

    /// Stops a running constant source for good.
    pub fn stop_source(&mut self, id: NodeId) -> Result<(), GraphError> {
        let state = self.source_state_mut(id)?;
        match *state {
            SourceState::Running => {
                *state = SourceState::Stopped;
                tracing::debug!("source_stop: {id}");
                Ok(())
            }
            SourceState::Idle => Err(GraphError::InvalidSourceState {
                node: id,
                reason: "not started",
            }),
            SourceState::Stopped => Err(GraphError::InvalidSourceState {
                node: id,
                reason: "already stopped",
            }),
        }
    }

    /// Lifecycle state of a constant source.
    pub fn source_state(&self, id: NodeId) -> Option<SourceState> {
        match &self.get_node(id).ok()?.kind {
            NodeKind::ConstantSource { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// The offset parameter of a constant source.
    pub fn offset_param(&self, id: NodeId) -> Result<Arc<BlockParam>, GraphError> {
        match &self.get_node(id)?.kind {
            NodeKind::ConstantSource { offset, .. } => Ok(Arc::clone(offset)),
            _ => Err(GraphError::WrongKind {
                node: id,
                expected: "constant source",
            }),
        }
    }

    /// The gain parameter of a gain node.
    pub fn gain_param(&self, id: NodeId) -> Result<Arc<BlockParam>, GraphError> {
        match &self.get_node(id)?.kind {
            NodeKind::Gain { gain } => Ok(Arc::clone(gain)),
            _ => Err(GraphError::WrongKind {
                node: id,
                expected: "gain node",
            }),
        }
    }

    /// Sets the offset of a constant source, effective next block.
    pub fn set_offset(&self, id: NodeId, offset: f32) -> Result<(), GraphError> {
        self.offset_param(id)?.set(offset);
        Ok(())
    }

    /// Sets the multiplier of a gain node, effective next block.
    pub fn set_gain(&self, id: NodeId, gain: f32) -> Result<(), GraphError> {
        self.gain_param(id)?.set(gain);
        Ok(())
    }

    /// Lifecycle state of a hosted kernel.
    pub fn kernel_state(&self, id: NodeId) -> Option<KernelState> {
        match &self.get_node(id).ok()?.kind {
            NodeKind::Kernel(slot) => Some(slot.state),
            _ => None,
        }
    }

    // --- Connections ---

    /// Connects two nodes with a directed edge.
    ///
    /// Returns the new edge's ID, or an error if:
    /// - Either node doesn't exist
    /// - The edge would create a cycle
    /// - A duplicate edge already exists
    /// - The connection is structurally invalid (e.g., edge into a constant source)
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        self.validate_connection(from, to)?;

        if self.find_edge(from, to).is_some() {
            return Err(GraphError::DuplicateEdge(from, to));
        }

        // A cycle exists if `to` can already reach `from`.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        let edge_id = EdgeId(self.next_edge_slot);
        self.next_edge_slot += 1;

        let edge_idx = edge_id.0 as usize;
        if edge_idx >= self.edges.len() {
            self.edges.resize_with(edge_idx + 1, || None);
        }
        self.edges[edge_idx] = Some(Edge { from, to });

        if let Some(Some(node)) = self.nodes.get_mut(from.0 as usize) {
            node.outgoing.push(edge_id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(to.0 as usize) {
            node.incoming.push(edge_id);
        }

        self.rebuild_order();
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(edge_id)
    }

    /// Disconnects an edge.
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge doesn't exist or was
    /// already disconnected.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<(), GraphError> {
        if self
            .edges
            .get(id.0 as usize)
            .and_then(|e| e.as_ref())
            .is_none()
        {
            return Err(GraphError::EdgeNotFound(id));
        }
        self.disconnect_internal(id);
        self.rebuild_order();
        tracing::debug!("graph_disconnect: edge {id}");
        Ok(())
    }

    /// Disconnects every outgoing edge of a node. Returns how many were removed.
    pub fn disconnect_all(&mut self, id: NodeId) -> Result<usize, GraphError> {
        let outgoing = self.get_node(id)?.outgoing.clone();
        for &edge_id in &outgoing {
            self.disconnect_internal(edge_id);
        }
        self.rebuild_order();
        tracing::debug!("graph_disconnect: all {} outgoing edges of {id}", outgoing.len());
        Ok(outgoing.len())
    }

    /// Finds the edge ID connecting `from` to `to`, if one exists.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let node = self.nodes.get(from.0 as usize)?.as_ref()?;
        node.outgoing.iter().copied().find(|edge_id| {
            matches!(&self.edges[edge_id.0 as usize], Some(edge) if edge.to == to)
        })
    }

    /// Returns `true` if `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get_node(id).is_ok()
    }

    /// Returns `true` if `id` names a live edge.
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        matches!(self.edges.get(id.0 as usize), Some(Some(_)))
    }

    /// Number of live nodes, the destination included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    // --- Render-domain notifications ---

    /// A probe sink for [`Logger`](knobkit_core::Logger) kernels hosted here.
    pub fn probe(&self) -> ChannelProbe {
        ChannelProbe::new(self.events_tx.clone())
    }

    /// A receiver for render events, for consumers that poll on their own.
    pub fn events(&self) -> Receiver<RenderEvent> {
        self.events_rx.clone()
    }

    /// Takes every pending render event and logs it.
    pub fn drain_events(&self) -> Vec<RenderEvent> {
        let events: Vec<RenderEvent> = self.events_rx.try_iter().collect();
        for event in &events {
            match event {
                RenderEvent::KernelFaulted {
                    node,
                    kernel,
                    fault: Some(fault),
                } => tracing::warn!("kernel '{kernel}' at {node} disabled: {fault}"),
                RenderEvent::KernelFaulted { node, kernel, .. } => {
                    tracing::warn!("kernel '{kernel}' at {node} disabled after a panic")
                }
                RenderEvent::KernelRetired { node, kernel } => {
                    tracing::debug!("kernel '{kernel}' at {node} retired")
                }
                RenderEvent::Probe { label, value } => tracing::debug!("probe {label}: {value}"),
            }
        }
        events
    }

    // --- Rendering ---

    /// Renders one block into `output` (render thread).
    ///
    /// `inputs[c]` feeds input nodes reading channel `c`; missing channels
    /// and short slices read as silence. At most `block_size` samples are
    /// rendered; any remainder of `output` is zeroed.
    ///
    /// Allocation-free unless a kernel panics.
    pub fn render_block(&mut self, inputs: &[&[f32]], output: &mut [f32]) {
        let frames = output.len().min(self.config.block_size);
        let Self {
            nodes,
            edges,
            order,
            mix,
            events_tx,
            destination,
            ..
        } = self;
        let mix = &mut mix[..frames];

        for &idx in order.iter() {
            mix.fill(0.0);
            let Some(node) = nodes[idx].as_ref() else {
                continue;
            };
            for edge_id in &node.incoming {
                let Some(edge) = &edges[edge_id.0 as usize] else {
                    continue;
                };
                if let Some(Some(source)) = nodes.get(edge.from.0 as usize) {
                    for (acc, &sample) in mix.iter_mut().zip(&source.output[..frames]) {
                        *acc += sample;
                    }
                }
            }

            let Some(node) = nodes[idx].as_mut() else {
                continue;
            };
            let out = &mut node.output[..frames];
            match &mut node.kind {
                NodeKind::Input { channel } => match inputs.get(*channel) {
                    Some(source) => {
                        let n = source.len().min(frames);
                        out[..n].copy_from_slice(&source[..n]);
                        out[n..].fill(0.0);
                    }
                    None => out.fill(0.0),
                },
                NodeKind::Destination => out.copy_from_slice(mix),
                NodeKind::ConstantSource { offset, state } => {
                    let value = if *state == SourceState::Running {
                        offset.get()
                    } else {
                        0.0
                    };
                    out.fill(value);
                }
                NodeKind::Gain { gain } => {
                    let g = gain.get();
                    for (y, &x) in out.iter_mut().zip(mix.iter()) {
                        *y = x * g;
                    }
                }
                NodeKind::Kernel(slot) => {
                    run_kernel(NodeId(idx as u32), slot, mix, out, events_tx);
                }
                NodeKind::Analyser(tap) => {
                    out.copy_from_slice(mix);
                    tap.push(mix);
                }
            }
        }

        match nodes.get(destination.0 as usize) {
            Some(Some(dest)) => output[..frames].copy_from_slice(&dest.output[..frames]),
            _ => output[..frames].fill(0.0),
        }
        output[frames..].fill(0.0);
    }

    // --- Internal helpers ---

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node_slot);
        self.next_node_slot += 1;

        let idx = id.0 as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
        }
        self.nodes[idx] = Some(NodeData::new(kind, self.config.block_size));
        self.rebuild_order();
        id
    }

    fn get_node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|n| n.as_ref())
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn source_state_mut(&mut self, id: NodeId) -> Result<&mut SourceState, GraphError> {
        let node = self
            .nodes
            .get_mut(id.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(GraphError::NodeNotFound(id))?;
        match &mut node.kind {
            NodeKind::ConstantSource { state, .. } => Ok(state),
            _ => Err(GraphError::WrongKind {
                node: id,
                expected: "constant source",
            }),
        }
    }

    /// Validates structural constraints for a connection.
    fn validate_connection(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;

        if matches!(from_node.kind, NodeKind::Destination) {
            return Err(GraphError::InvalidConnection(
                "the destination has no output".to_string(),
            ));
        }
        if !to_node.kind.accepts_input() {
            return Err(GraphError::InvalidConnection(format!(
                "{} {to} takes no input",
                to_node.kind.label()
            )));
        }
        Ok(())
    }

    /// DFS reachability check: can `from` reach `to` via existing edges?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;

            if let Some(Some(node)) = self.nodes.get(idx) {
                for edge_id in &node.outgoing {
                    if let Some(edge) = &self.edges[edge_id.0 as usize] {
                        stack.push(edge.to);
                    }
                }
            }
        }
        false
    }

    /// Removes an edge from the edge table and both adjacency lists.
    fn disconnect_internal(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(Some(node)) = self.nodes.get_mut(edge.from.0 as usize) {
            node.outgoing.retain(|&e| e != id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(edge.to.0 as usize) {
            node.incoming.retain(|&e| e != id);
        }
    }

    /// Recomputes the processing order with Kahn's algorithm.
    fn rebuild_order(&mut self) {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];

        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(node) = node {
                in_degree[i] = node
                    .incoming
                    .iter()
                    .filter(|e| self.edges[e.0 as usize].is_some())
                    .count() as u32;
            }
        }

        let mut queue: Vec<usize> = (0..n)
            .rev()
            .filter(|&i| self.nodes[i].is_some() && in_degree[i] == 0)
            .collect();
        let mut sorted = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted.push(idx);
            if let Some(node) = &self.nodes[idx] {
                for edge_id in &node.outgoing {
                    if let Some(edge) = &self.edges[edge_id.0 as usize] {
                        let to_idx = edge.to.0 as usize;
                        in_degree[to_idx] -= 1;
                        if in_degree[to_idx] == 0 {
                            queue.push(to_idx);
                        }
                    }
                }
            }
        }

        self.order = sorted;
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("config", &self.config)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish_non_exhaustive()
    }
}

/// Runs one hosted kernel for a block, isolating errors and panics.
fn run_kernel(
    node: NodeId,
    slot: &mut KernelSlot,
    input: &[f32],
    output: &mut [f32],
    events: &Sender<RenderEvent>,
) {
    if slot.state != KernelState::Active {
        output.fill(0.0);
        return;
    }

    let KernelSlot {
        kernel,
        params,
        snapshot,
        state,
    } = slot;
    params.snapshot(snapshot);
    let name = kernel.name();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        kernel.process(input, &mut *output, snapshot)
    }));

    match result {
        Ok(Ok(Flow::Continue)) => {}
        Ok(Ok(Flow::Retire)) => {
            *state = KernelState::Retired;
            let _ = events.try_send(RenderEvent::KernelRetired { node, kernel: name });
        }
        Ok(Err(fault)) => {
            *state = KernelState::Faulted;
            output.fill(0.0);
            let _ = events.try_send(RenderEvent::KernelFaulted {
                node,
                kernel: name,
                fault: Some(fault),
            });
        }
        Err(_) => {
            *state = KernelState::Faulted;
            output.fill(0.0);
            let _ = events.try_send(RenderEvent::KernelFaulted {
                node,
                kernel: name,
                fault: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knobkit_core::{KernelFault, KernelParamDescriptor, Scale};

    fn ctx() -> RenderContext {
        RenderContext::new(ContextConfig {
            block_size: 4,
            ..ContextConfig::default()
        })
    }

    fn render(ctx: &mut RenderContext, input: &[f32]) -> [f32; 4] {
        let mut out = [0.0; 4];
        ctx.render_block(&[input], &mut out);
        out
    }

    #[test]
    fn new_context_has_only_destination() {
        let ctx = ctx();
        assert_eq!(ctx.node_count(), 1);
        assert!(ctx.contains(ctx.destination()));
    }

    #[test]
    fn input_through_gain_to_destination() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let gain = ctx.add_gain(0.5);
        ctx.connect(input, gain).unwrap();
        ctx.connect(gain, ctx.destination()).unwrap();
        assert_eq!(render(&mut ctx, &[1.0, 2.0, 3.0, 4.0]), [0.5, 1.0, 1.5, 2.0]);

        ctx.set_gain(gain, 2.0).unwrap();
        assert_eq!(render(&mut ctx, &[1.0, 1.0, 1.0, 1.0]), [2.0; 4]);
    }

    #[test]
    fn inputs_are_summed() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let source = ctx.add_constant_source(10.0);
        let sum = ctx.add_gain(1.0);
        ctx.connect(input, sum).unwrap();
        ctx.connect(source, sum).unwrap();
        ctx.connect(sum, ctx.destination()).unwrap();
        ctx.start_source(source).unwrap();
        assert_eq!(render(&mut ctx, &[1.0, 2.0, 3.0, 4.0]), [11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn source_lifecycle() {
        let mut ctx = ctx();
        let source = ctx.add_constant_source(3.0);
        ctx.connect(source, ctx.destination()).unwrap();
        assert_eq!(render(&mut ctx, &[]), [0.0; 4]);

        ctx.start_source(source).unwrap();
        assert_eq!(render(&mut ctx, &[]), [3.0; 4]);
        assert!(matches!(
            ctx.start_source(source),
            Err(GraphError::InvalidSourceState { .. })
        ));

        ctx.stop_source(source).unwrap();
        assert_eq!(ctx.source_state(source), Some(SourceState::Stopped));
        assert_eq!(render(&mut ctx, &[]), [0.0; 4]);
        assert!(ctx.stop_source(source).is_err());
        assert!(ctx.start_source(source).is_err());
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let mut ctx = ctx();
        let source = ctx.add_constant_source(1.0);
        assert!(matches!(
            ctx.stop_source(source),
            Err(GraphError::InvalidSourceState {
                reason: "not started",
                ..
            })
        ));
    }

    #[test]
    fn structural_checks() {
        let mut ctx = ctx();
        let a = ctx.add_gain(1.0);
        let b = ctx.add_gain(1.0);
        let source = ctx.add_constant_source(0.0);
        let input = ctx.add_input(0);

        ctx.connect(a, b).unwrap();
        assert_eq!(ctx.connect(a, b), Err(GraphError::DuplicateEdge(a, b)));
        assert_eq!(ctx.connect(b, a), Err(GraphError::CycleDetected));
        assert_eq!(ctx.connect(a, a), Err(GraphError::CycleDetected));
        assert!(matches!(
            ctx.connect(a, source),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(matches!(
            ctx.connect(a, input),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(matches!(
            ctx.connect(ctx.destination(), a),
            Err(GraphError::InvalidConnection(_))
        ));
        assert!(matches!(
            ctx.set_gain(source, 1.0),
            Err(GraphError::WrongKind { .. })
        ));
    }

    #[test]
    fn disconnect_twice_is_an_error() {
        let mut ctx = ctx();
        let a = ctx.add_gain(1.0);
        let edge = ctx.connect(a, ctx.destination()).unwrap();
        ctx.disconnect(edge).unwrap();
        assert_eq!(ctx.disconnect(edge), Err(GraphError::EdgeNotFound(edge)));
        assert_eq!(ctx.edge_count(), 0);
    }

    #[test]
    fn remove_node_drops_edges() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let gain = ctx.add_gain(1.0);
        let e1 = ctx.connect(input, gain).unwrap();
        let e2 = ctx.connect(gain, ctx.destination()).unwrap();
        ctx.remove_node(gain).unwrap();
        assert!(!ctx.contains_edge(e1));
        assert!(!ctx.contains_edge(e2));
        assert_eq!(ctx.remove_node(gain), Err(GraphError::NodeNotFound(gain)));
        assert!(ctx.remove_node(ctx.destination()).is_err());
        assert_eq!(render(&mut ctx, &[1.0; 4]), [0.0; 4]);
    }

    #[test]
    fn disconnect_all_only_touches_outgoing() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let gain = ctx.add_gain(1.0);
        let other = ctx.add_gain(1.0);
        ctx.connect(input, gain).unwrap();
        ctx.connect(gain, ctx.destination()).unwrap();
        ctx.connect(gain, other).unwrap();
        assert_eq!(ctx.disconnect_all(gain).unwrap(), 2);
        assert!(ctx.find_edge(input, gain).is_some());
    }

    #[test]
    fn kernel_params_flow_through_handle() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let handle = ctx.add_kernel(Box::new(Scale::new())).unwrap();
        ctx.connect(input, handle.node()).unwrap();
        ctx.connect(handle.node(), ctx.destination()).unwrap();

        handle.set("input_max", 10.0);
        handle.set("output_min", -1.0);
        handle.set("output_max", 1.0);
        assert_eq!(render(&mut ctx, &[0.0, 5.0, 10.0, 5.0]), [-1.0, 0.0, 1.0, 0.0]);
    }

    struct Retiring(u32);

    impl Kernel for Retiring {
        fn name(&self) -> &'static str {
            "retiring"
        }
        fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor] {
            &[]
        }
        fn process(
            &mut self,
            input: &[f32],
            output: &mut [f32],
            _params: &BlockParams,
        ) -> Result<Flow, KernelFault> {
            output.copy_from_slice(input);
            self.0 += 1;
            Ok(if self.0 >= 2 { Flow::Retire } else { Flow::Continue })
        }
    }

    #[test]
    fn retired_kernel_goes_silent() {
        let mut ctx = ctx();
        let input = ctx.add_input(0);
        let handle = ctx.add_kernel(Box::new(Retiring(0))).unwrap();
        ctx.connect(input, handle.node()).unwrap();
        ctx.connect(handle.node(), ctx.destination()).unwrap();

        assert_eq!(render(&mut ctx, &[1.0; 4]), [1.0; 4]);
        assert_eq!(render(&mut ctx, &[1.0; 4]), [1.0; 4]);
        assert_eq!(ctx.kernel_state(handle.node()), Some(KernelState::Retired));
        assert_eq!(render(&mut ctx, &[1.0; 4]), [0.0; 4]);
        assert_eq!(
            ctx.drain_events(),
            vec![RenderEvent::KernelRetired {
                node: handle.node(),
                kernel: "retiring"
            }]
        );
    }

    struct TooMany;

    static MANY: [KernelParamDescriptor; MAX_KERNEL_PARAMS + 1] =
        [KernelParamDescriptor::block("p", 0.0); MAX_KERNEL_PARAMS + 1];

    impl Kernel for TooMany {
        fn name(&self) -> &'static str {
            "too-many"
        }
        fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor] {
            &MANY
        }
        fn process(
            &mut self,
            _input: &[f32],
            _output: &mut [f32],
            _params: &BlockParams,
        ) -> Result<Flow, KernelFault> {
            Ok(Flow::Continue)
        }
    }

    #[test]
    fn kernels_with_too_many_params_are_rejected() {
        let mut ctx = ctx();
        assert!(matches!(
            ctx.add_kernel(Box::new(TooMany)),
            Err(GraphError::TooManyParameters { count: 9, .. })
        ));
        assert_eq!(ctx.node_count(), 1);
    }

    struct Inverted;

    static INVERTED: [KernelParamDescriptor; 1] =
        [KernelParamDescriptor::block("depth", 0.5).with_range(1.0, 0.0)];

    impl Kernel for Inverted {
        fn name(&self) -> &'static str {
            "inverted"
        }
        fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor] {
            &INVERTED
        }
        fn process(
            &mut self,
            input: &[f32],
            output: &mut [f32],
            _params: &BlockParams,
        ) -> Result<Flow, KernelFault> {
            output.copy_from_slice(input);
            Ok(Flow::Continue)
        }
    }

    #[test]
    fn kernels_with_invalid_ranges_are_rejected() {
        let mut ctx = ctx();
        assert!(matches!(
            ctx.add_kernel(Box::new(Inverted)),
            Err(GraphError::InvalidParameterRange {
                kernel: "inverted",
                param: "depth"
            })
        ));
        assert_eq!(ctx.node_count(), 1);
    }

    #[test]
    fn short_output_and_missing_channels() {
        let mut ctx = ctx();
        let input = ctx.add_input(3);
        ctx.connect(input, ctx.destination()).unwrap();
        let mut out = [7.0; 6];
        ctx.render_block(&[&[1.0; 4][..]], &mut out);
        assert_eq!(out, [0.0; 6]);
    }
}
