//! Integration tests for knobkit-graph: segments, hosted kernels and the
//! shared context working together.

use std::sync::{Arc, Barrier};
use std::thread;

use knobkit_core::{
    BlockParams, DbToGain, Flow, Kernel, KernelFault, KernelParamDescriptor, Logger, PowCurve,
    Scale,
};
use knobkit_graph::{
    AnalyserTap, ContextConfig, KernelState, RenderContext, RenderEvent, SignalScaler,
    SignalToRatio, release_shared_context, shared_context, try_shared_context,
};

const BLOCK: usize = 64;

fn context() -> RenderContext {
    RenderContext::new(ContextConfig {
        block_size: BLOCK,
        ..ContextConfig::default()
    })
}

fn render(ctx: &mut RenderContext, input: f32) -> Vec<f32> {
    let block = vec![input; BLOCK];
    let mut out = vec![0.0; BLOCK];
    ctx.render_block(&[block.as_slice()], &mut out);
    out
}

fn tap_latest(tap: &AnalyserTap) -> Vec<f32> {
    let mut window = vec![0.0; BLOCK];
    tap.copy_latest(&mut window);
    window
}

/// Passes its input through, then fails from block `fail_at` on.
struct FailsAfter {
    blocks: u32,
    fail_at: u32,
    panics: bool,
}

impl Kernel for FailsAfter {
    fn name(&self) -> &'static str {
        "fails-after"
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
        self.blocks += 1;
        if self.blocks >= self.fail_at {
            // Leave garbage behind to prove the host silences it.
            output.fill(f32::NAN);
            if self.panics {
                panic!("kernel blew up mid-block");
            }
            return Err(KernelFault::Failed("synthetic failure"));
        }
        output.copy_from_slice(input);
        Ok(Flow::Continue)
    }
}

#[test]
fn scaler_feeds_kernel_chain() {
    // Knob in [0, 10] -> [-60, 0] dB -> linear gain.
    let mut ctx = context();
    let knob = ctx.add_input(0);
    let mut scaler = SignalScaler::new(&mut ctx, 0.0, 10.0, -60.0, 0.0, None).unwrap();
    let gain = ctx.add_kernel(Box::new(DbToGain::new())).unwrap();
    ctx.connect(knob, scaler.input().unwrap()).unwrap();
    ctx.connect(scaler.output().unwrap(), gain.node()).unwrap();
    ctx.connect(gain.node(), ctx.destination()).unwrap();

    let full = render(&mut ctx, 10.0);
    assert!(full.iter().all(|&y| (y - 1.0).abs() < 1e-4));

    let half = render(&mut ctx, 5.0);
    let expected = 10f32.powf(-30.0 / 20.0);
    assert!(half.iter().all(|&y| (y - expected).abs() < 1e-4));

    scaler.dispose(&mut ctx).unwrap();
    // Only the kernel's own edge to the destination is left.
    assert_eq!(ctx.node_count(), 3);
    assert_eq!(ctx.edge_count(), 1);
}

#[test]
fn ratio_drives_pow_curve() {
    let mut ctx = context();
    let knob = ctx.add_input(0);
    let mut ratio = SignalToRatio::new(&mut ctx, 0.0, 127.0, None).unwrap();
    let scale = ctx.add_kernel(Box::new(Scale::new())).unwrap();
    let curve = ctx.add_kernel(Box::new(PowCurve::new())).unwrap();
    scale.set("output_min", 1.0);
    scale.set("output_max", 100.0);
    ctx.connect(knob, ratio.input().unwrap()).unwrap();
    ctx.connect(ratio.output().unwrap(), scale.node()).unwrap();
    ctx.connect(scale.node(), curve.node()).unwrap();
    ctx.connect(curve.node(), ctx.destination()).unwrap();

    let top = render(&mut ctx, 127.0);
    assert!(top.iter().all(|&y| (y - 100.0).abs() < 1e-2));
    let bottom = render(&mut ctx, 0.0);
    assert!(bottom.iter().all(|&y| (y - 1.0).abs() < 1e-4));

    ratio.dispose(&mut ctx).unwrap();
}

fn faulting_kernel_is_isolated(panics: bool) {
    let mut ctx = context();
    let input = ctx.add_input(0);
    let faulty = ctx
        .add_kernel(Box::new(FailsAfter {
            blocks: 0,
            fail_at: 2,
            panics,
        }))
        .unwrap();
    let sibling = ctx.add_kernel(Box::new(Scale::new())).unwrap();
    sibling.set("output_max", 2.0);
    let tap = Arc::new(AnalyserTap::new(BLOCK));
    let meter = ctx.add_analyser(Arc::clone(&tap));

    ctx.connect(input, faulty.node()).unwrap();
    ctx.connect(faulty.node(), ctx.destination()).unwrap();
    ctx.connect(input, sibling.node()).unwrap();
    ctx.connect(sibling.node(), meter).unwrap();

    assert_eq!(render(&mut ctx, 0.25), vec![0.25; BLOCK]);

    for _ in 0..3 {
        assert_eq!(render(&mut ctx, 0.25), vec![0.0; BLOCK]);
        assert_eq!(tap_latest(&tap), vec![0.5; BLOCK]);
    }
    assert_eq!(ctx.kernel_state(faulty.node()), Some(KernelState::Faulted));
    assert_eq!(ctx.kernel_state(sibling.node()), Some(KernelState::Active));

    let fault = if panics {
        None
    } else {
        Some(KernelFault::Failed("synthetic failure"))
    };
    assert_eq!(
        ctx.drain_events(),
        vec![RenderEvent::KernelFaulted {
            node: faulty.node(),
            kernel: "fails-after",
            fault,
        }]
    );
}

#[test]
fn failing_kernel_is_silenced_while_siblings_continue() {
    faulting_kernel_is_isolated(false);
}

#[test]
fn panicking_kernel_is_silenced_while_siblings_continue() {
    faulting_kernel_is_isolated(true);
}

#[test]
fn invalid_kernel_parameter_faults_the_kernel() {
    let mut ctx = context();
    let input = ctx.add_input(0);
    let curve = ctx.add_kernel(Box::new(PowCurve::new())).unwrap();
    ctx.connect(input, curve.node()).unwrap();
    ctx.connect(curve.node(), ctx.destination()).unwrap();

    assert!(curve.set("base", 1.0));
    assert_eq!(render(&mut ctx, 50.0), vec![0.0; BLOCK]);
    assert_eq!(
        ctx.drain_events(),
        vec![RenderEvent::KernelFaulted {
            node: curve.node(),
            kernel: "pow-curve",
            fault: Some(KernelFault::InvalidParameter {
                name: "base",
                value: 1.0
            }),
        }]
    );

    // Fixing the parameter does not revive a faulted kernel.
    curve.set("base", 2.0);
    assert_eq!(render(&mut ctx, 50.0), vec![0.0; BLOCK]);
}

#[test]
fn logger_reports_first_sample_per_block() {
    let mut ctx = context();
    let input = ctx.add_input(0);
    let logger = ctx
        .add_kernel(Box::new(Logger::new("knob", ctx.probe())))
        .unwrap();
    ctx.connect(input, logger.node()).unwrap();
    ctx.connect(logger.node(), ctx.destination()).unwrap();

    assert_eq!(render(&mut ctx, 0.75), vec![0.75; BLOCK]);
    render(&mut ctx, 0.5);
    assert_eq!(
        ctx.drain_events(),
        vec![
            RenderEvent::Probe {
                label: "knob",
                value: 0.75
            },
            RenderEvent::Probe {
                label: "knob",
                value: 0.5
            },
        ]
    );
}

#[test]
fn scaler_tap_sees_remapped_signal() {
    let mut ctx = context();
    let tap = Arc::new(AnalyserTap::new(BLOCK));
    let meter = ctx.add_analyser(Arc::clone(&tap));
    let input = ctx.add_input(0);
    let mut scaler = SignalScaler::new(&mut ctx, 0.0, 1.0, 100.0, 200.0, Some(meter)).unwrap();
    ctx.connect(input, scaler.input().unwrap()).unwrap();

    render(&mut ctx, 0.5);
    assert!(tap_latest(&tap).iter().all(|&y| (y - 150.0).abs() < 1e-3));

    scaler.dispose(&mut ctx).unwrap();
    assert!(ctx.contains(meter));
}

#[test]
fn shared_context_is_created_once() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    release_shared_context();
    assert!(try_shared_context().is_none());

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared_context(&ContextConfig::default())
            })
        })
        .collect();
    let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for ctx in &contexts[1..] {
        assert!(Arc::ptr_eq(&contexts[0], ctx));
    }
    let later = shared_context(&ContextConfig {
        sample_rate: 44_100.0,
        ..ContextConfig::default()
    });
    assert!(Arc::ptr_eq(&contexts[0], &later));
    assert_eq!(later.lock().sample_rate(), 48_000.0);

    assert!(release_shared_context());
    assert!(!release_shared_context());
    let fresh = shared_context(&ContextConfig::default());
    assert!(!Arc::ptr_eq(&contexts[0], &fresh));
    release_shared_context();
}
