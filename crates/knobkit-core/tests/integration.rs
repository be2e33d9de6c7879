//! Integration tests for knobkit-core: curves feeding kernels through the
//! block-rate parameter path.

use knobkit_core::{
    BlockParams, CurvedRange, DbToGain, Flow, Kernel, KernelFault, ParamBank, PowCurve, Scale,
    TransferCurve, WaveShaper, scale_value,
};

const BLOCK: usize = 128;

/// Runs one block of `kernel` with the bank's current values.
fn run_block(kernel: &mut dyn Kernel, bank: &ParamBank, input: &[f32]) -> Vec<f32> {
    let mut snapshot = BlockParams::new();
    bank.snapshot(&mut snapshot);
    let mut output = vec![0.0; input.len()];
    let flow = kernel.process(input, &mut output, &snapshot).unwrap();
    assert_eq!(flow, Flow::Continue);
    output
}

#[test]
fn knob_drives_pow_curve_through_param_bank() {
    let mut kernel = PowCurve::new();
    let bank = ParamBank::new(kernel.parameter_descriptors());

    // The widget maps a knob position to the kernel's `max` parameter.
    let ceiling = CurvedRange::pow2(100.0, 1600.0).unwrap();
    let max = ceiling.curved_value(850.0).unwrap();
    assert!((max - 400.0).abs() < 1e-9);
    assert!(bank.set("max", max as f32));

    let output = run_block(&mut kernel, &bank, &[1000.0; BLOCK]);
    assert!(output.iter().all(|&y| (y - 400.0).abs() < 0.05));
}

#[test]
fn parameter_change_lands_on_next_block() {
    let mut kernel = DbToGain::new();
    let bank = ParamBank::new(kernel.parameter_descriptors());
    let input = [-50.0; BLOCK];

    let first = run_block(&mut kernel, &bank, &input);
    assert!(first.iter().all(|&y| y > 0.0));

    bank.set("min_threshold", -40.0);
    let second = run_block(&mut kernel, &bank, &input);
    assert!(second.iter().all(|&y| y == 0.0));
}

#[test]
fn scale_kernel_matches_scale_value() {
    let mut kernel = Scale::new();
    let bank = ParamBank::new(kernel.parameter_descriptors());
    bank.set("input_min", -1.0);
    bank.set("input_max", 1.0);
    bank.set("output_min", 200.0);
    bank.set("output_max", 2000.0);

    let input: Vec<f32> = (0..BLOCK).map(|i| i as f32 / 64.0 - 1.0).collect();
    let output = run_block(&mut kernel, &bank, &input);
    for (&x, &y) in input.iter().zip(&output) {
        let expected = scale_value(f64::from(x), -1.0, 1.0, 200.0, 2000.0).unwrap();
        assert!((f64::from(y) - expected).abs() < 1e-3);
    }
}

#[test]
fn invalid_block_parameters_fault_instead_of_nan() {
    let mut kernel = PowCurve::new();
    let bank = ParamBank::new(kernel.parameter_descriptors());
    bank.set("base", 1.0);

    let mut snapshot = BlockParams::new();
    bank.snapshot(&mut snapshot);
    let mut output = [0.0; BLOCK];
    let result = kernel.process(&[10.0; BLOCK], &mut output, &snapshot);
    assert_eq!(
        result,
        Err(KernelFault::InvalidParameter {
            name: "base",
            value: 1.0
        })
    );
}

#[test]
fn kernels_are_object_safe() {
    let kernels: Vec<Box<dyn Kernel>> = vec![
        Box::new(PowCurve::new()),
        Box::new(DbToGain::new()),
        Box::new(Scale::new()),
        Box::new(WaveShaper::new(TransferCurve::exp_scaler(3.0).unwrap())),
    ];
    let names: Vec<&str> = kernels.iter().map(|k| k.name()).collect();
    assert_eq!(names, ["pow-curve", "db-to-gain", "scale", "wave-shaper"]);
    assert_eq!(kernels[0].parameter_descriptors().len(), 3);
    assert!(kernels[3].parameter_descriptors().is_empty());
}
