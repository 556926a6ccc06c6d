//! Floating-point and signed-integer `farith` execution.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines,
    clippy::float_cmp
)]

#[allow(dead_code)]
mod support;

use proptest::prelude::*;
use revelation_core::float::CANONICAL_NAN;
use revelation_core::{
    bits_to_float, float_to_bits, ArithMode, Config, Excause, RegisterIndex, StatusFlag, Timer,
};
use rstest::rstest;
use support::*;

use log as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn float_harness(rd: f32, rn: f32, rm: f32) -> Harness {
    let mut h = Harness::new();
    h.set_gpr(1, float_to_bits(rd));
    h.set_gpr(2, float_to_bits(rn));
    h.set_gpr(3, float_to_bits(rm));
    h
}

fn integer_harness(rd: i32, rn: i32, rm: i32) -> Harness {
    let mut h = Harness::new();
    h.machine()
        .set_config(Config::new(0).with_arithmode(ArithMode::SignedInt));
    h.set_gpr(1, rd as u32);
    h.set_gpr(2, rn as u32);
    h.set_gpr(3, rm as u32);
    h
}

#[rstest]
#[case(FADD, 1.0, 2.5, 0.5, 3.0)]
#[case(FSUB, 1.0, 2.5, 0.5, 2.0)]
#[case(FMUL, 1.0, 2.5, 4.0, 10.0)]
#[case(FMADD, 1.0, 2.0, 3.0, 7.0)]
#[case(FMSUB, 1.0, 2.0, 3.0, -5.0)]
#[case(FABS, 0.0, -6.25, 0.0, 6.25)]
fn float_mode_arithmetic(
    #[case] op: u32,
    #[case] rd: f32,
    #[case] rn: f32,
    #[case] rm: f32,
    #[case] expected: f32,
) {
    let rm_field = if op == FABS { 0 } else { 3 };
    let mut h = float_harness(rd, rn, rm);
    h.execute(farith16(op, 1, 2, rm_field), 2);
    assert_eq!(bits_to_float(h.gpr(1)), expected);
    assert_eq!(h.machine().flag(StatusFlag::Bn), expected < 0.0);
    assert!(!h.machine().flag(StatusFlag::Bz));
}

#[test]
fn float_and_fix_convert_between_domains() {
    let mut h = Harness::new();
    h.set_gpr(2, (-7i32) as u32);
    h.execute(farith32(FLOAT, 1, 2, 0), 4);
    assert_eq!(bits_to_float(h.gpr(1)), -7.0);
    h.set_gpr(2, float_to_bits(42.9));
    h.execute(farith32(FIX, 1, 2, 0), 4);
    assert_eq!(h.gpr(1), 42);
}

#[test]
fn fix_of_nan_yields_all_ones_and_sets_bis() {
    let mut h = Harness::new();
    h.set_gpr(2, CANONICAL_NAN);
    h.execute(farith16(FIX, 1, 2, 0), 2);
    assert_eq!(h.gpr(1), 0xffff_ffff);
    assert!(h.machine().flag(StatusFlag::Bis));
}

#[test]
fn tiny_results_set_bz() {
    let mut h = float_harness(0.0, 0.00005, 0.00001);
    h.execute(farith16(FADD, 1, 2, 3), 2);
    assert!(h.machine().flag(StatusFlag::Bz));
}

#[test]
fn infinite_result_sets_overflow_flags() {
    let mut h = float_harness(0.0, f32::MAX, f32::MAX);
    h.execute(farith32(FMUL, 1, 2, 3), 4);
    assert_eq!(bits_to_float(h.gpr(1)), f32::INFINITY);
    assert!(h.machine().flag(StatusFlag::Bv));
    assert!(h.machine().flag(StatusFlag::Bvs));
    h.set_gpr(2, float_to_bits(1.0));
    h.set_gpr(3, float_to_bits(1.0));
    h.execute(farith32(FMUL, 1, 2, 3), 4);
    assert!(!h.machine().flag(StatusFlag::Bv));
    assert!(h.machine().flag(StatusFlag::Bvs));
}

#[test]
fn subnormal_result_flushes_to_zero() {
    let mut h = float_harness(0.0, f32::MIN_POSITIVE, 0.5);
    h.execute(farith16(FMUL, 1, 2, 3), 2);
    assert_eq!(h.gpr(1), 0);
    assert!(h.machine().flag(StatusFlag::Bus));
}

#[test]
fn enabled_invalid_exception_enters_software_exception_handler() {
    let mut h = float_harness(0.0, 0.0, 0.0);
    h.set_gpr(2, CANONICAL_NAN);
    h.machine().set_config(Config::new(0b10));
    h.execute(farith16(FADD, 1, 2, 3), 2);
    assert_eq!(h.machine().status().excause(), Some(Excause::Fpu));
    assert_eq!(h.reg(RegisterIndex::IPEND), 0b10);
    assert_eq!(h.reg(RegisterIndex::IRET), 2);
    assert_eq!(h.pc(), 4);
}

#[test]
fn disabled_exceptions_only_record_sticky_flags() {
    let mut h = float_harness(0.0, 0.0, 0.0);
    h.set_gpr(2, CANONICAL_NAN);
    h.execute(farith16(FADD, 1, 2, 3), 2);
    assert!(h.machine().flag(StatusFlag::Bis));
    assert_eq!(h.reg(RegisterIndex::ILAT), 0);
}

#[rstest]
#[case(FADD, 0, 7, -9, -2)]
#[case(FSUB, 0, 7, -9, 16)]
#[case(FMUL, 0, -6, 7, -42)]
#[case(FMADD, 10, 2, 3, 16)]
#[case(FMSUB, 10, 2, 3, 4)]
#[case(FABS, 0, -12, 0, 12)]
#[case(FLOAT, 0, -5, 0, -5)]
#[case(FIX, 0, -5, 0, -5)]
fn signed_integer_mode(
    #[case] op: u32,
    #[case] rd: i32,
    #[case] rn: i32,
    #[case] rm: i32,
    #[case] expected: i32,
) {
    let unary = matches!(op, FABS | FLOAT | FIX);
    let mut h = integer_harness(rd, rn, rm);
    h.execute(farith32(op, 1, 2, if unary { 0 } else { 3 }), 4);
    assert_eq!(h.gpr(1) as i32, expected);
    assert_eq!(h.machine().flag(StatusFlag::Bn), expected < 0);
    assert_eq!(h.machine().flag(StatusFlag::Bz), expected == 0);
}

#[test]
fn integer_mode_counts_ialu_events_and_float_mode_counts_fpu_events() {
    let mut h = integer_harness(0, 1, 1);
    h.machine().set_config(
        Config::new(0)
            .with_arithmode(ArithMode::SignedInt)
            .with_timer_mode(Timer::Zero, 4)
            .with_timer_mode(Timer::One, 5),
    );
    h.set_reg(RegisterIndex::CTIMER0, 5);
    h.set_reg(RegisterIndex::CTIMER1, 5);
    h.execute(farith16(FADD, 1, 2, 3), 2);
    assert_eq!(h.reg(RegisterIndex::CTIMER0), 4);
    assert_eq!(h.reg(RegisterIndex::CTIMER1), 5);

    let config = h.machine().config().with_arithmode(ArithMode::Float);
    h.machine().set_config(config);
    h.execute(farith16(FADD, 1, 2, 3), 2);
    assert_eq!(h.reg(RegisterIndex::CTIMER0), 4);
    assert_eq!(h.reg(RegisterIndex::CTIMER1), 4);
}

proptest! {
    #[test]
    fn float_add_matches_host(a in -1_000_000i32..1_000_000, b in -1_000_000i32..1_000_000) {
        let (a, b) = (a as f32, b as f32);
        let mut h = float_harness(0.0, a, b);
        h.execute(farith32(FADD, 1, 2, 3), 4);
        prop_assert_eq!(h.gpr(1), float_to_bits(a + b));
    }

    #[test]
    fn integer_mul_wraps(a in any::<i32>(), b in any::<i32>()) {
        let mut h = integer_harness(0, a, b);
        h.execute(farith16(FMUL, 1, 2, 3), 2);
        prop_assert_eq!(h.gpr(1) as i32, a.wrapping_mul(b));
    }
}
