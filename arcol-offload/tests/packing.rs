// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use arcol_offload::wire::{Datatype, Element, elements_per_word, pack, unpack};
use proptest::prelude::*;

fn check_round_trip<T: Element>(values: &[T]) {
    let words = pack(values);
    assert_eq!(words.len(), values.len().div_ceil(elements_per_word::<T>()));

    let mut out = vec![T::default(); values.len()];
    unpack(&words, &mut out);
    assert_eq!(out, values);
}

#[test]
fn float_extremes() {
    assert_eq!(f32::DATATYPE, Datatype::Float);
    check_round_trip(&[f32::MIN, f32::MAX, f32::MIN_POSITIVE, f32::EPSILON, -1.0, 0.0]);
}

#[test]
fn double_extremes() {
    assert_eq!(f64::DATATYPE, Datatype::Double);
    check_round_trip(&[f64::MIN, f64::MAX, f64::MIN_POSITIVE, f64::EPSILON, -1.0, 0.0]);
}

#[test]
fn int32_extremes() {
    assert_eq!(i32::DATATYPE, Datatype::Int32);
    check_round_trip(&[i32::MIN, i32::MAX, -1, 0, 1]);
}

#[test]
fn uint32_extremes() {
    assert_eq!(u32::DATATYPE, Datatype::UInt32);
    check_round_trip(&[u32::MIN, u32::MAX, 1, 0x8000_0000]);
}

#[test]
fn int64_extremes() {
    assert_eq!(i64::DATATYPE, Datatype::Int64);
    check_round_trip(&[i64::MIN, i64::MAX, -1, 0, 1, i64::from(i32::MIN) - 1]);
}

#[test]
fn uint64_extremes() {
    assert_eq!(u64::DATATYPE, Datatype::UInt64);
    check_round_trip(&[u64::MIN, u64::MAX, 1, 1 << 63]);
}

#[test]
fn negative_zero_keeps_its_sign() {
    let words = pack(&[-0.0_f64]);
    let mut out = [1.0_f64];
    unpack(&words, &mut out);
    assert!(out[0].is_sign_negative());
}

proptest! {
    #[test]
    fn any_length_of_ints(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let words = pack(&values);
        let mut out = vec![0; values.len()];
        unpack(&words, &mut out);
        prop_assert_eq!(out, values);
    }

    #[test]
    fn any_length_of_u64(values in prop::collection::vec(any::<u64>(), 0..40)) {
        let words = pack(&values);
        prop_assert_eq!(words.len(), values.len().div_ceil(8));
        let mut out = vec![0; values.len()];
        unpack(&words, &mut out);
        prop_assert_eq!(out, values);
    }
}
