mod common;

use common::*;
use lyra_runtime::Value;
use num_bigint::BigInt;
use proptest::prelude::*;

proptest! {
    #[test]
    fn isqrt_bracket_holds_for_all_inputs(n in any::<u64>()) {
        let mut rt = rt();
        let v = Value::big(BigInt::from(n));
        let r = call_module(&mut rt, "math", "isqrt", &[v]).unwrap();
        let s = match r {
            Value::Int(i) => BigInt::from(i),
            Value::Big(b) => (*b).clone(),
            other => panic!("unexpected {other:?}"),
        };
        let n = BigInt::from(n);
        prop_assert!(&s * &s <= n);
        prop_assert!((&s + 1) * (&s + 1) > n);
    }
}

proptest! {
    #[test]
    fn isqrt_bracket_past_native_width(hi in any::<u64>(), lo in any::<u64>()) {
        let mut rt = rt();
        let n = (BigInt::from(hi) << 64u32) + BigInt::from(lo);
        let r = call_module(&mut rt, "math", "isqrt", &[Value::big(n.clone())]).unwrap();
        let s = match r {
            Value::Int(i) => BigInt::from(i),
            Value::Big(b) => (*b).clone(),
            other => panic!("unexpected {other:?}"),
        };
        prop_assert!(&s * &s <= n);
        prop_assert!((&s + 1) * (&s + 1) > n);
    }
}

proptest! {
    #[test]
    fn sum_of_ints_is_exact(xs in proptest::collection::vec(any::<i64>(), 0..40)) {
        let mut rt = rt();
        let expected: BigInt = xs.iter().map(|x| BigInt::from(*x)).sum();
        let r = rt.call_global("sum", &[ints(&xs)]).unwrap();
        let got = match r {
            Value::Int(i) => BigInt::from(i),
            Value::Big(b) => (*b).clone(),
            other => panic!("unexpected {other:?}"),
        };
        prop_assert_eq!(got, expected);
    }
}

proptest! {
    #[test]
    fn fsum_cancels_exact_negations_to_zero(
        xs in proptest::collection::vec(-1e290f64..1e290f64, 0..30)
    ) {
        // every term paired with its negation far away in the stream: the
        // exact sum is zero, and compensated summation must find it exactly
        let mut rt = rt();
        let mut terms: Vec<f64> = xs.clone();
        terms.extend(xs.iter().rev().map(|x| -x));
        let r = call_module(&mut rt, "math", "fsum", &[floats(&terms)]).unwrap();
        prop_assert_eq!(as_f64(&r), 0.0);
    }
}

proptest! {
    #[test]
    fn utf8_round_trip(s in ".*") {
        let mut rt = rt();
        let encoded = call_module(
            &mut rt, "codecs", "encode",
            &[Value::str(s.clone()), Value::str("utf-8")],
        ).unwrap();
        let decoded = call_module(
            &mut rt, "codecs", "decode",
            &[encoded, Value::str("utf-8")],
        ).unwrap();
        prop_assert!(matches!(&decoded, Value::Str(out) if **out == *s));
    }
}

proptest! {
    #[test]
    fn utf16_and_utf32_round_trip(s in ".*") {
        let mut rt = rt();
        for enc in ["utf-16-le", "utf-16-be", "utf-32-le", "utf-32-be"] {
            let encoded = call_module(
                &mut rt, "codecs", "encode",
                &[Value::str(s.clone()), Value::str(enc)],
            ).unwrap();
            let decoded = call_module(
                &mut rt, "codecs", "decode",
                &[encoded, Value::str(enc)],
            ).unwrap();
            prop_assert!(matches!(&decoded, Value::Str(out) if **out == *s), "{}", enc);
        }
    }
}

proptest! {
    #[test]
    fn escape_encode_decode_round_trip(data in proptest::collection::vec(any::<u8>(), 0..200)) {
        let mut rt = rt();
        let encoded = call_module(
            &mut rt, "codecs", "escape_encode",
            &[Value::bytes(data.clone())],
        ).unwrap();
        let bytes = match &encoded {
            Value::Tuple(items) => match &items[0] {
                Value::Bytes(b) => b.to_vec(),
                _ => panic!("shape"),
            },
            _ => panic!("shape"),
        };
        let decoded = call_module(
            &mut rt, "codecs", "escape_decode",
            &[Value::bytes(bytes)],
        ).unwrap();
        match &decoded {
            Value::Tuple(items) => {
                prop_assert!(matches!(&items[0], Value::Bytes(b) if **b == data[..]));
            }
            _ => panic!("shape"),
        }
    }
}

proptest! {
    #[test]
    fn integral_float_hash_matches_int_hash(n in -(1i64 << 52)..(1i64 << 52)) {
        let mut rt = rt();
        let hi = as_int(&rt.call_global("hash", &[Value::Int(n)]).unwrap());
        let hf = as_int(&rt.call_global("hash", &[Value::Float(n as f64)]).unwrap());
        prop_assert_eq!(hi, hf);
    }
}

proptest! {
    #[test]
    fn sorted_output_is_ordered_permutation(xs in proptest::collection::vec(any::<i64>(), 0..50)) {
        let mut rt = rt();
        let r = rt.call_global("sorted", &[ints(&xs)]).unwrap();
        let out = match &r {
            Value::List(l) => l.borrow().as_int_slice().map(<[i64]>::to_vec),
            _ => None,
        };
        let out = out.unwrap_or_default();
        let mut expected = xs.clone();
        expected.sort();
        prop_assert_eq!(out, expected);
    }
}

proptest! {
    #[test]
    fn nextafter_steps_equals_iterated_single_steps(
        x in -1e300f64..1e300f64,
        steps in 0u64..64,
    ) {
        let mut rt = rt();
        let f = module_member(&rt, "math", "nextafter");
        let jumped = rt.call_kw(
            &f,
            &[Value::Float(x), Value::Float(f64::INFINITY)],
            &[kw("steps", Value::Int(steps as i64))],
        ).unwrap();
        let mut walked = x;
        for _ in 0..steps {
            walked = as_f64(&rt.call(
                &f,
                &[Value::Float(walked), Value::Float(f64::INFINITY)],
            ).unwrap());
        }
        prop_assert_eq!(as_f64(&jumped).to_bits(), walked.to_bits());
    }
}
