// tests/hash_values.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;

use workdag::errors::HashError;
use workdag::hash::{
    Canonical, ContentHasher, ExactFloat, HashOptions, Value, hash_function, hash_value,
};
use workdag::types::{DeclaredType, HashAlgorithm};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn test_map_key_order_does_not_matter() -> TestResult {
    init_tracing();

    let a = Value::map([("b", Value::from(1)), ("a", Value::from("x"))]);
    let b = Value::map([("a", Value::from("x")), ("b", Value::from(1))]);

    assert_eq!(hash_function(&a)?, hash_function(&b)?);
    assert_eq!(
        hash_value(&a, DeclaredType::Opaque)?,
        Canonical::Pairs(vec![
            ("a".to_string(), Canonical::Str("x".to_string())),
            ("b".to_string(), Canonical::Int(1)),
        ])
    );
    Ok(())
}

#[test]
fn test_list_order_matters() -> TestResult {
    let a = Value::list([1, 2, 3]);
    let b = Value::list([3, 2, 1]);
    assert_ne!(hash_function(&a)?, hash_function(&b)?);
    Ok(())
}

#[test]
fn test_list_and_tuple_hash_alike() -> TestResult {
    let list = Value::list(["a", "b"]);
    let tuple = Value::tuple(["a", "b"]);
    assert_eq!(hash_function(&list)?, hash_function(&tuple)?);
    Ok(())
}

#[test]
fn test_nested_maps_are_sorted_at_every_level() -> TestResult {
    let a = Value::map([
        ("outer", Value::map([("y", 2), ("x", 1)])),
        ("list", Value::list([Value::map([("q", true), ("p", false)])])),
    ]);
    let b = Value::map([
        ("list", Value::list([Value::map([("p", false), ("q", true)])])),
        ("outer", Value::map([("x", 1), ("y", 2)])),
    ]);
    assert_eq!(hash_function(&a)?, hash_function(&b)?);
    Ok(())
}

#[test]
fn test_distinct_scalars_hash_differently() -> TestResult {
    let values = [
        Value::Null,
        Value::from(true),
        Value::from(false),
        Value::from(1),
        Value::from(1.5),
        Value::from("1"),
        Value::list(Vec::<Value>::new()),
        Value::map(Vec::<(String, Value)>::new()),
    ];
    let mut digests: Vec<String> = values
        .iter()
        .map(hash_function)
        .collect::<Result<_, _>>()?;
    let total = digests.len();
    digests.sort();
    digests.dedup();
    assert_eq!(digests.len(), total);
    Ok(())
}

#[test]
fn test_digest_is_stable_across_calls_and_lowercase_hex() -> TestResult {
    let v = Value::map([("pi", Value::from(std::f64::consts::PI))]);
    let first = hash_function(&v)?;
    let second = hash_function(&v)?;

    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    Ok(())
}

#[test]
fn test_float_canonical_form_is_exact() -> TestResult {
    let pi = ExactFloat::from_f64(std::f64::consts::PI)?;
    assert_eq!(
        pi,
        ExactFloat {
            mantissa: 884279719003555,
            exponent: -48,
        }
    );
    assert_eq!(pi.as_ratio(), Some((884279719003555, 1u128 << 48)));

    let tenth = ExactFloat::from_f64(0.1)?;
    assert_eq!(tenth.as_ratio(), Some((3602879701896397, 1u128 << 55)));

    let neg = ExactFloat::from_f64(-2.5)?;
    assert_eq!(neg.as_ratio(), Some((-5, 2)));

    let whole = ExactFloat::from_f64(96.0)?;
    assert_eq!(whole.as_ratio(), Some((96, 1)));
    Ok(())
}

#[test]
fn test_positive_and_negative_zero_hash_alike() -> TestResult {
    assert_eq!(
        hash_function(&Value::from(0.0))?,
        hash_function(&Value::from(-0.0))?
    );
    Ok(())
}

#[test]
fn test_nearby_floats_hash_differently() -> TestResult {
    let a = 0.1 + 0.2;
    let b = 0.3;
    assert_ne!(hash_function(&Value::from(a))?, hash_function(&Value::from(b))?);
    Ok(())
}

#[test]
fn test_non_finite_floats_are_rejected() {
    for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = hash_function(&Value::from(x)).unwrap_err();
        assert!(matches!(err, HashError::NonFiniteFloat(_)), "{x}: {err:?}");
    }
}

#[test]
fn test_subnormal_float_round_trips_exactly() -> TestResult {
    let tiny = f64::from_bits(1);
    let exact = ExactFloat::from_f64(tiny)?;
    assert_eq!(exact.mantissa, 1);
    assert_eq!(exact.exponent, -1074);
    // 2^1074 does not fit in 128 bits.
    assert_eq!(exact.as_ratio(), None);
    Ok(())
}

#[test]
fn test_path_declared_opaque_hashes_the_text() -> TestResult {
    // Nothing touches the filesystem for opaque values.
    let v = Value::from("/definitely/not/here.txt");
    assert_eq!(
        hash_value(&v, DeclaredType::Opaque)?,
        Canonical::Str("/definitely/not/here.txt".to_string())
    );
    Ok(())
}

#[test]
fn test_declared_file_requires_a_path_string() {
    let err = hash_value(&Value::from(3), DeclaredType::File).unwrap_err();
    assert!(matches!(
        err,
        HashError::DeclaredTypeMismatch {
            declared: DeclaredType::File,
            found: "integer",
        }
    ));
    assert!(err.to_string().contains("cannot be hashed as a file"));
}

#[test]
fn test_declared_directory_with_bool_is_rejected() {
    let err = hash_value(&Value::from(true), DeclaredType::Directory).unwrap_err();
    assert!(matches!(err, HashError::DeclaredTypeMismatch { found: "bool", .. }));
}

#[test]
fn test_json_and_toml_values_agree() -> TestResult {
    let json: serde_json::Value = serde_json::from_str(r#"{"b": [1, 2.5, "s"], "a": null}"#)?;
    let toml_table: toml::Table = toml::from_str("b = [1, 2.5, \"s\"]\n")?;

    let from_json = Value::from(json);
    let from_toml = Value::from(toml::Value::Table(toml_table));

    // TOML has no null, so compare the shared part.
    let json_b = match &from_json {
        Value::Map(entries) => entries.iter().find(|(k, _)| k == "b").map(|(_, v)| v.clone()),
        _ => None,
    };
    let toml_b = match &from_toml {
        Value::Map(entries) => entries.iter().find(|(k, _)| k == "b").map(|(_, v)| v.clone()),
        _ => None,
    };
    let (json_b, toml_b) = (json_b.ok_or("missing b")?, toml_b.ok_or("missing b")?);
    assert_eq!(hash_function(&json_b)?, hash_function(&toml_b)?);
    Ok(())
}

#[test]
fn test_option_none_is_null() -> TestResult {
    let none: Option<i64> = None;
    assert_eq!(Value::from(none), Value::Null);
    assert_eq!(hash_value(&Value::from(Some(4)), DeclaredType::Opaque)?, Canonical::Int(4));
    Ok(())
}

#[test]
fn test_algorithm_changes_the_digest() -> TestResult {
    let v = Value::list(["same", "value"]);
    let sha = ContentHasher::new(HashOptions::default()).hash_function(&v, DeclaredType::Opaque)?;
    let blake = ContentHasher::new(HashOptions {
        algorithm: HashAlgorithm::Blake3,
        ..HashOptions::default()
    })
    .hash_function(&v, DeclaredType::Opaque)?;

    assert_eq!(sha.len(), 64);
    assert_eq!(blake.len(), 64);
    assert_ne!(sha, blake);
    Ok(())
}

#[test]
fn test_hash_inputs_ignores_input_order() -> TestResult {
    let hasher = ContentHasher::new(HashOptions::default());
    let n = Value::from(3);
    let s = Value::from("x");

    let forward = hasher.hash_inputs([
        ("n", &n, DeclaredType::Opaque),
        ("s", &s, DeclaredType::Opaque),
    ])?;
    let backward = hasher.hash_inputs([
        ("s", &s, DeclaredType::Opaque),
        ("n", &n, DeclaredType::Opaque),
    ])?;
    assert_eq!(forward, backward);

    // Renaming an input changes the key.
    let renamed = hasher.hash_inputs([
        ("m", &n, DeclaredType::Opaque),
        ("s", &s, DeclaredType::Opaque),
    ])?;
    assert_ne!(forward, renamed);
    Ok(())
}

#[test]
fn test_same_float_written_differently_hashes_alike() -> TestResult {
    #[allow(clippy::approx_constant)]
    let literal = 3.141592653589793_f64;
    assert_eq!(
        hash_function(&Value::from(std::f64::consts::PI))?,
        hash_function(&Value::from(literal))?
    );
    assert_ne!(
        hash_function(&Value::from(std::f64::consts::PI))?,
        hash_function(&Value::from(3.14159_f64))?
    );
    Ok(())
}
