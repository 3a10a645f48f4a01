// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_yaml::Value;

fn sample(pairs: &[(&str, &str)]) -> Sample {
    let attrs = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    Sample::from_attrs(attrs).unwrap()
}

#[test]
fn name_is_required() {
    let err = Sample::from_attrs(IndexMap::new()).unwrap_err();
    assert!(matches!(err, SampleError::MissingName));
}

#[test]
fn name_must_be_nonempty_string() {
    let mut attrs = IndexMap::new();
    attrs.insert(SAMPLE_NAME_ATTR.to_string(), Value::String(String::new()));
    assert!(matches!(
        Sample::from_attrs(attrs).unwrap_err(),
        SampleError::InvalidName
    ));

    let mut attrs = IndexMap::new();
    attrs.insert(SAMPLE_NAME_ATTR.to_string(), Value::Number(7.into()));
    assert!(matches!(
        Sample::from_attrs(attrs).unwrap_err(),
        SampleError::InvalidName
    ));
}

#[test]
fn identity_is_by_name() {
    let a = sample(&[("sample_name", "s1"), ("protocol", "ATAC")]);
    let b = sample(&[("sample_name", "s1"), ("protocol", "RRBS")]);
    let c = sample(&[("sample_name", "s2")]);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let mut set = std::collections::HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn protocol_accessor() {
    let s = sample(&[("sample_name", "s1"), ("protocol", "ATAC-seq")]);
    assert_eq!(s.protocol(), Some("ATAC-seq"));
    let s = sample(&[("sample_name", "s1")]);
    assert_eq!(s.protocol(), None);
}

#[test]
fn piface_sources_accepts_string_or_list() {
    let s = sample(&[("sample_name", "s1"), ("pipeline_interfaces", "pi.yaml")]);
    assert_eq!(s.piface_sources(), vec!["pi.yaml".to_string()]);

    let mut attrs = IndexMap::new();
    attrs.insert(
        SAMPLE_NAME_ATTR.to_string(),
        Value::String("s1".to_string()),
    );
    attrs.insert(
        PIFACE_ATTR.to_string(),
        Value::Sequence(vec![
            Value::String("a.yaml".to_string()),
            Value::String("b.yaml".to_string()),
        ]),
    );
    let s = Sample::from_attrs(attrs).unwrap();
    assert_eq!(s.piface_sources(), vec!["a.yaml", "b.yaml"]);

    let s = sample(&[("sample_name", "s1")]);
    assert!(s.piface_sources().is_empty());
}

#[test]
fn set_replaces_attribute() {
    let mut s = sample(&[("sample_name", "s1")]);
    s.set("peak_file", Value::String("/out/p.bed".to_string()));
    assert_eq!(s.get_str("peak_file"), Some("/out/p.bed"));
}
