use anyhow::Result;
use litdom::*;

fn http_method() -> Domain {
    Domain::builder("HttpMethod")
        .member("GET", "GET")
        .member("POST", "POST")
        .member("DELETE", "DELETE")
        .build()
        .expect("valid declaration")
}

#[test]
fn scenario_membership_and_order() {
    let d = http_method();
    assert!(d.contains(&Value::from("GET")));
    assert!(!d.contains(&Value::from("PATCH")));
    let values: Vec<_> = d.values().iter().map(|v| v.to_string()).collect();
    assert_eq!(values, ["\"GET\"", "\"POST\"", "\"DELETE\""]);
}

#[test]
fn scenario_alias_introspection() -> Result<()> {
    let d = Domain::builder("Method")
        .member("GET", "GET")
        .member("get", "GET")
        .build()?;
    assert_eq!(d.len(), 1);
    let get = Literal::Str("GET".into());
    let names: Vec<_> = d.names_of(&get)?.iter().map(|n| n.to_string()).collect();
    assert_eq!(names, ["GET", "get"]);
    assert_eq!(d.canonical_name_of(&get)?.as_ref(), "GET");
    // Iteration yields the value exactly once.
    assert_eq!(d.iter().count(), 1);
    Ok(())
}

#[test]
fn scenario_extension_with_and_without_opt_in() -> Result<()> {
    let base = http_method();

    let err = Domain::builder("Extended")
        .inherit(&base)
        .member("PATCH", "PATCH")
        .build()
        .unwrap_err();
    assert!(matches!(err, DeclarationError::ExtendRequired { .. }));

    let ext = Domain::builder("Extended")
        .inherit(&base)
        .extend(true)
        .member("PATCH", "PATCH")
        .member("PUT", "PUT")
        .build()?;
    let values: Vec<_> = ext.values().iter().map(|v| v.to_string()).collect();
    assert_eq!(
        values,
        ["\"GET\"", "\"POST\"", "\"DELETE\"", "\"PATCH\"", "\"PUT\""]
    );

    // The parent is untouched.
    assert_eq!(base.len(), 3);
    Ok(())
}

#[test]
fn scenario_strict_mode_names_the_canonical() {
    let err = Domain::builder("Strict")
        .allow_aliases(false)
        .member("A", "x")
        .member("B", "x")
        .build()
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'B'"), "{msg}");
    assert!(msg.contains("'A'"), "{msg}");
}

#[test]
fn strict_key_law_bool_and_int() -> Result<()> {
    let d = Domain::builder("Mixed")
        .member("YES", true)
        .member("ONE", 1)
        .build()?;
    assert_eq!(d.len(), 2);
    assert!(d.contains(&Value::from(true)));
    assert!(d.contains(&Value::from(1)));
    Ok(())
}

#[test]
fn len_matches_declared_pairs_without_aliases() -> Result<()> {
    let d = Domain::builder("Status")
        .member("OK", 200)
        .member("CREATED", 201)
        .member("NO_CONTENT", 204)
        .build()?;
    assert_eq!(d.len(), 3);
    assert_eq!(d.mapping().len(), 3);
    Ok(())
}

#[test]
fn union_and_intersection_laws() -> Result<()> {
    let read = Domain::builder("Read")
        .member("GET", "GET")
        .member("HEAD", "HEAD")
        .build()?;
    let write = Domain::builder("Write")
        .member("POST", "POST")
        .member("GET", "GET")
        .build()?;

    let all = read.union(&write);
    // Every value of both operands, exactly once.
    for v in read.values().iter().chain(write.values()) {
        assert!(all.contains_literal(v));
    }
    assert_eq!(all.len(), 3);

    let common = read.intersection(&write);
    assert_eq!(common.len(), 1);
    assert!(common.contains(&Value::from("GET")));
    // Left operand's declared order is preserved.
    assert_eq!(common.keys()[0].as_ref(), "GET");
    Ok(())
}

#[test]
fn validation_and_lookup_errors_are_recoverable() -> Result<()> {
    let d = http_method();

    let err = d.validate(Value::from("PATCH")).unwrap_err();
    assert!(matches!(err, ValidationError::NotAMember { .. }));
    assert!(err.to_string().contains("\"GET\""));

    let err = d.get("PATCH").unwrap_err();
    assert!(matches!(err, LookupError::UnknownName { .. }));

    let err = d
        .names_of(&Literal::Str("PATCH".into()))
        .unwrap_err();
    assert!(matches!(err, LookupError::UnknownValue { .. }));

    // The domain survives failed validation unchanged.
    assert_eq!(d.len(), 3);
    Ok(())
}

#[test]
fn byte_and_null_members() -> Result<()> {
    let d = Domain::builder("Markers")
        .member("HEADER", b"\x7fELF".as_slice())
        .member("MISSING", Value::Null)
        .build()?;
    assert_eq!(d.len(), 2);
    assert!(d.contains(&Value::from(b"\x7fELF".as_slice())));
    assert!(d.contains(&Value::Null));
    // A null member and the string "null" would be distinct.
    assert!(!d.contains(&Value::from("null")));
    Ok(())
}

#[test]
fn float_members_reject_nan_and_negative_zero() {
    let err = Domain::builder("Rates")
        .member("HALF", 0.5)
        .member("BAD", f64::NAN)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("NaN"), "{err}");

    let err = Domain::builder("Rates")
        .member("ZERO", -0.0)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("-0.0"), "{err}");

    let d = Domain::builder("Rates")
        .member("HALF", 0.5)
        .member("ZERO", 0.0)
        .build()
        .expect("positive zero is fine");
    assert_eq!(d.len(), 2);
}
