//! Tests for scopes used in evaluation.

use assert_matches::assert_matches;

use arithmetic_expr::{error::ScopeError, parse, Scope};

#[test]
fn evaluation_in_nested_scopes() {
    let expr = parse("rate * amount + fee").unwrap();

    let mut global = Scope::new();
    global.create_with_value("rate", 0.5).unwrap();
    global.create_with_value("fee", 1).unwrap();
    let mut request = global.child();
    request.create_with_value("amount", "10").unwrap();
    assert_eq!(expr.evaluate(&request).unwrap(), 6.0);

    request.create_with_value("fee", 0).unwrap();
    assert_eq!(expr.evaluate(&request).unwrap(), 5.0);
    request.remove("fee");
    assert_eq!(expr.evaluate(&request).unwrap(), 6.0);
}

#[test]
fn root_constants_are_visible_but_protected() {
    let scope = Scope::new();
    let expr = parse("euler ^ 0 + pi * 0").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 1.0);

    let mut pi = Scope::root().find_variable("pi").unwrap().clone();
    let err = pi.set_value(3.0).unwrap_err();
    assert_matches!(err, ScopeError::ConstantModification { .. });
}

#[test]
fn local_variables_shadow_constants() {
    let mut scope = Scope::new();
    scope.create_with_value("pi", 3).unwrap();
    let expr = parse("2 * pi").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 6.0);
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 2.0 * core::f64::consts::PI);
}

#[test]
fn enumerating_variables() {
    let mut outer = Scope::new();
    outer.create_with_value("a", 1).unwrap();
    outer.create_with_value("b", 2).unwrap();
    let mut inner = outer.child();
    inner.create_with_value("b", 3).unwrap();

    assert_eq!(inner.local_names().collect::<Vec<_>>(), ["b"]);
    let mut names: Vec<_> = inner.names().collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "b", "euler", "pi"]);
    let b = inner.variables().find(|var| var.name() == "b").unwrap();
    assert_eq!(b.value(), 3.0);
}
