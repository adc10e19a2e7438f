//! Integration tests for parsing and evaluating expressions.

use assert_matches::assert_matches;

use arithmetic_expr::{
    error::{ErrorKind, EvalError, ScopeError},
    parse, BinaryOp, Expr, Parser, Scope,
};

mod functions;
mod scope;

fn evaluate(text: &str) -> f64 {
    parse(text).unwrap().evaluate(&Scope::new()).unwrap()
}

#[test]
fn expressions_without_variables_do_not_depend_on_scope() {
    let expr = parse("2 ^ 10 / 4 - sqrt(9) * 50% + |-1|").unwrap();
    assert!(expr.variable_names().is_empty());
    let expected = 256.0 - 1.5 + 1.0;

    let mut scope = Scope::new();
    assert_eq!(expr.evaluate(&scope).unwrap(), expected);
    scope.create_with_value("x", 100).unwrap();
    scope.create_with_value("y", -3).unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), expected);
    assert_eq!(expr.evaluate(&scope.child()).unwrap(), expected);
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(evaluate("2 + 3 * 4"), 14.0);
    assert_eq!(evaluate("(2 + 3) * 4"), 20.0);
    assert_eq!(evaluate("10 - 2 - 3"), 5.0);
    assert_eq!(evaluate("2 * 3 % 4"), 2.0);
}

#[test]
fn partial_constant_folding() {
    let expr = parse("a + 2 + 3").unwrap();
    assert_matches!(
        expr.root(),
        Expr::Binary { op: BinaryOp::Add, lhs, .. }
            if matches!(**lhs, Expr::Constant(value) if value == 5.0)
    );

    let expr = Parser::new().optional("a", None).parse("a + 2 + 3").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 5.0);
}

#[test]
fn quantifiers_and_percent() {
    assert_eq!(evaluate("1k"), 1_000.0);
    assert_eq!(evaluate("1m"), 0.001);
    assert_eq!(evaluate("50%"), 0.5);
}

#[test]
fn relational_tolerance() {
    assert_eq!(evaluate("1.00000000001 = 1"), 1.0);
    assert_eq!(evaluate("1.1 = 1"), 0.0);
    assert_eq!(evaluate("1 <= 1.00000000001 && 1 >= 1.00000000001"), 1.0);
}

#[test]
fn missing_required_variable() {
    let expr = parse("a + 1").unwrap();
    let err = expr.evaluate(&Scope::new()).unwrap_err();
    assert_matches!(err, EvalError::MissingVariables(ref names) if *names == ["a"]);
    assert_eq!(
        err.to_string(),
        "Missing values for required variable(s): `a`"
    );
}

#[test]
fn optional_variable_with_default() {
    let expr = Parser::new().optional("a", Some(0.0)).parse("a+1").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 1.0);

    let expr = Parser::new()
        .optional_by_default(true)
        .default_value(-1.0)
        .parse("a * b")
        .unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 1.0);
}

#[test]
fn arity_mismatch_is_syntax_error() {
    let err = parse("pow(2)").unwrap_err();
    assert_matches!(
        err.first().kind(),
        ErrorKind::ArgsLenMismatch { expected: 2, actual: 1, .. }
    );
}

#[test]
fn if_does_not_evaluate_other_branch() {
    assert_eq!(evaluate("if(1, 5, 1/0)"), 5.0);

    assert_eq!(evaluate("if(1, 5, x)"), 5.0);
    assert_eq!(evaluate("if(0, x, 6)"), 6.0);

    let err = parse("if(0, 5, x)").unwrap().evaluate(&Scope::new()).unwrap_err();
    assert_matches!(err, EvalError::MissingVariables(ref names) if *names == ["x"]);
}

#[test]
fn constants_cannot_be_modified() {
    let mut scope = Scope::new();
    scope.create_constant("c", 1.0);
    let err = scope.create("c").set_value(5.0).unwrap_err();
    assert_matches!(err, ScopeError::ConstantModification { ref name } if name == "c");

    let expr = parse("c * 2").unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 2.0);
}

#[test]
fn nan_propagates() {
    let expr = parse("sqrt(x) + 1").unwrap();
    let mut scope = Scope::new();
    scope.create_with_value("x", f64::NAN).unwrap();
    assert!(expr.evaluate(&scope).unwrap().is_nan());
    assert!(evaluate("sqrt(-1) < 1").is_nan());
}

#[test]
fn division_by_zero_is_infinite() {
    assert_eq!(evaluate("1 / 0"), f64::INFINITY);
    assert_eq!(evaluate("-1 / 0"), f64::NEG_INFINITY);
}
