//! Tests for standard and custom functions.

use assert_matches::assert_matches;

use arithmetic_expr::{
    error::{ErrorKind, EvalError},
    fns::{Arity, Function, Functions},
    parse, Expr, Parser, Scope,
};

fn sum(scope: &Scope<'_>, args: &[Expr]) -> Result<f64, EvalError> {
    args.iter().map(|arg| arg.evaluate(scope)).sum()
}

#[test]
fn trigonometry() {
    for (text, expected) in [
        ("sin(0)", 0.0),
        ("cos(0)", 1.0),
        ("tan(pi / 4)", 1.0),
        ("asin(1)", core::f64::consts::FRAC_PI_2),
        ("atan2(1, 1)", core::f64::consts::FRAC_PI_4),
        ("cosh(0)", 1.0),
        ("deg(rad(45))", 45.0),
    ] {
        let value = parse(text).unwrap().evaluate(&Scope::new()).unwrap();
        assert!((value - expected).abs() < 1e-12, "{text}: {value}");
    }
}

#[test]
fn rounding() {
    let values: Vec<_> = ["round(2.5)", "round(-2.5)", "floor(-0.5)", "ceil(-0.5)", "sign(-7)"]
        .into_iter()
        .map(|text| parse(text).unwrap().evaluate(&Scope::new()).unwrap())
        .collect();
    assert_eq!(values, [3.0, -2.0, -1.0, -0.0, -1.0]);
}

#[test]
fn random_function_is_not_folded() {
    let expr = parse("rnd(10)").unwrap();
    assert_matches!(expr.root(), Expr::Call { .. });
    let value = expr.evaluate(&Scope::new()).unwrap();
    assert!((0.0..10.0).contains(&value));
}

#[test]
fn lazy_custom_function() {
    let mut functions = Functions::standard().clone();
    functions.register(Function::lazy("sum", Arity::Any, sum));
    functions.register(Function::unary("sq", |x| x * x).impure());
    let parser = Parser::new().with_functions(&functions);

    let expr = parser.parse("sum(1, 2, sq(3), x)").unwrap();
    assert_matches!(expr.root(), Expr::Call { .. });
    let mut scope = Scope::new();
    scope.create_with_value("x", 4).unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 16.0);

    let expr = parser.parse("sum(1, 2) * x").unwrap();
    assert_eq!(expr.to_string(), "3 * x");
    // Standard functions are not affected.
    assert!(!Functions::standard().contains("sum"));
    let err = parse("sum(1)").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnknownFunction(_));
}

#[test]
fn replacing_standard_function() {
    let mut functions = Functions::standard().clone();
    functions.register(Function::unary("log", f64::log2));
    let expr = Parser::new().with_functions(&functions).parse("log(8)").unwrap();
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 3.0);
}
