//! Tests for the expression parser.

use assert_matches::assert_matches;

use super::*;
use crate::{error::ErrorCategory, fns::Function, Scope};

fn eval(text: &str) -> f64 {
    let expr = parse(text).unwrap_or_else(|err| panic!("failed parsing `{text}`: {err}"));
    expr.evaluate(Scope::root())
        .unwrap_or_else(|err| panic!("failed evaluating `{text}`: {err}"))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-12 * expected.abs().max(1.0),
        "{actual} != {expected}"
    );
}

#[test]
fn operator_precedence() {
    assert_eq!(eval("2 + 3 * 4"), 14.0);
    assert_eq!(eval("(2 + 3) * 4"), 20.0);
    assert_eq!(eval("2 * 3 ^ 2"), 18.0);
    assert_eq!(eval("1 + 1 < 3"), 1.0);
    assert_eq!(eval("1 < 2 && 3 > 2"), 1.0);
    assert_eq!(eval("2 ** 10"), 1024.0);
}

#[test]
fn same_priority_chains_are_left_associative() {
    assert_eq!(eval("10 - 2 - 3"), 5.0);
    assert_eq!(eval("10 - 2 + 3"), 11.0);
    assert_eq!(eval("100 / 10 / 5"), 2.0);
    assert_eq!(eval("12 / 3 * 2"), 8.0);
    assert_eq!(eval("2 ^ 3 ^ 2"), 64.0);
    assert_eq!(eval("3 > 2 > 0"), 1.0);
    assert_eq!(eval("1 || 0 && 0"), 0.0);
}

#[test]
fn parentheses_seal_operations() {
    let expr = parse("10 - (2 - x)").unwrap();
    assert_matches!(
        expr.root(),
        Expr::Binary { op: BinaryOp::Sub, lhs, rhs, sealed: false }
            if matches!(**lhs, Expr::Constant(value) if value == 10.0)
                && matches!(**rhs, Expr::Binary { op: BinaryOp::Sub, sealed: true, .. })
    );

    let mut scope = Scope::new();
    scope.create_with_value("x", 3).unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 11.0);
    assert_eq!(expr.to_string(), "10 - (2 - x)");
}

#[test]
fn long_chains() {
    let sum = vec!["1"; 300].join(" + ");
    assert_eq!(eval(&sum), 300.0);
    let difference = vec!["1"; 300].join(" - ");
    assert_eq!(eval(&difference), -298.0);
}

#[test]
fn chain_length_is_not_limited_by_nesting_depth() {
    let parser = Parser::new().with_features(Features::all() - Features::FOLD_CONSTANTS);
    let sum = vec!["1"; 600].join(" + ");
    assert!(parser.parse(&sum).is_ok());
    let product = vec!["x"; 600].join(" * ");
    assert!(parser.parse(&product).is_ok());

    // The resulting tree is as deep as the chain is long, so use a larger stack
    // for evaluating and dropping it in debug builds.
    let handle = std::thread::Builder::new()
        .stack_size(64 << 20)
        .spawn(|| {
            let sum = vec!["1"; 10_000].join(" + ");
            assert_eq!(eval(&sum), 10_000.0);
            let sum = vec!["1"; 10_000].join("+");
            let expr = Parser::new()
                .with_features(Features::all() - Features::FOLD_CONSTANTS)
                .parse(&sum)
                .unwrap();
            assert_eq!(expr.evaluate(Scope::root()).unwrap(), 10_000.0);
        })
        .unwrap();
    handle.join().unwrap();
}

#[test]
fn signs_and_negative_literals() {
    assert_eq!(eval("-3"), -3.0);
    assert_eq!(eval("- 3"), -3.0);
    assert_eq!(eval("+4"), 4.0);
    assert_eq!(eval("+(2)"), 2.0);
    assert_eq!(eval("-(2 + 3)"), -5.0);
    assert_eq!(eval("2 - -3"), 5.0);
    assert_eq!(eval("2--3"), 5.0);
}

#[test]
fn glued_minus_after_operand_is_subtraction() {
    assert_eq!(eval("5 -3"), 2.0);
    assert_eq!(eval("5-3"), 2.0);
    assert_eq!(eval("2 * 3 -4"), 2.0);
    assert_eq!(eval("2 -4 * 3"), -10.0);
    assert_eq!(eval("1-2-3"), -4.0);
    assert_eq!(eval("10-2k / 1k"), 8.0);

    let expr = parse("x-1").unwrap();
    let mut scope = Scope::new();
    scope.create_with_value("x", 10).unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), 9.0);
    assert_eq!(expr.to_string(), "x - 1");
}

#[test]
fn glued_minus_does_not_change_precedence() {
    assert_eq!(eval("8-2^2"), 4.0);
    assert_eq!(eval("8 -2^2"), 4.0);
    assert_eq!(eval("8 - 2^2"), 4.0);
    assert_eq!(eval("8-2**2*2"), 0.0);

    let expr = parse("x-2^2").unwrap();
    let mut scope = Scope::new();
    scope.create_with_value("x", 1).unwrap();
    assert_eq!(expr.evaluate(&scope).unwrap(), -3.0);
    assert_matches!(
        expr.root(),
        Expr::Binary { op: BinaryOp::Sub, rhs, .. }
            if matches!(**rhs, Expr::Constant(value) if value == 4.0)
    );
}

#[test]
fn quantifiers() {
    assert_eq!(eval("1k"), 1_000.0);
    assert_eq!(eval("1m"), 0.001);
    assert_eq!(eval("2.5K"), 2_500.0);
    assert_eq!(eval("3M"), 3e6);
    assert_eq!(eval("1G"), 1e9);
    assert_close(eval("5u"), 5e-6);
    assert_close(eval("20n"), 2e-8);
    assert_eq!(eval("2k + 1"), 2_001.0);
}

#[test]
fn unknown_quantifier() {
    let err = parse("1x + 2").unwrap_err();
    assert_eq!(err.len(), 1);
    let err = err.first();
    assert_matches!(err.kind(), ErrorKind::UnknownQuantifier(suffix) if suffix == "x");
    assert_eq!(err.kind().category(), ErrorCategory::Lexical);
    assert_eq!(err.snippet(), "x");
    assert_eq!(err.span().location_offset(), 1);
}

#[test]
fn detached_quantifier_is_not_recognized() {
    let err = parse("1 k").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::Leftovers);
    assert_eq!(err.first().snippet(), "k");
}

#[test]
fn percent_operation() {
    assert_eq!(eval("50%"), 0.5);
    assert_eq!(eval("(50)%"), 0.5);
    assert_close(eval("200 * 10%"), 20.0);
    assert_eq!(eval("50% * 1k"), 500.0);
    assert_eq!(eval("50% + 1"), 1.5);
    assert_eq!(eval("7 % 3"), 1.0);
    assert_eq!(eval("7 % -3"), 1.0);
}

#[test]
fn percent_node_is_sealed() {
    let expr = Parser::new()
        .with_features(Features::all() - Features::FOLD_CONSTANTS)
        .parse("50%")
        .unwrap();
    assert_matches!(
        expr.root(),
        Expr::Binary { op: BinaryOp::Mul, rhs, sealed: true, .. }
            if matches!(**rhs, Expr::Constant(value) if value == 0.01)
    );
}

#[test]
fn comparisons_tolerate_rounding() {
    assert_eq!(eval("1.00000000001 = 1"), 1.0);
    assert_eq!(eval("1.1 = 1"), 0.0);
    assert_eq!(eval("0.1 + 0.2 = 0.3"), 1.0);
    assert_eq!(eval("0.1 + 0.2 != 0.3"), 0.0);
    assert_eq!(eval("1.00000000001 > 1"), 0.0);
}

#[test]
fn absolute_value_bars() {
    assert_eq!(eval("|2 - 5|"), 3.0);
    assert_eq!(eval("|-3| * 2"), 6.0);
    assert_eq!(eval("|1 - |2 - 7| |"), 4.0);
}

#[test]
fn function_calls() {
    assert_eq!(eval("max(2, 3) + min(2, 3)"), 5.0);
    assert_eq!(eval("avg(1, 2, 3, 6)"), 3.0);
    assert!(eval("avg()").is_nan());
    assert_eq!(eval("sqrt(pow(3, 2) + 16)"), 5.0);
    assert_eq!(eval("floor(2.7) + ceil(2.1)"), 5.0);
    assert_close(eval("sin(pi / 2)"), 1.0);
    assert_close(eval("ln(euler)"), 1.0);
}

#[test]
fn function_arity_is_checked() {
    let err = parse("pow(2)").unwrap_err();
    assert_eq!(err.len(), 1);
    let err = err.first();
    assert_matches!(
        err.kind(),
        ErrorKind::ArgsLenMismatch { function, expected: 2, actual: 1 } if function == "pow"
    );
    assert_eq!(err.kind().category(), ErrorCategory::Syntax);
    assert_eq!(err.snippet(), "pow");
    assert!(err.to_string().contains("expects 2 argument(s), found 1"), "{err}");

    let err = parse("sin()").unwrap_err();
    assert_matches!(
        err.first().kind(),
        ErrorKind::ArgsLenMismatch { expected: 1, actual: 0, .. }
    );
}

#[test]
fn unknown_function() {
    let err = parse("1 + foo(2, x)").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnknownFunction(name) if name == "foo");
    assert_eq!(err.first().span().location_offset(), 4);
}

#[test]
fn if_evaluates_only_selected_branch() {
    assert_eq!(eval("if(1, 5, 1/0)"), 5.0);
    assert_eq!(eval("if(2 < 1, 5, 6)"), 6.0);

    let expr = parse("if(1, 5, x)").unwrap();
    assert_eq!(expr.variable_names(), ["x"]);
    assert_eq!(expr.evaluate(&Scope::new()).unwrap(), 5.0);
}

#[test]
fn errors_are_collected() {
    let err = parse("1 + # 2 )").unwrap_err();
    let kinds: Vec<_> = err.iter().map(|err| err.kind().clone()).collect();
    assert_eq!(kinds, [ErrorKind::UnexpectedChar, ErrorKind::Leftovers]);
    let offsets: Vec<_> = err.iter().map(|err| err.span().location_offset()).collect();
    assert_eq!(offsets, [4, 8]);

    let err = parse("(1 + 2").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnexpectedEnd { expected: "`)`" });

    let err = parse("1 +").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnexpectedEnd { .. });
    let err = parse("").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnexpectedEnd { .. });

    let err = parse("2 * , 3").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnexpectedToken { .. });
    assert_eq!(err.first().snippet(), ",");
}

#[test]
fn errors_on_multiple_lines() {
    let err = parse("1 +\n  2 $").unwrap_err();
    let err = err.first();
    assert_eq!(err.span().location_line(), 2);
    assert_eq!(err.span().get_column(), 5);
    assert!(err.to_string().starts_with("2:5: "), "{err}");
}

#[test]
fn nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
    let err = parse(&deep).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_matches!(err.first().kind(), ErrorKind::NestingTooDeep { limit: 512 });

    let parser = Parser::new().max_depth(20);
    assert!(parser.parse("(1 + 2) * 3").is_ok());
    let err = parser.parse("((((1))))").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::NestingTooDeep { limit: 20 });
}

#[test]
fn constant_folding() {
    let expr = parse("a + 2 + 3").unwrap();
    assert_matches!(
        expr.root(),
        Expr::Binary { op: BinaryOp::Add, lhs, rhs, .. }
            if matches!(**lhs, Expr::Constant(value) if value == 5.0)
                && matches!(**rhs, Expr::Variable(ref name) if name == "a")
    );

    let expr = parse("2 * a * 3 * b").unwrap();
    assert_eq!(expr.to_string(), "6 * a * b");
    let expr = parse("sqrt(16) + a").unwrap();
    assert_eq!(expr.to_string(), "4 + a");
    let expr = parse("rnd(1) + 1").unwrap();
    assert_matches!(expr.root(), Expr::Binary { .. });

    let expr = Parser::new()
        .with_features(Features::all() - Features::FOLD_CONSTANTS)
        .parse("2 + 3")
        .unwrap();
    assert_matches!(expr.root(), Expr::Binary { op: BinaryOp::Add, .. });
    assert_eq!(expr.evaluate(Scope::root()).unwrap(), 5.0);
}

#[test]
fn disabled_features() {
    let cases = [
        (Features::QUANTIFIERS, "1k", "k"),
        (Features::PERCENT, "50%", "%"),
        (Features::ABS_BARS, "|x|", "|"),
    ];
    for (feature, text, snippet) in cases {
        let parser = Parser::new().with_features(Features::all() - feature);
        let err = parser.parse(text).unwrap_err();
        assert_matches!(err.first().kind(), ErrorKind::DisabledFeature(_));
        assert_eq!(err.first().snippet(), snippet);
        assert!(Parser::new().parse(text).is_ok(), "{text}");
    }

    let parser = Parser::new().with_features(Features::empty());
    assert_eq!(
        parser.parse("7 % 2").unwrap().evaluate(Scope::root()).unwrap(),
        1.0
    );
}

#[test]
fn variable_names_are_distinct() {
    let expr = parse("b * a + b - c / a").unwrap();
    assert_eq!(expr.variable_names(), ["b", "a", "c"]);

    let expr = parse("2 * pi").unwrap();
    assert_eq!(expr.variable_names(), ["pi"]);
    assert_close(
        expr.evaluate(&Scope::new()).unwrap(),
        2.0 * core::f64::consts::PI,
    );
}

#[test]
fn custom_functions() {
    let mut functions = Functions::new();
    functions.register(Function::binary("hypot", f64::hypot));
    let parser = Parser::new().with_functions(&functions);

    let expr = parser.parse("hypot(3, 4) + x").unwrap();
    assert_eq!(expr.to_string(), "5 + x");
    let err = parser.parse("sin(x)").unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::UnknownFunction(_));
}

#[test]
fn display_roundtrip() {
    for text in ["(a + b) * c", "a - b - c", "a - (b - c)", "a ^ b * c", "max(a, |b|) / 2"] {
        let expr = parse(text).unwrap();
        let reparsed = parse(&expr.to_string()).unwrap();
        assert_eq!(reparsed.to_string(), expr.to_string(), "{text}");
    }
}
