//! Template expression grammar.
//!
//! Directive values, interpolations and handler bodies are JavaScript. oxc
//! parses them; [`lower`] copies the result into the owned [`Expr`] tree:
//! literals (including template and regex literals), member access,
//! optional chaining, calls, `new`, unary/binary/logical operators,
//! conditionals, assignments, updates, arrow and function expressions, plus
//! the statements handler bodies need (`if`, `return`, declarations,
//! `throw`).
//!
//! The runtime evaluates this tree; it outlives the oxc arena it came from.

pub mod ast;
mod lower;

pub use ast::*;

use lower::{parse_program, Lower};
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;

/// A syntax error, or syntax the evaluator does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: std::string::String,
}

impl ParseError {
    pub fn new(message: impl Into<std::string::String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a single (possibly comma) expression spanning the whole input.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let wrapped = format!("return {}", source.trim());
    let allocator = Allocator::default();
    let program = parse_program(&allocator, &wrapped)?;
    let lower = Lower::new(&wrapped);
    match (program.directives.is_empty(), program.body.first(), program.body.len()) {
        (true, Some(Statement::ReturnStatement(ret)), 1) => match &ret.argument {
            Some(argument) => lower.expr(argument),
            None => Err(ParseError::new("Unexpected end of input")),
        },
        _ => Err(ParseError::new(format!("Unexpected token after expression: {}", source.trim()))),
    }
}

/// Parse a statement list, as found in a function body.
pub fn parse_statements(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source)?;
    Lower::new(source).body(&program.directives, &program.body)
}

/// Parse a bare parameter list (`item, index` or `{ row }`).
pub fn parse_params(source: &str) -> Result<Vec<Pattern>, ParseError> {
    let wrapped = format!("function _({}) {{}}", source);
    let allocator = Allocator::default();
    let program = parse_program(&allocator, &wrapped)?;
    match (program.body.first(), program.body.len()) {
        (Some(Statement::FunctionDeclaration(f)), 1)
            if f.body.as_ref().is_some_and(|b| b.statements.is_empty()) =>
        {
            Lower::new(&wrapped).params(&f.params)
        }
        _ => Err(ParseError::new(format!("Invalid parameter list: {}", source))),
    }
}

/// Parse one binding target (`item`, `{ a, b }`, `[x, y]`), no default.
pub fn parse_binding(source: &str) -> Result<Pattern, ParseError> {
    let wrapped = format!("var {}=_", source);
    let allocator = Allocator::default();
    let program = parse_program(&allocator, &wrapped)?;
    if let (Some(Statement::VariableDeclaration(decl)), 1) = (program.body.first(), program.body.len()) {
        if let [declarator] = &decl.declarations[..] {
            return Lower::new(&wrapped).pattern(&declarator.id);
        }
    }
    Err(ParseError::new(format!("Invalid binding: {}", source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.into()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let Expr::Binary { op, right, .. } = parse_expression("2 ** 3 ** 2").unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Exp);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Exp, .. }));
    }

    #[test]
    fn test_member_call_chain() {
        let expr = parse_expression("a.b?.[c](d, ...e)").unwrap();
        let Expr::Call { callee, args, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1], Expr::Spread(_)));
        assert!(matches!(*callee, Expr::Member { optional: true, .. }));
    }

    #[test]
    fn test_keyword_property_names() {
        assert!(parse_expression("a.delete + { if: 1 }.if").is_ok());
        assert!(parse_expression("delete").is_err());
    }

    #[test]
    fn test_arrow_functions() {
        let expr = parse_expression("(a, { b = 1 }) => a + b").unwrap();
        let Expr::Function { params, arrow, .. } = expr else {
            panic!("expected function");
        };
        assert!(arrow);
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].bound_names(), ["b"]);

        assert!(matches!(
            parse_expression("x => { x++ }").unwrap(),
            Expr::Function { body: FunctionBody::Block(_), .. }
        ));
        // plain parenthesized expression still parses
        assert!(matches!(parse_expression("(a, b)").unwrap(), Expr::Sequence(_)));
    }

    #[test]
    fn test_assignment_targets() {
        assert!(parse_expression("a.b[c] = 1").is_ok());
        assert!(parse_expression("count += 2").is_ok());
        assert!(parse_expression("a + b = c").is_err());
        assert!(parse_expression("a() ++").is_err());
    }

    #[test]
    fn test_statements_with_asi() {
        let body = parse_statements("count++; go(1)\nreturn done").unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(body[2], Stmt::Return(Some(_))));
        assert!(parse_statements("a b").is_err());
    }

    #[test]
    fn test_return_prefix_validates_expression() {
        assert!(parse_statements("return a; b").is_ok());
        assert!(parse_statements("return foo(").is_err());
        assert!(parse_statements("return if").is_err());
    }

    #[test]
    fn test_template_literal_substitutions() {
        let Expr::Template { quasis, exprs } = parse_expression("`a${b + 1}c`").unwrap() else {
            panic!("expected template");
        };
        assert_eq!(quasis.len(), 2);
        assert!(matches!(exprs[0], Expr::Binary { .. }));
        assert!(parse_expression("`${a b}`").is_err());
    }

    #[test]
    fn test_params_and_bindings() {
        let params = parse_params("item, index").unwrap();
        assert_eq!(params.len(), 2);
        assert!(parse_params("").unwrap().is_empty());
        assert!(parse_params("{ a, b: [c] }, ...rest").is_ok());
        assert!(parse_params("a b").is_err());

        assert_eq!(
            parse_binding("{ a, b: { c } }").unwrap().bound_names(),
            ["a", "c"]
        );
        assert!(parse_binding("foo-bar").is_err());
        assert!(parse_binding("if").is_err());
    }

    #[test]
    fn test_object_literal_forms() {
        let Expr::Object(props) = parse_expression("{ a, 'b-c': 1, [d]: 2, ...e, f() {} }").unwrap()
        else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 5);
        assert!(parse_expression("{ if }").is_err());
    }

    #[test]
    fn test_whole_input_is_one_expression() {
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("a; b").is_err());
        assert!(parse_expression("").is_err());
        assert!(parse_expression("  a  ").is_ok());
    }

    #[test]
    fn test_string_statement_is_kept() {
        assert_eq!(
            parse_statements("'hi'").unwrap(),
            [Stmt::Expr(Expr::String("hi".into()))]
        );
    }

    #[test]
    fn test_regex_literal() {
        assert_eq!(
            parse_expression("/a+b/gi").unwrap(),
            Expr::Regex {
                pattern: "a+b".into(),
                flags: "gi".into(),
            }
        );
    }

    #[test]
    fn test_unsupported_syntax_is_an_error() {
        let err = parse_expression("class {}").unwrap_err();
        assert!(err.message.starts_with("Unsupported syntax in template expression: class"));
        assert!(parse_expression("[a, b] = c").is_err());
        assert!(parse_statements("for (;;) {}").is_err());
        assert!(parse_expression("async () => 1").is_err());
    }

    #[test]
    fn test_params_reject_trailing_body() {
        assert!(parse_params("a) { return 1 } function f(b").is_err());
    }
}
