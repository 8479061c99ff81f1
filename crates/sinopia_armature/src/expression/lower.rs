//! Lowering from the oxc syntax tree into [`Expr`]/[`Stmt`]/[`Pattern`].
//!
//! oxc owns the grammar; this module only copies out the subset the
//! runtime evaluates. Anything outside it (classes, generators, `async`,
//! destructuring assignment, loops, ...) is a [`ParseError`] naming the
//! offending source text.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    self as js, Argument, ArrayExpressionElement, AssignmentOperator, AssignmentTarget,
    BinaryOperator, BindingPattern, ChainElement, Expression, FormalParameters, LogicalOperator,
    ObjectPropertyKind, PropertyKind, SimpleAssignmentTarget, Statement, UnaryOperator,
    UpdateOperator, VariableDeclarationKind,
};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{GetSpan, SourceType, Span};
use sinopia_carton::{format_compact, String};

use super::ast::*;
use super::ParseError;

/// Parse `source` as a sloppy-mode script body where `return` is allowed.
pub(super) fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
) -> Result<js::Program<'a>, ParseError> {
    let ret = Parser::new(allocator, source, SourceType::cjs())
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            preserve_parens: false,
            ..ParseOptions::default()
        })
        .parse();
    match ret.errors.first() {
        Some(error) => Err(ParseError::new(error.to_string())),
        None => Ok(ret.program),
    }
}

fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e21 {
        format_compact!("{}", n as i64)
    } else {
        format_compact!("{}", n)
    }
}

pub(super) struct Lower<'s> {
    source: &'s str,
}

impl<'s> Lower<'s> {
    pub(super) fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn unsupported(&self, span: Span) -> ParseError {
        ParseError::new(format!(
            "Unsupported syntax in template expression: {}",
            span.source_text(self.source)
        ))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub(super) fn body(
        &self,
        directives: &[js::Directive<'_>],
        statements: &[Statement<'_>],
    ) -> Result<Vec<Stmt>, ParseError> {
        // a lone string statement comes back as a directive prologue
        let mut out: Vec<Stmt> = directives
            .iter()
            .map(|d| Stmt::Expr(Expr::String(d.expression.value.as_str().into())))
            .collect();
        for statement in statements {
            out.push(self.stmt(statement)?);
        }
        Ok(out)
    }

    fn stmt(&self, statement: &Statement<'_>) -> Result<Stmt, ParseError> {
        Ok(match statement {
            Statement::ExpressionStatement(s) => Stmt::Expr(self.expr(&s.expression)?),
            Statement::ReturnStatement(s) => Stmt::Return(match &s.argument {
                Some(argument) => Some(self.expr(argument)?),
                None => None,
            }),
            Statement::IfStatement(s) => Stmt::If {
                test: self.expr(&s.test)?,
                consequent: Box::new(self.stmt(&s.consequent)?),
                alternate: match &s.alternate {
                    Some(alternate) => Some(Box::new(self.stmt(alternate)?)),
                    None => None,
                },
            },
            Statement::BlockStatement(s) => Stmt::Block(self.body(&[], &s.body)?),
            Statement::ThrowStatement(s) => Stmt::Throw(self.expr(&s.argument)?),
            Statement::EmptyStatement(_) => Stmt::Empty,
            Statement::VariableDeclaration(decl) => {
                let kind = match decl.kind {
                    VariableDeclarationKind::Var => DeclKind::Var,
                    VariableDeclarationKind::Let => DeclKind::Let,
                    VariableDeclarationKind::Const => DeclKind::Const,
                    _ => return Err(self.unsupported(decl.span)),
                };
                let mut declarations = Vec::with_capacity(decl.declarations.len());
                for declarator in &decl.declarations {
                    let init = match &declarator.init {
                        Some(init) => Some(self.expr(init)?),
                        None => None,
                    };
                    declarations.push((self.pattern(&declarator.id)?, init));
                }
                Stmt::Declare { kind, declarations }
            }
            other => return Err(self.unsupported(other.span())),
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(super) fn expr(&self, expression: &Expression<'_>) -> Result<Expr, ParseError> {
        Ok(match expression {
            Expression::BooleanLiteral(b) => Expr::Bool(b.value),
            Expression::NullLiteral(_) => Expr::Null,
            Expression::NumericLiteral(n) => Expr::Number(n.value),
            Expression::StringLiteral(s) => Expr::String(s.value.as_str().into()),
            Expression::TemplateLiteral(t) => Expr::Template {
                quasis: t
                    .quasis
                    .iter()
                    .map(|q| {
                        let cooked = q.value.cooked.as_ref().unwrap_or(&q.value.raw);
                        String::from(cooked.as_str())
                    })
                    .collect(),
                exprs: self.exprs(&t.expressions)?,
            },
            Expression::RegExpLiteral(r) => Expr::Regex {
                pattern: r.regex.pattern.text.as_str().into(),
                flags: format_compact!("{}", r.regex.flags),
            },
            Expression::Identifier(id) => Expr::Ident(id.name.as_str().into()),
            Expression::ThisExpression(_) => Expr::This,
            Expression::ParenthesizedExpression(p) => self.expr(&p.expression)?,
            Expression::SequenceExpression(s) => Expr::Sequence(self.exprs(&s.expressions)?),
            Expression::ArrayExpression(a) => {
                let mut elements = Vec::with_capacity(a.elements.len());
                for element in &a.elements {
                    elements.push(match element {
                        ArrayExpressionElement::Elision(_) => None,
                        ArrayExpressionElement::SpreadElement(s) => {
                            Some(Expr::Spread(Box::new(self.expr(&s.argument)?)))
                        }
                        other => match other.as_expression() {
                            Some(e) => Some(self.expr(e)?),
                            None => return Err(self.unsupported(other.span())),
                        },
                    });
                }
                Expr::Array(elements)
            }
            Expression::ObjectExpression(o) => {
                let mut properties = Vec::with_capacity(o.properties.len());
                for property in &o.properties {
                    properties.push(match property {
                        ObjectPropertyKind::SpreadProperty(s) => {
                            Property::Spread(self.expr(&s.argument)?)
                        }
                        ObjectPropertyKind::ObjectProperty(p) => {
                            if p.kind != PropertyKind::Init {
                                return Err(self.unsupported(p.span));
                            }
                            Property::KeyValue {
                                key: self.property_key(&p.key, p.computed)?,
                                value: self.expr(&p.value)?,
                            }
                        }
                    });
                }
                Expr::Object(properties)
            }
            Expression::StaticMemberExpression(m) => Expr::Member {
                object: Box::new(self.expr(&m.object)?),
                property: MemberProperty::Static(m.property.name.as_str().into()),
                optional: m.optional,
            },
            Expression::ComputedMemberExpression(m) => Expr::Member {
                object: Box::new(self.expr(&m.object)?),
                property: MemberProperty::Computed(Box::new(self.expr(&m.expression)?)),
                optional: m.optional,
            },
            Expression::CallExpression(c) => self.call(c)?,
            Expression::ChainExpression(c) => match &c.expression {
                ChainElement::CallExpression(call) => self.call(call)?,
                ChainElement::StaticMemberExpression(m) => Expr::Member {
                    object: Box::new(self.expr(&m.object)?),
                    property: MemberProperty::Static(m.property.name.as_str().into()),
                    optional: m.optional,
                },
                ChainElement::ComputedMemberExpression(m) => Expr::Member {
                    object: Box::new(self.expr(&m.object)?),
                    property: MemberProperty::Computed(Box::new(self.expr(&m.expression)?)),
                    optional: m.optional,
                },
                other => return Err(self.unsupported(other.span())),
            },
            Expression::NewExpression(n) => Expr::New {
                callee: Box::new(self.expr(&n.callee)?),
                args: self.args(&n.arguments)?,
            },
            Expression::UnaryExpression(u) => Expr::Unary {
                op: match u.operator {
                    UnaryOperator::LogicalNot => UnaryOp::Not,
                    UnaryOperator::UnaryNegation => UnaryOp::Minus,
                    UnaryOperator::UnaryPlus => UnaryOp::Plus,
                    UnaryOperator::BitwiseNot => UnaryOp::BitNot,
                    UnaryOperator::Typeof => UnaryOp::TypeOf,
                    UnaryOperator::Void => UnaryOp::Void,
                    UnaryOperator::Delete => UnaryOp::Delete,
                },
                argument: Box::new(self.expr(&u.argument)?),
            },
            Expression::UpdateExpression(u) => Expr::Update {
                op: match u.operator {
                    UpdateOperator::Increment => UpdateOp::Increment,
                    UpdateOperator::Decrement => UpdateOp::Decrement,
                },
                prefix: u.prefix,
                argument: Box::new(self.simple_target(&u.argument)?),
            },
            Expression::BinaryExpression(b) => Expr::Binary {
                op: binary_op(b.operator),
                left: Box::new(self.expr(&b.left)?),
                right: Box::new(self.expr(&b.right)?),
            },
            Expression::LogicalExpression(l) => Expr::Logical {
                op: logical_op(l.operator),
                left: Box::new(self.expr(&l.left)?),
                right: Box::new(self.expr(&l.right)?),
            },
            Expression::ConditionalExpression(c) => Expr::Conditional {
                test: Box::new(self.expr(&c.test)?),
                consequent: Box::new(self.expr(&c.consequent)?),
                alternate: Box::new(self.expr(&c.alternate)?),
            },
            Expression::AssignmentExpression(a) => {
                let target = match &a.left {
                    AssignmentTarget::AssignmentTargetIdentifier(id) => {
                        Expr::Ident(id.name.as_str().into())
                    }
                    other => match other.as_simple_assignment_target() {
                        Some(simple) => self.simple_target(simple)?,
                        None => return Err(self.unsupported(other.span())),
                    },
                };
                Expr::Assign {
                    op: assign_op(a.operator),
                    target: Box::new(target),
                    value: Box::new(self.expr(&a.right)?),
                }
            }
            Expression::ArrowFunctionExpression(f) => {
                if f.r#async {
                    return Err(self.unsupported(f.span));
                }
                let params = self.params(&f.params)?;
                let body = if f.expression {
                    match f.body.statements.first() {
                        Some(Statement::ExpressionStatement(s)) => {
                            FunctionBody::Expr(Box::new(self.expr(&s.expression)?))
                        }
                        _ => return Err(self.unsupported(f.span)),
                    }
                } else {
                    FunctionBody::Block(self.body(&f.body.directives, &f.body.statements)?)
                };
                Expr::Function {
                    params,
                    body,
                    arrow: true,
                }
            }
            Expression::FunctionExpression(f) => self.function(f)?,
            other => return Err(self.unsupported(other.span())),
        })
    }

    fn exprs(&self, expressions: &[Expression<'_>]) -> Result<Vec<Expr>, ParseError> {
        expressions.iter().map(|e| self.expr(e)).collect()
    }

    fn args(&self, arguments: &[Argument<'_>]) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(match argument {
                Argument::SpreadElement(s) => Expr::Spread(Box::new(self.expr(&s.argument)?)),
                other => match other.as_expression() {
                    Some(e) => self.expr(e)?,
                    None => return Err(self.unsupported(other.span())),
                },
            });
        }
        Ok(args)
    }

    fn call(&self, call: &js::CallExpression<'_>) -> Result<Expr, ParseError> {
        Ok(Expr::Call {
            callee: Box::new(self.expr(&call.callee)?),
            args: self.args(&call.arguments)?,
            optional: call.optional,
        })
    }

    fn function(&self, f: &js::Function<'_>) -> Result<Expr, ParseError> {
        if f.r#async || f.generator {
            return Err(self.unsupported(f.span));
        }
        let body = match &f.body {
            Some(body) => self.body(&body.directives, &body.statements)?,
            None => Vec::new(),
        };
        Ok(Expr::Function {
            params: self.params(&f.params)?,
            body: FunctionBody::Block(body),
            arrow: false,
        })
    }

    fn simple_target(&self, target: &SimpleAssignmentTarget<'_>) -> Result<Expr, ParseError> {
        Ok(match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                Expr::Ident(id.name.as_str().into())
            }
            SimpleAssignmentTarget::StaticMemberExpression(m) => Expr::Member {
                object: Box::new(self.expr(&m.object)?),
                property: MemberProperty::Static(m.property.name.as_str().into()),
                optional: false,
            },
            SimpleAssignmentTarget::ComputedMemberExpression(m) => Expr::Member {
                object: Box::new(self.expr(&m.object)?),
                property: MemberProperty::Computed(Box::new(self.expr(&m.expression)?)),
                optional: false,
            },
            other => return Err(self.unsupported(other.span())),
        })
    }

    fn property_key(&self, key: &js::PropertyKey<'_>, computed: bool) -> Result<PropertyKey, ParseError> {
        if computed {
            return match key.as_expression() {
                Some(e) => Ok(PropertyKey::Computed(self.expr(e)?)),
                None => Err(self.unsupported(key.span())),
            };
        }
        Ok(PropertyKey::Static(match key {
            js::PropertyKey::StaticIdentifier(id) => id.name.as_str().into(),
            js::PropertyKey::StringLiteral(s) => s.value.as_str().into(),
            js::PropertyKey::NumericLiteral(n) => number_key(n.value),
            other => return Err(self.unsupported(other.span())),
        }))
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    pub(super) fn params(&self, params: &FormalParameters<'_>) -> Result<Vec<Pattern>, ParseError> {
        let mut out = Vec::with_capacity(params.items.len() + 1);
        for param in &params.items {
            let target = self.pattern(&param.pattern)?;
            out.push(match &param.initializer {
                Some(value) => Pattern::Default {
                    target: Box::new(target),
                    value: Box::new(self.expr(value)?),
                },
                None => target,
            });
        }
        if let Some(rest) = &params.rest {
            out.push(Pattern::Rest(Box::new(self.pattern(&rest.rest.argument)?)));
        }
        Ok(out)
    }

    pub(super) fn pattern(&self, pattern: &BindingPattern<'_>) -> Result<Pattern, ParseError> {
        Ok(match pattern {
            BindingPattern::BindingIdentifier(id) => Pattern::Ident(id.name.as_str().into()),
            BindingPattern::AssignmentPattern(a) => Pattern::Default {
                target: Box::new(self.pattern(&a.left)?),
                value: Box::new(self.expr(&a.right)?),
            },
            BindingPattern::ObjectPattern(o) => {
                let mut properties = Vec::with_capacity(o.properties.len());
                for property in &o.properties {
                    properties.push((
                        self.property_key(&property.key, property.computed)?,
                        self.pattern(&property.value)?,
                    ));
                }
                Pattern::Object {
                    properties,
                    rest: match &o.rest {
                        Some(rest) => Some(Box::new(self.pattern(&rest.argument)?)),
                        None => None,
                    },
                }
            }
            BindingPattern::ArrayPattern(a) => {
                let mut elements = Vec::with_capacity(a.elements.len());
                for element in &a.elements {
                    elements.push(match element {
                        Some(element) => Some(self.pattern(element)?),
                        None => None,
                    });
                }
                Pattern::Array {
                    elements,
                    rest: match &a.rest {
                        Some(rest) => Some(Box::new(self.pattern(&rest.argument)?)),
                        None => None,
                    },
                }
            }
        })
    }
}

fn binary_op(op: BinaryOperator) -> BinaryOp {
    match op {
        BinaryOperator::Addition => BinaryOp::Add,
        BinaryOperator::Subtraction => BinaryOp::Sub,
        BinaryOperator::Multiplication => BinaryOp::Mul,
        BinaryOperator::Division => BinaryOp::Div,
        BinaryOperator::Remainder => BinaryOp::Rem,
        BinaryOperator::Exponential => BinaryOp::Exp,
        BinaryOperator::Equality => BinaryOp::Eq,
        BinaryOperator::Inequality => BinaryOp::NotEq,
        BinaryOperator::StrictEquality => BinaryOp::StrictEq,
        BinaryOperator::StrictInequality => BinaryOp::StrictNotEq,
        BinaryOperator::LessThan => BinaryOp::Lt,
        BinaryOperator::LessEqualThan => BinaryOp::LtEq,
        BinaryOperator::GreaterThan => BinaryOp::Gt,
        BinaryOperator::GreaterEqualThan => BinaryOp::GtEq,
        BinaryOperator::In => BinaryOp::In,
        BinaryOperator::Instanceof => BinaryOp::InstanceOf,
        BinaryOperator::BitwiseAnd => BinaryOp::BitAnd,
        BinaryOperator::BitwiseOR => BinaryOp::BitOr,
        BinaryOperator::BitwiseXOR => BinaryOp::BitXor,
        BinaryOperator::ShiftLeft => BinaryOp::Shl,
        BinaryOperator::ShiftRight => BinaryOp::Shr,
        BinaryOperator::ShiftRightZeroFill => BinaryOp::UShr,
    }
}

fn logical_op(op: LogicalOperator) -> LogicalOp {
    match op {
        LogicalOperator::And => LogicalOp::And,
        LogicalOperator::Or => LogicalOp::Or,
        LogicalOperator::Coalesce => LogicalOp::Nullish,
    }
}

fn assign_op(op: AssignmentOperator) -> AssignOp {
    match op {
        AssignmentOperator::Assign => AssignOp::Assign,
        AssignmentOperator::Addition => AssignOp::Binary(BinaryOp::Add),
        AssignmentOperator::Subtraction => AssignOp::Binary(BinaryOp::Sub),
        AssignmentOperator::Multiplication => AssignOp::Binary(BinaryOp::Mul),
        AssignmentOperator::Division => AssignOp::Binary(BinaryOp::Div),
        AssignmentOperator::Remainder => AssignOp::Binary(BinaryOp::Rem),
        AssignmentOperator::Exponential => AssignOp::Binary(BinaryOp::Exp),
        AssignmentOperator::ShiftLeft => AssignOp::Binary(BinaryOp::Shl),
        AssignmentOperator::ShiftRight => AssignOp::Binary(BinaryOp::Shr),
        AssignmentOperator::ShiftRightZeroFill => AssignOp::Binary(BinaryOp::UShr),
        AssignmentOperator::BitwiseOR => AssignOp::Binary(BinaryOp::BitOr),
        AssignmentOperator::BitwiseXOR => AssignOp::Binary(BinaryOp::BitXor),
        AssignmentOperator::BitwiseAnd => AssignOp::Binary(BinaryOp::BitAnd),
        AssignmentOperator::LogicalOr => AssignOp::Logical(LogicalOp::Or),
        AssignmentOperator::LogicalAnd => AssignOp::Logical(LogicalOp::And),
        AssignmentOperator::LogicalNullish => AssignOp::Logical(LogicalOp::Nullish),
    }
}
