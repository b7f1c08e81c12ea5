//! Logic for parsing raw Jack code into an AST.
//!
//! The grammar is handled in a single combinator tower; tokens take
//! care of surrounding whitespace and comments themselves, so no
//! separate token stream is materialized.

#[allow(clippy::wildcard_imports)]
use crate::common::ast::*;
use chumsky::prelude::*;

use crate::fileio::input::SourceFile;

pub type JackParseError = Simple<char>;

/// Parse a single class (source file).
pub fn parse_class(source_file: &SourceFile) -> Result<Class, Vec<JackParseError>> {
    parser().parse(source_file.content())
}

/// Whitespace, `// ...` line comments and `/* ... */` range comments
/// (including the `/** ... */ ` documentation form).
fn whitespace() -> impl Parser<char, (), Error = JackParseError> + Clone {
    let line_comment = just("//")
        .then(take_until(text::newline().or(end())))
        .ignored();
    let range_comment = just("/*").then(take_until(just("*/"))).ignored();

    filter(|c: &char| c.is_whitespace())
        .ignored()
        .or(line_comment)
        .or(range_comment)
        .repeated()
        .ignored()
}

/// `name(args)` or `receiver.name(args)`.
fn subroutine_call(
    expression: impl Parser<char, Expression, Error = JackParseError> + Clone,
) -> impl Parser<char, SubroutineCall, Error = JackParseError> + Clone {
    let ws = whitespace();
    let identifier = text::ident().padded_by(ws.clone());

    identifier
        .clone()
        .then(
            just('.')
                .padded_by(ws.clone())
                .ignore_then(identifier)
                .or_not(),
        )
        .then(
            expression
                .separated_by(just(',').padded_by(ws.clone()))
                .delimited_by(just('(').padded_by(ws.clone()), just(')').padded_by(ws)),
        )
        .map(|((first, second), arguments)| match second {
            Some(name) => SubroutineCall {
                receiver: Some(first),
                name,
                arguments,
            },
            None => SubroutineCall {
                receiver: None,
                name: first,
                arguments,
            },
        })
}

/// Construct the parser for a Jack class (file).
#[allow(clippy::too_many_lines)]
fn parser() -> impl Parser<char, Class, Error = JackParseError> {
    let ws = whitespace();

    let sym = |c: char| just(c).padded_by(ws.clone());
    let word = |kw: &'static str| text::keyword(kw).padded_by(ws.clone());

    let identifier = text::ident().padded_by(ws.clone());

    let integer = text::int(10).padded_by(ws.clone()).try_map(|s: String, span| {
        s.parse::<u16>()
            .ok()
            .filter(|&n| n <= 32767)
            .ok_or_else(|| Simple::custom(span, "integer constant out of range"))
    });

    let string = just('"')
        .ignore_then(filter(|c: &char| *c != '"' && *c != '\n').repeated())
        .then_ignore(just('"'))
        .map(|chars| chars.into_iter().collect::<String>())
        .padded_by(ws.clone());

    let ty = choice((
        word("int").to(Type::Int),
        word("char").to(Type::Char),
        word("boolean").to(Type::Boolean),
        identifier.clone().map(Type::Class),
    ));

    let expression = recursive(|expression| {
        let call = subroutine_call(expression.clone());

        let term = recursive(|term| {
            let keyword_constant = choice((
                word("true").to(KeywordConstant::True),
                word("false").to(KeywordConstant::False),
                word("null").to(KeywordConstant::Null),
                word("this").to(KeywordConstant::This),
            ))
            .map(Term::KeywordConstant);

            let indexed = identifier
                .clone()
                .then(expression.clone().delimited_by(sym('['), sym(']')))
                .map(|(name, index)| Term::IndexedVariable(name, Box::new(index)));

            let parenthesized = expression
                .clone()
                .delimited_by(sym('('), sym(')'))
                .map(|inner| Term::Parenthesized(Box::new(inner)));

            let unary = one_of("-~")
                .padded_by(ws.clone())
                .then(term)
                .map(|(op, operand)| {
                    let op = if op == '-' { UnaryOp::Neg } else { UnaryOp::Not };
                    Term::Unary(op, Box::new(operand))
                });

            // order matters: a call or an indexed read starts with the
            // same identifier a plain variable does
            choice((
                integer.clone().map(Term::IntegerConstant),
                string.clone().map(Term::StringConstant),
                keyword_constant,
                call.clone().map(Term::Call),
                indexed,
                identifier.clone().map(Term::Variable),
                parenthesized,
                unary,
            ))
        });

        let binary_op = one_of("+-*/&|<>=").padded_by(ws.clone()).map(|c| match c {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            '/' => BinaryOp::Div,
            '&' => BinaryOp::And,
            '|' => BinaryOp::Or,
            '<' => BinaryOp::Lt,
            '>' => BinaryOp::Gt,
            _ => BinaryOp::Eq,
        });

        term.clone()
            .then(binary_op.then(term).repeated())
            .map(|(term, tail)| Expression { term, tail })
    });

    let statement = recursive(|statement| {
        let block = statement.repeated().delimited_by(sym('{'), sym('}'));

        let let_statement = word("let")
            .ignore_then(identifier.clone())
            .then(
                expression
                    .clone()
                    .delimited_by(sym('['), sym(']'))
                    .or_not(),
            )
            .then_ignore(sym('='))
            .then(expression.clone())
            .then_ignore(sym(';'))
            .map(|((variable, index), value)| {
                Statement::Let(LetStatement {
                    variable,
                    index,
                    value,
                })
            });

        let if_statement = word("if")
            .ignore_then(expression.clone().delimited_by(sym('('), sym(')')))
            .then(block.clone())
            .then(word("else").ignore_then(block.clone()).or_not())
            .map(|((condition, then_branch), else_branch)| {
                Statement::If(IfStatement {
                    condition,
                    then_branch,
                    else_branch: else_branch.unwrap_or_default(),
                })
            });

        let while_statement = word("while")
            .ignore_then(expression.clone().delimited_by(sym('('), sym(')')))
            .then(block)
            .map(|(condition, body)| Statement::While(WhileStatement { condition, body }));

        let do_statement = word("do")
            .ignore_then(subroutine_call(expression.clone()))
            .then_ignore(sym(';'))
            .map(|call| Statement::Do(DoStatement { call }));

        let return_statement = word("return")
            .ignore_then(expression.clone().or_not())
            .then_ignore(sym(';'))
            .map(|value| Statement::Return(ReturnStatement { value }));

        choice((
            let_statement,
            if_statement,
            while_statement,
            do_statement,
            return_statement,
        ))
    });

    let names = identifier.clone().separated_by(sym(',')).at_least(1);

    let class_var_dec = choice((
        word("static").to(ClassVarKind::Static),
        word("field").to(ClassVarKind::Field),
    ))
    .then(ty.clone())
    .then(names.clone())
    .then_ignore(sym(';'))
    .map(|((kind, ty), names)| ClassVarDec { kind, ty, names });

    let var_dec = word("var")
        .ignore_then(ty.clone())
        .then(names)
        .then_ignore(sym(';'))
        .map(|(ty, names)| VarDec { ty, names });

    let parameters = ty
        .clone()
        .then(identifier.clone())
        .map(|(ty, name)| Parameter { ty, name })
        .separated_by(sym(','));

    let return_type = word("void").to(None).or(ty.map(Some));

    let subroutine_dec = choice((
        word("constructor").to(SubroutineKind::Constructor),
        word("function").to(SubroutineKind::Function),
        word("method").to(SubroutineKind::Method),
    ))
    .then(return_type)
    .then(identifier.clone())
    .then(parameters.delimited_by(sym('('), sym(')')))
    .then(
        var_dec
            .repeated()
            .then(statement.repeated())
            .delimited_by(sym('{'), sym('}')),
    )
    .map(
        |((((kind, return_type), name), parameters), (var_decs, statements))| SubroutineDec {
            kind,
            return_type,
            name,
            parameters,
            body: SubroutineBody {
                var_decs,
                statements,
            },
        },
    );

    word("class")
        .ignore_then(identifier)
        .then(
            class_var_dec
                .repeated()
                .then(subroutine_dec.repeated())
                .delimited_by(sym('{'), sym('}')),
        )
        .then_ignore(end())
        .map(|(name, (var_decs, subroutines))| Class {
            name,
            var_decs,
            subroutines,
        })
}
