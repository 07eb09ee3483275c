//! Entity and body-block parsing (keyword-dispatched).

use super::stmt::{parse_block_until, parse_declaration};
use super::{expr, types, ParseError, TokenStream};
use nestml_ast::*;
use nestml_lexer::Token;

/// Parse every entity in the stream, recovering at the next entity keyword
/// after an error.
pub(super) fn parse_entities(stream: &mut TokenStream) -> (Vec<Entity>, Vec<ParseError>) {
    let mut entities = Vec::new();
    let mut errors = Vec::new();

    while !stream.at_end() {
        match parse_entity(stream) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                errors.push(e);
                // Always make progress before resynchronizing.
                stream.advance();
                stream.synchronize();
            }
        }
    }

    (entities, errors)
}

fn parse_entity(stream: &mut TokenStream) -> Result<Entity, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    let kind = match stream.advance() {
        Some(Token::Neuron) => EntityKind::Neuron,
        Some(Token::Component) => EntityKind::Component,
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "at top level (expected `neuron` or `component`)",
                span,
            ))
        }
    };

    let name = parse_ident(stream, "as entity name")?;
    stream.expect(Token::Colon)?;

    let mut body = Vec::new();
    while !stream.check(&Token::End) {
        body.push(parse_body_element(stream)?);
    }
    stream.expect(Token::End)?;

    let span = stream.span_from(start);
    Ok(Entity {
        id: stream.fresh_id(),
        kind,
        name,
        body,
        span,
    })
}

fn parse_body_element(stream: &mut TokenStream) -> Result<BodyElement, ParseError> {
    match stream.peek() {
        Some(Token::State) => parse_var_block(stream, BlockKind::State).map(BodyElement::Block),
        Some(Token::Parameters) => {
            parse_var_block(stream, BlockKind::Parameters).map(BodyElement::Block)
        }
        Some(Token::Internals) => {
            parse_var_block(stream, BlockKind::Internals).map(BodyElement::Block)
        }
        Some(Token::Equations) => parse_equations(stream).map(BodyElement::Equations),
        Some(Token::Input) => parse_input(stream).map(BodyElement::Input),
        Some(Token::Output) => parse_output(stream).map(BodyElement::Output),
        Some(Token::Update) => parse_update(stream).map(BodyElement::Update),
        Some(Token::Function) => parse_function(stream).map(BodyElement::Function),
        other => Err(ParseError::unexpected_token(
            other,
            "in entity body (expected a block or `function`)",
            stream.current_span(),
        )),
    }
}

/// `state:` / `parameters:` / `internals:` followed by declarations and `end`.
fn parse_var_block(stream: &mut TokenStream, kind: BlockKind) -> Result<VarBlock, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    stream.expect(Token::Colon)?;

    let mut declarations = Vec::new();
    while !stream.check(&Token::End) {
        declarations.push(parse_declaration(stream)?);
    }
    stream.expect(Token::End)?;

    let span = stream.span_from(start);
    Ok(VarBlock {
        id: stream.fresh_id(),
        kind,
        declarations,
        span,
    })
}

fn parse_equations(stream: &mut TokenStream) -> Result<EquationsBlock, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    stream.expect(Token::Colon)?;

    let mut equations = Vec::new();
    while !stream.check(&Token::End) {
        equations.push(parse_equation(stream)?);
    }
    stream.expect(Token::End)?;

    let span = stream.span_from(start);
    Ok(EquationsBlock {
        id: stream.fresh_id(),
        equations,
        span,
    })
}

fn parse_equation(stream: &mut TokenStream) -> Result<Equation, ParseError> {
    let start = stream.current_pos();

    if stream.eat(&Token::Shape) {
        let name = parse_ident(stream, "as shape name")?;
        stream.expect(Token::Eq)?;
        let rhs = expr::parse_expr(stream)?;
        let span = stream.span_from(start);
        return Ok(Equation::Shape(ShapeDef {
            id: stream.fresh_id(),
            name,
            rhs,
            span,
        }));
    }

    let lhs = parse_ident(stream, "as equation left-hand side")?;
    let base = lhs.name.trim_end_matches('\'');
    let order = (lhs.name.len() - base.len()) as u32;
    if order == 0 {
        return Err(ParseError::invalid_syntax(
            format!(
                "equation left-hand side `{}` must be a derivative (e.g. `{}'`)",
                lhs.name, lhs.name
            ),
            lhs.span,
        ));
    }
    let lhs = Ident::new(base, lhs.span);

    stream.expect(Token::Eq)?;
    let rhs = expr::parse_expr(stream)?;
    let span = stream.span_from(start);
    Ok(Equation::Ode(OdeEquation {
        id: stream.fresh_id(),
        lhs,
        order,
        rhs,
        span,
    }))
}

/// `input:` ports `end`.
fn parse_input(stream: &mut TokenStream) -> Result<InputBlock, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    stream.expect(Token::Colon)?;

    let mut ports = Vec::new();
    while !stream.check(&Token::End) {
        ports.push(parse_input_port(stream)?);
    }
    stream.expect(Token::End)?;

    let span = stream.span_from(start);
    Ok(InputBlock {
        id: stream.fresh_id(),
        ports,
        span,
    })
}

fn parse_input_port(stream: &mut TokenStream) -> Result<InputPort, ParseError> {
    let start = stream.current_pos();
    let name = parse_ident(stream, "as input port name")?;

    let ty = if stream.check(&Token::LeftArrow) {
        None
    } else {
        Some(types::parse_type(stream)?)
    };
    stream.expect(Token::LeftArrow)?;

    let mut modifier = None;
    loop {
        if stream.eat(&Token::Inhibitory) {
            modifier = Some(InputModifier::Inhibitory);
        } else if stream.eat(&Token::Excitatory) {
            modifier = Some(InputModifier::Excitatory);
        } else {
            break;
        }
    }

    let signal = parse_signal(stream)?;
    let span = stream.span_from(start);
    Ok(InputPort {
        id: stream.fresh_id(),
        name,
        ty,
        modifier,
        signal,
        span,
    })
}

/// `output: spike`
fn parse_output(stream: &mut TokenStream) -> Result<OutputBlock, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    stream.expect(Token::Colon)?;
    let signal = parse_signal(stream)?;
    let span = stream.span_from(start);
    Ok(OutputBlock {
        id: stream.fresh_id(),
        signal,
        span,
    })
}

fn parse_signal(stream: &mut TokenStream) -> Result<SignalKind, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Spike) => Ok(SignalKind::Spike),
        Some(Token::Current) => Ok(SignalKind::Current),
        other => Err(ParseError::unexpected_token(
            other,
            "(expected `spike` or `current`)",
            span,
        )),
    }
}

/// `update:` statements `end`.
fn parse_update(stream: &mut TokenStream) -> Result<UpdateBlock, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    stream.expect(Token::Colon)?;
    let body = parse_block_until(stream, &[Token::End])?;
    stream.expect(Token::End)?;
    let span = stream.span_from(start);
    Ok(UpdateBlock {
        id: stream.fresh_id(),
        body,
        span,
    })
}

/// `function name(p1 T1, p2 T2) R:` statements `end`.
fn parse_function(stream: &mut TokenStream) -> Result<FunctionDef, ParseError> {
    let start = stream.current_pos();
    stream.advance();
    let name = parse_ident(stream, "as function name")?;

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    while !stream.check(&Token::RParen) {
        let param_start = stream.current_pos();
        let param_name = parse_ident(stream, "as parameter name")?;
        let ty = types::parse_type(stream)?;
        let span = stream.span_from(param_start);
        params.push(Param {
            id: stream.fresh_id(),
            name: param_name,
            ty,
            span,
        });
        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RParen)?;

    let return_type = if stream.check(&Token::Colon) {
        None
    } else {
        Some(types::parse_type(stream)?)
    };
    stream.expect(Token::Colon)?;

    let body = parse_block_until(stream, &[Token::End])?;
    stream.expect(Token::End)?;

    let span = stream.span_from(start);
    Ok(FunctionDef {
        id: stream.fresh_id(),
        name,
        params,
        return_type,
        body,
        span,
    })
}

pub(super) fn parse_ident(stream: &mut TokenStream, context: &str) -> Result<Ident, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(name)) => Ok(Ident::new(name.as_ref(), span)),
        other => Err(ParseError::unexpected_token(other, context, span)),
    }
}
