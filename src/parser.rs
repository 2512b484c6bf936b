use std::rc::Rc;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::ast::*;
use crate::lexer::*;

/// Recursive-descent parser for the domain declaration language.
///
/// ```text
/// domain Extended : HttpMethod (extend, allow_aliases = false) {
///     _ignore_ = "draft"
///     PATCH = "PATCH"
/// }
/// ```
#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
        })
    }

    fn token_text(&self) -> &str {
        self.tok.1.text()
    }

    fn next_token(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.tok.0 == TokenKind::Symbol && self.token_text() == text
            || self.tok.0 == TokenKind::Ident && self.token_text() == text
        {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.tok.1.error(&msg))
        }
    }

    fn at_symbol(&self, text: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.token_text() == text
    }

    fn parse_ident(&mut self, context: &str) -> Result<(Rc<str>, Span)> {
        if self.tok.0 != TokenKind::Ident {
            bail!(self.tok.1.error(&format!("expecting identifier {context}")));
        }
        let span = self.tok.1.clone();
        let name: Rc<str> = span.text().into();
        self.next_token()?;
        Ok((name, span))
    }

    fn parse_bool(&mut self, context: &str) -> Result<bool> {
        let value = match (&self.tok.0, self.token_text()) {
            (TokenKind::Ident, "true") => true,
            (TokenKind::Ident, "false") => false,
            _ => bail!(self
                .tok
                .1
                .error(&format!("expecting `true` or `false` {context}"))),
        };
        self.next_token()?;
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Expr> {
        let span = self.tok.1.clone();
        let text = span.text();
        let expr = if text.contains('.') {
            match f64::from_str(text) {
                Ok(value) => Expr::Float { span: span.clone(), value },
                Err(_) => bail!(span.error("invalid float literal")),
            }
        } else {
            match i64::from_str(text) {
                Ok(value) => Expr::Int { span: span.clone(), value },
                Err(_) => bail!(span.error("integer literal out of range")),
            }
        };
        self.next_token()?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.tok.0 {
            TokenKind::String => {
                let span = self.tok.1.clone();
                let value: Rc<str> = unescape_string(span.text())
                    .map_err(|e| span.error(&e.to_string()))?
                    .into();
                self.next_token()?;
                Ok(Expr::String { span, value })
            }
            TokenKind::ByteString => {
                let span = self.tok.1.clone();
                let value: Rc<[u8]> = unescape_bytes(span.text())
                    .map_err(|e| span.error(&e.to_string()))?
                    .into();
                self.next_token()?;
                Ok(Expr::Bytes { span, value })
            }
            TokenKind::Number => self.parse_number(),
            TokenKind::Ident => {
                let span = self.tok.1.clone();
                let expr = match span.text() {
                    "true" => Expr::Bool { span, value: true },
                    "false" => Expr::Bool { span, value: false },
                    "null" => Expr::Null { span },
                    _ => Expr::Var { span },
                };
                self.next_token()?;
                Ok(expr)
            }
            TokenKind::Symbol if self.token_text() == "[" => self.parse_list(),
            _ => bail!(self.tok.1.error("expecting a value expression")),
        }
    }

    fn parse_list(&mut self) -> Result<Expr> {
        let span = self.tok.1.clone();
        self.next_token()?;
        let mut items = vec![];
        if !self.at_symbol("]") {
            loop {
                items.push(self.parse_expr()?);
                if self.at_symbol(",") {
                    self.next_token()?;
                    // Allow a trailing comma.
                    if self.at_symbol("]") {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect("]", "to close list")?;
        Ok(Expr::List { span, items })
    }

    fn parse_options(&mut self, options: &mut DeclOptions) -> Result<()> {
        self.next_token()?;
        loop {
            let (name, span) = self.parse_ident("in declaration options")?;
            match name.as_ref() {
                "extend" => {
                    options.extend = if self.at_symbol("=") {
                        self.next_token()?;
                        self.parse_bool("for `extend`")?
                    } else {
                        true
                    };
                }
                "allow_aliases" => {
                    options.allow_aliases = Some(if self.at_symbol("=") {
                        self.next_token()?;
                        self.parse_bool("for `allow_aliases`")?
                    } else {
                        true
                    });
                }
                "callable" => {
                    options.callable_as_validator = Some(if self.at_symbol("=") {
                        self.next_token()?;
                        self.parse_bool("for `callable`")?
                    } else {
                        true
                    });
                }
                _ => bail!(span.error(&format!("unknown declaration option `{name}`"))),
            }
            if self.at_symbol(",") {
                self.next_token()?;
            } else {
                break;
            }
        }
        self.expect(")", "to close declaration options")
    }

    fn parse_decl(&mut self, module: &Rc<str>) -> Result<DomainDecl> {
        let span = self.tok.1.clone();
        self.expect("domain", "to start a declaration")?;
        let (name, _) = self.parse_ident("as the domain name")?;

        let mut parents = vec![];
        if self.at_symbol(":") {
            self.next_token()?;
            loop {
                parents.push(self.parse_ident("as a parent domain name")?);
                if self.at_symbol(",") {
                    self.next_token()?;
                } else {
                    break;
                }
            }
        }

        let mut options = DeclOptions::default();
        if self.at_symbol("(") {
            self.parse_options(&mut options)?;
        }

        self.expect("{", "to open the declaration body")?;
        let mut ignore = None;
        let mut members = vec![];
        while !self.at_symbol("}") {
            let (member, member_span) = self.parse_ident("as a member name")?;
            self.expect("=", "after member name")?;
            let value = self.parse_expr()?;

            // Names starting with `_` are never members. `_ignore_` is the
            // ignore directive; any other private assignment is discarded.
            if member.as_ref() == "_ignore_" {
                ignore = Some(value);
            } else if !member.starts_with('_') {
                members.push(MemberStmt {
                    span: member_span,
                    name: member,
                    value,
                });
            }
        }
        self.expect("}", "to close the declaration body")?;

        Ok(DomainDecl {
            span,
            module: module.clone(),
            name,
            parents,
            options,
            ignore,
            members,
        })
    }

    /// Parse every declaration in the source, attributing them to `module`.
    pub fn parse_module(&mut self, module: &str) -> Result<Vec<DomainDecl>> {
        let module: Rc<str> = module.into();
        let mut decls = vec![];
        while self.tok.0 != TokenKind::Eof {
            decls.push(self.parse_decl(&module)?);
        }
        Ok(decls)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<DomainDecl>> {
        let source = Source::from_contents("test.ld".to_string(), text.to_string())?;
        Parser::new(&source)?.parse_module("test")
    }

    #[test]
    fn parses_members_options_and_parent() -> Result<()> {
        let decls = parse(
            r#"
            domain HttpMethod (callable) {
                GET = "GET"
                POST = "POST"
            }

            domain Extended : HttpMethod (extend, allow_aliases = false) {
                _ignore_ = "draft"
                _private = "skipped"
                PATCH = "PATCH"
                CODE = 204
                FLAG = true
                NOTHING = null
                RAW = b"\x01"
            }
            "#,
        )?;
        assert_eq!(decls.len(), 2);

        let first = &decls[0];
        assert_eq!(first.ident().as_ref(), "test::HttpMethod");
        assert_eq!(first.options.callable_as_validator, Some(true));
        assert_eq!(first.members.len(), 2);

        let second = &decls[1];
        assert_eq!(second.parents.len(), 1);
        assert_eq!(second.parents[0].0.as_ref(), "HttpMethod");
        assert!(second.options.extend);
        assert_eq!(second.options.allow_aliases, Some(false));
        assert!(second.ignore.is_some());
        // `_private` is dropped; five member statements remain.
        assert_eq!(second.members.len(), 5);
        assert!(matches!(second.members[1].value, Expr::Int { value: 204, .. }));
        assert!(matches!(second.members[2].value, Expr::Bool { value: true, .. }));
        assert!(matches!(second.members[3].value, Expr::Null { .. }));
        assert!(matches!(second.members[4].value, Expr::Bytes { .. }));
        Ok(())
    }

    #[test]
    fn parses_dynamic_and_list_exprs() -> Result<()> {
        let decls = parse("domain D { A = other_name B = [1, 2] }")?;
        let members = &decls[0].members;
        assert!(matches!(members[0].value, Expr::Var { .. }));
        assert!(members[0].value.to_value().is_none());
        assert!(matches!(members[1].value, Expr::List { .. }));
        assert!(members[1].value.to_value().is_some());
        Ok(())
    }

    #[test]
    fn multi_parent_syntax_is_accepted() -> Result<()> {
        let decls = parse("domain D : A, B { }")?;
        assert_eq!(decls[0].parents.len(), 2);
        Ok(())
    }

    #[test]
    fn error_messages_point_at_the_offender() {
        let err = parse("domain D { A }").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("expecting `=` after member name"), "{msg}");
        assert!(msg.contains("test.ld:1:"), "{msg}");

        let err = parse("domain D (frozen) { }").unwrap_err();
        assert!(format!("{err}").contains("unknown declaration option `frozen`"));
    }

    #[test]
    fn negative_numbers_and_floats() -> Result<()> {
        let decls = parse("domain D { A = -40 B = 0.5 }")?;
        assert!(matches!(decls[0].members[0].value, Expr::Int { value: -40, .. }));
        assert!(matches!(decls[0].members[1].value, Expr::Float { .. }));
        Ok(())
    }
}
