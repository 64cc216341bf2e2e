//! Fragment parser for generated markup.
//!
//! Only well-formed markup is accepted: every non-void element must be
//! closed, in order. Entities are kept verbatim in text nodes and
//! whitespace-only text between tags is dropped. Comments are skipped.

use thiserror::Error;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "wbr"];

/// Markup could not be parsed into a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// Input ended inside a tag or comment.
    #[error("Unexpected end of markup at byte {position}")]
    UnexpectedEof {
        /// Byte offset where input ran out.
        position: usize,
    },

    /// A `<` not followed by a tag name.
    #[error("Invalid tag at byte {position}")]
    InvalidTag {
        /// Byte offset of the `<`.
        position: usize,
    },

    /// An element was still open at the end of input.
    #[error("Element <{tag}> is never closed")]
    UnclosedTag {
        /// Tag of the innermost open element.
        tag: String,
    },

    /// A closing tag with nothing open.
    #[error("Closing tag </{tag}> at byte {position} has no open element")]
    UnexpectedClose {
        /// Tag named by the closing tag.
        tag: String,
        /// Byte offset of the closing tag.
        position: usize,
    },

    /// A closing tag that does not match the innermost open element.
    #[error("Expected </{expected}> but found </{found}> at byte {position}")]
    MismatchedClose {
        /// Tag of the innermost open element.
        expected: String,
        /// Tag named by the closing tag.
        found: String,
        /// Byte offset of the closing tag.
        position: usize,
    },
}

/// A lexical unit of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Open {
        tag: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        tag: String,
        position: usize,
    },
    Text(String),
}

impl Token {
    pub(crate) fn is_void(tag: &str) -> bool {
        VOID_ELEMENTS.contains(&tag)
    }
}

/// Split markup into tokens.
pub(crate) fn tokenize(html: &str) -> Result<Vec<Token>, MarkupError> {
    let mut lexer = Lexer { src: html, pos: 0 };
    let mut tokens = Vec::new();

    while lexer.pos < html.len() {
        if lexer.rest().starts_with("<!--") {
            let end = lexer.rest()[4..]
                .find("-->")
                .ok_or(MarkupError::UnexpectedEof { position: html.len() })?;
            lexer.pos += 4 + end + 3;
        } else if lexer.rest().starts_with("</") {
            tokens.push(lexer.close_tag()?);
        } else if lexer.rest().starts_with('<') {
            tokens.push(lexer.open_tag()?);
        } else {
            let len = lexer.rest().find('<').unwrap_or(lexer.rest().len());
            let text = &lexer.rest()[..len];
            if !text.trim().is_empty() {
                tokens.push(Token::Text(text.to_string()));
            }
            lexer.pos += len;
        }
    }

    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eof(&self) -> MarkupError {
        MarkupError::UnexpectedEof {
            position: self.src.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            self.bump();
        }
        self.src[start..self.pos].to_ascii_lowercase()
    }

    fn expect(&mut self, want: char) -> Result<(), MarkupError> {
        let position = self.pos;
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(_) => Err(MarkupError::InvalidTag { position }),
            None => Err(self.eof()),
        }
    }

    fn close_tag(&mut self) -> Result<Token, MarkupError> {
        let position = self.pos;
        self.pos += 2;
        let tag = self.name();
        if tag.is_empty() {
            return Err(MarkupError::InvalidTag { position });
        }
        self.skip_whitespace();
        self.expect('>')?;
        Ok(Token::Close { tag, position })
    }

    fn open_tag(&mut self) -> Result<Token, MarkupError> {
        let position = self.pos;
        self.pos += 1;
        let tag = self.name();
        if tag.is_empty() {
            return Err(MarkupError::InvalidTag { position });
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.eof()),
                Some('>') => {
                    self.bump();
                    return Ok(Token::Open {
                        tag,
                        attributes,
                        self_closing: false,
                    });
                }
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    return Ok(Token::Open {
                        tag,
                        attributes,
                        self_closing: true,
                    });
                }
                Some(_) => attributes.push(self.attribute()?),
            }
        }
    }

    fn attribute(&mut self) -> Result<(String, String), MarkupError> {
        let position = self.pos;
        let name = self.name();
        if name.is_empty() {
            return Err(MarkupError::InvalidTag { position });
        }
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.bump();
        self.skip_whitespace();

        let value = match self.peek() {
            None => return Err(self.eof()),
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let len = self.rest().find(quote).ok_or_else(|| self.eof())?;
                let value = self.rest()[..len].to_string();
                self.pos += len + 1;
                value
            }
            Some(_) => {
                let len = self
                    .rest()
                    .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                    .unwrap_or(self.rest().len());
                let value = self.rest()[..len].to_string();
                self.pos += len;
                value
            }
        };
        Ok((name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_nested_markup() {
        let tokens = tokenize(r#"<section id="p1"><blockquote>hi</blockquote></section>"#)
            .expect("valid markup");
        assert_eq!(
            tokens,
            vec![
                Token::Open {
                    tag: "section".to_string(),
                    attributes: vec![("id".to_string(), "p1".to_string())],
                    self_closing: false,
                },
                Token::Open {
                    tag: "blockquote".to_string(),
                    attributes: vec![],
                    self_closing: false,
                },
                Token::Text("hi".to_string()),
                Token::Close {
                    tag: "blockquote".to_string(),
                    position: 31,
                },
                Token::Close {
                    tag: "section".to_string(),
                    position: 44,
                },
            ]
        );
    }

    #[test]
    fn accepts_single_quoted_unquoted_and_bare_attributes() {
        let tokens = tokenize("<input type=checkbox checked data-x='a b'>").expect("valid markup");
        let Token::Open { attributes, .. } = &tokens[0] else {
            panic!("expected open tag, got {:?}", tokens[0]);
        };
        assert_eq!(
            attributes,
            &vec![
                ("type".to_string(), "checkbox".to_string()),
                ("checked".to_string(), String::new()),
                ("data-x".to_string(), "a b".to_string()),
            ]
        );
    }

    #[test]
    fn skips_comments_and_whitespace_text() {
        let tokens = tokenize("<!-- note -->\n  <hr/>\n").expect("valid markup");
        assert_eq!(
            tokens,
            vec![Token::Open {
                tag: "hr".to_string(),
                attributes: vec![],
                self_closing: true,
            }]
        );
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert_eq!(
            tokenize("<section id=\"p1\""),
            Err(MarkupError::UnexpectedEof { position: 16 })
        );
    }

    #[test]
    fn empty_tag_name_is_an_error() {
        assert_eq!(tokenize("< >"), Err(MarkupError::InvalidTag { position: 0 }));
    }
}
