/*!
  Tokens produced by the lexer and consumed, by index, by both passes of the assembler.
  Token text is interned, so cloning a token is cheap and label names compare by pointer.
*/

use std::fmt::{Display, Formatter};

use string_cache::DefaultAtom;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

#[derive(StrumDisplay, IntoStaticStr, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum TokenKind {
  /// `&name`, a reference to a label.
  #[strum(serialize = "label")]
  Label,
  /// `&name:`, the definition of a label at the current address.
  #[strum(serialize = "label definition")]
  LabelDefinition,
  #[strum(serialize = "instruction")]
  Instruction,
  #[strum(serialize = "register")]
  Register,
  /// Signed or unsigned decimal literal. The sign, if any, is kept in the text.
  #[strum(serialize = "integer")]
  Integer,
  #[strum(serialize = "`,`")]
  Comma,
  #[strum(serialize = "`[`")]
  BracketLeft,
  #[strum(serialize = "`]`")]
  BracketRight,
  #[strum(serialize = "end of file")]
  EndOfFile,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Token {
  pub kind : TokenKind,
  pub text : DefaultAtom,
  /// 1-based source line, for diagnostics.
  pub line : usize,
}

impl Token {
  pub fn new(kind: TokenKind, text: &str, line: usize) -> Token {
    Token {
      kind,
      text: DefaultAtom::from(text),
      line
    }
  }

  pub fn end_of_file(line: usize) -> Token {
    Token::new(TokenKind::EndOfFile, "", line)
  }

  pub fn is(&self, kind: TokenKind) -> bool {
    self.kind == kind
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.kind {

      TokenKind::EndOfFile => {
        write!(f, "end of file")
      }

      TokenKind::Label => {
        write!(f, "label `&{}`", self.text)
      }

      TokenKind::LabelDefinition => {
        write!(f, "label definition `&{}:`", self.text)
      }

      TokenKind::Comma | TokenKind::BracketLeft | TokenKind::BracketRight => {
        write!(f, "{}", self.kind)
      }

      kind => {
        write!(f, "{} `{}`", kind, self.text)
      }

    }
  }
}
