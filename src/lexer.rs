/*!
  Turns assembly source into a flat sequence of tokens terminated by a single `EndOfFile` token.

  The grammar is line oriented only in that `#` starts a comment running to the end of the line;
  otherwise whitespace and newlines are pure delimiters. Tokens are recognized as follows:

    `&name:`            LabelDefinition
    `&name`             Label
    `a`, `b`, ..., `fp` Register
    `mov`, `add`, ...   Instruction
    `42`, `-1`, `+3`    Integer (the sign is kept in the token text)
    `,` `[` `]`         Comma, BracketLeft, BracketRight

  An alphabetic word that is neither a register nor a mnemonic is an error, as is a sign that is
  not immediately followed by a digit. Any other character is a delimiter.
*/

use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::{take_while, take_while1},
  character::complete::{
    alpha1,
    char as one_char,
    digit1,
    not_line_ending,
    one_of,
    space1
  },
  combinator::{map, opt, recognize},
  sequence::{pair, preceded},
  IResult
};

use crate::bytecode::Opcode;
use crate::error::LexError;
use crate::register::Register;
use crate::token::{Token, TokenKind};

/// What a single successful match produced, before classification.
enum Lexeme<'a> {
  Label { name: &'a str, is_definition: bool },
  Word(&'a str),
  Integer(&'a str),
  Punctuation(TokenKind, &'a str),
  Trivia,
}

fn is_label_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn is_word_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

fn label_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  map(
    pair(
      preceded(one_char('&'), take_while1(is_label_char)),
      opt(one_char(':'))
    ),
    |(name, colon)| Lexeme::Label { name, is_definition: colon.is_some() }
  )(input)
}

fn word_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  map(recognize(pair(alpha1, take_while(is_word_char))), Lexeme::Word)(input)
}

fn integer_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  map(recognize(pair(opt(one_of("+-")), digit1)), Lexeme::Integer)(input)
}

fn punctuation_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  alt((
    map(one_char(','), |_| Lexeme::Punctuation(TokenKind::Comma, ",")),
    map(one_char('['), |_| Lexeme::Punctuation(TokenKind::BracketLeft, "[")),
    map(one_char(']'), |_| Lexeme::Punctuation(TokenKind::BracketRight, "]"))
  ))(input)
}

fn trivia_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  map(
    alt((
      space1,
      recognize(pair(one_char('#'), not_line_ending))
    )),
    |_| Lexeme::Trivia
  )(input)
}

fn lexeme_p(input: &str) -> IResult<&str, Lexeme<'_>> {
  alt((trivia_p, label_p, word_p, integer_p, punctuation_p))(input)
}

/// Registers are checked before mnemonics; the two sets of names are disjoint.
fn classify_word(word: &str, line: usize) -> Result<Token, LexError> {
  if Register::from_str(word).is_ok() {
    return Ok(Token::new(TokenKind::Register, word, line));
  }
  if Opcode::from_str(word).is_ok() {
    return Ok(Token::new(TokenKind::Instruction, word, line));
  }
  Err(LexError::UnknownWord { word: word.to_string(), line })
}

fn tokenize_line(text: &str, line: usize, tokens: &mut Vec<Token>) -> Result<(), LexError> {
  let mut rest = text;

  while !rest.is_empty() {
    match lexeme_p(rest) {

      Ok((remaining, lexeme)) => {
        match lexeme {
          Lexeme::Label { name, is_definition } => {
            let kind = match is_definition {
              true  => TokenKind::LabelDefinition,
              false => TokenKind::Label
            };
            tokens.push(Token::new(kind, name, line));
          }
          Lexeme::Word(word) => tokens.push(classify_word(word, line)?),
          Lexeme::Integer(text) => tokens.push(Token::new(TokenKind::Integer, text, line)),
          Lexeme::Punctuation(kind, text) => tokens.push(Token::new(kind, text, line)),
          Lexeme::Trivia => {}
        }
        rest = remaining;
      }

      Err(_e) => {
        let mut chars = rest.chars();
        match chars.next() {
          Some('+') | Some('-') => return Err(LexError::DanglingSign { line }),
          // Any other character is a delimiter.
          _ => {}
        }
        rest = chars.as_str();
      }

    }
  }

  Ok(())
}

/// Tokenizes `source`. The returned sequence always ends with exactly one `EndOfFile` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
  let mut tokens = Vec::new();
  let mut line_count = 0;

  for (index, text) in source.lines().enumerate() {
    tokenize_line(text, index + 1, &mut tokens)?;
    line_count = index + 1;
  }

  tokens.push(Token::end_of_file(line_count.max(1)));
  Ok(tokens)
}


#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
  }

  fn texts(source: &str) -> Vec<String> {
    tokenize(source).unwrap().into_iter().map(|t| t.text.to_string()).collect()
  }

  #[test]
  fn empty_source(){
    assert_eq!(kinds(""), vec![TokenKind::EndOfFile]);
    assert_eq!(kinds("  \n\n\t \n"), vec![TokenKind::EndOfFile]);
  }

  #[test]
  fn instruction_with_operands(){
    use TokenKind::*;
    assert_eq!(
      kinds("mov a, 10\nadd a,b"),
      vec![Instruction, Register, Comma, Integer, Instruction, Register, Comma, Register, EndOfFile]
    );
    assert_eq!(texts("mov a, 10"), vec!["mov", "a", ",", "10", ""]);
  }

  #[test]
  fn labels(){
    use TokenKind::*;
    let tokens = tokenize("&start:\n  jump &loop_1").unwrap();
    assert_eq!(
      tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
      vec![LabelDefinition, Instruction, Label, EndOfFile]
    );
    assert_eq!(&*tokens[0].text, "start");
    assert_eq!(&*tokens[2].text, "loop_1");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[2].line, 2);
  }

  #[test]
  fn frame_operand(){
    use TokenKind::*;
    assert_eq!(
      kinds("load a, fp[-2]"),
      vec![Instruction, Register, Comma, Register, BracketLeft, Integer, BracketRight, EndOfFile]
    );
    assert_eq!(texts("store fp[+3], b")[3], "+3");
    assert_eq!(texts("store fp[-3], b")[3], "-3");
  }

  #[test]
  fn every_register_name(){
    for name in &["a", "b", "ip", "sp", "fp"] {
      assert_eq!(kinds(name), vec![TokenKind::Register, TokenKind::EndOfFile]);
    }
  }

  #[test]
  fn full_mnemonic_set(){
    let source = "halt load store mov add sub mul div mod and or not shl shr \
                  gt ge lt le eq ne jump jumpz jumpnz push pop call ret";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.len(), 28);
    assert!(tokens[..27].iter().all(|t| t.is(TokenKind::Instruction)));
  }

  #[test]
  fn comments_are_skipped(){
    assert_eq!(
      kinds("halt # stop here, with a, b\n# whole line"),
      vec![TokenKind::Instruction, TokenKind::EndOfFile]
    );
  }

  #[test]
  fn unknown_word(){
    assert_eq!(
      tokenize("mov a, 1\nfoo a"),
      Err(LexError::UnknownWord { word: "foo".to_string(), line: 2 })
    );
    assert!(tokenize("MOV a, 1").is_err());
    assert!(tokenize("mov1 a, 1").is_err());
  }

  #[test]
  fn dangling_sign(){
    assert_eq!(tokenize("mov a, -"), Err(LexError::DanglingSign { line: 1 }));
    assert_eq!(tokenize("\nmov a, + 1"), Err(LexError::DanglingSign { line: 2 }));
  }

  #[test]
  fn stray_characters_delimit(){
    use TokenKind::*;
    assert_eq!(kinds("halt:halt"), vec![Instruction, Instruction, EndOfFile]);
    assert_eq!(kinds("& halt"), vec![Instruction, EndOfFile]);
  }

}
