//! Token definitions for the Java subset.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+|//[^\n]*|/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // Keywords
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,
    #[token("throws")]
    Throws,
    #[token("void")]
    Void,
    #[token("boolean")]
    #[token("byte")]
    #[token("char")]
    #[token("short")]
    #[token("int")]
    #[token("long")]
    #[token("float")]
    #[token("double")]
    PrimitiveType,
    #[token("public")]
    #[token("protected")]
    #[token("private")]
    #[token("static")]
    #[token("final")]
    #[token("abstract")]
    #[token("native")]
    #[token("transient")]
    #[token("volatile")]
    #[token("strictfp")]
    Modifier,
    #[token("synchronized")]
    Synchronized,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("return")]
    Return,
    #[token("throw")]
    Throw,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("assert")]
    Assert,
    #[token("new")]
    New,
    #[token("instanceof")]
    Instanceof,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals
    #[regex(r"[0-9]+|0[xX][0-9a-fA-F]+")]
    IntLit,
    #[regex(r"([0-9]+|0[xX][0-9a-fA-F]+)[lL]")]
    LongLit,
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[fF]")]
    FloatLit,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[dD]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[dD]?")]
    #[regex(r"[0-9]+[dD]")]
    DoubleLit,
    #[regex(r"'([^'\\\n]|\\.)+'")]
    CharLit,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // Separators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // Operators
    #[token("=")]
    Assign,
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    CompoundAssign,
    #[token("<<=")]
    #[token(">>=")]
    #[token(">>>=")]
    ShiftAssign,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("|")]
    Or,
    #[token("^")]
    Caret,
    #[token("&")]
    And,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            kinds("class Classy int intx"),
            vec![Token::Class, Token::Ident, Token::PrimitiveType, Token::Ident]
        );
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(
            kinds("1 2L 3.0 4.5f 6d 0x1F"),
            vec![
                Token::IntLit,
                Token::LongLit,
                Token::DoubleLit,
                Token::FloatLit,
                Token::DoubleLit,
                Token::IntLit,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a /* block\n comment */ b // line\n c"),
            vec![Token::Ident, Token::Ident, Token::Ident]
        );
    }

    #[test]
    fn test_shift_operators() {
        assert_eq!(
            kinds("a >>> b >>= c << d"),
            vec![
                Token::Ident,
                Token::UShr,
                Token::Ident,
                Token::ShiftAssign,
                Token::Ident,
                Token::Shl,
                Token::Ident,
            ]
        );
    }
}
