//! PGN move text utilities: regex cleanup and strict SAN tokenizing.

use regex::Regex;
use shakmaty::san::SanPlus;

use crate::error::MovetextError;

const RESULT_TOKENS: [&str; 5] = ["1-0", "0-1", "1/2-1/2", "½-½", "*"];

fn pattern(re: &str) -> Result<Regex, MovetextError> {
    Regex::new(re).map_err(|e| MovetextError::Pattern(e.to_string()))
}

/// Split PGN text into its SAN move tokens, in order.
///
/// Tag pairs, `{}` and `;` comments, NAGs, move numbers, result markers and
/// (nested) variations are dropped. Anything else is returned verbatim for the
/// caller to validate; unbalanced braces or parentheses are an error rather
/// than being silently skipped.
pub fn tokenize_movetext(pgn: &str) -> Result<Vec<String>, MovetextError> {
    let no_headers = pattern(r#"\[\w+\s+"(?:[^"\\]|\\.)*"\s*\]"#)?.replace_all(pgn, "");

    let no_comments = pattern(r"\{[^}]*\}")?.replace_all(&no_headers, " ");
    if no_comments.contains('{') || no_comments.contains('}') {
        return Err(MovetextError::Unbalanced("comment"));
    }
    let no_comments = pattern(r";[^\n]*")?.replace_all(&no_comments, " ");

    // Peel variations innermost-first until none remain
    let variation_re = pattern(r"\([^()]*\)")?;
    let mut text = no_comments.into_owned();
    loop {
        let next = variation_re.replace_all(&text, " ").into_owned();
        if next == text {
            break;
        }
        text = next;
    }
    if text.contains('(') || text.contains(')') {
        return Err(MovetextError::Unbalanced("variation"));
    }

    let text = pattern(r"\$\d+")?.replace_all(&text, " ");
    let move_number_re = pattern(r"^\d+\.+")?;

    let mut tokens = Vec::new();
    for raw in text.split_whitespace() {
        let stripped = move_number_re.replace(raw, "");
        let token: &str = &stripped;
        if token.is_empty() || RESULT_TOKENS.contains(&token) {
            continue;
        }
        tokens.push(token.to_string());
    }

    Ok(tokens)
}

/// Parse one move token such as `Nf3`, `exd8=Q+` or `O-O!?`.
/// Trailing annotation glyphs are accepted; any other trailing text is not.
/// Castling written with zeros (`0-0`, `0-0-0`) is read as `O-O` / `O-O-O`.
pub fn parse_san_token(token: &str) -> Option<SanPlus> {
    let token = normalize_castling(token);
    let (san_plus, used) = SanPlus::from_ascii_prefix(token.as_bytes()).ok()?;
    let rest = &token[used..];
    if rest.chars().all(|c| c == '!' || c == '?') {
        Some(san_plus)
    } else {
        None
    }
}

fn normalize_castling(token: &str) -> std::borrow::Cow<'_, str> {
    if let Some(rest) = token.strip_prefix("0-0-0") {
        format!("O-O-O{rest}").into()
    } else if let Some(rest) = token.strip_prefix("0-0") {
        format!("O-O{rest}").into()
    } else {
        token.into()
    }
}

/// Extract a string value from a PGN header (e.g. FEN, Termination).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Custom starting position declared by `[SetUp "1"]` + `[FEN "..."]`.
pub fn declared_start_fen(pgn: &str) -> Option<String> {
    let fen = extract_header(pgn, "FEN")?;
    match extract_header(pgn, "SetUp").as_deref() {
        Some("1") | None => Some(fen),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_full_record() {
        let pgn = r#"[Event "MoltChess Arena"]
[Site "moltchess.io"]
[White "agent-a"]
[Black "agent-b"]
[Result "1-0"]
[Termination "checkmate"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0"#;

        let tokens = tokenize_movetext(pgn).unwrap();
        assert_eq!(
            tokens,
            vec!["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]
        );
    }

    #[test]
    fn test_tokenize_strips_annotations() {
        let pgn = "1. e4 {best by test} e5 $1 2. Nf3 (2. f4 exf4 (2... d5)) 2... Nc6 ; old line\n3.Bb5 *";
        let tokens = tokenize_movetext(pgn).unwrap();
        assert_eq!(tokens, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    }

    #[test]
    fn test_tokenize_rejects_unbalanced() {
        assert_eq!(
            tokenize_movetext("1. e4 { unterminated e5"),
            Err(MovetextError::Unbalanced("comment"))
        );
        assert_eq!(
            tokenize_movetext("1. e4 (1. d4 e5"),
            Err(MovetextError::Unbalanced("variation"))
        );
    }

    #[test]
    fn test_parse_san_token() {
        assert!(parse_san_token("Nf3").is_some());
        assert!(parse_san_token("exd8=Q+").is_some());
        assert!(parse_san_token("O-O!?").is_some());
        assert!(parse_san_token("Nf3xyz").is_none());
        assert!(parse_san_token("zz9").is_none());
    }

    #[test]
    fn test_parse_zero_castling() {
        assert_eq!(parse_san_token("0-0"), parse_san_token("O-O"));
        assert_eq!(parse_san_token("0-0-0+"), parse_san_token("O-O-O+"));
        assert!(parse_san_token("0-0").is_some());
        assert!(parse_san_token("0-0x").is_none());
    }

    #[test]
    fn test_tokenize_header_value_with_brackets() {
        let pgn = r#"[Event "Arena [x] cup]"]
[Annotator "a \"quoted\" name"]

1. e4 e5 *"#;
        assert_eq!(tokenize_movetext(pgn).unwrap(), vec!["e4", "e5"]);
    }

    #[test]
    fn test_declared_start_fen() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 *"#;
        assert_eq!(
            declared_start_fen(pgn).as_deref(),
            Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")
        );
        assert_eq!(declared_start_fen("1. e4 e5"), None);
    }
}
