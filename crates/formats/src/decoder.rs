//! Parser for the renderer script statements produced by [`RendererCommand::to_script`].
//!
//! Accepts exactly one statement of the form `name(arg, ...);` where each
//! argument is a quoted string, a number, `null`, or a bracketed list. The
//! string grammar follows the script language's escape rules, so anything
//! the encoder writes (and hand-written variants of it) reads back intact.

use foundation::{LatLng, MarkerId};

use crate::command::{ADD_MARKER, CLEAR_ALL_MARKERS, DRAW_PATH, RendererCommand, SET_VIEWPORT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEnd,
    UnexpectedChar { pos: usize, found: char },
    InvalidNumber { pos: usize, text: String },
    InvalidEscape { pos: usize },
    UnknownCommand(String),
    Arity {
        command: &'static str,
        expected: usize,
        found: usize,
    },
    ArgumentType {
        command: &'static str,
        index: usize,
        expected: &'static str,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedEnd => write!(f, "unexpected end of script"),
            DecodeError::UnexpectedChar { pos, found } => {
                write!(f, "unexpected {found:?} at byte {pos}")
            }
            DecodeError::InvalidNumber { pos, text } => {
                write!(f, "invalid number {text:?} at byte {pos}")
            }
            DecodeError::InvalidEscape { pos } => write!(f, "invalid escape at byte {pos}"),
            DecodeError::UnknownCommand(name) => write!(f, "unknown command {name:?}"),
            DecodeError::Arity {
                command,
                expected,
                found,
            } => write!(f, "{command} takes {expected} arguments, got {found}"),
            DecodeError::ArgumentType {
                command,
                index,
                expected,
            } => write!(f, "{command} argument {index} must be {expected}"),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Str(String),
    Num(f64),
    Null,
    List(Vec<Arg>),
}

/// Decodes one script statement back into a [`RendererCommand`].
pub fn decode(script: &str) -> Result<RendererCommand, DecodeError> {
    let mut parser = Parser { src: script, pos: 0 };
    let (name, args) = parser.statement()?;
    into_command(&name, args)
}

fn into_command(name: &str, args: Vec<Arg>) -> Result<RendererCommand, DecodeError> {
    match name {
        SET_VIEWPORT => {
            let [lat, lng, zoom] = take_args::<3>(SET_VIEWPORT, args)?;
            let zoom = match zoom {
                Arg::Null => None,
                other => Some(number(SET_VIEWPORT, 2, other)?),
            };
            Ok(RendererCommand::SetViewport {
                center: LatLng::new(number(SET_VIEWPORT, 0, lat)?, number(SET_VIEWPORT, 1, lng)?),
                zoom,
            })
        }
        CLEAR_ALL_MARKERS => {
            let [] = take_args::<0>(CLEAR_ALL_MARKERS, args)?;
            Ok(RendererCommand::ClearAllMarkers)
        }
        ADD_MARKER => {
            let [id, lat, lng, label] = take_args::<4>(ADD_MARKER, args)?;
            Ok(RendererCommand::AddMarker {
                id: MarkerId::new(string(ADD_MARKER, 0, id)?),
                position: LatLng::new(number(ADD_MARKER, 1, lat)?, number(ADD_MARKER, 2, lng)?),
                label: string(ADD_MARKER, 3, label)?,
            })
        }
        DRAW_PATH => {
            let [points] = take_args::<1>(DRAW_PATH, args)?;
            let Arg::List(points) = points else {
                return Err(type_error(DRAW_PATH, 0, "a list of [lat, lng] pairs"));
            };
            let points = points
                .into_iter()
                .map(|pair| match pair {
                    Arg::List(pair) => match <[Arg; 2]>::try_from(pair) {
                        Ok([lat, lng]) => {
                            Ok(LatLng::new(number(DRAW_PATH, 0, lat)?, number(DRAW_PATH, 0, lng)?))
                        }
                        Err(_) => Err(type_error(DRAW_PATH, 0, "a list of [lat, lng] pairs")),
                    },
                    _ => Err(type_error(DRAW_PATH, 0, "a list of [lat, lng] pairs")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RendererCommand::DrawPath { points })
        }
        other => Err(DecodeError::UnknownCommand(other.to_string())),
    }
}

fn take_args<const N: usize>(
    command: &'static str,
    args: Vec<Arg>,
) -> Result<[Arg; N], DecodeError> {
    let found = args.len();
    <[Arg; N]>::try_from(args).map_err(|_| DecodeError::Arity {
        command,
        expected: N,
        found,
    })
}

fn number(command: &'static str, index: usize, arg: Arg) -> Result<f64, DecodeError> {
    match arg {
        Arg::Num(v) => Ok(v),
        _ => Err(type_error(command, index, "a number")),
    }
}

fn string(command: &'static str, index: usize, arg: Arg) -> Result<String, DecodeError> {
    match arg {
        Arg::Str(s) => Ok(s),
        _ => Err(type_error(command, index, "a string")),
    }
}

fn type_error(command: &'static str, index: usize, expected: &'static str) -> DecodeError {
    DecodeError::ArgumentType {
        command,
        index,
        expected,
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn statement(&mut self) -> Result<(String, Vec<Arg>), DecodeError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        self.expect('(')?;
        let args = self.sequence(')')?;
        self.skip_ws();
        if self.peek() == Some(';') {
            self.bump();
        }
        self.skip_ws();
        match self.peek() {
            None => Ok((name, args)),
            Some(found) => Err(DecodeError::UnexpectedChar {
                pos: self.pos,
                found,
            }),
        }
    }

    /// Comma-separated values up to (and consuming) `close`.
    fn sequence(&mut self, close: char) -> Result<Vec<Arg>, DecodeError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.bump();
            return Ok(items);
        }
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => self.skip_ws(),
                Some(c) if c == close => return Ok(items),
                Some(found) => {
                    return Err(DecodeError::UnexpectedChar {
                        pos: self.pos - found.len_utf8(),
                        found,
                    });
                }
                None => return Err(DecodeError::UnexpectedEnd),
            }
        }
    }

    fn value(&mut self) -> Result<Arg, DecodeError> {
        match self.peek() {
            None => Err(DecodeError::UnexpectedEnd),
            Some(q @ ('\'' | '"')) => {
                self.bump();
                self.string_body(q).map(Arg::Str)
            }
            Some('[') => {
                self.bump();
                self.sequence(']').map(Arg::List)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                match self.ident()?.as_str() {
                    "null" | "undefined" => Ok(Arg::Null),
                    "NaN" => Ok(Arg::Num(f64::NAN)),
                    "Infinity" => Ok(Arg::Num(f64::INFINITY)),
                    _ => Err(DecodeError::UnexpectedChar { pos: start, found: c }),
                }
            }
            Some(found) => Err(DecodeError::UnexpectedChar {
                pos: self.pos,
                found,
            }),
        }
    }

    fn number(&mut self) -> Result<Arg, DecodeError> {
        let start = self.pos;
        let rest = &self.src[start..];
        for (sign, value) in [("-Infinity", f64::NEG_INFINITY), ("+Infinity", f64::INFINITY)] {
            if rest.starts_with(sign) {
                self.pos += sign.len();
                return Ok(Arg::Num(value));
            }
        }

        let mut prev = None;
        while let Some(c) = self.peek() {
            let sign_ok =
                matches!(c, '-' | '+') && (self.pos == start || matches!(prev, Some('e' | 'E')));
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') || sign_ok {
                prev = Some(c);
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map(Arg::Num)
            .map_err(|_| DecodeError::InvalidNumber {
                pos: start,
                text: text.to_string(),
            })
    }

    /// Reads up to the closing `quote`; the opening quote is already consumed.
    fn string_body(&mut self, quote: char) -> Result<String, DecodeError> {
        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                None => return Err(DecodeError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\n' | '\r') => {
                    return Err(DecodeError::UnexpectedChar {
                        pos: at,
                        found: '\n',
                    });
                }
                Some('\\') => self.escape(at, &mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, at: usize, out: &mut String) -> Result<(), DecodeError> {
        let Some(c) = self.bump() else {
            return Err(DecodeError::UnexpectedEnd);
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|d| d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2, at)?;
                out.push(char::from_u32(code).ok_or(DecodeError::InvalidEscape { pos: at })?);
            }
            'u' => {
                let ch = self.unicode_escape(at)?;
                out.push(ch);
            }
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            c if c.is_ascii_digit() => return Err(DecodeError::InvalidEscape { pos: at }),
            // Any other escaped character stands for itself.
            c => out.push(c),
        }
        Ok(())
    }

    fn unicode_escape(&mut self, at: usize) -> Result<char, DecodeError> {
        let high = if self.peek() == Some('{') {
            self.bump();
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[start..self.pos];
            self.expect('}')?;
            u32::from_str_radix(digits, 16).map_err(|_| DecodeError::InvalidEscape { pos: at })?
        } else {
            self.hex_digits(4, at)?
        };

        if (0xD800..0xDC00).contains(&high) {
            // Surrogate pair written as two escapes.
            if !self.src[self.pos..].starts_with("\\u") {
                return Err(DecodeError::InvalidEscape { pos: at });
            }
            self.pos += 2;
            let low = self.hex_digits(4, at)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(DecodeError::InvalidEscape { pos: at });
            }
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(code).ok_or(DecodeError::InvalidEscape { pos: at });
        }
        char::from_u32(high).ok_or(DecodeError::InvalidEscape { pos: at })
    }

    fn hex_digits(&mut self, count: usize, at: usize) -> Result<u32, DecodeError> {
        let digits = self
            .src
            .get(self.pos..self.pos + count)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or(DecodeError::InvalidEscape { pos: at })?;
        self.pos += count;
        u32::from_str_radix(digits, 16).map_err(|_| DecodeError::InvalidEscape { pos: at })
    }

    fn ident(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            Some(found) => return Err(DecodeError::UnexpectedChar { pos: start, found }),
            None => return Err(DecodeError::UnexpectedEnd),
        }
        while self
            .peek()
            .is_some_and(|c| is_ident_start(c) || c.is_ascii_digit())
        {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn expect(&mut self, want: char) -> Result<(), DecodeError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(DecodeError::UnexpectedChar {
                pos: self.pos,
                found,
            }),
            None => Err(DecodeError::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, decode};
    use crate::command::RendererCommand;
    use foundation::{LatLng, MarkerId};
    use pretty_assertions::assert_eq;

    fn add_marker(id: &str, lat: f64, lng: f64, label: &str) -> RendererCommand {
        RendererCommand::AddMarker {
            id: MarkerId::new(id),
            position: LatLng::new(lat, lng),
            label: label.to_string(),
        }
    }

    #[test]
    fn decodes_each_command_kind() {
        assert_eq!(
            decode("setViewport(22.904888, 120.2719823, 20);"),
            Ok(RendererCommand::SetViewport {
                center: LatLng::new(22.904888, 120.2719823),
                zoom: Some(20.0),
            })
        );
        assert_eq!(
            decode("setViewport(1, 2, null)"),
            Ok(RendererCommand::SetViewport {
                center: LatLng::new(1.0, 2.0),
                zoom: None,
            })
        );
        assert_eq!(decode("  clearAllMarkers( ) ; "), Ok(RendererCommand::ClearAllMarkers));
        assert_eq!(
            decode("addMarker('m1', 1.0, 2.0, '1');"),
            Ok(add_marker("m1", 1.0, 2.0, "1"))
        );
        assert_eq!(
            decode("drawPath([[1, 2], [3.5, -4]]);"),
            Ok(RendererCommand::DrawPath {
                points: vec![LatLng::new(1.0, 2.0), LatLng::new(3.5, -4.0)],
            })
        );
    }

    #[test]
    fn quoted_label_survives_the_script_form() {
        let cmd = add_marker("m1", 1.0, 2.0, "O'Brien");
        let script = cmd.to_script();
        assert!(script.contains(r"\'"), "quote must be escaped: {script}");
        assert_eq!(decode(&script), Ok(cmd));
    }

    #[test]
    fn hostile_labels_cannot_escape_the_literal() {
        for label in [
            "'); clearAllMarkers(); ('",
            r"trailing backslash \",
            "line\nbreak\r\u{2028}sep\u{2029}",
            "\u{0}\u{7}\u{1f}\u{7f}",
            "<img src=x onerror=alert(1)></script>",
            "mixed \"double\" and 'single'",
        ] {
            let cmd = add_marker("m9", 0.0, 0.0, label);
            assert_eq!(decode(&cmd.to_script()), Ok(cmd.clone()), "label {label:?}");
        }
    }

    #[test]
    fn coordinates_round_trip_bit_for_bit() {
        let samples = [
            (22.904888, 120.2719823),
            (0.1 + 0.2, -179.99999999999997),
            (-0.0, 5e-324),
            (f64::MAX, f64::MIN_POSITIVE),
            (89.99999999999999, 1.0 / 3.0),
        ];
        for (lat, lng) in samples {
            let script = add_marker("m1", lat, lng, "x").to_script();
            let Ok(RendererCommand::AddMarker { position, .. }) = decode(&script) else {
                panic!("failed to decode {script}");
            };
            assert_eq!(position.lat.to_bits(), lat.to_bits(), "{script}");
            assert_eq!(position.lng.to_bits(), lng.to_bits(), "{script}");
        }
    }

    #[test]
    fn understands_hand_written_escapes() {
        assert_eq!(
            decode(r#"addMarker("m1", 0, 0, '\x41B\u{43}🚀\q');"#),
            Ok(add_marker("m1", 0.0, 0.0, "ABC\u{1F680}q"))
        );
    }

    #[test]
    fn non_finite_numbers_decode() {
        let Ok(RendererCommand::SetViewport { center, zoom }) =
            decode("setViewport(NaN, -Infinity, Infinity);")
        else {
            panic!("expected viewport");
        };
        assert!(center.lat.is_nan());
        assert_eq!(center.lng, f64::NEG_INFINITY);
        assert_eq!(zoom, Some(f64::INFINITY));
    }

    #[test]
    fn rejects_malformed_statements() {
        assert_eq!(decode(""), Err(DecodeError::UnexpectedEnd));
        assert_eq!(
            decode("flyTo(1, 2);"),
            Err(DecodeError::UnknownCommand("flyTo".to_string()))
        );
        assert_eq!(
            decode("clearAllMarkers(1);"),
            Err(DecodeError::Arity {
                command: "clearAllMarkers",
                expected: 0,
                found: 1,
            })
        );
        assert!(matches!(
            decode("addMarker(1, 2, 3, 4);"),
            Err(DecodeError::ArgumentType { index: 0, .. })
        ));
        assert!(decode("addMarker('m1, 1, 2, 'x');").is_err());
        assert!(matches!(
            decode("clearAllMarkers(); clearAllMarkers();"),
            Err(DecodeError::UnexpectedChar { .. })
        ));
        assert!(matches!(
            decode("setViewport(1.2.3, 0, 0);"),
            Err(DecodeError::InvalidNumber { .. })
        ));
    }
}
