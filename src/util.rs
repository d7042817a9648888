//! Text helpers: input decoding and number formatting for title prefixes.

use std::borrow::Cow;

/// Strip a UTF-8 byte order mark.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Decode bytes to a string, handling various encodings.
///
/// 1. First tries UTF-8
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (superset of ISO-8859-1)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the encoding name from an XML declaration, if present.
///
/// Only the first 100 bytes are examined.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = memchr::memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = memchr::memchr(quote, rest)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Upper-case the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const UPPER_ROMAN_DIGITS: [char; 7] = ['I', 'V', 'X', 'L', 'C', 'D', 'M'];
const LOWER_ROMAN_DIGITS: [char; 7] = ['i', 'v', 'x', 'l', 'c', 'd', 'm'];

/// Upper-case Roman number, like XVI. `None` outside 1..=3999.
pub fn to_upper_roman(n: u32) -> Option<String> {
    to_roman(n, &UPPER_ROMAN_DIGITS)
}

/// Lower-case Roman number, like xvi. `None` outside 1..=3999.
pub fn to_lower_roman(n: u32) -> Option<String> {
    to_roman(n, &LOWER_ROMAN_DIGITS)
}

fn to_roman(n: u32, digits: &[char; 7]) -> Option<String> {
    if n == 0 || n > 3999 {
        return None;
    }

    let mut result = String::new();
    let mut rest = n;
    // Thousands, hundreds, tens, ones: (one, five, ten) symbols per position
    for (pos, divisor) in [1000u32, 100, 10, 1].into_iter().enumerate() {
        let digit = rest / divisor;
        rest %= divisor;

        let base = (3 - pos) * 2;
        let one = digits[base];
        let five = digits.get(base + 1).copied();
        let ten = digits.get(base + 2).copied();

        match (digit, five, ten) {
            (0, _, _) => {}
            (1..=3, _, _) => result.extend(std::iter::repeat_n(one, digit as usize)),
            (4, Some(five), _) => {
                result.push(one);
                result.push(five);
            }
            (5..=8, Some(five), _) => {
                result.push(five);
                result.extend(std::iter::repeat_n(one, (digit - 5) as usize));
            }
            (9, _, Some(ten)) => {
                result.push(one);
                result.push(ten);
            }
            _ => return None,
        }
    }
    Some(result)
}

/// Upper-case Latin (alphabetic) number: A, B, ..., Z, AA, AB, ...
/// `None` for 0.
pub fn to_upper_latin(n: u32) -> Option<String> {
    to_latin(n, b'A')
}

/// Bijective base-26: there is no zero digit, so Z is followed by AA.
fn to_latin(n: u32, first: u8) -> Option<String> {
    if n == 0 {
        return None;
    }
    let mut letters = Vec::new();
    let mut rest = n;
    while rest > 0 {
        rest -= 1;
        letters.push(first + (rest % 26) as u8);
        rest /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).ok()
}

// ============================================================================
// Tests
// ============================================================================
