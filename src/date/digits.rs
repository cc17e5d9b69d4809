/// Arabic-Indic digits U+0660..=U+0669
const ARABIC_INDIC_ZERO: u32 = 0x0660;
/// Extended Arabic-Indic (Persian) digits U+06F0..=U+06F9
const EXTENDED_ARABIC_INDIC_ZERO: u32 = 0x06F0;

/// Replace Arabic-Indic and Persian digits with ASCII `0-9`.
/// Every other character is kept as-is, so the char count never changes.
pub fn normalize_digits(s: &str) -> String {
    s.chars().map(ascii_digit).collect()
}

fn ascii_digit(c: char) -> char {
    let code = c as u32;
    for zero in [ARABIC_INDIC_ZERO, EXTENDED_ARABIC_INDIC_ZERO] {
        if (zero..zero + 10).contains(&code) {
            return char::from(b'0' + (code - zero) as u8);
        }
    }
    c
}
