//! printf.
//!
//! Supports %s %d %i %u %x %X %o %c %b %% with the -, 0, width and
//! precision modifiers, backslash escapes in the format, and format
//! reuse until the arguments are exhausted.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::ExecResult;
use crate::parser::word_parser::ansi_c_decode;

pub fn printf_builtin(args: &[String]) -> Result<ExecResult, InterpreterError> {
    let format = match args.first() {
        Some(f) => f.as_str(),
        None => {
            return Ok(ExecResult::failure(
                "printf: usage: printf format [arguments]\n".to_string(),
            ));
        }
    };
    let mut operands: &[String] = &args[1..];
    let mut stdout = String::new();
    let mut stderr = String::new();

    loop {
        let (chunk, consumed) = render(format, operands, &mut stderr);
        stdout.push_str(&chunk);
        if consumed == 0 || consumed >= operands.len() {
            break;
        }
        operands = &operands[consumed..];
    }

    let exit_code = if stderr.is_empty() { 0 } else { 1 };
    Ok(ExecResult::new(stdout, stderr, exit_code))
}

/// Render the format once; returns the output and how many operands
/// were consumed.
fn render(format: &str, operands: &[String], stderr: &mut String) -> (String, usize) {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut next = 0usize;
    let mut i = 0;

    let mut take = |next: &mut usize| -> String {
        let value = operands.get(*next).cloned().unwrap_or_default();
        *next += 1;
        value
    };

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                // Reuse the ANSI-C escape set; \xHH and \NNN span digits
                let esc = chars.get(i + 1).copied();
                let mut j = (i + 2).min(chars.len());
                match esc {
                    Some('x') => {
                        while j < chars.len() && j < i + 4 && chars[j].is_ascii_hexdigit() {
                            j += 1;
                        }
                    }
                    Some(c) if c.is_digit(8) => {
                        while j < chars.len() && j < i + 4 && chars[j].is_digit(8) {
                            j += 1;
                        }
                    }
                    _ => {}
                }
                let segment: String = chars[i..j].iter().collect();
                out.push_str(&ansi_c_decode(&segment));
                i = j;
            }
            '%' => {
                if chars.get(i + 1) == Some(&'%') {
                    out.push('%');
                    i += 2;
                    continue;
                }
                let (spec, end) = parse_spec(&chars, i + 1);
                match spec {
                    Some(spec) => {
                        let value = take(&mut next);
                        out.push_str(&format_operand(&spec, &value, stderr));
                        i = end;
                    }
                    None => {
                        out.push('%');
                        i += 1;
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    (out, next)
}

struct Spec {
    left_align: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

fn parse_spec(chars: &[char], start: usize) -> (Option<Spec>, usize) {
    let mut i = start;
    let mut left_align = false;
    let mut zero_pad = false;

    while let Some(c) = chars.get(i) {
        match c {
            '-' => left_align = true,
            '0' => zero_pad = true,
            '+' | ' ' | '#' => {}
            _ => break,
        }
        i += 1;
    }

    let mut width = 0usize;
    while let Some(c) = chars.get(i) {
        match c.to_digit(10) {
            Some(d) => {
                width = width * 10 + d as usize;
                i += 1;
            }
            None => break,
        }
    }

    let mut precision = None;
    if chars.get(i) == Some(&'.') {
        i += 1;
        let mut p = 0usize;
        while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
            p = p * 10 + d as usize;
            i += 1;
        }
        precision = Some(p);
    }

    match chars.get(i) {
        Some(&c) if "sdiuxXocb".contains(c) => {
            (Some(Spec { left_align, zero_pad, width, precision, conversion: c }), i + 1)
        }
        _ => (None, start),
    }
}

fn format_operand(spec: &Spec, value: &str, stderr: &mut String) -> String {
    let body = match spec.conversion {
        's' => {
            let mut s = value.to_string();
            if let Some(p) = spec.precision {
                s = s.chars().take(p).collect();
            }
            s
        }
        'b' => ansi_c_decode(value),
        'c' => value.chars().next().map(|c| c.to_string()).unwrap_or_default(),
        'd' | 'i' | 'u' => numeric(value, stderr).to_string(),
        'x' => format!("{:x}", numeric(value, stderr)),
        'X' => format!("{:X}", numeric(value, stderr)),
        'o' => format!("{:o}", numeric(value, stderr)),
        _ => value.to_string(),
    };

    pad(&body, spec)
}

fn numeric(value: &str, stderr: &mut String) -> i64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0;
    }
    // Leading quote means the char code of the next character
    if let Some(rest) = trimmed.strip_prefix('\'').or_else(|| trimmed.strip_prefix('"')) {
        return rest.chars().next().map(|c| c as i64).unwrap_or(0);
    }
    match trimmed.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                if let Ok(n) = i64::from_str_radix(hex, 16) {
                    return n;
                }
            }
            stderr.push_str(&format!("bash: printf: {}: invalid number\n", value));
            0
        }
    }
}

fn pad(body: &str, spec: &Spec) -> String {
    let len = body.chars().count();
    if len >= spec.width {
        return body.to_string();
    }
    let fill = spec.width - len;
    if spec.left_align {
        format!("{}{}", body, " ".repeat(fill))
    } else if spec.zero_pad && !body.starts_with('-') {
        format!("{}{}", "0".repeat(fill), body)
    } else if spec.zero_pad {
        // Keep the sign ahead of the zeros
        format!("-{}{}", "0".repeat(fill), &body[1..])
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn run(items: &[&str]) -> String {
        printf_builtin(&args(items)).unwrap().stdout
    }

    #[test]
    fn test_printf_string_and_newline() {
        assert_eq!(run(&["%s\\n", "hello"]), "hello\n");
    }

    #[test]
    fn test_printf_decimal() {
        assert_eq!(run(&["%d", "42"]), "42");
        assert_eq!(run(&["%05d", "42"]), "00042");
        assert_eq!(run(&["%5d", "42"]), "   42");
        assert_eq!(run(&["%-5d|", "42"]), "42   |");
    }

    #[test]
    fn test_printf_hex_octal() {
        assert_eq!(run(&["%x", "255"]), "ff");
        assert_eq!(run(&["%X", "255"]), "FF");
        assert_eq!(run(&["%o", "8"]), "10");
    }

    #[test]
    fn test_printf_precision() {
        assert_eq!(run(&["%.2s", "hello"]), "he");
    }

    #[test]
    fn test_printf_format_reuse() {
        assert_eq!(run(&["%s\\n", "a", "b", "c"]), "a\nb\nc\n");
    }

    #[test]
    fn test_printf_percent_literal() {
        assert_eq!(run(&["100%%"]), "100%");
    }

    #[test]
    fn test_printf_missing_args() {
        assert_eq!(run(&["%s-%s", "only"]), "only-");
        assert_eq!(run(&["%d"]), "0");
    }

    #[test]
    fn test_printf_char() {
        assert_eq!(run(&["%c", "abc"]), "a");
    }

    #[test]
    fn test_printf_invalid_number_reports() {
        let result = printf_builtin(&args(&["%d", "abc"])).unwrap();
        assert_eq!(result.stdout, "0");
        assert!(result.stderr.contains("invalid number"));
        assert_eq!(result.exit_code, 1);
    }
}
