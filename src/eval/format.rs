//! The shared formatter behind both `printf`-style calls and
//! `${expr:fmt}` string interpolation (SPEC_FULL §C: "one shared
//! formatter behind printf and string interpolation").
use crate::value::Value;

fn pad(digits: &str, width: usize, zero: bool) -> String {
    if digits.len() >= width {
        return digits.to_owned();
    }
    let fill = width - digits.len();
    if zero {
        if let Some(rest) = digits.strip_prefix('-') {
            format!("-{}{rest}", "0".repeat(fill))
        } else {
            format!("{}{digits}", "0".repeat(fill))
        }
    } else {
        format!("{}{digits}", " ".repeat(fill))
    }
}

/// `printf("...", args...)`: a minimal `%d`/`%ld`/`%s`/`%c`/`%%`
/// implementation with zero-padding and width, matching what the
/// original's format routine actually supports (SPEC_FULL §C).
/// A specifier with no remaining argument is emitted verbatim rather
/// than panicking; extra arguments are appended space-separated.
pub fn format_printf(fmt: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut rest = args.iter();
    let chars: Vec<char> = fmt.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        if i < chars.len() && chars[i] == '%' {
            out.push('%');
            i += 1;
            continue;
        }
        let mut zero_pad = false;
        if i < chars.len() && chars[i] == '0' {
            zero_pad = true;
            i += 1;
        }
        let mut width = 0usize;
        while i < chars.len() && chars[i].is_ascii_digit() {
            width = width * 10 + chars[i].to_digit(10).unwrap() as usize;
            i += 1;
        }
        if i < chars.len() && chars[i] == 'l' {
            i += 1;
        }
        let verbatim = |end: usize| chars[start..end].iter().collect::<String>();
        if i >= chars.len() {
            out.push_str(&verbatim(i));
            break;
        }
        let spec = chars[i];
        i += 1;
        match spec {
            'd' => match rest.next() {
                Some(v) => out.push_str(&pad(&v.as_int().unwrap_or(0).to_string(), width, zero_pad)),
                None => out.push_str(&verbatim(i)),
            },
            's' => match rest.next() {
                Some(v) => out.push_str(&v.format_default()),
                None => out.push_str(&verbatim(i)),
            },
            'c' => match rest.next() {
                Some(Value::Char(c)) => out.push(*c),
                Some(v) => out.push_str(&v.format_default()),
                None => out.push_str(&verbatim(i)),
            },
            _ => out.push_str(&verbatim(i)),
        }
    }
    let leftover: Vec<String> = rest.map(Value::format_default).collect();
    if !leftover.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&leftover.join(" "));
    }
    out
}

/// `${expr:fmt}` interpolation (SPEC_FULL §C, spec §4.4): `x`/`b` hex
/// and binary, `.N` fixed-point precision, `0N` zero-padded width.
/// Falls back to the value's default `Display` when the format tag
/// doesn't apply to the value's shape or is absent.
pub fn format_interp_value(value: &Value, format: Option<&str>) -> String {
    let Some(fmt) = format else { return value.format_default() };
    if fmt == "x" {
        if let Some(i) = value.as_int() {
            return format!("{i:x}");
        }
    }
    if fmt == "b" {
        if let Some(i) = value.as_int() {
            return format!("{i:b}");
        }
    }
    if let Some(precision) = fmt.strip_prefix('.') {
        if let Ok(p) = precision.parse::<usize>() {
            if let Some(f) = value.as_float() {
                return format!("{f:.p$}");
            }
        }
    }
    if let Some(rest) = fmt.strip_prefix('0') {
        let digits = rest.strip_suffix('d').unwrap_or(rest);
        if let Ok(width) = digits.parse::<usize>() {
            if let Some(i) = value.as_int() {
                return pad(&i.to_string(), width, true);
            }
        }
    }
    value.format_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printf_substitutes_and_pads() {
        let out = format_printf("n=%03d s=%s", &[Value::Integer(7), Value::Str("hi".to_owned())]);
        assert_eq!(out, "n=007 s=hi");
    }

    #[test]
    fn printf_missing_arg_is_left_verbatim() {
        let out = format_printf("n=%d", &[]);
        assert_eq!(out, "n=%d");
    }

    #[test]
    fn printf_extra_args_appended() {
        let out = format_printf("x", &[Value::Integer(1), Value::Integer(2)]);
        assert_eq!(out, "x 1 2");
    }

    #[test]
    fn interp_hex_and_precision() {
        assert_eq!(format_interp_value(&Value::Integer(255), Some("x")), "ff");
        assert_eq!(format_interp_value(&Value::Float(1.5), Some(".2")), "1.50");
    }
}
