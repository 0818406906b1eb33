//! Scalar typing following the YAML 1.2 core schema.
//!
//! Only plain (unquoted) scalars are typed; quoted and block scalars are
//! always strings. A `!!str` tag forces a string regardless of style.

use std::sync::LazyLock;

use regex::Regex;
use yaml_overlay_core::Scalar;
use yaml_rust2::parser::Tag;
use yaml_rust2::scanner::TScalarStyle;

static NULL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:~|null|Null|NULL|)$").expect("static regex must compile")
});

static BOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:true|True|TRUE|false|False|FALSE)$").expect("static regex must compile")
});

static INT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-+]?[0-9]+|0o([0-7]+)|0x([0-9a-fA-F]+))$")
        .expect("static regex must compile")
});

static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?$")
        .expect("static regex must compile")
});

static SPECIAL_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([-+]?)\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$")
        .expect("static regex must compile")
});

/// Joins a parser tag back into its written form (`!reset`, `!!str`).
pub(crate) fn tag_text(tag: &Tag) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}

fn is_str_tag(tag: &Tag) -> bool {
    tag.suffix == "str" && matches!(tag.handle.as_str(), "!!" | "tag:yaml.org,2002:")
}

/// Types one scalar event.
pub(crate) fn type_scalar(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Scalar {
    if tag.is_some_and(is_str_tag) || !matches!(style, TScalarStyle::Plain) {
        return Scalar::String(text.to_string());
    }
    type_plain(text)
}

/// Types a plain scalar by the core schema.
pub(crate) fn type_plain(text: &str) -> Scalar {
    if NULL_RE.is_match(text) {
        return Scalar::Null;
    }
    if BOOL_RE.is_match(text) {
        return Scalar::Bool(text.eq_ignore_ascii_case("true"));
    }
    if let Some(caps) = INT_RE.captures(text) {
        let parsed = if let Some(octal) = caps.get(1) {
            i64::from_str_radix(octal.as_str(), 8)
        } else if let Some(hex) = caps.get(2) {
            i64::from_str_radix(hex.as_str(), 16)
        } else {
            text.parse::<i64>()
        };
        // Out-of-range integers degrade to floats, then to strings.
        return match parsed {
            Ok(i) => Scalar::Int(i),
            Err(_) => text
                .parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or_else(|_| Scalar::String(text.to_string())),
        };
    }
    if FLOAT_RE.is_match(text) {
        if let Ok(x) = text.parse::<f64>() {
            return Scalar::Float(x);
        }
    }
    if let Some(caps) = SPECIAL_FLOAT_RE.captures(text) {
        return match caps.get(1) {
            Some(sign) if sign.as_str() == "-" => Scalar::Float(f64::NEG_INFINITY),
            Some(_) => Scalar::Float(f64::INFINITY),
            None => Scalar::Float(f64::NAN),
        };
    }
    Scalar::String(text.to_string())
}
