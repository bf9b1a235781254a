use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn disable_color() {
    if let Ok(mut color) = COLOR.write() {
        *color = false;
    }
}

fn color_enabled() -> bool {
    COLOR.read().map(|color| *color).unwrap_or(false)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if color_enabled() {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Parses a `FIELD=VALUE` search term.
pub fn parse_term(arg: &str) -> Result<(String, String), String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{arg}'"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{arg}'"));
    }

    Ok((field.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_term() {
        assert_eq!(
            parse_term("distribution=Moose"),
            Ok(("distribution".into(), "Moose".into()))
        );
        assert_eq!(
            parse_term(" name = Moo* "),
            Ok(("name".into(), "Moo*".into()))
        );
        assert_eq!(
            parse_term("module.name=Foo=Bar"),
            Ok(("module.name".into(), "Foo=Bar".into()))
        );
        assert!(parse_term("Moose").is_err());
        assert!(parse_term("=Moose").is_err());
    }
}
