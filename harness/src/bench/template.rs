//! Argument templates
//!
//! Benchmark arguments may reference a handful of placeholders that are only
//! known once a variant is fixed:
//!
//! - `{root}`: suite source root
//! - `{srcdir}`: benchmark source directory
//! - `{dstdir}`: benchmark build directory
//! - `{prefix}`: variant prefix followed by `-` (`x86-`, `rv32-x86-`), or empty
//! - `{mode}`: `-` followed by the translation mode (`-globals`), or empty
//!
//! `{{` and `}}` stand for literal braces.

use thiserror::Error;

/// Values substituted into a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub root: &'a str,
    pub srcdir: &'a str,
    pub dstdir: &'a str,
    pub prefix: &'a str,
    pub mode: &'a str,
}

impl<'a> TemplateVars<'a> {
    fn lookup(&self, key: &str) -> Option<&'a str> {
        match key {
            "root" => Some(self.root),
            "srcdir" => Some(self.srcdir),
            "dstdir" => Some(self.dstdir),
            "prefix" => Some(self.prefix),
            "mode" => Some(self.mode),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder")]
    Unterminated,

    #[error("single `}}` outside a placeholder")]
    UnmatchedClose,
}

/// Substitute every `{name}` in `template`.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(at) = rest.find(['{', '}']) {
        out.push_str(&rest[..at]);
        let brace = &rest[at..at + 1];
        let after = &rest[at + 1..];

        if let Some(tail) = after.strip_prefix(brace) {
            out.push_str(brace);
            rest = tail;
            continue;
        }
        if brace == "}" {
            return Err(TemplateError::UnmatchedClose);
        }

        let end = after.find('}').ok_or(TemplateError::Unterminated)?;
        let key = &after[..end];
        let value = vars
            .lookup(key)
            .ok_or_else(|| TemplateError::UnknownPlaceholder(key.to_string()))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars<'static> {
        TemplateVars {
            root: "/top/mibench",
            srcdir: "/top/mibench/security/rijndael",
            dstdir: "/top/build/mibench/security/rijndael",
            prefix: "rv32-x86-",
            mode: "-globals",
        }
    }

    #[test]
    fn test_render_plain_text() {
        assert_eq!(render("e", &vars()).unwrap(), "e");
    }

    #[test]
    fn test_render_prefix_and_mode() {
        let out = render("{dstdir}/{prefix}output_large{mode}.enc", &vars()).unwrap();
        assert_eq!(
            out,
            "/top/build/mibench/security/rijndael/rv32-x86-output_large-globals.enc"
        );
    }

    #[test]
    fn test_render_empty_prefix_and_mode() {
        let v = TemplateVars {
            prefix: "",
            mode: "",
            ..vars()
        };
        let out = render("{dstdir}/{prefix}output_large{mode}.dec", &v).unwrap();
        assert_eq!(out, "/top/build/mibench/security/rijndael/output_large.dec");
    }

    #[test]
    fn test_unknown_placeholder() {
        assert_eq!(
            render("{srcdir}/{input}", &vars()),
            Err(TemplateError::UnknownPlaceholder("input".into()))
        );
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert_eq!(render("{root/x", &vars()), Err(TemplateError::Unterminated));
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let out = render("{{print $1}} {srcdir}/x{{{mode}}}", &vars()).unwrap();
        assert_eq!(out, "{print $1} /top/mibench/security/rijndael/x{-globals}");
    }

    #[test]
    fn test_single_close_brace_rejected() {
        assert_eq!(render("a}b", &vars()), Err(TemplateError::UnmatchedClose));
    }
}
