//! Line grammar.
//!
//! Every non-blank, non-comment line of a stack file has one of two shapes,
//! tried in this order:
//!
//! ```text
//! module:      [-]<phase> <control|[spec]> <module>.so [parameters...]
//! delegation:  <phase> <include|substack> <path>
//! ```
//!
//! Fields are separated by runs of spaces or tabs. The module token is the
//! longest stretch after the action that ends in `.so`, so it may contain
//! spaces, and a `.so` inside the arguments pulls them into the module.
//! Parameters are whatever follows, trimmed at both ends but otherwise kept
//! verbatim, so `uid >= 1000 quiet` survives with its inner spacing intact.
//!
//! The tokenizer is a tiny cursor over the trimmed line. Each shape is a
//! straight-line sequence of cursor calls that bails out with `None` as soon
//! as a field does not fit; `parse_line` picks the first shape that matches.

use crate::{Action, ControlFlag, Delegation, Directive, MODULE_SUFFIX, Phase};

/// A line that is neither a module nor a delegation directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed stack line: {text:?}")]
pub struct MalformedLine {
    /// The offending line, as it was given.
    pub text: String,
}

/// True for lines the resolver skips before parsing: empty after trimming,
/// or starting with `#` once leading whitespace is removed.
pub fn is_ignorable_line(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse one stack line into a [`Directive`].
///
/// # Example
/// ```
/// use pamstack::{Phase, parse_line};
///
/// let d = parse_line("auth sufficient pam_unix.so nullok try_first_pass").unwrap();
/// assert_eq!(d.phase(), Phase::Auth);
/// assert_eq!(d.module_name(), "pam_unix.so");
/// assert_eq!(d.parameters(), "nullok try_first_pass");
/// ```
pub fn parse_line(raw: &str) -> Result<Directive, MalformedLine> {
    let line = raw.trim();

    parse_module(line).or_else(|| parse_delegation(line)).ok_or_else(|| MalformedLine { text: raw.to_string() })
}

fn parse_module(line: &str) -> Option<Directive> {
    let mut cursor = Cursor::new(line);

    let silent = cursor.eat('-');
    let phase = Phase::from_keyword(cursor.word()?)?;
    cursor.separator()?;

    let action = if cursor.peek() == Some('[') {
        Action::Bracketed(cursor.bracketed()?.to_string())
    } else {
        Action::Control(ControlFlag::from_keyword(cursor.word()?)?)
    };
    cursor.separator()?;

    // Greedy: the module runs to the last `.so`, spaces included.
    let rest = cursor.rest();
    let end = rest.rfind(MODULE_SUFFIX)? + MODULE_SUFFIX.len();
    let (module, parameters) = rest.split_at(end);

    Directive::module(phase, action, module, parameters.trim(), silent)
}

fn parse_delegation(line: &str) -> Option<Directive> {
    let mut cursor = Cursor::new(line);

    let phase = Phase::from_keyword(cursor.word()?)?;
    cursor.separator()?;
    let kind = Delegation::from_keyword(cursor.word()?)?;
    cursor.separator()?;

    Directive::delegation(phase, kind, cursor.rest().trim())
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Forward-only view over the unconsumed part of a line.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Cursor { rest: line }
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Consume `c` if it is the next character.
    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Consume a non-empty run of separators.
    fn separator(&mut self) -> Option<()> {
        let trimmed = self.rest.trim_start_matches(is_separator);
        if trimmed.len() == self.rest.len() {
            return None;
        }
        self.rest = trimmed;
        Some(())
    }

    /// Consume a non-empty token up to the next separator or end of line.
    fn word(&mut self) -> Option<&'a str> {
        let end = self.rest.find(is_separator).unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }

    /// Consume `[ ... ]`, ending at the first `]` that is followed by a
    /// separator. The returned slice includes both brackets.
    fn bracketed(&mut self) -> Option<&'a str> {
        if !self.rest.starts_with('[') {
            return None;
        }

        let (close, _) = self
            .rest
            .match_indices(']')
            .find(|(idx, _)| self.rest[idx + 1..].chars().next().is_some_and(is_separator))?;

        let (spec, rest) = self.rest.split_at(close + 1);
        self.rest = rest;
        Some(spec)
    }

    fn rest(self) -> &'a str {
        self.rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_directive(d: &Directive, text: &str, silent: bool, phase: Phase, action: &str, module: &str, params: &str) {
        assert_eq!(d.canonical_text(), text);
        assert_eq!(d.silent(), silent);
        assert_eq!(d.phase(), phase);
        assert_eq!(d.action().as_str(), action);
        assert_eq!(d.module_name(), module);
        assert_eq!(d.parameters(), params);
    }

    #[test]
    fn module_line_with_parameters() {
        let d = parse_line("auth sufficient pam_unix.so nullok try_first_pass").unwrap();
        assert_directive(
            &d,
            "auth sufficient pam_unix.so nullok try_first_pass",
            false,
            Phase::Auth,
            "sufficient",
            "pam_unix.so",
            "nullok try_first_pass",
        );
        assert_eq!(d.action(), &Action::Control(ControlFlag::Sufficient));
    }

    #[test]
    fn silent_module_line() {
        let d = parse_line("-auth sufficient pam_sss.so forward_pass").unwrap();
        assert_directive(
            &d,
            "-auth sufficient pam_sss.so forward_pass",
            true,
            Phase::Auth,
            "sufficient",
            "pam_sss.so",
            "forward_pass",
        );
    }

    #[test]
    fn module_line_without_parameters() {
        let d = parse_line("auth sufficient pam_sss.so").unwrap();
        assert_directive(&d, "auth sufficient pam_sss.so", false, Phase::Auth, "sufficient", "pam_sss.so", "");
    }

    #[test]
    fn bracketed_action_is_kept_verbatim() {
        let d = parse_line("auth [default=1 ignore=ignore success=ok] pam_succeed_if.so uid >= 1000 quiet").unwrap();
        assert_directive(
            &d,
            "auth [default=1 ignore=ignore success=ok] pam_succeed_if.so uid >= 1000 quiet",
            false,
            Phase::Auth,
            "[default=1 ignore=ignore success=ok]",
            "pam_succeed_if.so",
            "uid >= 1000 quiet",
        );
        assert!(matches!(d.action(), Action::Bracketed(_)));
    }

    #[test]
    fn irregular_spacing_is_normalized_outside_parameters() {
        let d = parse_line(" auth   sufficient    pam_sss.so \tforward_pass ").unwrap();
        assert_eq!(d.canonical_text(), "auth sufficient pam_sss.so forward_pass");

        let d = parse_line("password\trequisite\tpam_pwquality.so  retry=3   local_users_only").unwrap();
        assert_eq!(d.parameters(), "retry=3   local_users_only");
        assert_eq!(d.canonical_text(), "password requisite pam_pwquality.so retry=3   local_users_only");
    }

    #[test]
    fn canonical_text_reparses_to_the_same_directive() {
        let lines = [
            "-session   optional pam_systemd.so",
            "auth [success=done  default=ignore]\tpam_localuser.so   a  b",
            "account required /usr/lib64/security/pam_unix.so broken_shadow",
            "auth required /opt/my dir/pam_x.so  arg",
            "auth required pam_x.sox",
        ];

        for line in lines {
            let first = parse_line(line).unwrap();
            let second = parse_line(first.canonical_text()).unwrap();
            assert_eq!(first, second, "{line}");
        }
    }

    #[test]
    fn delegation_lines() {
        let d = parse_line("account include system-auth").unwrap();
        assert_eq!(d.delegation_kind(), Some(Delegation::Include));
        assert_eq!(d.module_name(), "system-auth");
        assert_eq!(d.parameters(), "");
        assert!(!d.silent());

        let d = parse_line("auth\tsubstack   /etc/other-pam.d/substack  ").unwrap();
        assert_eq!(d.delegation_kind(), Some(Delegation::Substack));
        assert_eq!(d.module_name(), "/etc/other-pam.d/substack");
        assert_eq!(d.canonical_text(), "auth substack /etc/other-pam.d/substack");
    }

    #[test]
    fn delegation_path_may_contain_spaces() {
        let d = parse_line("session include my stack file").unwrap();
        assert_eq!(d.module_name(), "my stack file");
    }

    #[test]
    fn silent_delegation_is_malformed() {
        assert!(parse_line("-auth include system-auth").is_err());
    }

    #[test]
    fn invalid_phase_and_action_are_malformed() {
        let err = parse_line("authentication sufficient pam_sss.so forward_pass").unwrap_err();
        assert_eq!(err.text, "authentication sufficient pam_sss.so forward_pass");

        assert!(parse_line("auth bad pam_sss.so forward_pass").is_err());
        assert!(parse_line("Auth required pam_sss.so").is_err());
    }

    #[test]
    fn module_without_suffix_is_malformed() {
        assert!(parse_line("auth required pam_unix").is_err());
        assert!(parse_line("auth required pam_unix.s nullok").is_err());
    }

    #[test]
    fn module_path_may_contain_spaces() {
        let d = parse_line("auth required /opt/my dir/pam_x.so arg").unwrap();
        assert_directive(&d, "auth required /opt/my dir/pam_x.so arg", false, Phase::Auth, "required", "/opt/my dir/pam_x.so", "arg");
    }

    #[test]
    fn module_token_ends_at_the_last_suffix() {
        let d = parse_line("auth required pam_unix.sox nullok").unwrap();
        assert_eq!(d.module_name(), "pam_unix.so");
        assert_eq!(d.parameters(), "x nullok");

        let d = parse_line("auth required pam_x.so file=/lib/foo.so").unwrap();
        assert_eq!(d.module_name(), "pam_x.so file=/lib/foo.so");
        assert_eq!(d.parameters(), "");

        let d = parse_line("session optional pam_x.so a=/lib/b.so  quiet").unwrap();
        assert_eq!(d.module_name(), "pam_x.so a=/lib/b.so");
        assert_eq!(d.parameters(), "quiet");
    }

    #[test]
    fn incomplete_lines_are_malformed() {
        assert!(parse_line("auth required").is_err());
        assert!(parse_line("auth include").is_err());
        assert!(parse_line("auth [default=die pam_deny.so").is_err());
        assert!(parse_line("").is_err());
        assert!(parse_line("# auth required pam_deny.so").is_err());
    }

    #[test]
    fn ignorable_lines() {
        assert!(is_ignorable_line(""));
        assert!(is_ignorable_line("   \t"));
        assert!(is_ignorable_line("# comment"));
        assert!(is_ignorable_line("   #auth required pam_deny.so"));
        assert!(!is_ignorable_line("auth required pam_deny.so # trailing"));
    }
}
