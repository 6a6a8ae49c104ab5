//! Lookup by `(phase, module)` over a resolved stack.

use super::stack::DirectiveList;
use crate::{Directive, Phase};

/// Linear scan in stack order; the first exact (case-sensitive) match wins.
pub(crate) fn find_directive<'a>(stack: &'a DirectiveList, phase: Phase, module: &str) -> Option<&'a Directive> {
    let found = stack.iter().find(|d| d.phase() == phase && d.module_name() == module);

    log::trace!("[lookup] phase={} module={} found={}", phase, module, found.is_some());

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_line;

    fn stack() -> DirectiveList {
        [
            "account required pam_unix.so",
            "auth sufficient pam_unix.so nullok",
            "password requisite pam_pwquality.so try_first_pass local_users_only",
            "password sufficient pam_unix.so sha512",
            "auth required pam_unix.so second",
        ]
        .iter()
        .map(|l| parse_line(l).unwrap())
        .collect()
    }

    #[test]
    fn returns_first_match_in_stack_order() {
        let stack = stack();
        let d = find_directive(&stack, Phase::Auth, "pam_unix.so").unwrap();
        assert_eq!(d.parameters(), "nullok");
    }

    #[test]
    fn matches_phase_and_module_together() {
        let stack = stack();
        let d = find_directive(&stack, Phase::Password, "pam_pwquality.so").unwrap();
        assert_eq!(d.parameters(), "try_first_pass local_users_only");

        assert!(find_directive(&stack, Phase::Session, "pam_unix.so").is_none());
        assert!(find_directive(&stack, Phase::Password, "pam_sss.so").is_none());
    }

    #[test]
    fn module_match_is_exact() {
        let stack = stack();
        assert!(find_directive(&stack, Phase::Auth, "PAM_UNIX.SO").is_none());
        assert!(find_directive(&stack, Phase::Auth, "pam_unix").is_none());
    }
}
