/// Split plan text into its ordered steps.
///
/// Lines that are blank after trimming are dropped, so runs of blank lines
/// collapse. Retained lines keep their text as written (minus a trailing
/// `\r`), because a step is also its cache key.
#[must_use]
pub fn split_plan_steps(plan: &str) -> Vec<&str> {
    plan.trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(split_plan_steps("a\n\nb\nc\n\n\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_crlf_and_whitespace_lines() {
        assert_eq!(
            split_plan_steps("Paragraph 1 - intro\r\n   \r\nParagraph 2 - body\r\n"),
            vec!["Paragraph 1 - intro", "Paragraph 2 - body"]
        );
    }

    #[test]
    fn test_inner_lines_kept_verbatim() {
        assert_eq!(
            split_plan_steps("\n\n1. first\n   2. nested \n3. last  \n\n"),
            vec!["1. first", "   2. nested ", "3. last"]
        );
    }

    #[test]
    fn test_empty_plan_has_no_steps() {
        assert!(split_plan_steps("").is_empty());
        assert!(split_plan_steps(" \n\n \t\n").is_empty());
    }

    proptest! {
        #[test]
        fn prop_steps_are_single_nonblank_lines(lines in proptest::collection::vec("[a-z ]{0,8}", 0..20)) {
            let plan = lines.join("\n");
            let steps = split_plan_steps(&plan);
            let expected = lines.iter().filter(|l| !l.trim().is_empty()).count();
            prop_assert_eq!(steps.len(), expected);
            for step in steps {
                prop_assert!(!step.trim().is_empty());
                prop_assert!(!step.contains('\n'));
            }
        }
    }
}
