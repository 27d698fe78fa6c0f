pub fn check_control_leading_trailing<G>(
    given: G,
    max_chars: Option<usize>
) -> bool
where
    G: AsRef<str>
{
    let given_ref = given.as_ref();
    let mut iter = given_ref.chars();
    let mut char_count = 0;

    if let Some(ch) = iter.next() {
        char_count += 1;

        if ch.is_control() || ch.is_whitespace() {
            return false
        }
    }

    // check for trailing whitespace/control
    if let Some(ch) = iter.next_back() {
        char_count += 1;

        if ch.is_control() || ch.is_whitespace() {
            return false
        }
    }

    for ch in iter {
        if ch.is_control() {
            return false;
        }

        char_count += 1;
    }

    match max_chars {
        Some(max) => char_count <= max,
        None => true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn control_leading_trailing() {
        let valid = [
            "a",
            "Reports",
            "quarterly summary",
            "notes 😌",
        ];

        for test in valid {
            assert!(check_control_leading_trailing(test, Some(32)), "valid string failed {:?}", test);
        }

        let invalid = [
            " leading",
            "trailing ",
            "\tleading_tab",
            "middle\ncontrol",
        ];

        for test in invalid {
            assert!(!check_control_leading_trailing(test, Some(32)), "invalid string failed {:?}", test);
        }

        let too_long = "a".repeat(33);

        assert!(!check_control_leading_trailing(&too_long, Some(32)));
        assert!(check_control_leading_trailing(&too_long, None));
    }
}
