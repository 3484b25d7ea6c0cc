//! Small shared helpers for the object model.

/// Splits a name into its trailing run of ASCII digits and the text before
/// it, so names can be ordered the way a human expects: `Thm9` before
/// `Thm10`, rather than lexicographically (`Thm10` before `Thm9`).
pub fn numbered_name_key(name: &str) -> (&str, Option<u64>) {
    let digit_start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    match digit_start {
        Some(i) if i < name.len() => {
            let (prefix, digits) = name.split_at(i);
            (prefix, digits.parse::<u64>().ok())
        }
        _ => (name, None),
    }
}

pub fn numbered_name_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let (pa, na) = numbered_name_key(a);
    let (pb, nb) = numbered_name_key(b);
    pa.cmp(pb).then_with(|| na.cmp(&nb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thm9_sorts_before_thm10() {
        let mut names = vec!["Thm10", "Thm2", "Thm9", "Thm1"];
        names.sort_by(|a, b| numbered_name_cmp(a, b));
        assert_eq!(names, vec!["Thm1", "Thm2", "Thm9", "Thm10"]);
    }
}
