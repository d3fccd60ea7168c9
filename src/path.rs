use bevy::log::warn;

/// One `member` or `member[index]` segment of a property path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    pub member: String,
    pub index: Option<usize>,
}

impl PathStep {
    pub fn member(name: &str) -> Self {
        Self {
            member: name.to_string(),
            index: None,
        }
    }

    pub fn indexed(name: &str, index: usize) -> Self {
        Self {
            member: name.to_string(),
            index: Some(index),
        }
    }
}

/// Splits `a.b[2].c` into steps. Dots inside brackets do not split.
///
/// A bracket group that never closes, or that holds anything but a
/// non-negative integer, leaves the step without an index; navigation then
/// reports the member as missing or not indexable.
pub fn parse(path: &str) -> Vec<PathStep> {
    split_segments(path)
        .into_iter()
        .map(parse_segment)
        .collect()
}

fn split_segments(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    for (i, c) in path.char_indices() {
        match c {
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            '.' if !in_brackets => {
                parts.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < path.len() {
        parts.push(&path[start..]);
    }
    parts
}

fn parse_segment(segment: &str) -> PathStep {
    let Some(open) = segment.find('[') else {
        return PathStep::member(segment);
    };
    let name = &segment[..open];
    let Some(close) = segment[open..].find(']').map(|offset| open + offset) else {
        warn!("[Axiom inspect] Unclosed index in path segment '{segment}', ignoring index");
        return PathStep::member(name);
    };
    match segment[open + 1..close].trim().parse::<usize>() {
        Ok(index) => PathStep::indexed(name, index),
        Err(_) => {
            warn!("[Axiom inspect] Invalid index in path segment '{segment}', ignoring index");
            PathStep::member(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_member() {
        assert_eq!(parse("speed"), vec![PathStep::member("speed")]);
    }

    #[test]
    fn dotted_and_indexed_steps() {
        assert_eq!(
            parse("materials[1].color.r"),
            vec![
                PathStep::indexed("materials", 1),
                PathStep::member("color"),
                PathStep::member("r"),
            ]
        );
    }

    #[test]
    fn dots_inside_brackets_do_not_split() {
        let steps = parse("slots[1.5].value");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], PathStep::member("slots"));
        assert_eq!(steps[1], PathStep::member("value"));
    }

    #[test]
    fn empty_path_has_no_steps() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn malformed_indices_fall_back_to_plain_member() {
        assert_eq!(parse("items[x]"), vec![PathStep::member("items")]);
        assert_eq!(parse("items[-1]"), vec![PathStep::member("items")]);
        assert_eq!(parse("items[2"), vec![PathStep::member("items")]);
    }

    #[test]
    fn trailing_dot_is_dropped() {
        assert_eq!(parse("position."), vec![PathStep::member("position")]);
    }
}
