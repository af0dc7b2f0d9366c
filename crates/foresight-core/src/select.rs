//! Arg-max selection shared by the planner and the greedy policy.

/// Index of the first maximum of `values`.
///
/// NaN entries never win. If every entry is NaN the result is `Some(0)`.
/// Returns `None` only for an empty input.
pub fn first_argmax<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f32>,
{
    let mut len = 0usize;
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        len += 1;
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    match best {
        Some((i, _)) => Some(i),
        None if len > 0 => Some(0),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn picks_maximum() {
        assert_eq!(first_argmax([1.0, 5.0, 3.0]), Some(1));
    }

    #[test]
    fn ties_go_to_first_index() {
        assert_eq!(first_argmax([2.0, 7.0, 7.0, 1.0, 7.0]), Some(1));
    }

    #[test]
    fn nan_never_wins() {
        assert_eq!(first_argmax([f32::NAN, 1.0, f32::NAN, 0.5]), Some(1));
    }

    #[test]
    fn all_nan_selects_zero() {
        assert_eq!(first_argmax([f32::NAN, f32::NAN]), Some(0));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(first_argmax(Vec::<f32>::new()), None);
    }

    #[test]
    fn negative_infinity_is_selectable() {
        assert_eq!(first_argmax([f32::NEG_INFINITY]), Some(0));
    }

    proptest! {
        #[test]
        fn selected_value_is_maximal_and_first(values in prop::collection::vec(-1e6f32..1e6, 1..64)) {
            let i = first_argmax(values.iter().copied()).unwrap();
            prop_assert!(values.iter().all(|&v| v <= values[i]));
            prop_assert!(values[..i].iter().all(|&v| v < values[i]));
        }
    }
}
