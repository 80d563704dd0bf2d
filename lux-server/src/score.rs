/// Cap on the content-length contribution to a post's score
const CONTENT_FACTOR_CAP: f64 = 10.0;

/// Cap on the comment-count contribution to a post's score
const COMMENT_FACTOR_CAP: i64 = 10;

/// Compute the ranking score for a post from its engagement counts.
///
/// ```text
/// base           = likes * 2 + investment * 3
/// content_factor = min(chars(content) / 100, 10)
/// comment_factor = min(comment_count, 10)
/// score          = base + content_factor + comment_factor
/// ```
///
/// Content length is measured in characters, not bytes. Negative counter
/// inputs are clamped to zero so the function stays total.
///
/// # Examples
///
/// ```
/// use lux_server::score::compute_score;
/// assert_eq!(compute_score(5, 0, "", 0), 10.0);
/// assert_eq!(compute_score(0, 2, "", 0), 6.0);
/// ```
pub fn compute_score(likes: i64, investment: i64, content: &str, comment_count: i64) -> f64 {
    let likes = likes.max(0);
    let investment = investment.max(0);
    let comment_count = comment_count.max(0);

    let base = (likes * 2 + investment * 3) as f64;
    let content_factor = (content.chars().count() as f64 / 100.0).min(CONTENT_FACTOR_CAP);
    let comment_factor = comment_count.min(COMMENT_FACTOR_CAP) as f64;

    base + content_factor + comment_factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_zero_inputs_score_zero() {
        assert_eq!(compute_score(0, 0, "", 0), 0.0);
    }

    #[test]
    fn test_likes_weigh_double() {
        assert_eq!(compute_score(5, 0, "", 0), 10.0);
    }

    #[test]
    fn test_investment_weighs_triple() {
        assert_eq!(compute_score(0, 2, "", 0), 6.0);
    }

    #[test]
    fn test_content_factor_is_fractional() {
        let content = "a".repeat(50);
        assert_eq!(compute_score(0, 0, &content, 0), 0.5);
    }

    #[test]
    fn test_content_factor_saturates_at_ten() {
        let at_cap = "a".repeat(1000);
        let far_past_cap = "a".repeat(10_000);
        assert_eq!(compute_score(0, 0, &at_cap, 0), 10.0);
        assert_eq!(
            compute_score(0, 0, &at_cap, 0),
            compute_score(0, 0, &far_past_cap, 0)
        );
    }

    #[test]
    fn test_content_length_counts_characters_not_bytes() {
        // 100 snowmen are 300 bytes but exactly 100 characters
        let content = "☃".repeat(100);
        assert_eq!(compute_score(0, 0, &content, 0), 1.0);
    }

    #[test]
    fn test_comment_factor_saturates_at_ten() {
        assert_eq!(compute_score(0, 0, "", 10), 10.0);
        assert_eq!(compute_score(0, 0, "", 11), 10.0);
        assert_eq!(compute_score(3, 1, "", 10), compute_score(3, 1, "", 250));
    }

    #[test]
    fn test_all_terms_combine() {
        let content = "a".repeat(200);
        // 4*2 + 1*3 + 2.0 + 3 = 16.0
        assert_eq!(compute_score(4, 1, &content, 3), 16.0);
    }

    #[test]
    fn test_negative_counters_clamp_to_zero() {
        assert_eq!(compute_score(-5, -3, "", -1), 0.0);
    }

    proptest! {
        #[test]
        fn prop_deterministic(likes in 0i64..10_000, investment in 0i64..10_000, comments in 0i64..10_000, content in ".{0,300}") {
            prop_assert_eq!(
                compute_score(likes, investment, &content, comments),
                compute_score(likes, investment, &content, comments)
            );
        }

        #[test]
        fn prop_monotonic_in_likes(likes in 0i64..10_000, investment in 0i64..10_000, comments in 0i64..100, content in ".{0,300}") {
            let before = compute_score(likes, investment, &content, comments);
            let after = compute_score(likes + 1, investment, &content, comments);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_monotonic_in_investment(likes in 0i64..10_000, investment in 0i64..10_000, comments in 0i64..100, content in ".{0,300}") {
            let before = compute_score(likes, investment, &content, comments);
            let after = compute_score(likes, investment + 1, &content, comments);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_monotonic_in_comments(likes in 0i64..10_000, investment in 0i64..10_000, comments in 0i64..100, content in ".{0,300}") {
            let before = compute_score(likes, investment, &content, comments);
            let after = compute_score(likes, investment, &content, comments + 1);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_monotonic_in_content_length(likes in 0i64..10_000, investment in 0i64..10_000, comments in 0i64..100, len in 0usize..2000) {
            let shorter = "a".repeat(len);
            let longer = "a".repeat(len + 1);
            let before = compute_score(likes, investment, &shorter, comments);
            let after = compute_score(likes, investment, &longer, comments);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_score_never_negative(likes in -100i64..10_000, investment in -100i64..10_000, comments in -100i64..10_000, content in ".{0,300}") {
            prop_assert!(compute_score(likes, investment, &content, comments) >= 0.0);
        }
    }
}
