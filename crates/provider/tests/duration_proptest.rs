//! Property tests for duration normalisation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use circonus_provider::duration;
use proptest::prelude::*;

fn go_duration() -> impl Strategy<Value = String> {
    (0_u64..48, 0_u64..120, 0_u64..120, 0_u64..1000).prop_map(|(h, m, s, ms)| {
        let mut out = String::new();
        if h > 0 {
            out.push_str(&format!("{h}h"));
        }
        if m > 0 {
            out.push_str(&format!("{m}m"));
        }
        out.push_str(&format!("{s}s"));
        if ms > 0 {
            out.push_str(&format!("{ms}ms"));
        }
        out
    })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(input in go_duration()) {
        let once = duration::normalize("period", &input).unwrap();
        let twice = duration::normalize("period", &once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_preserves_the_length(input in go_duration()) {
        let once = duration::normalize("period", &input).unwrap();
        prop_assert_eq!(
            duration::parse("period", &input).unwrap(),
            duration::parse("period", &once).unwrap()
        );
    }

    #[test]
    fn whole_seconds_render_as_seconds(seconds in 0_u64..100_000) {
        let rendered = duration::seconds_string(seconds);
        prop_assert_eq!(
            duration::parse_seconds("after", &rendered).unwrap(),
            seconds
        );
    }
}
