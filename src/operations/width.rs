use crate::graph::EdgeTags;

/// Lane width of a highway class.
fn lane_width(highway: Option<&str>) -> f64 {
    match highway {
        Some("motorway" | "trunk") => 3.5,
        Some("primary" | "secondary") | None => 3.0,
        Some("service") => 2.25,
        Some(_) => 2.75,
    }
}

/// Reads a width tag written as a plain decimal: an optional minus sign,
/// digits, then an optional fraction.
fn parse_plain_decimal(text: &str) -> Option<f64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || fraction.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    text.parse().ok().filter(|w: &f64| w.is_finite())
}

/// Estimates the carriageway width of a road edge from its tags.
///
/// An explicit decimal `width` tag wins. Otherwise the lane count (the
/// `lanes` tag, or 1 for one-way roads and 2 for two-way roads) is multiplied
/// by the lane width of the highway class. A cycle track counts as one more
/// lane and a painted cycle lane adds a flat metre.
#[must_use]
pub fn evaluate_width_way(tags: &EdgeTags) -> f64 {
    if let Some(width) = tags.width.as_deref().and_then(parse_plain_decimal) {
        return width;
    }

    let mut lanes = tags.lanes.unwrap_or(if tags.oneway { 1 } else { 2 });
    if tags.has_cycle_track() {
        lanes += 1;
    }
    let mut width = f64::from(lanes) * lane_width(tags.highway.as_deref());
    if tags.has_cycle_lane() {
        width += 1.0;
    }
    width
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn motorway_two_way_default() {
        assert_relative_eq!(evaluate_width_way(&EdgeTags::highway("motorway")), 7.0);
    }

    #[test]
    fn cycle_lane_adds_one_metre() {
        let mut tags = EdgeTags::highway("motorway");
        tags.cycleway_left = Some("lane".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), 8.0);
    }

    #[test]
    fn cycle_track_adds_a_lane() {
        let mut tags = EdgeTags::highway("service");
        tags.cycleway = Some("track".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), 3.0 * 2.25);
    }

    #[test]
    fn explicit_width_and_lanes() {
        let mut tags = EdgeTags::highway("primary");
        tags.lanes = Some(3);
        assert_relative_eq!(evaluate_width_way(&tags), 9.0);
        tags.width = Some("12.5".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), 12.5);
        tags.width = Some("wide".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), 9.0);
    }

    #[test]
    fn width_tag_must_be_a_plain_decimal() {
        let mut tags = EdgeTags::highway("primary");
        for rejected in ["1e3", "+5", " 7 ", "7.", ".5", "inf", "NaN", "-"] {
            tags.width = Some(rejected.to_owned());
            assert_relative_eq!(evaluate_width_way(&tags), 6.0);
        }
        tags.width = Some("7".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), 7.0);
        tags.width = Some("-0.25".to_owned());
        assert_relative_eq!(evaluate_width_way(&tags), -0.25);
    }

    #[test]
    fn oneway_and_untagged() {
        let mut tags = EdgeTags::highway("residential");
        tags.oneway = true;
        assert_relative_eq!(evaluate_width_way(&tags), 2.75);
        assert_relative_eq!(evaluate_width_way(&EdgeTags::default()), 6.0);
    }
}
