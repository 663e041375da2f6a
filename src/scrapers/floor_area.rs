use regex::Regex;
use std::sync::LazyLock;

/// A number followed by a square-meter unit. Tesseract tends to read the
/// superscript in "m²" as "?", so "m?" counts as a unit too.
static AREA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.]+)\s?(?:sq\.?\s?m\.?|m\?)").expect("floor area pattern is valid")
});

/// Largest square-meter figure found in floor-plan OCR text, or 0.0.
///
/// Floor plans list one area per room plus a total; the total is the
/// largest number, so that is the one returned.
pub fn extract_floor_area(text: &str) -> f64 {
    AREA_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .fold(None, |max: Option<f64>, value| match max {
            Some(current) if current >= value => Some(current),
            _ => Some(value),
        })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR_PLAN_TEXT: &str = "
BEDROOM IS Al

14°6 x 9'4
4.4m x 2.8m = kK N

LOUNGE/DINER/KITCHEN
30'5 x 17'3
9.3m x 5.3m
BEDROOM
178 x 11'8
5.4m x 3.6m
1ST FLOOR

APPROX. FLOOR
AREA 523 SQ.FT.
(48.6 SQ.M.)

GROUND FLOOR
APPROX. FLOOR
AREA 570 SQ.FT.
(63.0 SQ.M.)
TOTAL APPROX. FLOOR AREA 1093 SQ.FT. (101.6 SQ.M.)
Whilst every attempt has been made to ensure the accuracy of the floor plan contained here, measurements
of doors, windows, rooms and any other items are approximate and no responsibility is taken for any error,
Made with Metropi 2015,
";

    #[test]
    fn picks_total_area_from_floor_plan() {
        assert_eq!(extract_floor_area(FLOOR_PLAN_TEXT), 101.6);
    }

    #[test]
    fn no_match_is_zero() {
        assert_eq!(extract_floor_area(""), 0.0);
        assert_eq!(extract_floor_area("4.4m x 2.8m, 523 SQ.FT."), 0.0);
    }

    #[test]
    fn accepts_ocr_mangled_unit() {
        assert_eq!(extract_floor_area("Total 72.5 m? approx"), 72.5);
        assert_eq!(extract_floor_area("Total 72.5m?"), 72.5);
    }

    #[test]
    fn accepts_unit_spellings() {
        assert_eq!(extract_floor_area("12 sqm"), 12.0);
        assert_eq!(extract_floor_area("12.5 sq m"), 12.5);
        assert_eq!(extract_floor_area("13 Sq.M"), 13.0);
    }

    #[test]
    fn skips_unparseable_numbers() {
        assert_eq!(extract_floor_area(".. sq.m. and 1.2.3 sqm"), 0.0);
        assert_eq!(extract_floor_area(". sqm then 40 sqm"), 40.0);
    }

    #[test]
    fn returns_maximum_of_all_mentions() {
        assert_eq!(extract_floor_area("10 sqm 55.5 sqm 30 sqm"), 55.5);
    }
}
