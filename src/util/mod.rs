use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn today_local() -> NaiveDate {
    // Browser runtime: chrono's wasmbind reads the JS clock and timezone.
    chrono::Local::now().date_naive()
}

/// `YYYY-MM-DD`, the format `<input type="date">` produces.
pub(crate) fn parse_exam_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub(crate) fn format_exam_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Optional free-text ids: blank means absent.
pub(crate) fn non_blank(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exam_date() {
        let d = parse_exam_date("2026-03-09").expect("valid date");
        assert_eq!(format_exam_date(d), "2026-03-09");
        assert!(parse_exam_date("").is_none());
        assert!(parse_exam_date("09/03/2026").is_none());
        assert!(parse_exam_date("2026-02-30").is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  nb-1 "), Some("nb-1".to_string()));
        assert_eq!(non_blank("   "), None);
    }
}
