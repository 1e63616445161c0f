use super::*;

#[test]
fn bare_number_is_rejected() {
    assert!(parse_time("500").is_err());
    assert!(parse_time("").is_err());
    assert!(parse_time(".").is_err());
}

#[test]
fn full_timestamp_parses() {
    assert_eq!(parse_time("0:00:01.500").unwrap(), 1_500);
    assert_eq!(parse_time("1:02:03.004").unwrap(), 3_723_004);
    assert_eq!(parse_time("123:00:00.000").unwrap(), 123 * 3_600_000);
}

#[test]
fn shorter_forms_parse() {
    assert_eq!(parse_time("0:00.050").unwrap(), 50);
    assert_eq!(parse_time("2.5").unwrap(), 2_005);
    assert_eq!(parse_time("59.999").unwrap(), 59_999);
    assert_eq!(parse_time("5:07.25").unwrap(), 5 * 60_000 + 7_000 + 25);
}

#[test]
fn field_limits_are_enforced() {
    for bad in [
        "0:60:00.000",
        "0:00:60.000",
        "0:0:01.000",
        "0:00:1.000",
        "0:00:01.1234",
        "0:00:01.",
        "a:00:01.000",
        "0:00:00:01.000",
        "1:-1.000",
        "100.000",
    ] {
        assert!(parse_time(bad).is_err(), "{bad}");
    }
}

#[test]
fn format_then_parse_round_trips() {
    for ms in [0, 1, 999, 1_000, 59_999, 60_000, 3_599_999, 3_600_000, 36_000_123, 987_654_321] {
        let s = format_time(ms);
        assert_eq!(parse_time(&s).unwrap(), ms, "{s}");
    }
    assert_eq!(format_time(3_723_004), "1:02:03.004");
    for s in ["0:00:00.000", "7:59:59.999", "12:30:00.500"] {
        let ms = parse_time(s).unwrap();
        assert_eq!(parse_time(&format_time(ms)).unwrap(), ms);
    }
}
