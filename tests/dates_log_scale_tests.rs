use challenge_table::dates::{correct_decimal_misread, parse_consecutive_dates, parse_date_cell};
use challenge_table::{extract_dates, extract_dates_with, to_log10, CellMatrix, DateBlock, DateSource};

#[test]
fn four_dates_in_one_row_are_read_as_is() {
    let m = CellMatrix::from_rows(vec![
        vec!["Test period", "01 15", "01 22", "01 29", "02 12"],
        vec!["Bulk Name", "Challenged Organism"],
    ]);
    let block = extract_dates(&m);
    assert_eq!(
        block,
        DateBlock {
            day0: "01/15".into(),
            day7: "01/22".into(),
            day14: "01/29".into(),
            day28: "02/12".into(),
            source: DateSource::Explicit,
        }
    );
}

#[test]
fn explicit_dates_are_zero_padded() {
    let m = CellMatrix::from_rows(vec![vec!["3/1", "3-8", "3.15", "3/29"]]);
    let block = extract_dates(&m);
    assert_eq!(block.day0, "03/01");
    assert_eq!(block.day7, "03/08");
    assert_eq!(block.day14, "03/15");
    assert_eq!(block.day28, "03/29");
}

#[test]
fn single_start_date_derives_the_rest() {
    let m = CellMatrix::from_rows(vec![vec!["Start", "03/01"], vec!["Bulk Name"]]);
    let block = extract_dates(&m);
    assert_eq!(block.source, DateSource::Derived);
    assert_eq!((block.day0.as_str(), block.day7.as_str()), ("03/01", "03/08"));
    assert_eq!((block.day14.as_str(), block.day28.as_str()), ("03/15", "03/29"));
}

#[test]
fn derived_dates_cross_month_ends() {
    let m = CellMatrix::from_rows(vec![vec!["02/20"]]);
    let block = extract_dates_with(&m, 5, 2024);
    assert_eq!(block.day7, "02/27");
    // 2024 is a leap year
    assert_eq!(block.day14, "03/05");
    assert_eq!(block.day28, "03/19");

    let block = extract_dates_with(&m, 5, 2023);
    assert_eq!(block.day14, "03/06");
}

#[test]
fn consecutive_dates_in_one_cell() {
    let m = CellMatrix::from_rows(vec![vec!["01 15 01 22 01 29 02 12"]]);
    let block = extract_dates(&m);
    assert_eq!(block.source, DateSource::Explicit);
    assert_eq!(block.day28, "02/12");

    assert_eq!(parse_consecutive_dates("01 15 01 22"), None);
    assert_eq!(parse_consecutive_dates("01 15 01 22 01 29 02 1x"), None);
}

#[test]
fn decimal_misread_is_repaired() {
    assert_eq!(correct_decimal_misread("0.5 15"), "05 15");
    assert_eq!(parse_date_cell("0.5 15"), Some(("05".into(), "15".into())));
    assert_eq!(parse_date_cell("12.25"), Some(("12".into(), "25".into())));
    assert_eq!(parse_date_cell("<10"), None);
    assert_eq!(parse_date_cell("5.0×10^5"), None);
}

#[test]
fn invalid_start_date_is_skipped() {
    let m = CellMatrix::from_rows(vec![vec!["13/45", "04/02"]]);
    let block = extract_dates(&m);
    assert_eq!(block.day0, "04/02");
}

#[test]
fn dates_below_scan_rows_are_ignored() {
    let mut rows = vec![vec!["Bulk Name"]; 5];
    rows.push(vec!["03/01"]);
    let block = extract_dates(&CellMatrix::from_rows(rows));
    assert!(block.is_empty());
    assert_eq!(block, DateBlock::default());
}

#[test]
fn log10_of_limits() {
    assert_eq!(to_log10("<10"), "<1.0");
    assert_eq!(to_log10("<10^2"), "<2.0");
    assert_eq!(to_log10("<10^3"), "<3.0");
}

#[test]
fn log10_of_counts() {
    assert_eq!(to_log10("7.0×10^2"), "2.8");
    assert_eq!(to_log10("1.0×10^5"), "5.0");
    assert_eq!(to_log10("6.0×10^0"), "0.8");
    assert_eq!(to_log10("100"), "2.0");
}

#[test]
fn log10_leaves_unconvertible_text() {
    assert_eq!(to_log10(""), "");
    assert_eq!(to_log10("  "), "");
    assert_eq!(to_log10("TNTC"), "TNTC");
    assert_eq!(to_log10("0"), "0");
}
