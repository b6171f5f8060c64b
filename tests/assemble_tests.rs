use challenge_table::{
    assemble, map_columns, order_by_strain_within_tests, resolve_header, CellMatrix, IdentifierContext, Judgment, Strain,
    TestRecord,
};

fn five_strain_page() -> CellMatrix {
    CellMatrix::from_rows(vec![
        vec!["Bulk Name", "Challenged Organism", "Specification", "Day 0", "Day 7", "Day 14", "Day 28", "Judgment", "Final Judgment"],
        vec!["25E15I14 GB1919-ZMB", "S.aureus", "SI", "5.0×10^5", "<10", "<10", "<10", "O", "O"],
        vec!["", "E.coli", "SI", "6.0x10 5", "CIO", "<10", "<10", "O", "O"],
        vec!["", "A.brasiliensis", "SI", "2.0×10^5", "2.0×10^4", "1.0×10^3", "<10", "X", "X"],
        vec!["", "P.aeruginosa", "SI", "4.0×10^5", "<10", "<10", "<10", "O", "O"],
        vec!["", "C.albicans", "SI", "3.0×10^5", "1.0X10 2", "<10", "<10", "O", "O"],
        vec!["Remarks: none", "", "", "", "", "", "", "", ""],
        vec!["25E15I15 GB2020-ABC", "E.coli", "SI", "7.0×10^5", "<10", "<10", "<10", "O", ""],
    ])
}

fn records_of(m: &CellMatrix) -> Vec<TestRecord> {
    let header = resolve_header(m);
    let cols = map_columns(m, header);
    assemble(m, &cols, header.data_start().unwrap())
}

#[test]
fn one_record_per_strain_row() {
    let records = records_of(&five_strain_page());
    assert_eq!(records.len(), 6);
}

#[test]
fn strains_reordered_within_test_group() {
    let records = records_of(&five_strain_page());
    let first: Vec<Strain> = records.iter().take(5).map(|r| r.strain).collect();
    assert_eq!(first, Strain::ALL.to_vec());
    assert!(records.iter().take(5).all(|r| r.test_number == "25E15I14"));
    assert!(records.iter().take(5).all(|r| r.prescription_number == "GB1919-ZMB"));

    let last = &records[5];
    assert_eq!(last.test_number, "25E15I15");
    assert_eq!(last.prescription_number, "GB2020-ABC");
    assert_eq!(last.strain, Strain::EColi);
}

#[test]
fn values_are_normalized_per_column() {
    let records = records_of(&five_strain_page());
    let ecoli = &records[0];
    assert_eq!(ecoli.cfu_day0, "6.0×10^5");
    assert_eq!(ecoli.cfu_day7, "<10^2");
    assert_eq!(ecoli.cfu_day14, "<10");

    let calbicans = records.iter().find(|r| r.strain == Strain::CAlbicans).unwrap();
    assert_eq!(calbicans.cfu_day7, "1.0×10^2");
}

#[test]
fn judgments_read_from_markers() {
    let records = records_of(&five_strain_page());
    let asp = records.iter().find(|r| r.strain == Strain::ABrasiliensis).unwrap();
    assert_eq!(asp.judgment, Judgment::Fail);
    assert_eq!(asp.final_judgment, Some(Judgment::Fail));

    assert_eq!(records[0].judgment, Judgment::Pass);
    assert_eq!(records[0].final_judgment, Some(Judgment::Pass));
    // blank final judgment cell
    assert_eq!(records[5].final_judgment, None);
}

#[test]
fn judgment_markers() {
    assert_eq!(Judgment::from_cell("O"), Judgment::Pass);
    assert_eq!(Judgment::from_cell(""), Judgment::Pass);
    assert_eq!(Judgment::from_cell("적합"), Judgment::Pass);
    assert_eq!(Judgment::from_cell("x"), Judgment::Fail);
    assert_eq!(Judgment::from_cell("×"), Judgment::Fail);
    assert_eq!(Judgment::from_cell("V"), Judgment::Fail);
    assert_eq!(Judgment::from_cell("부적합"), Judgment::Fail);
}

#[test]
fn blank_final_judgment_serializes_as_empty_string() {
    let records = records_of(&five_strain_page());
    let v = serde_json::to_value(&records[5]).unwrap();
    assert_eq!(v["final_judgment"], "");
    assert_eq!(v["judgment"], "pass");
    assert_eq!(v["strain"], "E.coli");

    let back: TestRecord = serde_json::from_value(v).unwrap();
    assert_eq!(back, records[5]);
}

#[test]
fn context_keeps_fields_not_replaced() {
    let ctx = IdentifierContext::default().advance("25E15I14 GB1919-ZMB");
    assert_eq!(ctx.test_number, "25E15I14");
    assert_eq!(ctx.prescription_number, "GB1919-ZMB");

    let ctx = ctx.advance("GB3030-XYZ");
    assert_eq!(ctx.test_number, "25E15I14");
    assert_eq!(ctx.prescription_number, "GB3030-XYZ");

    let ctx = ctx.advance("   ");
    assert_eq!(ctx.prescription_number, "GB3030-XYZ");

    let ctx = ctx.advance("see note");
    assert_eq!(ctx.test_number, "25E15I14");
}

#[test]
fn rows_before_first_identifier_have_empty_ids() {
    let m = CellMatrix::from_rows(vec![
        vec!["", "E.coli", "7.0×10^5", "<10", "<10", "<10", "O"],
        vec!["25E15I14", "P.aeruginosa", "5.0×10^5", "<10", "<10", "<10", "O"],
    ]);
    let records = records_of(&m);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].test_number, "");
    assert_eq!(records[1].test_number, "25E15I14");
}

#[test]
fn reorder_is_stable_and_keeps_groups_in_place() {
    let rec = |t: &str, s: Strain| TestRecord {
        test_number: t.into(),
        prescription_number: String::new(),
        strain: s,
        cfu_day0: String::new(),
        cfu_day7: String::new(),
        cfu_day14: String::new(),
        cfu_day28: String::new(),
        judgment: Judgment::Pass,
        final_judgment: None,
    };
    let mut records = vec![
        rec("B", Strain::SAureus),
        rec("B", Strain::EColi),
        rec("A", Strain::CAlbicans),
        rec("A", Strain::PAeruginosa),
    ];
    order_by_strain_within_tests(&mut records);
    let got: Vec<(&str, Strain)> = records.iter().map(|r| (r.test_number.as_str(), r.strain)).collect();
    assert_eq!(
        got,
        vec![("B", Strain::EColi), ("B", Strain::SAureus), ("A", Strain::PAeruginosa), ("A", Strain::CAlbicans)]
    );
}
