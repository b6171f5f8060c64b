use challenge_table::{map_columns, resolve_header, CellMatrix, ColumnMap, DayColumn, HeaderLocation};

fn header_page() -> CellMatrix {
    CellMatrix::from_rows(vec![
        vec!["Preservative Efficacy Test Report", "", "", "", "", "", "", "", ""],
        vec![
            "Bulk Name",
            "Challenged Organism",
            "Specification",
            "Day 0",
            "Day 7",
            "Day 14",
            "Day 28",
            "Judgment",
            "Final Judgment",
        ],
        vec!["25E15I14 GB1919-ZMB", "E.coli", "SI", "5.0×10^5", "<10", "<10", "<10", "O", "O"],
    ])
}

#[test]
fn header_found_by_structural_keyword() {
    let m = header_page();
    assert_eq!(resolve_header(&m), HeaderLocation::Row(1));
    assert_eq!(HeaderLocation::Row(1).data_start(), Some(2));
}

#[test]
fn header_keywords_map_every_role() {
    let m = header_page();
    let cols = map_columns(&m, HeaderLocation::Row(1));
    assert_eq!(
        cols,
        ColumnMap {
            bulk_name: 0,
            strain: Some(1),
            specification: Some(2),
            cfu_day0: Some(3),
            cfu_day7: Some(4),
            cfu_day14: Some(5),
            cfu_day28: Some(6),
            judgment: Some(7),
            final_judgment: Some(8),
        }
    );
    assert_eq!(cols.cfu(DayColumn::Day14), Some(5));
}

#[test]
fn strain_keyword_row_without_values_is_header() {
    let m = CellMatrix::from_rows(vec![
        vec!["", "균주", "0일", "7일", "14일", "28일", "판정"],
        vec!["25E15I14", "E.coli", "5.0×10^5", "<10", "<10", "<10", "O"],
    ]);
    assert_eq!(resolve_header(&m), HeaderLocation::Row(0));

    let cols = map_columns(&m, HeaderLocation::Row(0));
    assert_eq!(cols.strain, Some(1));
    assert_eq!(cols.cfu_day0, Some(2));
    assert_eq!(cols.cfu_day7, Some(3));
    assert_eq!(cols.cfu_day14, Some(4));
    assert_eq!(cols.cfu_day28, Some(5));
    assert_eq!(cols.judgment, Some(6));
    // positional fill: the column after judgment
    assert_eq!(cols.final_judgment, Some(7));
}

#[test]
fn strain_row_with_values_means_no_header() {
    let m = CellMatrix::from_rows(vec![
        vec!["25E15I14 GB1919-ZMB", "E.coli", "SI", "7.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "P.aeruginosa", "SI", "5.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "S.aureus", "SI", "4.0×10^5", "40", "<10", "<10", "O"],
    ]);
    let header = resolve_header(&m);
    assert_eq!(header, HeaderLocation::NoHeader { first_data_row: 0 });
    assert_eq!(header.data_start(), Some(0));

    let cols = map_columns(&m, header);
    assert_eq!(cols.bulk_name, 0);
    assert_eq!(cols.strain, Some(1));
    assert_eq!(cols.specification, Some(2), "three SI cells make a specification column");
    assert_eq!(cols.cfu_day0, Some(3));
    assert_eq!(cols.cfu_day28, Some(6));
    assert_eq!(cols.judgment, Some(7));
}

#[test]
fn too_few_spec_shaped_cells_leave_no_spec_column() {
    let m = CellMatrix::from_rows(vec![
        vec!["25E15I14", "E.coli", "7.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "P.aeruginosa", "5.0×10^5", "<10", "<10", "<10", "O"],
    ]);
    let cols = map_columns(&m, HeaderLocation::NoHeader { first_data_row: 0 });
    assert_eq!(cols.specification, None);
    assert_eq!(cols.cfu_day0, Some(2));
    assert_eq!(cols.cfu_day7, Some(3));
    assert_eq!(cols.judgment, Some(6));
}

#[test]
fn long_number_marks_a_data_row() {
    let m = CellMatrix::from_rows(vec![vec!["E.coli", "700000", "<10"]]);
    assert_eq!(resolve_header(&m), HeaderLocation::NoHeader { first_data_row: 0 });
}

#[test]
fn prose_page_has_no_table() {
    let m = CellMatrix::from_rows(vec![vec!["Certificate of analysis"], vec!["Approved by QA"]]);
    let header = resolve_header(&m);
    assert_eq!(header, HeaderLocation::NotFound);
    assert_eq!(header.data_start(), None);
    assert_eq!(map_columns(&m, header), ColumnMap::default());
}

#[test]
fn empty_matrix_has_no_table() {
    assert_eq!(resolve_header(&CellMatrix::new()), HeaderLocation::NotFound);
}

#[test]
fn header_location_serializes_with_kind_tag() {
    let v = serde_json::to_value(HeaderLocation::Row(3)).unwrap();
    assert_eq!(v, serde_json::json!({"kind": "row", "row": 3}));
    let v = serde_json::to_value(HeaderLocation::NoHeader { first_data_row: 2 }).unwrap();
    assert_eq!(v, serde_json::json!({"kind": "no_header", "row": {"first_data_row": 2}}));
    let v = serde_json::to_value(HeaderLocation::NotFound).unwrap();
    assert_eq!(v, serde_json::json!({"kind": "not_found"}));
}

#[test]
fn leading_date_row_before_headerless_data() {
    let m = CellMatrix::from_rows(vec![
        vec!["", "01 15", "01 22", "01 29", "02 12"],
        vec!["25E15I14 GB1919-ZMB", "E.coli", "7.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "P.aeruginosa", "5.0×10^5", "<10", "<10", "<10", "O"],
    ]);
    let header = resolve_header(&m);
    assert_eq!(header, HeaderLocation::NoHeader { first_data_row: 1 });
    assert_eq!(header.data_start(), Some(0));

    let cols = map_columns(&m, header);
    assert_eq!(cols.strain, Some(1));
    assert_eq!(cols.cfu_day0, Some(2));
    assert_eq!(cols.judgment, Some(6));
}

#[test]
fn abbreviated_strain_spellings_are_recognized() {
    let m = CellMatrix::from_rows(vec![
        vec!["25E15I14", "E. coli", "7.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "P. aeruginosa", "5.0×10^5", "<10", "<10", "<10", "O"],
        vec!["", "S. aureus", "4.0×10^5", "<10", "<10", "<10", "O"],
    ]);
    let header = resolve_header(&m);
    assert_eq!(header, HeaderLocation::NoHeader { first_data_row: 0 });
    assert_eq!(map_columns(&m, header).strain, Some(1));
}

#[test]
fn bulk_name_stays_in_first_column() {
    let m = CellMatrix::from_rows(vec![vec!["No.", "Challenged Organism", "Bulk Name", "Day 0", "Day 7", "Day 14", "Day 28"]]);
    let cols = map_columns(&m, HeaderLocation::Row(0));
    assert_eq!(cols.bulk_name, 0);
    assert_eq!(cols.strain, Some(1));
}
