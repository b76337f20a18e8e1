use super::*;
use crate::db::memory::MemoryStore;
use records::Page;

fn detail(result: Result<Vec<LegacyRow>, LegacyError>) -> String {
    result.unwrap_err().to_string()
}

#[test]
fn well_formed_csv_parses_every_row() {
    let rows = parse_legacy("book.csv", b"PD,LGD,EAD\n0.1,0.2,100\n0.05,0.15,200").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].raw_pd, "0.1");
    assert!((rows[1].ead - 200.0).abs() < f64::EPSILON);
}

#[test]
fn extra_columns_are_ignored() {
    let rows = parse_legacy("book.csv", b"Name,EAD,LGD,PD\nx,10,0.5,0.5\n").unwrap();
    assert_eq!(rows[0].raw_ead, "10");
}

#[test]
fn unsupported_extension_is_rejected() {
    assert_eq!(
        detail(parse_legacy("book.txt", b"PD,LGD,EAD\n")),
        "Unsupported file type; must be CSV or Excel"
    );
}

#[test]
fn missing_columns_are_listed_in_fixed_order() {
    assert_eq!(detail(parse_legacy("book.csv", b"EAD\n100\n")), "Missing columns: PD, LGD");
    assert_eq!(detail(parse_legacy("book.csv", b"PD,LGD\n0.1,0.2\n")), "Missing columns: EAD");
}

#[test]
fn empty_cells_are_null_values() {
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\n0.1,0.2,100\n0.1,,100\n")),
        "Null values found in required columns"
    );
}

#[test]
fn null_check_runs_before_numeric_check() {
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\nabc,0.2,100\n0.1,0.2,\n")),
        "Null values found in required columns"
    );
}

#[test]
fn non_numeric_values_are_rejected() {
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\nhigh,0.2,100\n")),
        "PD, LGD, and EAD values must be numeric"
    );
}

#[test]
fn non_finite_values_are_not_numeric() {
    for ead in ["inf", "-inf", "infinity", "NaN"] {
        let csv = format!("PD,LGD,EAD\n0.1,0.2,{ead}\n");
        assert_eq!(
            detail(parse_legacy("book.csv", csv.as_bytes())),
            "PD, LGD, and EAD values must be numeric",
            "EAD {ead}"
        );
    }
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\ninf,0.2,100\n")),
        "PD, LGD, and EAD values must be numeric"
    );
}

#[test]
fn out_of_range_values_report_the_parsed_value() {
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\n1.5,0.2,100\n")),
        "PD must be between 0 and 1, got 1.5"
    );
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\n0.5,2,100\n")),
        "LGD must be between 0 and 1, got 2.0"
    );
    assert_eq!(
        detail(parse_legacy("book.csv", b"PD,LGD,EAD\n0.5,0.2,-1\n")),
        "EAD must be non-negative, got -1.0"
    );
}

#[tokio::test]
async fn ingest_legacy_stores_rows_and_history() {
    let store = MemoryStore::new();
    let inserted = ingest_legacy(&store, "book.csv", b"PD,LGD,EAD\n0.1,0.2,100\n0.05,0.15,200")
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let listed = store.list_legacy_instruments(Page::default()).await.unwrap();
    assert_eq!(listed.len(), 2);
    let history = store.list_legacy_upload_history(Page::default()).await.unwrap();
    assert_eq!(history[0].inserted, 2);
}

#[tokio::test]
async fn rejected_legacy_upload_stores_nothing() {
    let store = MemoryStore::new();
    let err = ingest_legacy(&store, "book.csv", b"PD,LGD,EAD\n0.1,0.2,100\n3,0.2,100")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_OUT_OF_RANGE");
    assert!(store.list_legacy_instruments(Page::default()).await.unwrap().is_empty());
}
