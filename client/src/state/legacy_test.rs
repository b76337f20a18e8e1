use super::*;

fn instrument(id: i64) -> Instrument {
    Instrument {
        id,
        pd: 0.1,
        lgd: 0.2,
        ead: 100.0,
        raw_pd: "0.1".into(),
        raw_lgd: "0.2".into(),
        raw_ead: "100".into(),
        created_at: None,
    }
}

#[test]
fn successful_upload_alerts_count_and_refetches() {
    let outcome = LegacyState::upload_outcome(Ok(2));
    assert_eq!(outcome, LegacyUploadOutcome { alert: "Inserted 2 records".into(), refetch: true });
}

#[test]
fn failed_upload_alerts_server_detail() {
    let outcome = LegacyState::upload_outcome(Err(r#"{"detail":"Missing columns: PD, LGD"}"#.into()));
    assert_eq!(outcome.alert, "Error: Missing columns: PD, LGD");
    assert!(!outcome.refetch);
}

#[test]
fn non_json_failure_body_is_shown_verbatim() {
    assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    assert_eq!(LegacyState::upload_outcome(Err("Bad Gateway".into())).alert, "Error: Bad Gateway");
}

#[test]
fn stale_legacy_listing_is_dropped() {
    let mut state = LegacyState::default();
    let old = state.begin_request();
    let new = state.begin_request();
    assert!(state.apply_response(new, Some(vec![instrument(1)])));
    assert!(!state.apply_response(old, Some(vec![instrument(1), instrument(2)])));
    assert_eq!(state.instruments.len(), 1);
}
