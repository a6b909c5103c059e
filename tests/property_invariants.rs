use chrono::{Duration, TimeZone, Utc};
use hashbrown::HashSet;
use proptest::prelude::*;

use diaglog::{
    catalog::{BrandMatcher, Catalog, FaultCode},
    core::{filter::RecordFilter, store::RecordBook},
    record::{RecordDraft, RecordPatch},
    types::{Severity, Status, Timestamp},
};

const EQUIPMENT: [&str; 5] = ["Midea 12k", "Gree 18k", "Fujitsu ducto", "paquete 5 ton", "Samsung"];

#[derive(Debug, Clone)]
enum Action {
    Create { client_idx: u8, equip_idx: u8, with_code: bool },
    Update { target: u8, status_idx: u8 },
    Touch { target: u8 },
    Delete { target: u8 },
    DeleteUnknown,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..16, 0u8..5, any::<bool>()).prop_map(|(client_idx, equip_idx, with_code)| Action::Create {
            client_idx,
            equip_idx,
            with_code,
        }),
        (0u8..32, 0u8..3).prop_map(|(target, status_idx)| Action::Update { target, status_idx }),
        (0u8..32).prop_map(|target| Action::Touch { target }),
        (0u8..32).prop_map(|target| Action::Delete { target }),
        Just(Action::DeleteUnknown),
    ]
}

fn at(step: usize) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(step as i64)
}

fn catalog() -> Catalog {
    Catalog::new(vec![FaultCode {
        brand: "Midea".to_string(),
        code: "E6".to_string(),
        title: "Comm error".to_string(),
        severity: Severity::Alta,
        fix: "Check wiring".to_string(),
        ..FaultCode::default()
    }])
}

fn pick(book: &RecordBook, target: u8) -> Option<String> {
    let records = book.records();
    if records.is_empty() {
        return None;
    }
    Some(records[usize::from(target) % records.len()].id.clone())
}

proptest! {
    #[test]
    fn random_sequences_preserve_store_invariants(actions in prop::collection::vec(action_strategy(), 1..120)) {
        let catalog = catalog();
        let matcher = BrandMatcher::default();
        let mut book = RecordBook::new();
        let mut expected_len = 0usize;

        for (step, action) in actions.into_iter().enumerate() {
            let now = at(step);
            match action {
                Action::Create { client_idx, equip_idx, with_code } => {
                    let draft = RecordDraft {
                        client: format!("Cliente {client_idx}"),
                        equipment: EQUIPMENT[usize::from(equip_idx)].to_string(),
                        code: if with_code { "E6".to_string() } else { String::new() },
                        ..RecordDraft::default()
                    };
                    let rec = book.create(draft, &catalog, &matcher, now).expect("create");
                    prop_assert_eq!(rec.created_at, now);
                    expected_len += 1;
                }
                Action::Update { target, status_idx } => {
                    let Some(id) = pick(&book, target) else { continue; };
                    let status = [Status::Pendiente, Status::EnProceso, Status::Resuelto][usize::from(status_idx)];
                    let before = book.get_cloned(&id).expect("present");
                    let after = book
                        .update(&id, &RecordPatch { status: Some(status), ..RecordPatch::default() }, now)
                        .expect("update");
                    prop_assert_eq!(&after.id, &before.id);
                    prop_assert_eq!(after.created_at, before.created_at);
                    prop_assert_eq!(after.status, status);
                }
                Action::Touch { target } => {
                    let Some(id) = pick(&book, target) else { continue; };
                    let mut before = book.get_cloned(&id).expect("present");
                    let after = book.update(&id, &RecordPatch::default(), now).expect("touch");
                    before.updated_at = now;
                    prop_assert_eq!(after, before);
                }
                Action::Delete { target } => {
                    let Some(id) = pick(&book, target) else { continue; };
                    prop_assert!(book.delete(&id).is_some());
                    prop_assert!(book.list(&RecordFilter::default()).iter().all(|r| r.id != id));
                    expected_len -= 1;
                }
                Action::DeleteUnknown => {
                    prop_assert!(book.delete("no-such-id").is_none());
                }
            }

            prop_assert_eq!(book.len(), expected_len);

            let listed = book.list(&RecordFilter::default());
            prop_assert_eq!(listed.len(), expected_len);
            prop_assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));

            let ids: HashSet<&str> = listed.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(ids.len(), listed.len());
            prop_assert!(listed.iter().all(|r| !r.client.trim().is_empty()));
        }

        let snapshot = book.export_snapshot(at(10_000));
        let json = serde_json::to_vec(&snapshot).expect("encode");
        let decoded: diaglog::core::store::ExportSnapshot = serde_json::from_slice(&json).expect("decode");

        let mut restored = RecordBook::new();
        restored.replace_all(decoded.db.history).expect("import");
        prop_assert_eq!(restored.records(), book.records());
    }
}
