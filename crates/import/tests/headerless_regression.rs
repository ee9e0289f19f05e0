use bankmap_core::MappingCatalog;
use bankmap_import::import::import_csv;
use bankmap_import::{DetectionOutcome, ImportSettings};

const CATALOG: &str = r#"
[[mapping]]
bank_name = "Sparkasse"
booking_date = ["Buchungstag"]
booking_text = ["Beguenstigter/Zahlungspflichtiger", "Verwendungszweck"]
booking_type = ["Buchungstext"]
booking_amount = ["Betrag"]
booking_date_parse_format = "dd.MM.yyyy"

[[mapping.detection]]
kind = "header_signature"
columns = ["Auftragskonto", "Buchungstag", "Valutadatum"]

[[mapping]]
bank_name = "Volksbank"
booking_date = ["$1"]
booking_type = ["$2"]
booking_text = ["$3"]
booking_amount = ["$4"]
booking_date_parse_format = "dd.MM.yyyy"
without_header = true

[[mapping.detection]]
kind = "headerless_structure"
column_count = 4
column_markers = ["date", "text", "text", "number"]
"#;

const HEADERLESS: &str = "01.03.2024;Kartenzahlung;REWE Markt;-12,50
02.03.2024;Gutschrift;Gehalt Maerz;2.500,00

03.03.2024;Dauerauftrag;Miete;-950,00
04.03.2024;Lastschrift;Stadtwerke;-80,00
";

const WITH_PREAMBLE: &str = "Umsatzanzeige;Girokonto
Zeitraum:;01.03.2024 - 31.03.2024
Auftragskonto;Buchungstag;Valutadatum;Buchungstext;Verwendungszweck;Beguenstigter/Zahlungspflichtiger;Betrag
DE01;01.03.2024;01.03.2024;Lastschrift;Strom Maerz;Stadtwerke;-80,00
DE01;31.02.2024;01.03.2024;Gutschrift;Erstattung;Versicherung;15,00
";

fn settings() -> ImportSettings {
    ImportSettings::from_toml(
        r#"
[display]
date_format = "yyyy-MM-dd"

[labels]
account = "Giro"
"#,
    )
    .unwrap()
}

#[test]
fn headerless_file_keeps_every_physical_row() {
    let catalog = MappingCatalog::from_toml(CATALOG).unwrap();
    let outcome = import_csv(HEADERLESS.as_bytes(), &catalog, &settings(), None).unwrap();

    assert_eq!(
        outcome.detection.outcome,
        DetectionOutcome::HeaderlessStructure {
            bank_name: "Volksbank".into()
        }
    );
    assert!(!outcome.detection.has_header);

    let physical_rows = HEADERLESS.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(outcome.transactions.len(), physical_rows);

    let first = &outcome.transactions[0];
    assert_eq!(first.booking_date, "2024-03-01");
    assert_eq!(first.booking_type, "Kartenzahlung");
    assert_eq!(first.booking_text, "REWE Markt");
    assert_eq!(first.booking_amount, "-12,50");
    assert_eq!(first.booking_account, "Giro");
    assert_eq!(outcome.transactions[3].booking_text, "Stadtwerke");
}

#[test]
fn signature_file_skips_preamble() {
    let catalog = MappingCatalog::from_toml(CATALOG).unwrap();
    let outcome = import_csv(WITH_PREAMBLE.as_bytes(), &catalog, &settings(), None).unwrap();

    assert!(outcome.detection.has_header);
    assert_eq!(outcome.detection.skipped_rows, 2);
    assert_eq!(outcome.mapping.unwrap().bank_name, "Sparkasse");
    assert_eq!(outcome.detection.candidates[0].bank_name, "Sparkasse");
    assert!(!outcome.detection.candidates[1].passed);

    let txs = &outcome.transactions;
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].booking_date, "2024-03-01");
    assert_eq!(txs[0].booking_text, "Stadtwerke Strom Maerz");
    assert_eq!(txs[0].amount_value(), Some(-80.0));

    // invalid calendar date stays raw
    assert_eq!(txs[1].booking_date, "31.02.2024");
    assert!(txs[1].booking_date_iso.is_none());
}
