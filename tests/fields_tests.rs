//! Integration tests for the field extraction registry.

use plex_media_export::core::fields::{show_registry, FieldRegistry};
use plex_media_export::models::media::{ItemMetadata, ShowItem, Tag};
use plex_media_export::models::report::FieldValue;
use plex_media_export::Error;

fn show() -> ShowItem {
    ShowItem {
        metadata: ItemMetadata {
            title: Some("Dark".to_string()),
            year: Some(2017),
            studio: Some("Wiedemann & Berg".to_string()),
            labels: vec![Tag::new("German"), Tag::new("Sci-Fi")],
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_unknown_field_yields_missing_marker() {
    let fields = ["Title", "Nonexistent", "Year"];
    let record = show_registry().extract_all(&show(), &fields, "Dark");

    assert_eq!(record.len(), 3);
    assert_eq!(record.get("Nonexistent"), Some(&FieldValue::NotAvailable));
    assert_eq!(record.get("Year"), Some(&FieldValue::Integer(2017)));
    assert_eq!(record.values[1].1.to_string(), "N/A");
}

#[test]
fn test_failing_extractor_is_isolated() {
    let registry: FieldRegistry<ShowItem> = FieldRegistry::new()
        .register("Title", |s: &ShowItem| {
            Ok(FieldValue::text_or_na(s.metadata.title.as_deref()))
        })
        .register("Broken", |_: &ShowItem| Err(Error::field("Broken", "always fails")))
        .register("Studio", |s: &ShowItem| {
            Ok(FieldValue::text_or_na(s.metadata.studio.as_deref()))
        });

    let record = registry.extract_all(&show(), &["Title", "Broken", "Studio"], "Dark");
    assert_eq!(record.get("Title"), Some(&FieldValue::Text("Dark".into())));
    assert_eq!(record.get("Broken"), Some(&FieldValue::ExtractionError));
    assert_eq!(record.get("Broken").unwrap().to_string(), "Error Processing Field");
    assert_eq!(
        record.get("Studio"),
        Some(&FieldValue::Text("Wiedemann & Berg".into()))
    );
}

#[test]
fn test_selection_order_is_kept() {
    let fields = ["Labels", "Title", "ViewCount"];
    let record = show_registry().extract_all(&show(), &fields, "Dark");
    let names: Vec<&str> = record.values.iter().map(|(n, _)| n.as_str()).collect();

    assert_eq!(names, fields);
    assert_eq!(
        record.get("Labels"),
        Some(&FieldValue::Text("German, Sci-Fi".into()))
    );
    assert_eq!(record.get("ViewCount"), Some(&FieldValue::Integer(0)));
}

#[test]
fn test_extraction_does_not_modify_item() {
    let item = show();
    let before = format!("{:?}", item);
    show_registry().extract_all(&item, &show_registry().names(), "Dark");
    assert_eq!(format!("{:?}", item), before);
}
