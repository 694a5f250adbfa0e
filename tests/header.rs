// ParserHandle-level behavior: header capture, transform hooks, dynamic
// typing, and field-count reconciliation against the header.

use flowcsv::config::{DelimiterConfig, DynamicTyping, Newline, NewlineConfig, ParserConfig};
use flowcsv::handle::{ColumnRef, HandleConfig, ParserHandle, RowData};
use flowcsv::value::FieldValue;
use std::sync::Arc;

fn base_config() -> ParserConfig {
    ParserConfig {
        delimiter: DelimiterConfig::Char(b','),
        newline: NewlineConfig::Fixed(Newline::Lf),
        ..Default::default()
    }
}

#[test]
fn transform_header_can_rename_and_drop_columns() {
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        transform_header: Some(Arc::new(|name, _i| {
            if name == "skip" {
                None
            } else {
                Some(name.to_uppercase())
            }
        })),
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a,skip,b\n1,2,3\n", 0, false, None);
    assert_eq!(
        out.meta.fields,
        Some(vec![Some("A".into()), None, Some("B".into())])
    );
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("A"), Some(&FieldValue::Str("1".into())));
            assert_eq!(map.get("B"), Some(&FieldValue::Str("3".into())));
            assert!(map.get("skip").is_none());
        }
        _ => panic!("expected mapped row"),
    }
}

#[test]
fn transform_sees_resolved_column_name_once_header_known() {
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        transform: Some(Arc::new(|value, col| match col {
            ColumnRef::Name(name) if name == "b" => value.trim().to_string(),
            _ => value.to_string(),
        })),
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a,b\n1, 2 \n", 0, false, None);
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("a"), Some(&FieldValue::Str("1".into())));
            assert_eq!(map.get("b"), Some(&FieldValue::Str("2".into())));
        }
        _ => panic!("expected mapped row"),
    }
}

#[test]
fn transform_on_positional_rows_sees_index_column_ref() {
    let config = HandleConfig {
        parser: base_config(),
        header: false,
        transform: Some(Arc::new(|value, col| match col {
            ColumnRef::Index(0) => value.to_uppercase(),
            _ => value.to_string(),
        })),
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a,b\n", 0, false, None);
    match &out.rows[0].data {
        RowData::Positional(rec) => {
            assert_eq!(rec, &vec![FieldValue::Str("A".into()), FieldValue::Str("b".into())]);
        }
        _ => panic!("expected positional row"),
    }
}

#[test]
fn too_few_fields_is_flagged_without_panicking() {
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a,b,c\n1,2\n", 0, false, None);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(
        out.rows[0].errors[0].code,
        flowcsv::error::ParseErrorCode::TooFewFields
    );
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("a"), Some(&FieldValue::Str("1".into())));
            assert_eq!(map.get("b"), Some(&FieldValue::Str("2".into())));
            assert!(map.get("c").is_none());
        }
        _ => panic!("expected mapped row"),
    }
}

#[test]
fn duplicate_header_names_keep_first_mapping() {
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a,a,b\n1,2,3\n", 0, false, None);
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("a"), Some(&FieldValue::Str("1".into())));
            assert_eq!(map.get("b"), Some(&FieldValue::Str("3".into())));
        }
        _ => panic!("expected mapped row"),
    }
}

#[test]
fn dynamic_typing_leaves_unparseable_strings_alone() {
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        dynamic_typing: DynamicTyping::AllOn,
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"a\nnot-a-number\n", 0, false, None);
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("a"), Some(&FieldValue::Str("not-a-number".into())));
        }
        _ => panic!("expected mapped row"),
    }
}

#[test]
fn dynamic_typing_per_column_only_coerces_selected_columns() {
    let mut columns = std::collections::HashMap::new();
    columns.insert("n".to_string(), true);
    let config = HandleConfig {
        parser: base_config(),
        header: true,
        dynamic_typing: DynamicTyping::PerColumn(columns),
        ..Default::default()
    };
    let mut handle = ParserHandle::new(config);
    let out = handle.parse(b"n,label\n42,007\n", 0, false, None);
    match &out.rows[0].data {
        RowData::Mapped(map) => {
            assert_eq!(map.get("n"), Some(&FieldValue::Number(42.0)));
            assert_eq!(map.get("label"), Some(&FieldValue::Str("007".into())));
        }
        _ => panic!("expected mapped row"),
    }
}
