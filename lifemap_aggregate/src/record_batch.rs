// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arrow record batches as aggregation input.

use std::borrow::Cow;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;

use crate::error::AggregateError;
use crate::table::{Column, Table, TableSource};

/// Columns are copied in schema order. `Int32`/`Int64` become integers,
/// `Float32`/`Float64` floats, `Utf8`/`LargeUtf8` strings and `Boolean`
/// booleans. Nulls are rejected like in JSON input.
impl TableSource for RecordBatch {
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError> {
        let schema = self.schema();
        let mut table = Table::new();
        for (field, array) in schema.fields().iter().zip(self.columns()) {
            let column = column_from_arrow(field.name(), array.as_ref())?;
            table.push_column(field.name().clone(), column)?;
        }
        Ok(Cow::Owned(table))
    }
}

fn column_from_arrow(name: &str, array: &dyn Array) -> Result<Column, AggregateError> {
    if array.null_count() > 0 {
        return Err(AggregateError::MixedValues(name.to_owned()));
    }
    let column = match array.data_type() {
        DataType::Int64 => Column::Int(array.as_primitive::<Int64Type>().values().to_vec()),
        DataType::Int32 => Column::Int(
            array
                .as_primitive::<Int32Type>()
                .values()
                .iter()
                .map(|&v| i64::from(v))
                .collect(),
        ),
        DataType::Float64 => Column::Float(array.as_primitive::<Float64Type>().values().to_vec()),
        DataType::Float32 => Column::Float(
            array
                .as_primitive::<Float32Type>()
                .values()
                .iter()
                .map(|&v| f64::from(v))
                .collect(),
        ),
        DataType::Utf8 => Column::Str(
            array
                .as_string::<i32>()
                .iter()
                .flatten()
                .map(str::to_owned)
                .collect(),
        ),
        DataType::LargeUtf8 => Column::Str(
            array
                .as_string::<i64>()
                .iter()
                .flatten()
                .map(str::to_owned)
                .collect(),
        ),
        DataType::Boolean => Column::Bool(array.as_boolean().values().iter().collect()),
        other => {
            return Err(AggregateError::UnsupportedArrowType {
                column: name.to_owned(),
                data_type: other.to_string(),
            });
        }
    };
    Ok(column)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{
        ArrayRef, BooleanArray, Date32Array, Float32Array, Int32Array, Int64Array,
        LargeStringArray, StringArray,
    };
    use serde_json::json;

    use super::*;
    use crate::tests::sample_index;
    use crate::{Aggregator, ColumnKind, CountOptions, FreqOptions};

    fn int64(values: Vec<i64>) -> ArrayRef {
        Arc::new(Int64Array::from(values))
    }

    #[test]
    fn counts_from_a_record_batch_match_json() {
        let index = sample_index();
        let aggregator = Aggregator::new(&index);
        let ids = vec![33213, 33154, 33208, 33090, 33208, 2];
        let batch = RecordBatch::try_from_iter([("taxid", int64(ids.clone()))]).unwrap();

        let options = CountOptions::default();
        let from_batch = aggregator.count(&batch, &options).unwrap();
        let from_json = aggregator
            .count(&json!({ "taxid": ids }), &options)
            .unwrap();
        assert_eq!(from_batch, from_json);
        assert_eq!(from_batch.column("n").unwrap().as_ints().unwrap()[0], 6);
    }

    #[test]
    fn arrow_types_map_to_column_kinds() {
        let batch = RecordBatch::try_from_iter([
            ("taxid", Arc::new(Int32Array::from(vec![2, 2759])) as ArrayRef),
            ("f", Arc::new(Float32Array::from(vec![0.5, 1.5])) as ArrayRef),
            ("s", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
            ("l", Arc::new(LargeStringArray::from(vec!["c", "d"])) as ArrayRef),
            ("b", Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef),
        ])
        .unwrap();
        let table = batch.to_table().unwrap();
        let kinds: Vec<ColumnKind> = table.columns().map(|(_, c)| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Int,
                ColumnKind::Float,
                ColumnKind::Str,
                ColumnKind::Str,
                ColumnKind::Bool
            ]
        );
        assert_eq!(table.ints("taxid").unwrap(), &[2, 2759]);
        assert_eq!(table.column("f").unwrap().as_floats(), Some(&[0.5, 1.5][..]));
        assert_eq!(
            table.column("l").unwrap().as_strs(),
            Some(&["c".to_owned(), "d".to_owned()][..])
        );
    }

    #[test]
    fn sliced_batches_keep_only_their_rows() {
        let index = sample_index();
        let batch = RecordBatch::try_from_iter([
            ("taxid", int64(vec![2, 33090, 33208])),
            (
                "value",
                Arc::new(StringArray::from(vec!["x", "a", "b"])) as ArrayRef,
            ),
        ])
        .unwrap()
        .slice(1, 2);
        let out = Aggregator::new(&index)
            .freq(&batch, "value", &FreqOptions::default())
            .unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["taxid", "a", "b"]);
        assert!(!out.ints("taxid").unwrap().contains(&2));
    }

    #[test]
    fn nulls_and_unsupported_types_are_rejected() {
        let batch = RecordBatch::try_from_iter([(
            "taxid",
            Arc::new(Int64Array::from(vec![Some(2), None])) as ArrayRef,
        )])
        .unwrap();
        let err = batch.to_table().unwrap_err();
        assert!(matches!(err, AggregateError::MixedValues(ref c) if c == "taxid"));

        let batch = RecordBatch::try_from_iter([(
            "day",
            Arc::new(Date32Array::from(vec![1, 2])) as ArrayRef,
        )])
        .unwrap();
        let err = batch.to_table().unwrap_err();
        assert!(matches!(
            err,
            AggregateError::UnsupportedArrowType { ref column, ref data_type }
                if column == "day" && data_type == "Date32"
        ));
    }
}
