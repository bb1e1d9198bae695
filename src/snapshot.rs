use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use crate::error::HrError;
use crate::executor::ResultSet;

pub const TABLE_METADATA_KEY: &str = "hrdata:table";
pub const VERSION_METADATA_KEY: &str = "hrdata:version";
pub const FORMAT_VERSION: &str = "1";

/// Declared type of one snapshot column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotField {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// A decoded snapshot: table name, field list, and records aligned to the fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub table: String,
    pub fields: Vec<SnapshotField>,
    pub records: Vec<Vec<Option<String>>>,
}

impl Snapshot {
    /// Column order for re-inserting the records.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Encode a non-empty result set as a Parquet snapshot of `table`.
///
/// Every column is written as a nullable UTF-8 string, so `42` comes back as
/// `"42"`. The table name is stored in the file metadata.
pub fn encode(table: &str, result: &ResultSet) -> Result<Vec<u8>, HrError> {
    if result.is_empty() {
        return Err(HrError::invalid(format!(
            "no data to back up: table {table} is empty"
        )));
    }

    let fields = result
        .columns
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect::<Vec<_>>();
    let metadata = HashMap::from([
        (TABLE_METADATA_KEY.to_string(), table.to_string()),
        (VERSION_METADATA_KEY.to_string(), FORMAT_VERSION.to_string()),
    ]);
    let schema = Arc::new(Schema::new_with_metadata(fields, metadata));

    let arrays = (0..result.columns.len())
        .map(|col_idx| {
            let values = result
                .rows
                .iter()
                .map(|row| row[col_idx].to_text())
                .collect::<Vec<Option<String>>>();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect::<Vec<_>>();

    let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(|e| HrError::Snapshot {
        message: format!("failed to build record batch: {e}"),
    })?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue {
                key: TABLE_METADATA_KEY.to_string(),
                value: Some(table.to_string()),
            },
            KeyValue {
                key: VERSION_METADATA_KEY.to_string(),
                value: Some(FORMAT_VERSION.to_string()),
            },
        ]))
        .build();

    let mut writer =
        ArrowWriter::try_new(Vec::new(), schema, Some(props)).map_err(|e| HrError::Snapshot {
            message: format!("failed to create Parquet writer: {e}"),
        })?;

    writer.write(&batch).map_err(|e| HrError::Snapshot {
        message: format!("failed to write Parquet data: {e}"),
    })?;

    writer.into_inner().map_err(|e| HrError::Snapshot {
        message: format!("failed to finalize Parquet snapshot: {e}"),
    })
}

/// Decode a snapshot written by [`encode`].
pub fn decode(data: Bytes) -> Result<Snapshot, HrError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data).map_err(|e| HrError::Snapshot {
        message: format!("not a readable snapshot: {e}"),
    })?;

    let schema = builder.schema().clone();
    let table = schema
        .metadata()
        .get(TABLE_METADATA_KEY)
        .cloned()
        .or_else(|| {
            builder
                .metadata()
                .file_metadata()
                .key_value_metadata()
                .and_then(|kv| kv.iter().find(|e| e.key == TABLE_METADATA_KEY))
                .and_then(|e| e.value.clone())
        })
        .ok_or_else(|| HrError::Snapshot {
            message: "snapshot does not name its table".to_string(),
        })?;

    let fields = schema
        .fields()
        .iter()
        .map(|f| SnapshotField {
            name: f.name().clone(),
            data_type: match f.data_type() {
                DataType::Utf8 => "string".to_string(),
                other => other.to_string(),
            },
            nullable: f.is_nullable(),
        })
        .collect::<Vec<_>>();

    let reader = builder.build().map_err(|e| HrError::Snapshot {
        message: format!("failed to open snapshot reader: {e}"),
    })?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| HrError::Snapshot {
            message: format!("failed to read snapshot data: {e}"),
        })?;

        let columns = batch
            .columns()
            .iter()
            .zip(&fields)
            .map(|(array, field)| {
                array
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| HrError::Snapshot {
                        message: format!(
                            "column {} is {}, expected string",
                            field.name, field.data_type
                        ),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            records.push(
                columns
                    .iter()
                    .map(|col| (!col.is_null(row)).then(|| col.value(row).to_string()))
                    .collect(),
            );
        }
    }

    Ok(Snapshot {
        table,
        fields,
        records,
    })
}
