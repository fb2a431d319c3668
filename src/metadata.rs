//! Assembles the samples x fields metadata matrix from per-sample annotation
//! records. Which fields land in the matrix is explicit configuration
//! ([MetadataSchema]), not a naming convention inferred at runtime.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context};
use hashbrown::HashMap;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_structs::SAMPLE_ID_COL;

/// Annotation field holding the bare sample name.
pub const SAMPLENAME_KEY: &str = "sample_name";
/// Annotation field holding the dataset the sample belongs to.
pub const DATASETS_KEY: &str = "sj_datasets";

/// Maps raw dataset annotations to curated short identifiers. Order matters:
/// the first entry found within the raw value wins, so entries are listed in
/// the chronological order the datasets appeared.
const DATASET_TO_ID_MAP: &[(&str, &str)] = &[
    ("Pediatric Cancer Genome Project (PCGP)", "PCGP"),
    ("Clinical Pilot", "ClinicalPilot"),
    ("Genomes 4 Kids (G4K)", "G4K"),
    ("Real-time Clinical Genomics (RTCG)", "RTCG"),
    ("Childhood Solid Tumor Network (CSTN)", "CSTN"),
    ("Pan-Acute Lymphoblastic Leukemia (PanALL)", "PanALL"),
    ("Pediatric Therapy-related Myeloid Neoplasms (tMN)", "tMN"),
];

/// Explicit description of the annotation fields the metadata matrix
/// recognizes: an allow-list of identity fields plus one attribute-prefix
/// rule. Fields matching neither are dropped with a debug log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSchema {
    pub identity_fields:  Vec<String>,
    pub attribute_prefix: String,
}

impl Default for MetadataSchema {
    fn default() -> Self {
        MetadataSchema {
            identity_fields:  [
                SAMPLENAME_KEY,
                "subject_name",
                "sample_type",
                "sj_diseases",
                "sj_long_disease_name",
                "sj_embargo_date",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            attribute_prefix: "attr".to_string(),
        }
    }
}

impl MetadataSchema {
    pub fn is_attribute(
        &self,
        field: &str,
    ) -> bool {
        field.starts_with(&self.attribute_prefix)
    }

    pub fn recognizes(
        &self,
        field: &str,
    ) -> bool {
        self.is_attribute(field) || self.identity_fields.iter().any(|f| f == field)
    }
}

/// One sample's recognized annotation fields, keyed by field name.
#[derive(Debug, Clone)]
pub struct SampleAnnotations {
    pub sample_id: String,
    pub fields:    HashMap<String, String>,
}

/// Reads one raw annotation record (a JSON object of per-sample fields).
pub fn read_annotation(path: &Path) -> anyhow::Result<Value> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening annotation record {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing annotation record {}", path.display()))
}

/// Derives the unique sample identifier used as the matrix row key:
/// the sample name plus the curated dataset tag, e.g. `"SJE001 (PCGP)"`.
/// A record with a dataset annotation this tool does not know is an error
/// (expected when new datasets appear before the tool is updated), while a
/// record with no dataset at all maps to `"UnspecifiedDataset"`.
pub fn sample_identifier(record: &Value) -> anyhow::Result<String> {
    let sample_name = match record.get(SAMPLENAME_KEY).and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => {
            bail!(
                "annotation record does not have the required sample name \
                 field: {SAMPLENAME_KEY}"
            )
        },
    };

    let dataset = match record.get(DATASETS_KEY).and_then(Value::as_str) {
        Some(raw) => {
            match DATASET_TO_ID_MAP
                .iter()
                .find(|(key, _)| raw.contains(key))
            {
                Some((_, curated)) => curated,
                None => {
                    bail!(
                        "unable to determine the dataset name for sample {} \
                         and dataset value: {}. Please ask the authors to add \
                         a key for this dataset.",
                        sample_name,
                        raw
                    )
                },
            }
        },
        None => "UnspecifiedDataset",
    };

    Ok(format!("{sample_name} ({dataset})"))
}

/// Extracts the schema-recognized fields from one raw record. Scalar values
/// are stringified; nested values and fields outside the schema are skipped.
pub fn annotations_from_record(
    record: &Value,
    schema: &MetadataSchema,
) -> anyhow::Result<SampleAnnotations> {
    let sample_id = sample_identifier(record)?;
    let object = match record.as_object() {
        Some(object) => object,
        None => bail!("annotation record for {sample_id} is not a JSON object"),
    };

    let mut fields = HashMap::new();
    for (key, value) in object {
        if !schema.recognizes(key) {
            debug!("skipping unrecognized annotation field '{}'", key);
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                debug!("skipping non-scalar annotation field '{}'", key);
                continue;
            },
        };
        fields.insert(key.clone(), rendered);
    }
    Ok(SampleAnnotations { sample_id, fields })
}

/// Builds the metadata matrix: one row per sample, columns ordered as the
/// non-attribute fields sorted lexicographically followed by the
/// attribute-prefixed fields sorted lexicographically, with null cells for
/// samples missing a field. The row index column is `"Sample ID"`.
pub fn collect_metadata(
    samples: &[SampleAnnotations],
    schema: &MetadataSchema,
) -> anyhow::Result<DataFrame> {
    if samples.is_empty() {
        bail!("must contain at least one annotation record");
    }

    let all_fields: BTreeSet<&str> = samples
        .iter()
        .flat_map(|s| s.fields.keys().map(String::as_str))
        .collect();
    let (attr_fields, identity_fields): (Vec<&str>, Vec<&str>) = all_fields
        .into_iter()
        .partition(|field| schema.is_attribute(field));

    let sample_ids: Vec<&str> = samples.iter().map(|s| s.sample_id.as_str()).collect();
    let mut columns = vec![Column::new(SAMPLE_ID_COL.into(), sample_ids)];
    for field in identity_fields.iter().chain(attr_fields.iter()) {
        let cells: Vec<Option<&str>> = samples
            .iter()
            .map(|s| s.fields.get(*field).map(String::as_str))
            .collect();
        columns.push(Column::new((*field).into(), cells));
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(
        name: &str,
        dataset: Option<&str>,
    ) -> Value {
        let mut value = json!({
            SAMPLENAME_KEY: name,
            "sample_type": "Diagnosis",
            "attr_library": "polyA",
            "attr_read_length": 100,
            "internal_bookkeeping": "dropped",
            "nested": {"a": 1},
        });
        if let Some(dataset) = dataset {
            value[DATASETS_KEY] = json!(dataset);
        }
        value
    }

    #[test]
    fn sample_identifier_maps_datasets() {
        let id = sample_identifier(&record(
            "SJE001",
            Some("Pediatric Cancer Genome Project (PCGP)"),
        ))
        .unwrap();
        assert_eq!(id, "SJE001 (PCGP)");

        let id = sample_identifier(&record("SJE002", None)).unwrap();
        assert_eq!(id, "SJE002 (UnspecifiedDataset)");
    }

    #[test]
    fn unknown_dataset_is_an_error() {
        assert!(sample_identifier(&record("SJE001", Some("Brand New Dataset"))).is_err());
        assert!(sample_identifier(&json!({"other": 1})).is_err());
    }

    #[test]
    fn schema_filters_fields() {
        let schema = MetadataSchema::default();
        let annotations =
            annotations_from_record(&record("SJE001", None), &schema).unwrap();

        assert_eq!(annotations.fields.get("sample_type").unwrap(), "Diagnosis");
        assert_eq!(annotations.fields.get("attr_read_length").unwrap(), "100");
        assert!(!annotations.fields.contains_key("internal_bookkeeping"));
        assert!(!annotations.fields.contains_key("nested"));
    }

    #[test]
    fn column_order_and_missing_cells() {
        let schema = MetadataSchema::default();
        let a = annotations_from_record(
            &json!({
                SAMPLENAME_KEY: "s-a",
                "sample_type": "Diagnosis",
                "attr_zz": "z",
                "attr_aa": "a",
            }),
            &schema,
        )
        .unwrap();
        let b = annotations_from_record(
            &json!({
                SAMPLENAME_KEY: "s-b",
                "subject_name": "subj",
                "attr_aa": "a2",
            }),
            &schema,
        )
        .unwrap();

        let frame = collect_metadata(&[a, b], &schema).unwrap();
        // Non-attribute fields sorted, then attribute fields sorted.
        assert_eq!(
            frame.get_column_names_str(),
            vec![
                SAMPLE_ID_COL,
                "sample_name",
                "sample_type",
                "subject_name",
                "attr_aa",
                "attr_zz"
            ]
        );
        assert_eq!(frame.height(), 2);

        let sample_type = frame.column("sample_type").unwrap().str().unwrap();
        assert_eq!(sample_type.get(0), Some("Diagnosis"));
        assert_eq!(sample_type.get(1), None);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(collect_metadata(&[], &MetadataSchema::default()).is_err());
    }
}
