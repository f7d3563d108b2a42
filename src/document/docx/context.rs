//! The data bundle used to fill a template.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::document::common::{format_long_date, reformat_date};

/// One student row of the placement table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StudentRow {
    #[serde(default)]
    #[schema(example = 1)]
    pub no: u32,
    #[serde(default)]
    #[schema(example = "Budi Santoso")]
    pub nama: String,
    #[serde(default)]
    #[schema(example = "XII TKJ 1")]
    pub kelas: String,
    #[serde(default)]
    #[schema(example = "081234567890")]
    pub hp: String,
}

impl StudentRow {
    fn to_value(&self) -> Value {
        json!({
            "no": self.no,
            "nama": self.nama,
            "kelas": self.kelas,
            "hp": self.hp,
        })
    }
}

/// Values for one render call. Every field is optional; a missing field
/// renders as an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RenderContext {
    #[serde(rename = "KOTA", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Sidoarjo")]
    pub kota: Option<String>,
    /// Machine date, e.g. `2024-07-28`; rendered as `28 Juli 2024`.
    #[serde(rename = "TANGGAL", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-07-28")]
    pub tanggal: Option<String>,
    #[serde(rename = "NOMORSURAT", default, skip_serializing_if = "Option::is_none")]
    pub nomor_surat: Option<String>,
    #[serde(rename = "NAMAPERUSAHAAN", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "PT. SO GOOD FOOD")]
    pub nama_perusahaan: Option<String>,
    #[serde(rename = "ALAMATPERUSAHAAN", default, skip_serializing_if = "Option::is_none")]
    pub alamat_perusahaan: Option<String>,
    #[serde(rename = "COL_NO", default, skip_serializing_if = "Option::is_none")]
    pub col_no: Option<String>,
    #[serde(rename = "COL_NAMA", default, skip_serializing_if = "Option::is_none")]
    pub col_nama: Option<String>,
    #[serde(rename = "COL_KELAS", default, skip_serializing_if = "Option::is_none")]
    pub col_kelas: Option<String>,
    #[serde(rename = "COL_HP", default, skip_serializing_if = "Option::is_none")]
    pub col_hp: Option<String>,
    #[serde(rename = "siswaData", default)]
    pub siswa_data: Vec<StudentRow>,
    /// Additional placeholder values for custom templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schema(value_type = Object)]
    pub extra: BTreeMap<String, Value>,
}

impl RenderContext {
    /// Build the evaluation data: the caller's fields, `TANGGAL` reformatted,
    /// `SISWA_LIST` for row repetition and an injected `CURRENT_DATE`.
    pub fn to_data(&self, today: NaiveDate) -> Value {
        let mut data: Map<String, Value> = self
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let scalars = [
            ("KOTA", &self.kota),
            ("NOMORSURAT", &self.nomor_surat),
            ("NAMAPERUSAHAAN", &self.nama_perusahaan),
            ("ALAMATPERUSAHAAN", &self.alamat_perusahaan),
            ("COL_NO", &self.col_no),
            ("COL_NAMA", &self.col_nama),
            ("COL_KELAS", &self.col_kelas),
            ("COL_HP", &self.col_hp),
        ];
        for (key, value) in scalars {
            if let Some(value) = value {
                data.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        if let Some(tanggal) = &self.tanggal {
            data.insert("TANGGAL".to_string(), Value::String(reformat_date(tanggal)));
        }

        let rows = Value::Array(self.siswa_data.iter().map(StudentRow::to_value).collect());
        data.insert("siswaData".to_string(), rows.clone());
        data.insert("SISWA_LIST".to_string(), rows);
        data.insert(
            "CURRENT_DATE".to_string(),
            Value::String(format_long_date(today)),
        );

        Value::Object(data)
    }
}
