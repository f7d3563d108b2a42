use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored metadata of one uploaded Word template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TemplateMeta {
    pub id: Uuid,
    #[schema(example = "Surat Pengajuan PKL.docx")]
    pub name: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
    /// Placeholders found at upload, in first-seen order.
    #[schema(example = json!(["KOTA", "TANGGAL", "NAMAPERUSAHAAN"]))]
    pub variables: Vec<String>,
}

impl TemplateMeta {
    pub fn new(name: String, size: usize, variables: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            size,
            uploaded_at: Utc::now(),
            variables,
        }
    }
}

/// A template together with its raw `.docx` bytes.
#[derive(Debug, Clone)]
pub struct Template {
    pub meta: TemplateMeta,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemplateSummary {
    #[serde(flatten)]
    pub meta: TemplateMeta,
    pub active: bool,
}

/// A variable templates may reference, as shown in the upload screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemplateVariable {
    #[schema(value_type = String, example = "NAMAPERUSAHAAN")]
    pub name: &'static str,
    #[schema(value_type = String)]
    pub description: &'static str,
    /// `true` for values the renderer fills in itself.
    pub automatic: bool,
}

const VARIABLES: [TemplateVariable; 11] = [
    TemplateVariable { name: "KOTA", description: "Kota pembuatan surat", automatic: false },
    TemplateVariable { name: "TANGGAL", description: "Tanggal surat, ditulis sebagai 28 Juli 2024", automatic: false },
    TemplateVariable { name: "NOMORSURAT", description: "Nomor surat", automatic: false },
    TemplateVariable { name: "NAMAPERUSAHAAN", description: "Nama perusahaan tujuan", automatic: false },
    TemplateVariable { name: "ALAMATPERUSAHAAN", description: "Alamat perusahaan tujuan", automatic: false },
    TemplateVariable { name: "COL_NO", description: "Judul kolom nomor pada tabel siswa", automatic: false },
    TemplateVariable { name: "COL_NAMA", description: "Judul kolom nama pada tabel siswa", automatic: false },
    TemplateVariable { name: "COL_KELAS", description: "Judul kolom kelas pada tabel siswa", automatic: false },
    TemplateVariable { name: "COL_HP", description: "Judul kolom nomor HP pada tabel siswa", automatic: false },
    TemplateVariable { name: "SISWA_LIST", description: "Daftar siswa untuk baris tabel berulang (FOR row IN SISWA_LIST)", automatic: true },
    TemplateVariable { name: "CURRENT_DATE", description: "Tanggal hari ini", automatic: true },
];

pub fn available_variables() -> &'static [TemplateVariable] {
    &VARIABLES
}
