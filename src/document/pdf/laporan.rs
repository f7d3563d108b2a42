//! Tabular reports with automatic page breaks, plus the standard presets
//! used by the violation, monitoring and per-category recap screens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::canvas::{Align, Canvas, FontStyle};
use super::Composer;
use crate::config::InstitutionProfile;
use crate::document::common::{column_key, download_filename, truncate_chars, underscore_spaces, value_to_text};
use crate::document::traits::{Generator, Validator};
use crate::document::validation::{validate_required, ValidationError, ValidationErrors};
use crate::document::{CompositionError, RenderedDocument};

const MARGIN: f32 = 20.0;
const HEADER_Y: f32 = 85.0;
const ROW_STEP: f32 = 10.0;
/// Rows are not started below this baseline; a new page begins instead.
const PAGE_BREAK_Y: f32 = 250.0;
const CONTINUATION_TOP: f32 = 30.0;
const CELL_CHARS: usize = 20;

/// One report record keyed by normalized column label (`nama_siswa`, `nis`).
pub type ReportRow = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LaporanRequest {
    #[schema(example = "LAPORAN MONITORING PKL")]
    pub title: String,
    #[schema(example = json!(["Tanggal", "NIS", "Nama Siswa"]))]
    pub columns: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<ReportRow>,
    /// Download name; derived from the title when absent.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub tanggal: Option<String>,
}

impl Validator for LaporanRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.title, "title", "Judul Laporan", &mut errors);
        if self.columns.is_empty() {
            errors.add(
                ValidationError::new("columns", "Kolom laporan tidak boleh kosong")
                    .with_suggestion("Sertakan minimal satu nama kolom"),
            );
        }
        if self.columns.iter().any(|column| column.trim().is_empty()) {
            errors.add(ValidationError::new("columns", "Nama kolom tidak boleh kosong"));
        }
        errors.into_result()
    }
}

impl LaporanRequest {
    fn download_name(&self) -> String {
        match self.filename.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => {
                let base = name.strip_suffix(".pdf").unwrap_or(name);
                download_filename(&underscore_spaces(base), "", "pdf")
            }
            None => download_filename(&underscore_spaces(&self.title), "", "pdf"),
        }
    }
}

/// Display text of one cell: the value under the column's key, at most 20 characters.
pub fn cell_text(row: &ReportRow, column: &str) -> String {
    let text = row.get(&column_key(column)).map(value_to_text).unwrap_or_default();
    truncate_chars(&text, CELL_CHARS)
}

pub fn layout(
    profile: &InstitutionProfile,
    title: &str,
    columns: &[String],
    rows: &[ReportRow],
    tanggal: &str,
) -> Canvas {
    let mut doc = Canvas::new(title);
    let width = doc.page_width();
    let center = width / 2.0;

    doc.set_font_size(16.0);
    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned(title, center, 30.0, Align::Center);

    doc.set_font_size(12.0);
    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned(profile.full_title(), center, 45.0, Align::Center);
    doc.text_aligned(format!("Tanggal: {}", tanggal), center, 60.0, Align::Center);

    doc.set_line_width(0.5);
    doc.line(MARGIN, 70.0, width - MARGIN, 70.0);

    let column_width = (width - 2.0 * MARGIN) / columns.len().max(1) as f32;
    let column_x = |index: usize| MARGIN + index as f32 * column_width;

    let mut y = HEADER_Y;
    doc.set_font_style(FontStyle::Bold);
    for (index, column) in columns.iter().enumerate() {
        doc.text(column.as_str(), column_x(index), y);
    }

    doc.set_font_style(FontStyle::Normal);
    y += ROW_STEP;

    for (number, row) in rows.iter().enumerate() {
        if y > PAGE_BREAK_Y {
            doc.add_page();
            y = CONTINUATION_TOP;
            log::debug!("Report '{}' breaks to page {} at row {}", title, doc.page_count(), number + 1);
        }
        for (index, column) in columns.iter().enumerate() {
            doc.text(cell_text(row, column), column_x(index), y);
        }
        y += ROW_STEP;
    }

    doc
}

impl Generator<LaporanRequest> for Composer {
    fn generate(&self, request: &LaporanRequest) -> Result<RenderedDocument, CompositionError> {
        log::info!(
            "Composing report '{}' with {} row(s) and {} column(s)",
            request.title,
            request.rows.len(),
            request.columns.len()
        );
        let tanggal = self.tanggal(request.tanggal.as_deref());
        let canvas = layout(
            self.profile(),
            &request.title,
            &request.columns,
            &request.rows,
            &tanggal,
        );
        self.finish(canvas, request.download_name())
    }
}

/// A named report shape used by the administration screens.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportPreset {
    #[schema(value_type = String, example = "monitoring")]
    pub key: &'static str,
    /// Title; `{kategori}` is replaced with the requested category.
    #[schema(value_type = String)]
    pub title: &'static str,
    #[schema(value_type = Vec<String>)]
    pub columns: &'static [&'static str],
    /// File stem; `{kategori}` is replaced with the requested category.
    #[schema(value_type = String)]
    pub filename: &'static str,
    /// Whether the preset needs a category.
    pub needs_kategori: bool,
}

const PRESETS: [ReportPreset; 3] = [
    ReportPreset {
        key: "pelanggaran",
        title: "LAPORAN PELANGGARAN SISWA PKL",
        columns: &["Tanggal", "NIS", "Nama", "Rombel", "Perusahaan", "Jenis", "Status"],
        filename: "Laporan_Pelanggaran_PKL",
        needs_kategori: false,
    },
    ReportPreset {
        key: "monitoring",
        title: "LAPORAN MONITORING PKL",
        columns: &["Tanggal", "NIS", "Nama Siswa", "Rombel", "Perusahaan"],
        filename: "Laporan_Monitoring_PKL",
        needs_kategori: false,
    },
    ReportPreset {
        key: "rekap-kategori",
        title: "REKAP SISWA PKL - {kategori}",
        columns: &["NIS", "Nama", "Rombel", "Perusahaan", "Kecamatan", "Status"],
        filename: "Rekap_By_Kategori_{kategori}",
        needs_kategori: true,
    },
];

impl ReportPreset {
    pub fn all() -> &'static [ReportPreset] {
        &PRESETS
    }

    pub fn find(key: &str) -> Option<&'static ReportPreset> {
        PRESETS.iter().find(|preset| preset.key == key)
    }

    /// Build a report request from this preset.
    pub fn request(
        &self,
        kategori: Option<&str>,
        rows: Vec<ReportRow>,
        tanggal: Option<String>,
    ) -> Result<LaporanRequest, String> {
        let kategori = kategori.map(str::trim).filter(|k| !k.is_empty());
        let kategori = match (self.needs_kategori, kategori) {
            (true, None) => {
                let mut errors = ValidationErrors::new();
                errors.add(ValidationError::empty_field("kategori", "Kategori"));
                return Err(errors.to_message());
            }
            (_, kategori) => kategori.unwrap_or_default(),
        };

        Ok(LaporanRequest {
            title: self.title.replace("{kategori}", kategori),
            columns: self.columns.iter().map(|c| c.to_string()).collect(),
            rows,
            filename: Some(self.filename.replace("{kategori}", &underscore_spaces(kategori))),
            tanggal,
        })
    }
}
