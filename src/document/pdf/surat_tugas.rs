//! Surat Tugas: assigns a supervising teacher to a placement company.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::canvas::{Align, Canvas, FontStyle};
use super::Composer;
use crate::config::InstitutionProfile;
use crate::document::common::download_filename;
use crate::document::traits::{Generator, Validator};
use crate::document::validation::{validate_required, ValidationErrors};
use crate::document::{CompositionError, RenderedDocument};

const TEACHER_NAME_PLACEHOLDER: &str = "[NAMA GURU]";
const TEACHER_NIP_PLACEHOLDER: &str = "[NIP GURU]";

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SuratTugasRequest {
    #[schema(example = "PT. SO GOOD FOOD")]
    pub nama_perusahaan: String,
    /// Supervising teacher; `[NAMA GURU]` is printed when absent.
    #[serde(default)]
    pub nama_guru: Option<String>,
    #[serde(default)]
    pub nip_guru: Option<String>,
    #[serde(default)]
    pub tanggal: Option<String>,
}

impl Validator for SuratTugasRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(
            &self.nama_perusahaan,
            "nama_perusahaan",
            "Nama Perusahaan",
            &mut errors,
        );
        errors.into_result()
    }
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(placeholder)
}

pub fn layout(profile: &InstitutionProfile, request: &SuratTugasRequest, tanggal: &str) -> Canvas {
    let mut doc = Canvas::new("Surat Tugas");
    let width = doc.page_width();
    let center = width / 2.0;

    doc.set_font_size(16.0);
    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned("SURAT TUGAS", center, 30.0, Align::Center);

    doc.set_font_size(12.0);
    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned(profile.name.as_str(), center, 45.0, Align::Center);
    doc.text_aligned(
        format!("Nomor: {}", profile.assignment_letter_number),
        center,
        55.0,
        Align::Center,
    );

    doc.set_line_width(0.5);
    doc.line(20.0, 65.0, width - 20.0, 65.0);

    doc.set_font_style(FontStyle::Bold);
    doc.text("MENUGASKAN:", 20.0, 85.0);

    doc.set_font_style(FontStyle::Normal);
    let name = or_placeholder(request.nama_guru.as_deref(), TEACHER_NAME_PLACEHOLDER);
    let nip = or_placeholder(request.nip_guru.as_deref(), TEACHER_NIP_PLACEHOLDER);
    doc.text(format!("Nama: {}", name), 20.0, 100.0);
    doc.text(format!("NIP: {}", nip), 20.0, 110.0);
    doc.text("Jabatan: Guru Pembimbing PKL", 20.0, 120.0);

    doc.set_font_style(FontStyle::Bold);
    doc.text("UNTUK:", 20.0, 140.0);

    doc.set_font_style(FontStyle::Normal);
    doc.text(
        format!(
            "Melaksanakan pembimbingan siswa PKL di {}",
            request.nama_perusahaan
        ),
        20.0,
        155.0,
    );
    doc.text("Periode: [TANGGAL MULAI] s/d [TANGGAL SELESAI]", 20.0, 165.0);
    doc.text("Dengan ketentuan:", 20.0, 180.0);
    doc.text("1. Melakukan monitoring dan evaluasi siswa PKL", 30.0, 190.0);
    doc.text("2. Memberikan bimbingan sesuai dengan bidang keahlian", 30.0, 200.0);
    doc.text("3. Membuat laporan hasil pembimbingan", 30.0, 210.0);

    doc.text_aligned(
        format!("{}, {}", profile.city, tanggal),
        width - 20.0,
        240.0,
        Align::Right,
    );
    doc.text_aligned(profile.headmaster_role(), width - 60.0, 260.0, Align::Center);
    doc.text_aligned(profile.headmaster_name.as_str(), width - 60.0, 280.0, Align::Center);

    doc
}

impl Generator<SuratTugasRequest> for Composer {
    fn generate(&self, request: &SuratTugasRequest) -> Result<RenderedDocument, CompositionError> {
        log::info!(
            "Composing surat tugas for {} at {}",
            request.nama_guru.as_deref().unwrap_or(TEACHER_NAME_PLACEHOLDER),
            request.nama_perusahaan
        );
        let tanggal = self.tanggal(request.tanggal.as_deref());
        let canvas = layout(self.profile(), request, &tanggal);
        let filename = download_filename("Surat_Tugas", &request.nama_perusahaan, "pdf");
        self.finish(canvas, filename)
    }
}
