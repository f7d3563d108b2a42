//! Sertifikat PKL: completion certificate for one student.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::canvas::{Align, Canvas, FontStyle};
use super::Composer;
use crate::config::InstitutionProfile;
use crate::document::common::download_filename;
use crate::document::traits::{Generator, Validator};
use crate::document::validation::{validate_required, validate_score, ValidationErrors};
use crate::document::{CompositionError, RenderedDocument};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SertifikatRequest {
    #[schema(example = "Budi Santoso")]
    pub nama: String,
    #[serde(default)]
    pub nis: String,
    #[serde(default)]
    pub rombel: String,
    #[schema(example = "PT. SO GOOD FOOD")]
    pub nama_perusahaan: String,
    #[serde(default)]
    #[schema(example = "1 Juli 2024 - 30 September 2024")]
    pub periode: String,
    /// Final score. `null` or absent omits the score line; `0` prints `0.00`.
    #[serde(default)]
    #[schema(example = 80.0)]
    pub nilai: Option<f64>,
    #[serde(default)]
    pub tanggal: Option<String>,
}

impl Validator for SertifikatRequest {
    fn validate(&self) -> Result<(), String> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.nama, "nama", "Nama Siswa", &mut errors);
        validate_required(
            &self.nama_perusahaan,
            "nama_perusahaan",
            "Nama Perusahaan",
            &mut errors,
        );
        validate_score(self.nilai, "nilai", &mut errors);
        errors.into_result()
    }
}

pub fn layout(profile: &InstitutionProfile, request: &SertifikatRequest, tanggal: &str) -> Canvas {
    let mut doc = Canvas::new(format!("Sertifikat PKL {}", request.nama));
    let width = doc.page_width();
    let height = doc.page_height();
    let center = width / 2.0;

    // double frame
    doc.set_line_width(2.0);
    doc.rect(10.0, 10.0, width - 20.0, height - 20.0);
    doc.set_line_width(1.0);
    doc.rect(15.0, 15.0, width - 30.0, height - 30.0);

    doc.set_font_size(20.0);
    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned("SERTIFIKAT", center, 50.0, Align::Center);
    doc.text_aligned("PRAKTIK KERJA LAPANGAN", center, 70.0, Align::Center);

    doc.set_font_size(14.0);
    doc.text_aligned(profile.full_title(), center, 90.0, Align::Center);

    doc.set_font_size(12.0);
    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned("Diberikan kepada:", center, 120.0, Align::Center);

    doc.set_font_size(16.0);
    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned(request.nama.as_str(), center, 140.0, Align::Center);

    doc.set_font_size(12.0);
    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned(format!("NIS: {}", request.nis), center, 155.0, Align::Center);
    doc.text_aligned(format!("Kelas: {}", request.rombel), center, 170.0, Align::Center);
    doc.text_aligned(
        "Yang telah menyelesaikan Praktik Kerja Lapangan di",
        center,
        190.0,
        Align::Center,
    );

    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned(request.nama_perusahaan.as_str(), center, 205.0, Align::Center);

    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned(format!("Periode: {}", request.periode), center, 220.0, Align::Center);

    if let Some(nilai) = request.nilai {
        doc.text_aligned(
            format!("Dengan nilai: {:.2}", nilai),
            center,
            235.0,
            Align::Center,
        );
    }

    let right = width - 40.0;
    doc.text_aligned(format!("{}, {}", profile.city, tanggal), right, 260.0, Align::Right);
    doc.text_aligned(profile.headmaster_role(), right, 275.0, Align::Right);
    doc.text_aligned(profile.headmaster_name.as_str(), right, 290.0, Align::Right);

    doc
}

impl Generator<SertifikatRequest> for Composer {
    fn generate(&self, request: &SertifikatRequest) -> Result<RenderedDocument, CompositionError> {
        log::info!("Composing sertifikat for {}", request.nama);
        let tanggal = self.tanggal(request.tanggal.as_deref());
        let canvas = layout(self.profile(), request, &tanggal);
        let filename = download_filename("Sertifikat", &request.nama, "pdf");
        self.finish(canvas, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::pdf::DrawOp;

    fn student(nilai: Option<f64>) -> SertifikatRequest {
        SertifikatRequest {
            nama: "Budi Santoso".to_string(),
            nis: "12345".to_string(),
            rombel: "XII TKJ 1".to_string(),
            nama_perusahaan: "PT. SO GOOD FOOD".to_string(),
            periode: "Juli - September 2024".to_string(),
            nilai,
            tanggal: None,
        }
    }

    fn score_line(canvas: &Canvas) -> Option<String> {
        canvas
            .texts_on(0)
            .into_iter()
            .find(|(text, _)| text.starts_with("Dengan nilai"))
            .map(|(text, _)| text.to_string())
    }

    #[test]
    fn test_double_frame() {
        let canvas = layout(&InstitutionProfile::default(), &student(None), "28 Juli 2024");
        let frames: Vec<&DrawOp> = canvas.pages()[0]
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { .. }))
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0],
            &DrawOp::Rect { x: 10.0, y: 10.0, w: 190.0, h: 277.0, width: 2.0 }
        );
        assert_eq!(
            frames[1],
            &DrawOp::Rect { x: 15.0, y: 15.0, w: 180.0, h: 267.0, width: 1.0 }
        );
    }

    #[test]
    fn test_score_line_presence() {
        let profile = InstitutionProfile::default();
        assert_eq!(
            score_line(&layout(&profile, &student(Some(80.0)), "x")).as_deref(),
            Some("Dengan nilai: 80.00")
        );
        assert_eq!(
            score_line(&layout(&profile, &student(Some(0.0)), "x")).as_deref(),
            Some("Dengan nilai: 0.00")
        );
        assert_eq!(score_line(&layout(&profile, &student(None), "x")), None);
    }

    #[test]
    fn test_validation_rejects_out_of_range_score() {
        assert!(student(Some(101.0)).validate().is_err());
        assert!(student(Some(87.5)).validate().is_ok());
    }
}
