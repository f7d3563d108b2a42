//! Surat Pengajuan PKL: the placement request letter sent to a company.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::canvas::{Align, Canvas, FontStyle};
use super::Composer;
use crate::config::InstitutionProfile;
use crate::document::common::download_filename;
use crate::document::traits::{Generator, Validator};
use crate::document::validation::{validate_required, ValidationErrors};
use crate::document::{CompositionError, RenderedDocument};

const BODY_TOP: f32 = 165.0;
const LINE_STEP: f32 = 10.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SuratPengajuanRequest {
    #[schema(example = "PT. SO GOOD FOOD")]
    pub nama_perusahaan: String,
    #[serde(default)]
    pub alamat_perusahaan: Option<String>,
    /// Letter date; today when absent.
    #[serde(default)]
    #[schema(example = "2024-07-28")]
    pub tanggal: Option<String>,
}

impl Validator for SuratPengajuanRequest {
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

fn body_lines(profile: &InstitutionProfile) -> Vec<String> {
    vec![
        format!(
            "Kami sampaikan, bahwa pelaksanaan Praktik Kerja Lapangan (PKL) siswa {}",
            profile.display_name
        ),
        format!(
            "{} akan dilaksanakan dalam 3 (tiga) bulan. Berkaitan dengan hal di atas, dengan ini",
            profile.city
        ),
        "kami ajukan permohonan izin Program Praktik Kerja Lapangan di perusahaan yang Bapak/Ibu"
            .to_string(),
        "pimpin.".to_string(),
        String::new(),
        "Adapun ketentuan pelaksanaan PKL adalah sebagai berikut:".to_string(),
        "1. Waktu pelaksanaan: 3 bulan".to_string(),
        "2. Jumlah siswa: akan ditentukan kemudian".to_string(),
        "3. Bidang keahlian: sesuai dengan program studi siswa".to_string(),
        String::new(),
        "Untuk melaksanakan PKL di perusahaan ini, atas perhatian dan kerjasamanya kami"
            .to_string(),
        "sampaikan terima kasih.".to_string(),
    ]
}

pub fn layout(profile: &InstitutionProfile, request: &SuratPengajuanRequest, tanggal: &str) -> Canvas {
    let mut doc = Canvas::new("Surat Pengajuan PKL");
    let width = doc.page_width();
    let center = width / 2.0;

    doc.set_font_size(16.0);
    doc.set_font_style(FontStyle::Bold);
    doc.text_aligned("SURAT PENGAJUAN PKL", center, 30.0, Align::Center);

    doc.set_font_size(14.0);
    doc.text_aligned(profile.name.as_str(), center, 45.0, Align::Center);

    doc.set_font_size(12.0);
    doc.set_font_style(FontStyle::Normal);
    doc.text_aligned(profile.address.as_str(), center, 55.0, Align::Center);
    doc.text_aligned(profile.phone.as_str(), center, 65.0, Align::Center);

    doc.set_line_width(0.5);
    doc.line(20.0, 75.0, width - 20.0, 75.0);

    doc.text_aligned(
        format!("{}, {}", profile.city, tanggal),
        width - 20.0,
        90.0,
        Align::Right,
    );

    doc.text("Kepada Yth.", 20.0, 110.0);
    doc.text(format!("Pimpinan {}", request.nama_perusahaan), 20.0, 120.0);
    if let Some(address) = request
        .alamat_perusahaan
        .as_deref()
        .filter(|address| !address.trim().is_empty())
    {
        doc.text(address, 20.0, 130.0);
    }

    doc.text("Dengan Hormat,", 20.0, 150.0);

    let mut y = BODY_TOP;
    for line in body_lines(profile) {
        doc.text(line, 20.0, y);
        y += LINE_STEP;
    }

    doc.text_aligned(profile.headmaster_role(), width - 60.0, y + 30.0, Align::Center);
    doc.text_aligned(profile.headmaster_name.as_str(), width - 60.0, y + 70.0, Align::Center);
    doc.text_aligned("Ketua Pokja PKL", 60.0, y + 30.0, Align::Center);
    doc.text_aligned(profile.pokja_chair_name.as_str(), 60.0, y + 70.0, Align::Center);

    doc
}

impl Generator<SuratPengajuanRequest> for Composer {
    fn generate(&self, request: &SuratPengajuanRequest) -> Result<RenderedDocument, CompositionError> {
        log::info!("Composing surat pengajuan for {}", request.nama_perusahaan);
        let tanggal = self.tanggal(request.tanggal.as_deref());
        let canvas = layout(self.profile(), request, &tanggal);
        let filename = download_filename("Surat_Pengajuan", &request.nama_perusahaan, "pdf");
        self.finish(canvas, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(address: Option<&str>) -> SuratPengajuanRequest {
        SuratPengajuanRequest {
            nama_perusahaan: "PT. SO GOOD FOOD".to_string(),
            alamat_perusahaan: address.map(str::to_string),
            tanggal: None,
        }
    }

    #[test]
    fn test_recipient_block_and_signatures() {
        let profile = InstitutionProfile::default();
        let canvas = layout(&profile, &request(Some("Jl. Raya Krian")), "28 Juli 2024");
        let texts = canvas.texts_on(0);

        assert!(texts.contains(&("Pimpinan PT. SO GOOD FOOD", 120.0)));
        assert!(texts.contains(&("Jl. Raya Krian", 130.0)));
        assert!(texts.contains(&("Sidoarjo, 28 Juli 2024", 90.0)));
        // 12 body lines from 165 leave the cursor at 285.
        assert!(texts.contains(&("Kepala SMK Krian 1", 315.0)));
        assert!(texts.contains(&("Ahmad Ridho, S.Kom", 355.0)));
    }

    #[test]
    fn test_missing_address_is_skipped() {
        let profile = InstitutionProfile::default();
        let canvas = layout(&profile, &request(None), "28 Juli 2024");
        assert!(canvas.texts_on(0).iter().all(|(_, y)| *y != 130.0));
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_validation_requires_company() {
        let empty = SuratPengajuanRequest::default();
        let message = empty.validate().unwrap_err();
        assert!(message.contains("Nama Perusahaan wajib diisi"));
        assert!(request(None).validate().is_ok());
    }
}
