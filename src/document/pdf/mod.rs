//! Fixed-layout PDF composition.
//!
//! Each layout is a plain function that draws onto a [`Canvas`]; the
//! [`Composer`] resolves the letter date, runs the layout and serializes
//! the canvas with printpdf. Geometry is in millimetres on A4 portrait with
//! the origin at the top-left corner.

mod backend;
mod canvas;
pub mod laporan;
mod metrics;
pub mod sertifikat;
pub mod surat_pengajuan;
pub mod surat_tugas;

pub use canvas::{Align, Canvas, DrawOp, FontStyle, A4_HEIGHT_MM, A4_WIDTH_MM};
pub use laporan::{LaporanRequest, ReportPreset};
pub use sertifikat::SertifikatRequest;
pub use surat_pengajuan::SuratPengajuanRequest;
pub use surat_tugas::SuratTugasRequest;

use super::common::{format_indonesian_date, reformat_date};
use super::{CompositionError, RenderedDocument};
use crate::config::InstitutionProfile;

/// Draws the fixed documents for one institution.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    profile: InstitutionProfile,
}

impl Composer {
    pub fn new(profile: InstitutionProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &InstitutionProfile {
        &self.profile
    }

    /// Date line value: the caller's date reformatted, or today.
    fn tanggal(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => reformat_date(value),
            None => format_indonesian_date(),
        }
    }

    fn finish(&self, canvas: Canvas, filename: String) -> Result<RenderedDocument, CompositionError> {
        let pdf = canvas.to_pdf().map_err(|e| {
            log::error!("Failed to compose '{}': {}", canvas.title(), e);
            e
        })?;
        log::info!(
            "Composed '{}' ({} page(s), {} bytes) as {}",
            canvas.title(),
            canvas.page_count(),
            pdf.len(),
            filename
        );
        Ok(RenderedDocument::pdf(filename, pdf))
    }
}
