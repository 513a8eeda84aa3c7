use crate::error::{CoreError, CoreResult};
use base64::Engine;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;

/// Wrapper around the pdfium library for PDF operations.
///
/// Not `Send`-free: callers on the server path serialise access to a single
/// `PdfEngine` behind a process-wide mutex (see `pdfsearch_server::state`),
/// since pdfium's render path is not safe to call concurrently.
pub struct PdfEngine {
    pdfium: Pdfium,
}

impl PdfEngine {
    /// Create a new PdfEngine, loading the pdfium library.
    pub fn new() -> CoreResult<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("."))
            })
            .map_err(|e| {
                CoreError::Pdfium(format!(
                    "Failed to load pdfium library: {e}\n\
                     Install pdfium: download from https://github.com/nicklockwood/pdfium-binaries/releases\n\
                     Place libpdfium.dylib (macOS) / libpdfium.so (Linux) in the project directory or system path."
                ))
            })?;
        let pdfium = Pdfium::new(bindings);
        Ok(Self { pdfium })
    }

    /// Open a PDF document from a file path.
    pub fn open_document(&self, path: &Path) -> CoreResult<PdfDocument<'_>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| CoreError::Pdf(format!("Failed to open PDF '{}': {e}", path.display())))
    }

    /// Get the total number of pages in a document.
    pub fn page_count(doc: &PdfDocument) -> u32 {
        doc.pages().len() as u32
    }

    /// Render a single page (0-based index) as a PNG image at the given DPI.
    ///
    /// Returns (base64_string, raw_png_bytes).
    pub fn render_page_as_image(page: &PdfPage, dpi: u32) -> CoreResult<(String, Vec<u8>)> {
        let scale = dpi as f32 / 72.0;
        let width = (page.width().value * scale) as i32;
        let height = (page.height().value * scale) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CoreError::Image(format!("Failed to render page: {e}")))?;

        let img: DynamicImage = bitmap.as_image();

        let mut png_bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut png_bytes);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| CoreError::Image(format!("Failed to encode PNG: {e}")))?;

        let b64 = base64::engine::general_purpose::STANDARD.encode(&png_bytes);

        Ok((b64, png_bytes))
    }

    /// Extract raw text content from a page, untrimmed and unsanitised.
    pub fn extract_page_text(page: &PdfPage) -> String {
        page.text()
            .map(|t| t.all())
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}
