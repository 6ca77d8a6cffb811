//! Text extraction with OCR fallback

use std::path::Path;
use std::sync::Arc;

use super::engines::{LocalPdfBackend, OcrEngine, OcrLine, PdfBackend, TesseractOcr};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{ExtractionResult, FileType};

/// How a file's text is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// PDF text layer only
    DirectText,
    /// OCR the whole image
    ImageOcr,
    /// PDF text layer, rendering and OCR'ing pages when it is too short
    PdfOcrFallback,
}

impl ExtractionStrategy {
    /// Pick the strategy for a file extension
    pub fn for_extension(ext: &str, pdf_ocr_fallback: bool) -> Result<Self> {
        match FileType::from_extension(ext) {
            FileType::Image => Ok(Self::ImageOcr),
            FileType::Pdf if pdf_ocr_fallback => Ok(Self::PdfOcrFallback),
            FileType::Pdf => Ok(Self::DirectText),
            FileType::Unknown => Err(Error::UnsupportedFileType(ext.to_string())),
        }
    }
}

/// Whether a PDF text layer is long enough to skip OCR
pub fn has_usable_text(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// Mean line confidence, 0 when nothing was recognized
fn mean_confidence(lines: &[OcrLine]) -> f32 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|l| l.confidence).sum::<f32>() / lines.len() as f32
}

fn join_lines(lines: &[OcrLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs extraction strategies against pluggable engines
pub struct Extractor {
    ocr: Arc<dyn OcrEngine>,
    pdf: Arc<dyn PdfBackend>,
    min_direct_text_chars: usize,
    pdf_ocr_fallback: bool,
}

impl Extractor {
    /// Create with explicit engines
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        pdf: Arc<dyn PdfBackend>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            ocr,
            pdf,
            min_direct_text_chars: config.min_direct_text_chars,
            pdf_ocr_fallback: config.pdf_ocr_fallback,
        }
    }

    /// Create with Tesseract and the local PDF backend
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let ocr = TesseractOcr::new(config);
        if !ocr.is_available() {
            tracing::warn!(
                "'{}' not found; image uploads and scanned PDFs will fail",
                config.tesseract_cmd
            );
        }
        Self::new(Arc::new(ocr), Arc::new(LocalPdfBackend::new(config)), config)
    }

    /// Strategy for an extension under this extractor's settings
    pub fn strategy_for(&self, ext: &str) -> Result<ExtractionStrategy> {
        ExtractionStrategy::for_extension(ext, self.pdf_ocr_fallback)
    }

    /// Extract text from a file, choosing the strategy by extension
    pub async fn extract(&self, path: &Path, ext: &str) -> Result<ExtractionResult> {
        let strategy = self.strategy_for(ext)?;
        self.run(strategy, path).await
    }

    /// Extract text with a given strategy
    pub async fn run(&self, strategy: ExtractionStrategy, path: &Path) -> Result<ExtractionResult> {
        let result = match strategy {
            ExtractionStrategy::ImageOcr => self.image_ocr(path).await?,
            ExtractionStrategy::DirectText => self.direct_text(path).await?,
            ExtractionStrategy::PdfOcrFallback => self.pdf_with_fallback(path).await?,
        };

        tracing::info!(
            "Extracted {} words from {} ({:?}, {} pages, confidence {:.2})",
            result.word_count,
            path.display(),
            strategy,
            result.pages,
            result.confidence
        );
        Ok(result)
    }

    async fn image_ocr(&self, path: &Path) -> Result<ExtractionResult> {
        let image = tokio::fs::read(path).await?;
        let lines = self.ocr.recognize(&image).await?;
        Ok(ExtractionResult::new(join_lines(&lines), 1, mean_confidence(&lines)))
    }

    async fn direct_text(&self, path: &Path) -> Result<ExtractionResult> {
        let pages = self.pdf.page_texts(path).await?;
        if pages.is_empty() {
            return Err(Error::extraction("PDF has no pages"));
        }
        Ok(ExtractionResult::new(pages.join("\n"), pages.len() as u32, 1.0))
    }

    async fn pdf_with_fallback(&self, path: &Path) -> Result<ExtractionResult> {
        match self.pdf.page_texts(path).await {
            Ok(pages) if !pages.is_empty() => {
                let text = pages.join("\n");
                if has_usable_text(&text, self.min_direct_text_chars) {
                    return Ok(ExtractionResult::new(text, pages.len() as u32, 1.0));
                }
                tracing::info!(
                    "Text layer of {} too short ({} chars), falling back to OCR",
                    path.display(),
                    text.trim().chars().count()
                );
            }
            Ok(_) => tracing::info!("No text layer in {}, falling back to OCR", path.display()),
            Err(e) => tracing::warn!(
                "{} could not read {}: {}; falling back to OCR",
                self.pdf.name(),
                path.display(),
                e
            ),
        }

        self.ocr_rendered_pages(path).await
    }

    async fn ocr_rendered_pages(&self, path: &Path) -> Result<ExtractionResult> {
        let images = self.pdf.render_pages(path).await?;
        if images.is_empty() {
            return Err(Error::extraction(format!(
                "{} rendered no pages from {}",
                self.pdf.name(),
                path.display()
            )));
        }

        let mut page_texts = Vec::new();
        let mut all_lines = Vec::new();
        for image in &images {
            let lines = self.ocr.recognize(image).await?;
            if !lines.is_empty() {
                page_texts.push(join_lines(&lines));
            }
            all_lines.extend(lines);
        }

        Ok(ExtractionResult::new(
            page_texts.join("\n\n"),
            images.len() as u32,
            mean_confidence(&all_lines),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// OCR fake returning canned lines per call, in order
    pub(crate) struct FakeOcr {
        pub responses: Mutex<Vec<Vec<OcrLine>>>,
        pub calls: Mutex<usize>,
    }

    impl FakeOcr {
        pub fn new(responses: Vec<Vec<OcrLine>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for FakeOcr {
        async fn recognize(&self, _image: &[u8]) -> Result<Vec<OcrLine>> {
            *self.calls.lock() += 1;
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(responses.remove(0))
            }
        }

        fn name(&self) -> &str {
            "fake-ocr"
        }
    }

    /// PDF fake with fixed page texts and rendered page count
    pub(crate) struct FakePdf {
        pub texts: Result<Vec<String>>,
        pub rendered: usize,
    }

    #[async_trait]
    impl PdfBackend for FakePdf {
        async fn page_texts(&self, _path: &Path) -> Result<Vec<String>> {
            match &self.texts {
                Ok(texts) => Ok(texts.clone()),
                Err(e) => Err(Error::extraction(e.to_string())),
            }
        }

        async fn render_pages(&self, _path: &Path) -> Result<Vec<Vec<u8>>> {
            Ok(vec![vec![0u8]; self.rendered])
        }

        fn name(&self) -> &str {
            "fake-pdf"
        }
    }

    pub(crate) fn line(text: &str, confidence: f32) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            confidence,
        }
    }

    fn extractor(ocr: Arc<FakeOcr>, pdf: FakePdf) -> Extractor {
        Extractor::new(ocr, Arc::new(pdf), &ExtractionConfig::default())
    }

    fn temp_file(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, b"bytes").unwrap();
        (dir, path)
    }

    #[test]
    fn test_strategy_for_extension() {
        assert_eq!(
            ExtractionStrategy::for_extension(".PNG", true).unwrap(),
            ExtractionStrategy::ImageOcr
        );
        assert_eq!(
            ExtractionStrategy::for_extension(".pdf", true).unwrap(),
            ExtractionStrategy::PdfOcrFallback
        );
        assert_eq!(
            ExtractionStrategy::for_extension(".pdf", false).unwrap(),
            ExtractionStrategy::DirectText
        );
        assert!(matches!(
            ExtractionStrategy::for_extension(".docx", true),
            Err(Error::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_usable_text_boundary() {
        let nineteen = "a".repeat(19);
        let twenty = "a".repeat(20);
        assert!(!has_usable_text(&nineteen, 20));
        assert!(has_usable_text(&twenty, 20));
        assert!(!has_usable_text(&format!("   {}\n\n", nineteen), 20));
    }

    #[tokio::test]
    async fn test_image_ocr() {
        let (_dir, path) = temp_file("scan.png");
        let ocr = Arc::new(FakeOcr::new(vec![vec![
            line("Hello world", 0.9),
            line("again", 0.7),
        ]]));
        let result = extractor(ocr, FakePdf { texts: Ok(vec![]), rendered: 0 })
            .extract(&path, ".png")
            .await
            .unwrap();

        assert_eq!(result.text, "Hello world again");
        assert_eq!(result.pages, 1);
        assert_eq!(result.word_count, 3);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_image_with_no_text() {
        let (_dir, path) = temp_file("blank.jpg");
        let ocr = Arc::new(FakeOcr::new(vec![]));
        let result = extractor(ocr, FakePdf { texts: Ok(vec![]), rendered: 0 })
            .extract(&path, ".jpg")
            .await
            .unwrap();

        assert_eq!(result.text, "");
        assert_eq!(result.word_count, 0);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_pdf_text_layer_skips_ocr() {
        let (_dir, path) = temp_file("doc.pdf");
        let ocr = Arc::new(FakeOcr::new(vec![]));
        let pdf = FakePdf {
            texts: Ok(vec!["a".repeat(20), "second page".to_string()]),
            rendered: 2,
        };
        let result = extractor(ocr.clone(), pdf).extract(&path, ".pdf").await.unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.text, format!("{}\nsecond page", "a".repeat(20)));
        assert_eq!(result.word_count, 3);
        assert_eq!(*ocr.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_short_text_layer_falls_back_to_ocr() {
        let (_dir, path) = temp_file("scan.pdf");
        let ocr = Arc::new(FakeOcr::new(vec![
            vec![line("page one", 0.9)],
            vec![],
            vec![line("page three", 0.5)],
        ]));
        let pdf = FakePdf {
            texts: Ok(vec!["a".repeat(19)]),
            rendered: 3,
        };
        let result = extractor(ocr.clone(), pdf).extract(&path, ".pdf").await.unwrap();

        assert_eq!(result.text, "page one\n\npage three");
        assert_eq!(result.pages, 3);
        assert_eq!(result.word_count, 4);
        assert!((result.confidence - 0.7).abs() < 1e-6);
        assert_eq!(*ocr.calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_falls_back_to_ocr() {
        let (_dir, path) = temp_file("odd.pdf");
        let ocr = Arc::new(FakeOcr::new(vec![vec![line("recovered", 0.6)]]));
        let pdf = FakePdf {
            texts: Err(Error::extraction("bad xref")),
            rendered: 1,
        };
        let result = extractor(ocr, pdf).extract(&path, ".pdf").await.unwrap();
        assert_eq!(result.text, "recovered");
    }

    #[tokio::test]
    async fn test_fallback_with_no_rendered_pages_fails() {
        let (_dir, path) = temp_file("empty.pdf");
        let ocr = Arc::new(FakeOcr::new(vec![]));
        let pdf = FakePdf {
            texts: Ok(vec![String::new()]),
            rendered: 0,
        };
        let err = extractor(ocr, pdf).extract(&path, ".pdf").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn test_direct_text_without_fallback() {
        let (_dir, path) = temp_file("short.pdf");
        let config = ExtractionConfig {
            pdf_ocr_fallback: false,
            ..Default::default()
        };
        let ocr = Arc::new(FakeOcr::new(vec![]));
        let pdf = FakePdf {
            texts: Ok(vec!["tiny".to_string()]),
            rendered: 1,
        };
        let result = Extractor::new(ocr.clone(), Arc::new(pdf), &config)
            .extract(&path, ".pdf")
            .await
            .unwrap();

        assert_eq!(result.text, "tiny");
        assert_eq!(*ocr.calls.lock(), 0);
    }
}
