//! OCR and PDF backends
//!
//! - Tesseract (TSV output) for recognizing text lines in raster images
//! - lopdf for the per-page text layer of PDFs
//! - pdftoppm (poppler-utils) for rasterizing PDF pages

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

/// One recognized text line
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    /// Line text
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
}

/// Recognizes text lines in an encoded image
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize lines in reading order
    async fn recognize(&self, image: &[u8]) -> Result<Vec<OcrLine>>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Reads and rasterizes PDFs
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Text layer of each page, in page order
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>>;

    /// Render every page to an encoded image, in page order
    async fn render_pages(&self, path: &Path) -> Result<Vec<Vec<u8>>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Tesseract command-line OCR
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    /// Create from extraction settings
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.ocr_language.clone(),
        }
    }

    /// Check if the tesseract binary can be run
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(command: &str, language: &str, image: &[u8]) -> Result<Vec<OcrLine>> {
        let temp_dir = tempfile::tempdir()?;
        let input_path = temp_dir.path().join("input.img");
        std::fs::write(&input_path, image)?;

        let output = Command::new(command)
            .arg(&input_path)
            .arg("stdout")
            .args(["-l", language, "tsv"])
            .output()
            .map_err(|e| Error::extraction(format!("Failed to run {}: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(format!("tesseract error: {}", stderr.trim())));
        }

        Ok(parse_tsv_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<Vec<OcrLine>> {
        let command = self.command.clone();
        let language = self.language.clone();
        let image = image.to_vec();

        tokio::task::spawn_blocking(move || Self::run(&command, &language, &image))
            .await
            .map_err(|e| Error::internal(format!("OCR task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Group Tesseract TSV word rows into lines.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Word rows are level 5; rows with a
/// negative confidence or blank text carry no word.
pub fn parse_tsv_lines(tsv: &str) -> Vec<OcrLine> {
    // (page, block, par, line) -> (first row index, words, confidences)
    let mut lines: BTreeMap<(u32, u32, u32, u32), (usize, Vec<String>, Vec<f32>)> =
        BTreeMap::new();

    for (row, record) in tsv.lines().skip(1).enumerate() {
        let fields: Vec<&str> = record.splitn(12, '\t').collect();
        if fields.len() < 12 || fields[0] != "5" {
            continue;
        }

        let Ok(conf) = fields[10].trim().parse::<f32>() else {
            continue;
        };
        let word = fields[11].trim();
        if conf < 0.0 || word.is_empty() {
            continue;
        }

        let num = |i: usize| fields[i].trim().parse::<u32>().unwrap_or(0);
        let key = (num(1), num(2), num(3), num(4));

        let entry = lines.entry(key).or_insert_with(|| (row, Vec::new(), Vec::new()));
        entry.1.push(word.to_string());
        entry.2.push(conf);
    }

    let mut ordered: Vec<_> = lines.into_values().collect();
    ordered.sort_by_key(|(row, _, _)| *row);

    ordered
        .into_iter()
        .map(|(_, words, confs)| {
            let mean = confs.iter().sum::<f32>() / confs.len() as f32;
            OcrLine {
                text: words.join(" "),
                confidence: (mean / 100.0).clamp(0.0, 1.0),
            }
        })
        .collect()
}

/// lopdf text layer plus pdftoppm rendering
pub struct LocalPdfBackend {
    pdftoppm: String,
    dpi: u32,
}

impl LocalPdfBackend {
    /// Create from extraction settings
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            pdftoppm: config.pdftoppm_cmd.clone(),
            dpi: config.render_dpi,
        }
    }

    fn extract_page_texts(data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::debug!("No text layer on page {}: {}", page_num, e);
                    texts.push(String::new());
                }
            }
        }
        Ok(texts)
    }

    fn render(pdftoppm: &str, dpi: u32, path: &Path) -> Result<Vec<Vec<u8>>> {
        let temp_dir = tempfile::tempdir()?;
        let prefix = temp_dir.path().join("page");

        let output = Command::new(pdftoppm)
            .args(["-png", "-r", &dpi.to_string()])
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::extraction(format!("Failed to run {}: {}", pdftoppm, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(format!("pdftoppm error: {}", stderr.trim())));
        }

        // pdftoppm zero-pads page numbers, so name order is page order
        let mut images: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort();

        images
            .iter()
            .map(|p| std::fs::read(p).map_err(Error::from))
            .collect()
    }
}

#[async_trait]
impl PdfBackend for LocalPdfBackend {
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let data = tokio::fs::read(path).await?;
        tokio::task::spawn_blocking(move || Self::extract_page_texts(&data))
            .await
            .map_err(|e| Error::internal(format!("PDF task failed: {}", e)))?
    }

    async fn render_pages(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let pdftoppm = self.pdftoppm.clone();
        let dpi = self.dpi;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || Self::render(&pdftoppm, dpi, &path))
            .await
            .map_err(|e| Error::internal(format!("Render task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "lopdf+pdftoppm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t\n\
             4\t1\t1\t1\t1\t0\t0\t0\t100\t10\t-1\t\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90\tHello\n\
             5\t1\t1\t1\t1\t2\t12\t0\t10\t10\t70\tworld\n\
             5\t1\t1\t1\t2\t1\t0\t12\t10\t10\t60\tSecond\n\
             5\t1\t1\t1\t2\t2\t12\t12\t10\t10\t-1\t \n"
        );

        let lines = parse_tsv_lines(&tsv);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello world");
        assert!((lines[0].confidence - 0.8).abs() < 1e-6);
        assert_eq!(lines[1].text, "Second");
        assert!((lines[1].confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_empty_output() {
        assert!(parse_tsv_lines("").is_empty());
        assert!(parse_tsv_lines(HEADER).is_empty());
    }

    #[tokio::test]
    async fn test_page_texts_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let backend = LocalPdfBackend::new(&ExtractionConfig::default());
        let err = backend.page_texts(&path).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed { .. }));
    }
}
