use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Cursor, Write},
    path::Path,
    time::UNIX_EPOCH,
};

use crate::{
    error::ExportError,
    languages::LanguageStat,
    narrative::{DiagramSet, NarrativeSource},
    scoring::ComplexityLabel,
};

/// Everything known about one analyzed repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub repo_name: String,
    pub repo_url: String,
    pub summary: String,
    pub features: Vec<String>,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    pub architecture_type: String,
    pub architecture_explanation: String,
    pub mermaid_diagrams: DiagramSet,
    pub folder_tree: String,
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub improvements_suggestion: Vec<String>,
    pub security_risks: Vec<String>,
    pub complexity_score: u8,
    pub complexity_label: ComplexityLabel,
    pub code_quality_score: u8,
    pub file_count: usize,
    pub total_lines: usize,
    pub primary_language: String,
    pub language_stats: Vec<LanguageStat>,
    /// Whether the narrative fields came from the model or the fallback.
    pub narrative_source: NarrativeSource,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub fn schema_as_json_string() -> String {
    let schema = schemars::schema_for!(AnalysisReport);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

pub fn export_json(path: &Path, report: &AnalysisReport) -> Result<(), ExportError> {
    require_extension(path, "json")?;
    let content = serde_json::to_string_pretty(report)?;
    write_bytes_atomic(path, content.as_bytes())
}

pub fn export_pdf(path: &Path, report: &AnalysisReport) -> Result<(), ExportError> {
    require_extension(path, "pdf")?;
    let bytes = build_pdf_bytes(report)?;
    write_bytes_atomic(path, &bytes)
}

fn require_extension(path: &Path, ext: &str) -> Result<(), ExportError> {
    let matches = path
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.eq_ignore_ascii_case(ext))
        .unwrap_or(false);
    if matches {
        Ok(())
    } else {
        Err(ExportError::InvalidPath(format!(
            "{} must end in .{}",
            path.display(),
            ext
        )))
    }
}

/// Writes through a sibling temp file so readers never see a partial report.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(ExportError::InvalidPath(path.display().to_string())),
    };
    if !parent.is_dir() {
        return Err(ExportError::InvalidPath(format!(
            "directory {} does not exist",
            parent.display()
        )));
    }

    let tmp_name = format!(
        ".repovision-export-{}-{}.tmp",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    );
    let tmp = parent.join(tmp_name);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        let _ = file.sync_all();
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Plain-text rendering shared by the PDF export and the CLI.
pub fn report_lines(report: &AnalysisReport) -> Vec<String> {
    let mut lines = vec![
        format!("RepoVision report: {}", report.repo_name),
        format!("URL: {}", report.repo_url),
        format!("Analyzed: {}", report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!(
            "Complexity: {} ({}/100)   Code quality: {}/100",
            report.complexity_label, report.complexity_score, report.code_quality_score
        ),
        format!(
            "Files: {}   Lines: {}   Primary language: {}",
            report.file_count, report.total_lines, report.primary_language
        ),
        String::new(),
        "Summary".to_string(),
        report.summary.clone(),
        String::new(),
        format!("Architecture: {}", report.architecture_type),
        report.architecture_explanation.clone(),
    ];

    let mut section = |title: &str, items: &[String]| {
        if items.is_empty() {
            return;
        }
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(items.iter().map(|i| format!("- {}", i)));
    };
    section("Features", &report.features);
    section("Languages", &report.languages);
    section("Frameworks", &report.frameworks);
    section("Databases", &report.databases);
    section("Improvements", &report.improvements_suggestion);
    section("Security", &report.security_risks);
    section("Warnings", &report.warnings);

    if !report.dependencies.is_empty() {
        lines.push(String::new());
        lines.push("Dependencies".to_string());
        for (ecosystem, deps) in &report.dependencies {
            lines.push(format!("- {}: {}", ecosystem, deps.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("Folder structure".to_string());
    lines.extend(report.folder_tree.lines().map(str::to_string));
    lines
}

fn build_pdf_bytes(report: &AnalysisReport) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new("RepoVision Report", Mm(210.0), Mm(297.0), "L1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let mut pages: Vec<(PdfPageIndex, PdfLayerIndex)> = vec![(page1, layer1)];
    let mut current = 0usize;
    let mut y_mm: f32 = 285.0;

    let lines: Vec<String> = report_lines(report)
        .iter()
        .flat_map(|line| wrap(&pdf_safe(line), 95))
        .collect();
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            write_pdf_line(&doc, &font, pages[current], 16.0, 15.0, y_mm, line);
            y_mm -= 10.0;
            continue;
        }
        if y_mm < 15.0 {
            let (p, l) = doc.add_page(Mm(210.0), Mm(297.0), format!("L{}", pages.len() + 1));
            pages.push((p, l));
            current = pages.len() - 1;
            y_mm = 285.0;
        }
        write_pdf_line(&doc, &font, pages[current], 9.0, 15.0, y_mm, line);
        y_mm -= 4.5;
    }

    let mut buf = BufWriter::new(Cursor::new(Vec::<u8>::new()));
    doc.save(&mut buf).map_err(|e| ExportError::Pdf(e.to_string()))?;
    let cursor = buf
        .into_inner()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn write_pdf_line(
    doc: &PdfDocumentReference,
    font: &IndirectFontRef,
    page: (PdfPageIndex, PdfLayerIndex),
    size: f32,
    x: f32,
    y: f32,
    text: &str,
) {
    let layer = doc.get_page(page.0).get_layer(page.1);
    layer.use_text(text, size, Mm(x), Mm(y), font);
}

/// Builtin PDF fonts only cover Latin-1; tree glyphs become ASCII.
fn pdf_safe(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '├' => '|',
            '└' => '`',
            '│' => '|',
            '─' => '-',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}
