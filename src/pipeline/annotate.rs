//! Stage 2: stamp the branded footer strip onto every page.
//!
//! Chromium prints with a bottom margin wide enough for the strip but leaves
//! it empty. Here each page gets a filled band along its bottom edge with
//! confidentiality text on the left and a version timestamp plus
//! "Page N of M" on the right.
//!
//! ## Content stream layout
//!
//! Chromium's page streams are not guaranteed to restore the graphics state
//! they change, so the existing content is bracketed with a shared `q` / `Q`
//! pair before the footer stream is appended:
//!
//! ```text
//! Contents = [ q, <original…>, Q, <footer> ]
//! ```
//!
//! ## Why write through a temp file?
//!
//! The annotated document replaces the input in place. It is saved to
//! `<pdf>.tmp`, re-opened to check the page count survived, and only then
//! renamed over the original, so a failed run never leaves a truncated PDF.

use crate::config::{FooterStyle, PipelineConfig, Rgb};
use crate::error::ProposalPdfError;
use crate::pipeline::helvetica::{encode_win_ansi, text_width};
use chrono::{DateTime, Local, TimeZone};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resource name the footer font is registered under on every page.
const FONT_RESOURCE: &[u8] = b"FHelvFooter";

/// Page-tree hops allowed when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

/// Stamp the footer onto every page of `pdf_path`, replacing the file.
///
/// Returns the number of pages annotated.
pub async fn add_branded_footer(
    pdf_path: &Path,
    config: &PipelineConfig,
) -> Result<usize, ProposalPdfError> {
    let path = pdf_path.to_path_buf();
    let tmp = temp_path(pdf_path);
    let style = config.footer.clone();
    let left_text = config.footer_left_text.clone();
    let version = version_stamp(&Local::now());
    debug!("Footer version stamp: {}", version);

    let total = tokio::task::spawn_blocking(move || {
        annotate_file(&path, &tmp, &style, &left_text, &version)
    })
    .await
    .map_err(|e| ProposalPdfError::Internal(format!("footer task panicked: {e}")))??;

    info!("Footer added to {} pages", total);
    Ok(total)
}

/// `<pdf_path>.tmp`
pub fn temp_path(pdf_path: &Path) -> PathBuf {
    let mut name = pdf_path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// `March 05, 2026 at 02:07 PM`
pub fn version_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%B %d, %Y at %I:%M %p").to_string()
}

fn annotate_file(
    path: &Path,
    tmp: &Path,
    style: &FooterStyle,
    left_text: &str,
    version: &str,
) -> Result<usize, ProposalPdfError> {
    let mut doc = load(path)?;
    let before = doc.get_pages().len();

    stamp_footer(&mut doc, path, style, left_text, version)?;
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| {
        ProposalPdfError::write_failed(tmp, std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?;
    write_temp(tmp, &bytes)?;

    let after = match load(tmp) {
        Ok(saved) => saved.get_pages().len(),
        Err(e) => {
            let _ = std::fs::remove_file(tmp);
            return Err(e);
        }
    };
    if after != before {
        let _ = std::fs::remove_file(tmp);
        return Err(ProposalPdfError::PageCountMismatch {
            path: path.to_path_buf(),
            before,
            after,
        });
    }

    commit_temp(tmp, path)?;
    Ok(after)
}

/// Write `bytes` to `tmp`, removing any partial file on failure.
fn write_temp(tmp: &Path, bytes: &[u8]) -> Result<(), ProposalPdfError> {
    std::fs::write(tmp, bytes).map_err(|e| {
        let _ = std::fs::remove_file(tmp);
        ProposalPdfError::write_failed(tmp, e)
    })
}

/// Rename `tmp` over `path`. A failed rename removes `tmp`.
fn commit_temp(tmp: &Path, path: &Path) -> Result<(), ProposalPdfError> {
    std::fs::rename(tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(tmp);
        ProposalPdfError::write_failed(path, e)
    })
}

pub(crate) fn load(path: &Path) -> Result<Document, ProposalPdfError> {
    if !path.is_file() {
        return Err(ProposalPdfError::PdfNotFound {
            path: path.to_path_buf(),
        });
    }
    Document::load(path).map_err(|e| ProposalPdfError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Add the footer to every page of `doc` in memory. Returns the page count.
fn stamp_footer(
    doc: &mut Document,
    path: &Path,
    style: &FooterStyle,
    left_text: &str,
    version: &str,
) -> Result<usize, ProposalPdfError> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let prefix = format!("Version: {version}  \u{00b7}  ");
    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let total = page_ids.len();

    for (index, page_id) in page_ids.into_iter().enumerate() {
        let media = media_box(doc, page_id).ok_or_else(|| ProposalPdfError::MissingMediaBox {
            path: path.to_path_buf(),
            page: index + 1,
        })?;
        let page_text = format!("Page {} of {}", index + 1, total);
        let layout = FooterLayout::new(media, style, &prefix, &page_text);

        let content = Content {
            operations: footer_operations(&layout, style, left_text, &prefix, &page_text),
        };
        let encoded = content
            .encode()
            .map_err(|e| ProposalPdfError::Internal(format!("footer content stream: {e}")))?;
        let footer_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        register_font(doc, page_id, font_id).map_err(|e| corrupt(path, e))?;
        wrap_contents(doc, page_id, save_id, restore_id, footer_id).map_err(|e| corrupt(path, e))?;
    }

    Ok(total)
}

fn corrupt(path: &Path, e: lopdf::Error) -> ProposalPdfError {
    ProposalPdfError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

/// Positions, in PDF user space, of everything drawn in one footer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FooterLayout {
    left: f32,
    bottom: f32,
    width: f32,
    strip_height: f32,
    baseline: f32,
    left_text_x: f32,
    prefix_x: f32,
    page_text_x: f32,
    /// Right edge of the page-number run.
    right_edge: f32,
}

impl FooterLayout {
    fn new(media: [f32; 4], style: &FooterStyle, prefix: &str, page_text: &str) -> Self {
        let [llx, lly, urx, _] = media;
        let width = urx - llx;
        let strip_height = style.height_pt() as f32;
        let pw = text_width(prefix, style.font_size);
        let gw = text_width(page_text, style.font_size);
        let prefix_x = llx + width - style.inset_pt - pw - gw;
        Self {
            left: llx,
            bottom: lly,
            width,
            strip_height,
            baseline: lly + strip_height / 2.0 - style.baseline_drop_pt,
            left_text_x: llx + style.inset_pt,
            prefix_x,
            page_text_x: prefix_x + pw,
            right_edge: prefix_x + pw + gw,
        }
    }
}

fn footer_operations(
    layout: &FooterLayout,
    style: &FooterStyle,
    left_text: &str,
    prefix: &str,
    page_text: &str,
) -> Vec<Operation> {
    let [r, g, b] = style.fill.to_unit();
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        Operation::new(
            "re",
            vec![
                layout.left.into(),
                layout.bottom.into(),
                layout.width.into(),
                layout.strip_height.into(),
            ],
        ),
        Operation::new("f", vec![]),
    ];
    text_run(&mut ops, layout.left_text_x, layout.baseline, style.font_size, style.text_color, left_text);
    text_run(&mut ops, layout.prefix_x, layout.baseline, style.font_size, style.text_color, prefix);
    text_run(
        &mut ops,
        layout.page_text_x,
        layout.baseline,
        style.font_size,
        style.page_number_color,
        page_text,
    );
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn text_run(ops: &mut Vec<Operation>, x: f32, y: f32, size: f32, color: Rgb, text: &str) {
    let [r, g, b] = color.to_unit();
    ops.extend([
        Operation::new("BT", vec![]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.to_vec()), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]);
}

// ── Page tree helpers ────────────────────────────────────────────────────

/// Follow a reference one hop.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look `key` up on the page, then up its `Parent` chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// The page's MediaBox as `[llx, lly, urx, ury]`, normalised so the lower
/// left corner comes first.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let array = resolve(doc, inherited(doc, page_id, b"MediaBox")?)?
        .as_array()
        .ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut v = [0.0f32; 4];
    for (slot, obj) in v.iter_mut().zip(array) {
        *slot = number(resolve(doc, obj)?)?;
    }
    Some([v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])])
}

/// Give the page its own Resources dictionary with the footer font added.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> lopdf::Result<()> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    fonts.set(FONT_RESOURCE.to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// `Contents = [save, <existing…>, restore, footer]`
fn wrap_contents(
    doc: &mut Document,
    page_id: ObjectId,
    save_id: ObjectId,
    restore_id: ObjectId,
    footer_id: ObjectId,
) -> lopdf::Result<()> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(restore_id));
    contents.push(Object::Reference(footer_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Two Legal pages whose MediaBox lives on the Pages node, with page
    /// Resources held by reference as Chromium writes them.
    fn legal_doc() -> Document {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let body_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => body_font },
        });

        let mut kids = Vec::new();
        for n in 1..=2 {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 900.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Body {n}"))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 1008.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn footer_strings(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
        let contents = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap();
        let footer_id = contents.last().unwrap().as_reference().unwrap();
        let stream = doc.get_object(footer_id).unwrap().as_stream().unwrap();
        Content::decode(&stream.content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn version_stamp_format() {
        let t = Utc.with_ymd_and_hms(2026, 3, 5, 14, 7, 0).unwrap();
        assert_eq!(version_stamp(&t), "March 05, 2026 at 02:07 PM");
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("out/proposal.pdf")),
            PathBuf::from("out/proposal.pdf.tmp")
        );
    }

    #[test]
    fn media_box_is_inherited_from_pages_node() {
        let doc = legal_doc();
        let first = *doc.get_pages().values().next().unwrap();
        assert_eq!(media_box(&doc, first), Some([0.0, 0.0, 612.0, 1008.0]));
    }

    #[test]
    fn layout_right_aligns_page_number() {
        let style = FooterStyle::default();
        let prefix = "Version: March 05, 2026 at 02:07 PM  \u{00b7}  ";
        let layout = FooterLayout::new([0.0, 0.0, 612.0, 1008.0], &style, prefix, "Page 3 of 14");
        assert!((layout.right_edge - (612.0 - 28.0)).abs() < 1e-3);
        assert_eq!(layout.left_text_x, 28.0);
        assert!((layout.baseline - (style.height_pt() as f32 / 2.0 - 2.0)).abs() < 1e-4);
        assert!(layout.prefix_x > layout.left_text_x);
        assert!(layout.page_text_x > layout.prefix_x);
    }

    #[test]
    fn layout_respects_offset_media_box() {
        let style = FooterStyle::default();
        let layout = FooterLayout::new([10.0, 20.0, 622.0, 1028.0], &style, "v ", "Page 1 of 1");
        assert_eq!(layout.left, 10.0);
        assert_eq!(layout.left_text_x, 38.0);
        assert!((layout.right_edge - (622.0 - 28.0)).abs() < 1e-3);
        assert!(layout.baseline > 20.0);
    }

    #[test]
    fn stamps_every_page() {
        let mut doc = legal_doc();
        let total = stamp_footer(
            &mut doc,
            Path::new("mem.pdf"),
            &FooterStyle::default(),
            "Left \u{00b7} Confidential",
            "March 05, 2026 at 02:07 PM",
        )
        .unwrap();
        assert_eq!(total, 2);

        for (i, page_id) in doc.get_pages().values().enumerate() {
            let strings = footer_strings(&doc, *page_id);
            assert_eq!(strings.len(), 3);
            assert_eq!(strings[0], b"Left \xb7 Confidential".to_vec());
            assert!(strings[1].starts_with(b"Version: March 05, 2026"));
            assert_eq!(strings[2], format!("Page {} of 2", i + 1).into_bytes());

            let page = doc.get_dictionary(*page_id).unwrap();
            let contents = page.get(b"Contents").unwrap().as_array().unwrap();
            assert_eq!(contents.len(), 4, "save, body, restore, footer");
            let fonts = page
                .get(b"Resources")
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"Font")
                .unwrap()
                .as_dict()
                .unwrap();
            assert!(fonts.has(b"F1"), "existing font kept");
            assert!(fonts.has(FONT_RESOURCE));
        }
    }

    #[test]
    fn missing_media_box_is_an_error() {
        let mut doc = legal_doc();
        let first = *doc.get_pages().values().next().unwrap();
        let pages_id = doc
            .get_dictionary(first)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();
        doc.get_object_mut(pages_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .remove(b"MediaBox");
        let err = stamp_footer(&mut doc, Path::new("x.pdf"), &FooterStyle::default(), "l", "v")
            .unwrap_err();
        assert!(matches!(err, ProposalPdfError::MissingMediaBox { page: 1, .. }));
    }

    #[tokio::test]
    async fn replaces_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("proposal.pdf");
        legal_doc().save(&pdf).unwrap();

        let config = PipelineConfig::builder().output_path(&pdf).build().unwrap();
        let pages = add_branded_footer(&pdf, &config).await.unwrap();

        assert_eq!(pages, 2);
        assert!(!temp_path(&pdf).exists());
        let reloaded = Document::load(&pdf).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("proposal.pdf");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();
        let tmp = temp_path(&target);
        write_temp(&tmp, b"%PDF-1.4").unwrap();

        let err = commit_temp(&tmp, &target).unwrap_err();
        assert!(matches!(err, ProposalPdfError::OutputWriteFailed { .. }), "got {err:?}");
        assert!(!tmp.exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("missing-dir").join("proposal.pdf.tmp");
        let err = write_temp(&tmp, b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, ProposalPdfError::OutputWriteFailed { .. }), "got {err:?}");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn corrupt_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\nnot really").unwrap();
        let err = add_branded_footer(&pdf, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalPdfError::CorruptPdf { .. }), "got {err:?}");
        assert!(pdf.exists());
    }
}
