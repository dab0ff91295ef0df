use chrono::NaiveDate;
use quote_report::config::{Letterhead, DEFAULT_BODY_FONT_FAMILY};
use quote_report::{
    fonts, render_quote, ComposerConfig, DocumentTree, LineItem, PdfAdapter, Quote,
    RenderingAdapter, ReportComposer, Section,
};
use rust_decimal_macros::dec;
use sha2::{Digest, Sha256};

fn sample_quote() -> Quote {
    let copper = LineItem::builder("Copper pipe")
        .quantity(12)
        .unit_labour_cost(dec!(4.5))
        .unit_material_cost(dec!(11.25))
        .labour_hours(dec!(6))
        .build()
        .expect("valid item");
    let valve = LineItem::builder("Ball valve")
        .quantity(2)
        .unit_labour_cost(dec!(20))
        .unit_material_cost(dec!(48.9))
        .labour_hours(dec!(1.5))
        .build()
        .expect("valid item");

    let mut quote = Quote::new("Mechanical retrofit")
        .with_section(Section::new("Above Ground DMV").with_items([copper, valve]))
        .with_section(Section::new("Empty allowance"));
    quote.set_extra_costs(dec!(55)).expect("non-negative");
    quote.set_cost_deductions(dec!(10)).expect("non-negative");
    quote
}

fn composer() -> ReportComposer {
    let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
    ReportComposer::new(
        ComposerConfig::new()
            .with_date(date)
            .with_place("Thunder Bay")
            .with_letterhead(Letterhead {
                name: "Dell Mechanical".into(),
                street: "666 Some Street".into(),
                locality: "Thunder Bay ON".into(),
                contact: "(807) 999-9999".into(),
            }),
    )
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::fonts_available(DEFAULT_BODY_FONT_FAMILY) {
        eprintln!(
            "Skipping PDF rendering: '{}' fonts missing. Set {} or copy assets/fonts next to the binary.",
            DEFAULT_BODY_FONT_FAMILY,
            fonts::FONTS_DIR_ENV
        );
        return None;
    }

    let bytes = render_quote(&composer(), &sample_quote(), &PdfAdapter::new())
        .expect("render sample pdf");
    Some(bytes)
}

/// Blanks out the metadata `printpdf` derives from the clock or random ids.
fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_between(data: &mut [u8], start: &[u8], end: &[u8], keep: &[u8]) {
        let mut offset = 0;
        while let Some(found) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let from = offset + found + start.len();
            let Some(length) = data[from..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[from..from + length] {
                if !keep.contains(byte) {
                    *byte = b'0';
                }
            }
            offset = from + length + end.len();
        }
    }

    let whitespace: &[u8] = b" \n\r\t";
    let mut normalized = bytes.to_vec();
    let tags: [&[u8]; 3] = [b"/CreationDate(", b"/ModDate(", b"/Producer("];
    for tag in tags {
        scrub_between(&mut normalized, tag, b")", &[]);
    }
    scrub_between(&mut normalized, b"/ID[", b"]", b"<> \n\r\t");
    for element in [
        "xmp:CreateDate",
        "xmp:ModifyDate",
        "xmp:MetadataDate",
        "xmpMM:DocumentID",
        "xmpMM:InstanceID",
        "xmpMM:VersionID",
    ] {
        let open = format!("<{element}>");
        let close = format!("</{element}>");
        scrub_between(&mut normalized, open.as_bytes(), close.as_bytes(), whitespace);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_a_pdf_document() {
    let Some(bytes) = render_sample_pdf() else {
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should carry the PDF magic");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_pdf(), render_sample_pdf()) else {
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn missing_fonts_surface_as_font_errors() {
    let tree = composer()
        .build(&sample_quote())
        .expect("composes");
    let json = tree.to_json().expect("serializes");
    let renamed = json.replace(
        &format!("\"font_family\": \"{DEFAULT_BODY_FONT_FAMILY}\""),
        "\"font_family\": \"NoSuchFamily-7f3a\"",
    );
    let tree: DocumentTree = serde_json::from_str(&renamed).expect("tree parses");

    if std::env::var_os(fonts::WINDOWS_FONTS_DIR_ENV).is_some() || cfg!(windows) {
        return;
    }
    let err = PdfAdapter::new().render(&tree).unwrap_err();
    assert!(matches!(err, quote_report::RenderError::FontLoad(_)));
}

#[test]
fn scrubbing_blanks_timestamps_only() {
    let raw = b"/CreationDate(D:20261016)/Title(Quote Document)";
    let scrubbed = scrub_pdf(raw);
    assert_eq!(&scrubbed[..], &b"/CreationDate(0000000000)/Title(Quote Document)"[..]);
}
