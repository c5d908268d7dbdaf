use std::collections::BTreeMap;

use chrono::NaiveDate;
use lopdf::{Document, Object, ObjectId, Stream};
use production_report::config::FONTS_DIR_ENV;
use production_report::fonts;
use production_report::{ReportComposer, ReportConfig, ReportError, ReportInput};
use sha2::{Digest, Sha256};

const SAMPLE_REQUEST: &str = r#"{
    "productionData": [
        {"dateRequested": "2023-10-01", "dateFulfilled": "2023-10-03", "producedQty": 120},
        {"dateRequested": "2023-10-02", "dateFulfilled": "2023-10-03", "producedQty": "80"},
        {"dateRequested": "2023-10-02", "producedQty": 40}
    ],
    "logisticsData": [
        {"_id": "r1", "status": "Pending"},
        {"_id": "r2", "status": "Completed"}
    ],
    "trackingData": [
        {"requestID": "r2", "status": "Completed", "phoneModel": "A14", "quantity": 50},
        {"status": "In Transit", "phoneModel": "A14", "quantity": 20}
    ]
}"#;

fn config() -> ReportConfig {
    let date = NaiveDate::from_ymd_opt(2023, 10, 9).expect("valid date");
    ReportConfig::from_env().without_logo().with_report_date(date)
}

fn composer() -> ReportComposer {
    ReportComposer::new().with_config(config())
}

fn fonts_available() -> bool {
    fonts::fonts_available(&config())
}

fn render(input: &ReportInput) -> Option<Vec<u8>> {
    if !fonts_available() {
        return None;
    }
    Some(composer().compose(input).expect("render report").bytes)
}

fn parse(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).expect("rendered report parses")
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).expect("dangling reference"),
        other => other,
    }
}

/// Image and form XObjects of a page, keyed by resource name.
fn page_xobjects(document: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, &Stream> {
    let page = document.get_dictionary(page_id).expect("page dictionary");
    let Ok(resources) = page.get(b"Resources") else {
        return BTreeMap::new();
    };
    let resources = resolve(document, resources)
        .as_dict()
        .expect("resources dictionary");
    let Ok(xobjects) = resources.get(b"XObject") else {
        return BTreeMap::new();
    };
    resolve(document, xobjects)
        .as_dict()
        .expect("XObject dictionary")
        .iter()
        .map(|(name, object)| {
            let stream = resolve(document, object).as_stream().expect("XObject stream");
            (name.clone(), stream)
        })
        .collect()
}

type PageFingerprint = ([u8; 32], Vec<(Vec<u8>, [u8; 32])>);

/// Per page: the content stream digest and every XObject name with its data digest.
///
/// Object numbers and dictionary key order are left out; the writer does not keep them stable.
fn fingerprint(bytes: &[u8]) -> Vec<PageFingerprint> {
    let document = parse(bytes);
    document
        .get_pages()
        .values()
        .map(|&page_id| {
            let content = document.get_page_content(page_id).expect("page content");
            let xobjects = page_xobjects(&document, page_id)
                .into_iter()
                .map(|(name, stream)| (name, Sha256::digest(&stream.content).into()))
                .collect();
            (Sha256::digest(&content).into(), xobjects)
        })
        .collect()
}

fn skip(test: &str) {
    eprintln!(
        "Skipping {test}: no report font found. Set {FONTS_DIR_ENV} or copy assets/fonts next to the binary."
    );
}

#[test]
fn empty_request_renders_three_pages() {
    let Some(bytes) = render(&ReportInput::default()) else {
        skip("empty_request_renders_three_pages");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(parse(&bytes).get_pages().len(), 3);
}

#[test]
fn sample_request_page_count_matches_layout() {
    if !fonts_available() {
        skip("sample_request_page_count_matches_layout");
        return;
    }
    let input = ReportInput::from_json(SAMPLE_REQUEST.as_bytes()).expect("valid request");
    let report = composer().compose(&input).expect("render report");

    assert_eq!(parse(&report.bytes).get_pages().len(), report.page_count);
    assert_eq!(report.chart_pages, vec![0, 0, 1, 1, 2]);
}

#[test]
fn rendering_is_deterministic() {
    let input = ReportInput::from_json(SAMPLE_REQUEST.as_bytes()).expect("valid request");
    let (Some(first), Some(second)) = (render(&input), render(&input)) else {
        skip("rendering_is_deterministic");
        return;
    };

    let first = fingerprint(&first);
    assert_eq!(first.len(), 3);
    assert_eq!(
        first,
        fingerprint(&second),
        "pages, drawing operations and embedded images must match between renders"
    );
}

#[test]
fn chart_images_are_embedded_at_printed_size() {
    let Some(bytes) = render(&ReportInput::default()) else {
        skip("chart_images_are_embedded_at_printed_size");
        return;
    };
    let document = parse(&bytes);

    let images: Vec<&Stream> = document
        .get_pages()
        .values()
        .flat_map(|&page_id| page_xobjects(&document, page_id).into_values())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|subtype| subtype == b"Image")
        })
        .collect();

    assert_eq!(images.len(), 5);
    for image in images {
        let dimension = |key: &[u8]| image.dict.get(key).and_then(Object::as_i64).ok();
        assert_eq!((dimension(b"Width"), dimension(b"Height")), (Some(400), Some(300)));
        assert!(image.content.len() <= 400 * 300 * 3);
    }
}

#[test]
fn missing_fonts_fail_as_server_error() {
    let config = config()
        .with_fonts_dir("/__production_report_missing_fonts__")
        .with_system_fonts_dir("/__production_report_missing_system_fonts__");
    if fonts::fonts_available(&config) {
        eprintln!("Skipping missing_fonts_fail_as_server_error: fonts found beside the binary or crate.");
        return;
    }

    match ReportComposer::new().with_config(config).compose(&ReportInput::default()) {
        Err(err @ ReportError::FontLoad(_)) => assert_eq!(err.status_code(), 500),
        Err(other) => panic!("expected a font error, got {other}"),
        Ok(_) => panic!("rendering without fonts must fail"),
    }
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_point_at_chart_pages() {
    use production_report::chart::REPORT_CHARTS;
    use std::collections::HashMap;

    if !fonts_available() {
        skip("bookmarks_point_at_chart_pages");
        return;
    }
    let report = composer()
        .compose_with_bookmarks(&ReportInput::default())
        .expect("render with bookmarks");
    let document = parse(&report.bytes);
    let page_indices: HashMap<ObjectId, usize> = document
        .get_pages()
        .values()
        .enumerate()
        .map(|(index, &page_id)| (page_id, index))
        .collect();

    let outlines = document
        .catalog()
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
        .expect("catalog links the outline root");
    let mut next = document
        .get_dictionary(outlines)
        .and_then(|root| root.get(b"First"))
        .and_then(Object::as_reference)
        .ok();

    let mut titles = Vec::new();
    let mut pages = Vec::new();
    while let Some(entry_id) = next {
        let entry = document.get_dictionary(entry_id).expect("outline entry");
        let title = entry.get(b"Title").and_then(Object::as_str).expect("title");
        titles.push(String::from_utf8_lossy(title).into_owned());

        let destination = entry
            .get(b"Dest")
            .and_then(Object::as_array)
            .expect("destination array");
        let page_id = destination[0].as_reference().expect("destination page");
        pages.push(page_indices[&page_id]);

        next = entry.get(b"Next").and_then(Object::as_reference).ok();
    }

    let expected_titles: Vec<_> = REPORT_CHARTS.iter().map(|spec| spec.title).collect();
    assert_eq!(titles, expected_titles);
    assert_eq!(pages, report.chart_pages);
}
