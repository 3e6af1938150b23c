use harvest_engine::{decode_payload, parse_listing_page};
use pretty_assertions::assert_eq;

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9"; // iso-8859-1
    let decoded = decode_payload(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.text, "café");
    assert!(
        decoded.encoding_label.eq_ignore_ascii_case("ISO-8859-1")
            || decoded.encoding_label.eq_ignore_ascii_case("windows-1252")
    );
}

#[test]
fn decode_handles_utf8_bom() {
    let bytes = b"\xEF\xBB\xBF[]";
    let decoded = decode_payload(bytes, Some("application/json")).unwrap();
    assert_eq!(decoded.text, "[]");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn decode_gbk_page_from_header() {
    // "剧情" in GBK
    let bytes = b"\xbe\xe7\xc7\xe9";
    let decoded = decode_payload(bytes, Some("text/html; charset=gbk")).unwrap();
    assert_eq!(decoded.text, "剧情");
}

#[test]
fn decode_rejects_malformed_utf8() {
    let bytes = b"\xff\xfe\xfd ok";
    assert!(decode_payload(&bytes[2..], Some("text/html; charset=utf-8")).is_err());
}

#[test]
fn listing_container_without_items_is_an_empty_page() {
    let html = r#"<html><body><ol class="grid_view"></ol></body></html>"#;
    assert!(parse_listing_page(html, None).unwrap().is_empty());
}
