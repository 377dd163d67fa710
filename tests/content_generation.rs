use stickerlab::element::{BARCODE_BOX_MM, ElementKind, QR_BOX_MM, SHAPE_BOX_MM, TABLE_BOX_MM};
use stickerlab::{CanvasConfig, ShapeKind, Symbology, generator};

fn config() -> CanvasConfig {
    CanvasConfig::new(100.0, 50.0)
}

#[test]
fn generated_kinds_get_their_default_boxes() {
    let config = config();
    assert_eq!(
        generator::new_qrcode("x", &config).unwrap().box_size_mm(),
        Some(QR_BOX_MM)
    );
    assert_eq!(
        generator::new_barcode("123", Symbology::Code128, &config)
            .unwrap()
            .box_size_mm(),
        Some(BARCODE_BOX_MM)
    );
    assert_eq!(
        generator::new_table(&config).box_size_mm(),
        Some(TABLE_BOX_MM)
    );
    assert_eq!(
        generator::new_shape(ShapeKind::Heart, &config)
            .unwrap()
            .box_size_mm(),
        Some(SHAPE_BOX_MM)
    );
}

#[test]
fn every_new_element_is_centered() {
    let config = config();
    let center = egui::Pos2::new(50.0, 25.0);
    assert_eq!(generator::new_text(&config).position_mm, center);
    assert_eq!(generator::new_table(&config).position_mm, center);
    assert_eq!(
        generator::new_qrcode("x", &config).unwrap().position_mm,
        center
    );
}

#[test]
fn code128_accepts_what_ean13_rejects() {
    let config = config();
    assert!(generator::new_barcode("SKU-778/a", Symbology::Code128, &config).is_ok());
    assert!(generator::new_barcode("SKU-778/a", Symbology::Ean13, &config).is_err());
}

#[test]
fn ean13_round_trips_a_valid_article_number() {
    let config = config();
    let element = generator::new_barcode("590123412345", Symbology::Ean13, &config).unwrap();
    let ElementKind::Barcode(p) = &element.kind else {
        panic!("expected barcode");
    };
    assert_eq!(p.symbology, Symbology::Ean13);
    let cache = p.cache.as_ref().unwrap();
    assert!(cache.width > cache.height, "bars form a wide strip");
}

#[test]
fn every_shape_kind_rasterizes() {
    let config = config();
    for kind in ShapeKind::ALL {
        let element = generator::new_shape(kind, &config).unwrap();
        let ElementKind::Shape(p) = &element.kind else {
            panic!("expected shape");
        };
        let cache = p.cache.as_ref().unwrap();
        assert!(
            cache.pixels.iter().skip(3).step_by(4).any(|a| *a > 0),
            "{kind:?} rasterized fully transparent"
        );
    }
}

#[test]
fn table_defaults_are_three_by_three() {
    let element = generator::new_table(&config());
    let ElementKind::Table(p) = &element.kind else {
        panic!("expected table");
    };
    assert_eq!((p.rows, p.cols), (3, 3));
    assert!(p.border_mm > 0.0);
}

#[test]
fn svg_document_becomes_a_raster_element() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="10">
        <rect width="30" height="10" fill="#123456"/>
    </svg>"##;
    let config = config();
    let element = generator::new_document("sheet.svg", svg, &config).unwrap();
    let ElementKind::Document(p) = &element.kind else {
        panic!("expected document");
    };
    assert_eq!(p.source_name, "sheet.svg");
    assert!(!p.bitmap.is_empty());
    // 3:1 page fits the 60x30mm placement box width-first.
    let size = p.size_mm;
    assert!((size.x / size.y - 3.0).abs() < 1e-3);
    assert!(size.x <= 60.0 + 1e-3);
}

#[test]
fn malformed_svg_reports_an_error() {
    assert!(generator::new_document("bad.svg", b"<svg", &config()).is_err());
}
