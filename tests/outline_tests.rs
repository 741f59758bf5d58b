//! Declared-class listing for document outlines.

mod helpers;

use helpers::{test_library, write_file};
use mols::ide::{declarations_for_path, ClassKind};

#[test]
fn lists_top_level_class() {
    let fixture = test_library();
    let symbols =
        declarations_for_path(&fixture.project, &fixture.file("Constants.mo")).unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "Constants");
    assert_eq!(symbols[0].kind, ClassKind::Package);
}

#[test]
fn reports_class_kinds() {
    let fixture = test_library();
    let symbols =
        declarations_for_path(&fixture.project, &fixture.file("TestPackage/TestClass.mo"))
            .unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "TestClass");
    assert_eq!(symbols[0].kind, ClassKind::Function);
}

#[test]
fn flattens_nested_classes_in_order() {
    let fixture = test_library();
    let symbols =
        declarations_for_path(&fixture.project, &fixture.file("Records.mo")).unwrap();
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Records", "Point", "Use"]);
    assert_eq!(symbols[0].kind, ClassKind::Package);
    assert_eq!(symbols[1].kind, ClassKind::Record);
    assert_eq!(symbols[2].kind, ClassKind::Model);
}

#[test]
fn selection_range_covers_the_identifier() {
    let fixture = test_library();
    let symbols =
        declarations_for_path(&fixture.project, &fixture.file("Constants.mo")).unwrap();
    let symbol = &symbols[0];
    // identifier sits on line 1: `package Constants`
    assert_eq!(symbol.selection.start.line, 1);
    assert_eq!(symbol.selection.start.column, 8);
    assert_eq!(symbol.selection.end.column, 8 + "Constants".len());
    assert!(symbol.span.contains(symbol.selection.start));
}

#[test]
fn unknown_document_yields_none() {
    let fixture = test_library();
    assert!(declarations_for_path(&fixture.project, &fixture.file("Missing.mo")).is_none());
}

#[test]
fn short_class_specifiers_are_listed() {
    let mut fixture = test_library();
    let file = fixture.file("Types.mo");
    write_file(
        &file,
        "within TestLibrary;\npackage Types\n  type Voltage = Real(unit = \"V\");\nend Types;\n",
    );
    fixture.project.add_document(&file).unwrap();
    let symbols = declarations_for_path(&fixture.project, &file).unwrap();
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Types", "Voltage"]);
    assert_eq!(symbols[1].kind, ClassKind::Type);
}
