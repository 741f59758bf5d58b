//! Document editing: full and ranged updates, version counters, and the
//! effect of edits on resolution.

mod helpers;

use helpers::{path, position_in, test_library};
use mols::base::Span;
use mols::semantic::{
    resolve_reference, AbsoluteReference, Resolution, ResolvedReference, UnresolvedReference,
};
use mols::Project;

fn resolve(project: &mut Project, symbols: &[&str]) -> Option<ResolvedReference> {
    let reference =
        UnresolvedReference::Absolute(AbsoluteReference::new(path(symbols), None).unwrap());
    resolve_reference(project, &reference, Resolution::Declaration).unwrap()
}

#[test]
fn full_update_replaces_tree() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    assert!(resolve(&mut fixture.project, &["TestLibrary", "Constants", "e"]).is_some());

    let updated = "within TestLibrary;\npackage Constants\n  constant Real tau = 6.28318;\nend Constants;\n";
    assert!(fixture.project.update_document(&file, updated, None));

    // the old constant is gone, the new one resolves
    assert!(resolve(&mut fixture.project, &["TestLibrary", "Constants", "e"]).is_none());
    assert!(resolve(&mut fixture.project, &["TestLibrary", "Constants", "tau"]).is_some());
}

#[test]
fn ranged_update_splices_text() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    // rename `e` to `ee`: insert one character at the declaration
    let position = position_in(helpers::CONSTANTS_MO, "e  = 2.71828", 0);
    let span = Span::from_coords(
        position.line,
        position.column,
        position.line,
        position.column,
    );
    assert!(fixture.project.update_document(&file, "e", Some(span)));

    let document = fixture.project.get_document(&file).unwrap();
    assert!(document.text().contains("constant Real ee"));
    assert!(document.parse_errors().is_empty());
    assert!(resolve(&mut fixture.project, &["TestLibrary", "Constants", "ee"]).is_some());
}

#[test]
fn versions_increase_monotonically() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    let initial = fixture.project.get_document(&file).unwrap().version();
    for _ in 0..3 {
        fixture
            .project
            .update_document(&file, helpers::CONSTANTS_MO, None);
    }
    let after = fixture.project.get_document(&file).unwrap().version();
    assert_eq!(after, initial + 3);
}

#[test]
fn package_path_is_stable_across_edits() {
    let mut fixture = test_library();
    let file = fixture.file("TestPackage/TestClass.mo");
    let before = fixture
        .project
        .get_document(&file)
        .unwrap()
        .package_path()
        .to_vec();
    fixture
        .project
        .update_document(&file, "function TestClass\nend TestClass;\n", None);
    let after = fixture.project.get_document(&file).unwrap();
    assert_eq!(after.package_path(), before.as_slice());
}

#[test]
fn edits_invalidate_previous_results_cleanly() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    let before = resolve(&mut fixture.project, &["TestLibrary", "Constants", "e"]).unwrap();

    // touch the document; resolved node ids from the old tree must not be
    // trusted, so resolution recomputes them
    fixture
        .project
        .update_document(&file, helpers::CONSTANTS_MO, None);
    let after = resolve(&mut fixture.project, &["TestLibrary", "Constants", "e"]).unwrap();
    assert_eq!(before.symbols, after.symbols);
    assert_eq!(before.kind, after.kind);
}
